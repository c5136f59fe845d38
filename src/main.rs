use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portal::auth::{AttemptTracker, CredentialStore};
use portal::notification::WebhookNotifier;
use portal::session::{FileBackend, SessionStore};
use portal::{api, config, jobs, AppState};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "portal=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => run_server(cfg, port).await,
        Some(cli::Commands::Session { command }) => handle_session_command(cfg, command).await,
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    tracing::info!(dir = %cfg.sessions_dir, "opening session store");
    let backend = FileBackend::open(&cfg.sessions_dir).await?;
    let sessions = SessionStore::new(backend);

    // The sweep must finish before any request can race it.
    let stats = sessions.sweep().await?;
    tracing::info!(
        retained = stats.retained,
        expired = stats.expired,
        corrupt = stats.corrupt,
        "startup session sweep done"
    );

    let state = Arc::new(AppState {
        sessions,
        credentials: CredentialStore::new(cfg.users.clone()),
        attempts: AttemptTracker::new(),
        webhook: WebhookNotifier::new(),
        config: cfg,
    });

    let app = axum::Router::new()
        // Health endpoint (no auth)
        .route("/healthz", axum::routing::get(|| async { "ok" }))
        .merge(api::portal_router(state.clone()))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware));

    jobs::sweep::spawn(state);
    tracing::info!("background session sweep started (hourly)");

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("portal listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Middleware: injects a unique X-Request-Id into every response.
/// This allows clients to correlate errors with portal logs.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = axum::http::HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

/// Middleware: injects security headers into every response.
/// These protect against XSS, clickjacking, MIME sniffing, and info leakage.
async fn security_headers_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert("X-Content-Type-Options", "nosniff".parse().unwrap());
    headers.insert("X-Frame-Options", "DENY".parse().unwrap());
    headers.insert("Referrer-Policy", "no-referrer".parse().unwrap());
    headers.remove("Server");

    resp
}

async fn handle_session_command(
    cfg: config::Config,
    cmd: cli::SessionCommands,
) -> anyhow::Result<()> {
    let backend = FileBackend::open(&cfg.sessions_dir).await?;
    let sessions = SessionStore::new(backend);

    match cmd {
        cli::SessionCommands::List => {
            let tokens = sessions.list_tokens().await?;
            if tokens.is_empty() {
                println!("No sessions found.");
                return Ok(());
            }
            println!("{:<46} {:<28} {:<26} EXPIRES", "TOKEN", "USERNAME", "CREATED");
            for tok in tokens {
                match sessions.get(&tok).await? {
                    Some(s) => println!(
                        "{:<46} {:<28} {:<26} {}",
                        s.token, s.username, s.created_at, s.expires_at
                    ),
                    // get() reclaims expired records as it goes
                    None => println!("{:<46} (expired or unreadable, removed)", tok),
                }
            }
        }
        cli::SessionCommands::Revoke { token } => {
            sessions.delete(&token).await?;
            println!("Session revoked.");
        }
        cli::SessionCommands::Sweep => {
            let stats = sessions.sweep().await?;
            println!(
                "Sweep complete: {} retained, {} expired, {} corrupt removed.",
                stats.retained, stats.expired, stats.corrupt
            );
        }
    }
    Ok(())
}
