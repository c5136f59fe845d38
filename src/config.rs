use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Directory holding one `session_<token>.json` per live session.
    pub sessions_dir: String,
    /// Directory of static assets (login page and friends).
    pub public_dir: String,
    /// Static identity → secret table, parsed from PORTAL_USERS.
    pub users: HashMap<String, String>,
    /// Login-attempt sink endpoints. Empty list disables the sink silently.
    pub webhook_urls: Vec<String>,
    /// Optional HMAC-SHA256 secret for signing sink deliveries.
    pub webhook_secret: Option<String>,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let users_raw = std::env::var("PORTAL_USERS").unwrap_or_default();
    let users = if users_raw.trim().is_empty() {
        let env_mode = std::env::var("PORTAL_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "PORTAL_USERS is not set. Refusing to start in production \
                 with the built-in demo accounts."
            );
        }
        eprintln!("⚠️  PORTAL_USERS is not set — falling back to the built-in demo accounts.");
        HashMap::from([
            ("user1@company.com".to_string(), "1234".to_string()),
            ("admin@company.com".to_string(), "pass".to_string()),
        ])
    } else {
        parse_users(&users_raw)?
    };

    Ok(Config {
        port: std::env::var("PORTAL_PORT")
            .unwrap_or_else(|_| "4000".into())
            .parse()
            .unwrap_or(4000),
        sessions_dir: std::env::var("PORTAL_SESSIONS_DIR").unwrap_or_else(|_| "sessions".into()),
        public_dir: std::env::var("PORTAL_PUBLIC_DIR").unwrap_or_else(|_| "public".into()),
        webhook_urls: std::env::var("PORTAL_WEBHOOK_URLS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        webhook_secret: std::env::var("PORTAL_WEBHOOK_SECRET").ok(),
        users,
    })
}

/// Parse `identity:secret` pairs separated by commas.
/// The secret may itself contain `:`; only the first one splits.
fn parse_users(raw: &str) -> anyhow::Result<HashMap<String, String>> {
    let mut users = HashMap::new();
    for pair in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((identity, secret)) = pair.split_once(':') else {
            anyhow::bail!("PORTAL_USERS entry without ':' separator: {pair:?}");
        };
        if identity.is_empty() || secret.is_empty() {
            anyhow::bail!("PORTAL_USERS entry with empty identity or secret");
        }
        users.insert(identity.to_string(), secret.to_string());
    }
    Ok(users)
}
