use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::gate;
use crate::AppState;

pub mod handlers;

/// Build the portal router.
///
/// `/dashboard.html` is routed through the authorization gate explicitly;
/// the static fallback only sees requests no route claimed, so the login
/// page and assets are public but the dashboard can never be served
/// around the gate.
pub fn portal_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/dashboard.html", get(handlers::dashboard))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::require_session,
        ));

    Router::new()
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/download/:token", get(handlers::download))
        .merge(protected)
        .fallback_service(ServeDir::new(&state.config.public_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
