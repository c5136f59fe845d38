//! Company portal — library crate for integration testing.
//!
//! Re-exports modules needed by integration tests in `tests/`.

use auth::{AttemptTracker, CredentialStore};
use notification::WebhookNotifier;
use session::SessionStore;

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod jobs;
pub mod notification;
pub mod session;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub sessions: SessionStore,
    pub credentials: CredentialStore,
    pub attempts: AttemptTracker,
    pub webhook: WebhookNotifier,
    pub config: config::Config,
}
