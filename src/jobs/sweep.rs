//! Background job: periodic session sweep.
//!
//! The startup sweep (run before the listener binds) already guarantees a
//! clean slate; this job keeps the sessions directory from accumulating
//! expired records between restarts. Reads stay correct without it — the
//! store checks the deadline on every `get`.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use crate::AppState;

/// Spawn the background sweep task. Call this once at startup, after the
/// initial sweep has completed.
pub fn spawn(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(3600)); // every hour
        interval.tick().await; // first tick completes immediately; skip it
        loop {
            interval.tick().await;
            match state.sessions.sweep().await {
                Ok(stats) if stats.expired + stats.corrupt > 0 => {
                    tracing::info!(
                        expired = stats.expired,
                        corrupt = stats.corrupt,
                        "periodic sweep reclaimed sessions"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("periodic session sweep failed: {}", e);
                }
            }
        }
    });
}
