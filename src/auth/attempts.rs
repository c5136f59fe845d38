//! Per-identity login attempt history.
//!
//! Owned by `AppState` and injected into the login flow rather than living
//! in process-global statics, so tests can construct and reset it
//! deterministically. The history only feeds the notification sink; it has
//! no effect on whether a login succeeds.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Most recent attempts kept per identity.
const HISTORY_CAP: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    pub timestamp: DateTime<Utc>,
    pub success: bool,
}

#[derive(Default)]
pub struct AttemptTracker {
    by_identity: Mutex<HashMap<String, Vec<Attempt>>>,
}

impl AttemptTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attempt and return the identity's history including it,
    /// oldest first.
    pub fn record(&self, identity: &str, success: bool) -> Vec<Attempt> {
        let mut map = self.by_identity.lock().expect("attempt tracker poisoned");
        let history = map.entry(identity.to_string()).or_default();
        history.push(Attempt {
            timestamp: Utc::now(),
            success,
        });
        if history.len() > HISTORY_CAP {
            let excess = history.len() - HISTORY_CAP;
            history.drain(..excess);
        }
        history.clone()
    }

    pub fn history(&self, identity: &str) -> Vec<Attempt> {
        self.by_identity
            .lock()
            .expect("attempt tracker poisoned")
            .get(identity)
            .cloned()
            .unwrap_or_default()
    }

    pub fn reset(&self) {
        self.by_identity
            .lock()
            .expect("attempt tracker poisoned")
            .clear();
    }
}
