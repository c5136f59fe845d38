//! Session lifecycle: token issuance, durable persistence, lazy expiry,
//! and the startup sweep.
//!
//! All reads go through [`SessionStore::get`], which checks the expiry
//! deadline before returning a record. A `get` that finds an expired record
//! deletes it as a side effect, so callers never observe a session past its
//! `expires_at` regardless of sweep cadence.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod file;
pub mod memory;
pub mod token;

pub use file::FileBackend;
pub use memory::MemoryBackend;

/// Fixed session validity window.
pub const SESSION_TTL_DAYS: i64 = 7;

/// A durable session record, keyed by its token.
///
/// Serialized field names (`created`, `expiresAt`) are the on-disk wire
/// format and the body served by the download endpoint — do not rename.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub username: String,
    pub token: String,
    #[serde(rename = "created")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A session is live iff its deadline is still in the future.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The persistence layer itself failed. Distinct from "not found":
    /// callers map this to a 5xx, never to a login redirect.
    #[error("session storage unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    #[error("session serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Counts reported by [`SessionStore::sweep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepStats {
    pub retained: usize,
    pub expired: usize,
    pub corrupt: usize,
}

/// Outcome of a raw backend fetch. Corrupt records are reported as their
/// own state so the sweep can count and delete them; everywhere else they
/// collapse into "absent".
#[derive(Debug)]
pub enum Fetched {
    Found(Session),
    /// A record exists under the key but its stored bytes do not parse.
    Corrupt,
    Missing,
}

/// Storage backend seam: durable key → record mapping with per-key
/// atomicity. `put` must be durably visible to a subsequent `fetch` before
/// it returns; `remove` must be idempotent.
#[async_trait::async_trait]
pub trait SessionBackend: Send + Sync {
    async fn put(&self, session: &Session) -> Result<(), StoreError>;

    async fn fetch(&self, token: &str) -> Result<Fetched, StoreError>;

    async fn remove(&self, token: &str) -> Result<(), StoreError>;

    /// All tokens currently persisted, parsable or not. Used by the sweep.
    async fn list_tokens(&self) -> Result<Vec<String>, StoreError>;
}

/// The session store: owns token generation, the TTL policy, and the
/// backend. The only component that writes the persisted representation.
pub struct SessionStore {
    backend: Arc<dyn SessionBackend>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(backend: impl SessionBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
            ttl: Duration::days(SESSION_TTL_DAYS),
        }
    }

    /// Test seam: override the fixed TTL (e.g. force already-expired
    /// records). Production code always uses `new`.
    pub fn with_ttl(backend: impl SessionBackend + 'static, ttl: Duration) -> Self {
        Self {
            backend: Arc::new(backend),
            ttl,
        }
    }

    /// Issue a token and persist a new record for `username`. The record
    /// is durably visible to `get` before this returns.
    pub async fn create(&self, username: &str) -> Result<Session, StoreError> {
        let now = Utc::now();
        let session = Session {
            username: username.to_string(),
            token: token::new_token(),
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.backend.put(&session).await?;
        tracing::debug!(username, token = %session.token, "session created");
        Ok(session)
    }

    /// Look up a live session. An expired record is deleted as a side
    /// effect of the read and reported absent; a missing or corrupt record
    /// is reported absent without touching storage.
    pub async fn get(&self, token: &str) -> Result<Option<Session>, StoreError> {
        if !token::is_well_formed(token) {
            return Ok(None);
        }
        let session = match self.backend.fetch(token).await? {
            Fetched::Found(s) => s,
            // Corrupt is indistinguishable from absent here; the sweep
            // reclaims the bytes.
            Fetched::Corrupt | Fetched::Missing => return Ok(None),
        };
        if session.is_live(Utc::now()) {
            return Ok(Some(session));
        }
        // Lazy expiry reclamation. remove() is idempotent, so two
        // concurrent reads of the same dead token both succeed.
        self.backend.remove(token).await?;
        tracing::debug!(token, "expired session reclaimed on read");
        Ok(None)
    }

    /// Idempotent removal; deleting an absent token is not an error.
    pub async fn delete(&self, token: &str) -> Result<(), StoreError> {
        if !token::is_well_formed(token) {
            return Ok(());
        }
        self.backend.remove(token).await
    }

    /// Bulk reclamation of expired and unparsable records. Runs once at
    /// startup, before the listener binds, and periodically thereafter.
    /// Corrupt records are deleted, never repaired and never fatal.
    pub async fn sweep(&self) -> Result<SweepStats, StoreError> {
        let now = Utc::now();
        let mut stats = SweepStats::default();

        for tok in self.backend.list_tokens().await? {
            match self.backend.fetch(&tok).await? {
                Fetched::Found(session) if session.is_live(now) => stats.retained += 1,
                Fetched::Found(_) => {
                    self.backend.remove(&tok).await?;
                    stats.expired += 1;
                }
                Fetched::Corrupt => {
                    self.backend.remove(&tok).await?;
                    stats.corrupt += 1;
                }
                // Raced with a concurrent delete between list and fetch.
                Fetched::Missing => {}
            }
        }

        tracing::info!(
            retained = stats.retained,
            expired = stats.expired,
            corrupt = stats.corrupt,
            "session sweep complete"
        );
        Ok(stats)
    }

    /// Tokens of all currently persisted records (live or not), for the
    /// operational CLI.
    pub async fn list_tokens(&self) -> Result<Vec<String>, StoreError> {
        self.backend.list_tokens().await
    }
}
