//! File-per-session backend.
//!
//! One `session_<token>.json` per record under a single directory, the
//! layout the rest of the portal tooling expects. Writes go through a
//! temp file + rename so a concurrent reader never observes a partially
//! written record.

use std::io::ErrorKind;
use std::path::PathBuf;

use super::{Fetched, Session, SessionBackend, StoreError};

const FILE_PREFIX: &str = "session_";
const FILE_SUFFIX: &str = ".json";

pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open (creating if needed) the sessions directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn record_path(&self, token: &str) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{token}{FILE_SUFFIX}"))
    }
}

#[async_trait::async_trait]
impl SessionBackend for FileBackend {
    async fn put(&self, session: &Session) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(session)?;
        // Rename within one directory is atomic; readers see either the
        // whole record or nothing.
        let tmp = self.dir.join(format!(".tmp-{}", session.token));
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, self.record_path(&session.token)).await?;
        Ok(())
    }

    async fn fetch(&self, token: &str) -> Result<Fetched, StoreError> {
        let bytes = match tokio::fs::read(self.record_path(token)).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Fetched::Missing),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice::<Session>(&bytes) {
            Ok(session) => Ok(Fetched::Found(session)),
            Err(e) => {
                tracing::warn!(token, error = %e, "unparsable session record");
                Ok(Fetched::Corrupt)
            }
        }
    }

    async fn remove(&self, token: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.record_path(token)).await {
            Ok(()) => Ok(()),
            // Already gone (double-delete race, or never existed): fine.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_tokens(&self) -> Result<Vec<String>, StoreError> {
        let mut tokens = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(tok) = name
                .strip_prefix(FILE_PREFIX)
                .and_then(|n| n.strip_suffix(FILE_SUFFIX))
            {
                tokens.push(tok.to_string());
            }
        }
        Ok(tokens)
    }
}
