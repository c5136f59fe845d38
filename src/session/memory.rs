//! In-memory backend: a locked map of serialized records.
//!
//! Stores the JSON bytes rather than the struct so corrupt-record handling
//! can be exercised in tests exactly as it happens on disk.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{Fetched, Session, SessionBackend, StoreError};

#[derive(Clone, Default)]
pub struct MemoryBackend {
    records: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test seam: plant raw bytes under a token, valid or not.
    pub async fn insert_raw(&self, token: &str, bytes: Vec<u8>) {
        self.records.write().await.insert(token.to_string(), bytes);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl SessionBackend for MemoryBackend {
    async fn put(&self, session: &Session) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(session)?;
        self.records
            .write()
            .await
            .insert(session.token.clone(), bytes);
        Ok(())
    }

    async fn fetch(&self, token: &str) -> Result<Fetched, StoreError> {
        let map = self.records.read().await;
        let Some(bytes) = map.get(token) else {
            return Ok(Fetched::Missing);
        };
        match serde_json::from_slice::<Session>(bytes) {
            Ok(session) => Ok(Fetched::Found(session)),
            Err(_) => Ok(Fetched::Corrupt),
        }
    }

    async fn remove(&self, token: &str) -> Result<(), StoreError> {
        self.records.write().await.remove(token);
        Ok(())
    }

    async fn list_tokens(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.records.read().await.keys().cloned().collect())
    }
}
