//! Integration tests for the session lifecycle: creation, checked reads,
//! lazy expiry reclamation, idempotent deletion, the bulk sweep, and
//! concurrent access.

use chrono::Duration;
use portal::session::{FileBackend, MemoryBackend, Session, SessionStore};

mod lifecycle_tests {
    use super::*;

    /// create → get → delete → get, the basic happy path.
    #[tokio::test]
    async fn test_create_get_delete_roundtrip() {
        let store = SessionStore::new(MemoryBackend::new());

        let session = store.create("admin").await.unwrap();
        assert_eq!(session.username, "admin");
        assert!(!session.token.is_empty());

        let fetched = store.get(&session.token).await.unwrap().unwrap();
        assert_eq!(fetched.username, "admin");
        assert_eq!(fetched.token, session.token);

        store.delete(&session.token).await.unwrap();
        assert!(store.get(&session.token).await.unwrap().is_none());
    }

    /// A record is visible to get() immediately after create() returns.
    #[tokio::test]
    async fn test_no_visibility_delay() {
        let store = SessionStore::new(MemoryBackend::new());
        for _ in 0..10 {
            let session = store.create("user1@company.com").await.unwrap();
            assert!(store.get(&session.token).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_expires_at_is_seven_days_out() {
        let store = SessionStore::new(MemoryBackend::new());
        let session = store.create("user1@company.com").await.unwrap();
        assert_eq!(session.expires_at - session.created_at, Duration::days(7));
    }

    /// delete() succeeds for a token that never existed, and twice for one
    /// that did.
    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = SessionStore::new(MemoryBackend::new());

        store.delete("no-such-token").await.unwrap();

        let session = store.create("admin").await.unwrap();
        store.delete(&session.token).await.unwrap();
        store.delete(&session.token).await.unwrap();
    }

    /// Hostile tokens never reach the backend as keys.
    #[tokio::test]
    async fn test_malformed_tokens_are_absent_not_errors() {
        let store = SessionStore::new(MemoryBackend::new());
        assert!(store.get("../../etc/passwd").await.unwrap().is_none());
        assert!(store.get("").await.unwrap().is_none());
        store.delete("a/b").await.unwrap();
    }
}

mod expiry_tests {
    use super::*;

    /// An expired record is never returned live; the first get() removes
    /// it and the second reports absent without error.
    #[tokio::test]
    async fn test_expired_record_reclaimed_on_first_read() {
        let backend = MemoryBackend::new();
        let store = SessionStore::with_ttl(backend.clone(), Duration::days(-1));

        let session = store.create("user1@company.com").await.unwrap();
        assert_eq!(backend.len().await, 1);

        assert!(store.get(&session.token).await.unwrap().is_none());
        // the read itself deleted the underlying record
        assert_eq!(backend.len().await, 0);
        assert!(store.get(&session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_live_record_survives_reads() {
        let backend = MemoryBackend::new();
        let store = SessionStore::new(backend.clone());
        let session = store.create("admin").await.unwrap();
        for _ in 0..5 {
            assert!(store.get(&session.token).await.unwrap().is_some());
        }
        assert_eq!(backend.len().await, 1);
    }

    /// Two reads of the same dead token must both succeed — the
    /// double-delete underneath is benign.
    #[tokio::test]
    async fn test_concurrent_reads_of_expired_token_both_succeed() {
        let backend = MemoryBackend::new();
        let store = std::sync::Arc::new(SessionStore::with_ttl(
            backend,
            Duration::days(-1),
        ));
        let session = store.create("admin").await.unwrap();

        let (a, b) = tokio::join!(store.get(&session.token), store.get(&session.token));
        assert!(a.unwrap().is_none());
        assert!(b.unwrap().is_none());
    }
}

mod sweep_tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_removes_expired_and_corrupt_keeps_live() {
        let backend = MemoryBackend::new();

        // two live records
        let live = SessionStore::new(backend.clone());
        live.create("user1@company.com").await.unwrap();
        live.create("admin@company.com").await.unwrap();

        // one expired record
        let dead = SessionStore::with_ttl(backend.clone(), Duration::days(-1));
        dead.create("gone@company.com").await.unwrap();

        // one corrupt record
        backend.insert_raw("corrupt-token", b"{not json".to_vec()).await;

        let stats = live.sweep().await.unwrap();
        assert_eq!(stats.retained, 2);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.corrupt, 1);
        assert_eq!(backend.len().await, 2);
    }

    #[tokio::test]
    async fn test_sweep_of_empty_store_is_clean() {
        let store = SessionStore::new(MemoryBackend::new());
        let stats = store.sweep().await.unwrap();
        assert_eq!(stats.retained, 0);
        assert_eq!(stats.expired, 0);
        assert_eq!(stats.corrupt, 0);
    }
}

mod concurrency_tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    /// 100 concurrent creates yield 100 unique tokens, each independently
    /// retrievable afterwards.
    #[tokio::test]
    async fn test_hundred_concurrent_creates_are_unique_and_retrievable() {
        let store = Arc::new(SessionStore::new(MemoryBackend::new()));

        let mut handles = Vec::new();
        for i in 0..100 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create(&format!("user{i}@company.com")).await.unwrap()
            }));
        }

        let mut tokens = HashSet::new();
        for handle in handles {
            let session = handle.await.unwrap();
            assert!(tokens.insert(session.token), "duplicate token issued");
        }
        assert_eq!(tokens.len(), 100);

        for token in &tokens {
            assert!(store.get(token).await.unwrap().is_some());
        }
    }
}

mod file_backend_tests {
    use super::*;

    #[tokio::test]
    async fn test_records_persist_across_store_instances() {
        let dir = tempfile::tempdir().unwrap();

        let token = {
            let store =
                SessionStore::new(FileBackend::open(dir.path()).await.unwrap());
            store.create("admin@company.com").await.unwrap().token
        };

        // a fresh store over the same directory sees the record
        let store = SessionStore::new(FileBackend::open(dir.path()).await.unwrap());
        let session = store.get(&token).await.unwrap().unwrap();
        assert_eq!(session.username, "admin@company.com");
    }

    /// On-disk wire format: session_<token>.json with the documented
    /// field names.
    #[tokio::test]
    async fn test_on_disk_layout_and_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(FileBackend::open(dir.path()).await.unwrap());
        let session = store.create("user1@company.com").await.unwrap();

        let path = dir.path().join(format!("session_{}.json", session.token));
        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(value["username"], "user1@company.com");
        assert_eq!(value["token"], session.token.as_str());
        assert!(value["created"].is_string());
        assert!(value["expiresAt"].is_string());
    }

    #[tokio::test]
    async fn test_expired_file_removed_by_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::with_ttl(
            FileBackend::open(dir.path()).await.unwrap(),
            Duration::days(-1),
        );
        let session = store.create("admin").await.unwrap();
        let path = dir.path().join(format!("session_{}.json", session.token));
        assert!(path.exists());

        assert!(store.get(&session.token).await.unwrap().is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_sweep_deletes_corrupt_file_without_failing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("session_corrupt-tok.json"), "]]]").unwrap();

        let store = SessionStore::new(FileBackend::open(dir.path()).await.unwrap());
        let survivor = store.create("admin").await.unwrap();

        let stats = store.sweep().await.unwrap();
        assert_eq!(stats.corrupt, 1);
        assert_eq!(stats.retained, 1);
        assert!(!dir.path().join("session_corrupt-tok.json").exists());
        assert!(store.get(&survivor.token).await.unwrap().is_some());
    }

    /// A corrupt file is invisible to get() but is not an error.
    #[tokio::test]
    async fn test_corrupt_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("session_badbytes.json"), "not json").unwrap();

        let store = SessionStore::new(FileBackend::open(dir.path()).await.unwrap());
        assert!(store.get("badbytes").await.unwrap().is_none());
    }

    /// Stray files that don't follow the record naming are left alone.
    #[tokio::test]
    async fn test_sweep_ignores_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.txt"), "hands off").unwrap();

        let store = SessionStore::new(FileBackend::open(dir.path()).await.unwrap());
        store.sweep().await.unwrap();
        assert!(dir.path().join("README.txt").exists());
    }
}

mod record_tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_liveness_boundary() {
        let now = Utc::now();
        let session = Session {
            username: "admin".into(),
            token: "tok".into(),
            created_at: now - Duration::days(7),
            expires_at: now,
        };
        // liveness is strictly now < expires_at
        assert!(!session.is_live(now));
        assert!(session.is_live(now - Duration::seconds(1)));
    }
}
