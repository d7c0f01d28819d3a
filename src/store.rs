//! Shared key-value store contract.
//!
//! The election manager only needs two primitives: read a key and write a
//! key with a time-to-live. Any store with per-key expiry (Redis SETEX,
//! etcd leases, ...) can sit behind this trait; values are opaque strings.
//!
//! `MemoryStore` is the in-process implementation used in tests and
//! single-host deployments. Expiry is lazy: an entry past its deadline is
//! dropped on the next read.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::Result;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any prior value. The store
    /// treats the key as absent once `ttl` has elapsed.
    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    deadline: DateTime<Utc>,
}

/// In-memory `KeyValueStore` with per-key TTL.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.deadline > Utc::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                deadline: Utc::now() + ttl,
            },
        );
        Ok(())
    }
}
