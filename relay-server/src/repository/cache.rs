//! Key/value cache
//!
//! The cache only offers `get` and `set` on string values. Writes from
//! concurrent requests may interleave; there are no transactions.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// String key/value store backing the route cache
#[async_trait]
pub trait RouteCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    async fn set(&self, key: &str, value: String);
}

/// Process-local cache, lost on restart
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RouteCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: String) {
        self.entries.write().await.insert(key.to_string(), value);
    }
}
