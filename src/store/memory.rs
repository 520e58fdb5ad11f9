use crate::core::store::DocumentStore;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory document store, used in tests and when no data directory is available.
#[derive(Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let documents = self.inner.lock().await;
        let value = documents.get(key).cloned();
        debug!(key, hit = value.is_some(), "Memory store GET");
        Ok(value)
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        let mut documents = self.inner.lock().await;
        debug!(key, "Memory store PUT");
        documents.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut documents = self.inner.lock().await;
        documents.remove(key);
        debug!(key, "Memory store REMOVE");
        Ok(())
    }
}
