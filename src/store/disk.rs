use crate::core::store::DocumentStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const DOCUMENTS_PARTITION: &str = "documents";

/// Document store backed by a fjall keyspace on disk.
pub struct FjallStore {
    keyspace: Keyspace,
    documents: PartitionHandle,
}

impl FjallStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;

        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        let documents = keyspace
            .open_partition(DOCUMENTS_PARTITION, PartitionCreateOptions::default())
            .context("Failed to open documents partition")?;
        debug!(path = %path.display(), "Opened document store");

        Ok(Self {
            keyspace,
            documents,
        })
    }

    fn persist(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to persist store")
    }
}

#[async_trait]
impl DocumentStore for FjallStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(raw) = self
            .documents
            .get(key)
            .with_context(|| format!("Failed to read '{key}' from store"))?
        else {
            debug!(key, "Store MISS");
            return Ok(None);
        };
        debug!(key, "Store HIT");
        let value = String::from_utf8(raw.to_vec())
            .with_context(|| format!("Stored document '{key}' is not valid UTF-8"))?;
        Ok(Some(value))
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        self.documents
            .insert(key.as_bytes(), value.as_bytes())
            .with_context(|| format!("Failed to write '{key}' to store"))?;
        debug!(key, "Store PUT");
        self.persist()
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.documents
            .remove(key.as_bytes())
            .with_context(|| format!("Failed to remove '{key}' from store"))?;
        debug!(key, "Store REMOVE");
        self.persist()
    }
}
