//! Storage abstraction for the JSON documents kept between runs.
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

/// Product catalog document (`{deposits, wealth}`).
pub const PRODUCT_CONFIG_KEY: &str = "productConfig";
/// Bank preset schemes.
pub const BANK_SCHEMES_KEY: &str = "bankSchemes";
/// Scenarios saved by the user.
pub const SAVED_SCENARIOS_KEY: &str = "savedCustomSchemes";

/// A string-keyed store of serialized documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn put(&self, key: &str, value: String) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

pub async fn load_json<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    key: &str,
) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(raw) => {
            let value = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse stored document '{key}'"))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

pub async fn save_json<T: Serialize + ?Sized>(
    store: &dyn DocumentStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)
        .with_context(|| format!("Failed to serialize document '{key}'"))?;
    store.put(key, raw).await
}
