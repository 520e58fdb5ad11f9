use crate::core::source::{ConfigDocument, ConfigSource};
use crate::providers::util::with_retry;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use tracing::debug;

const DOCUMENT_NAME: &str = "default-config.json";

/// Fetches the shared `{productConfig, bankSchemes}` document over HTTP.
pub struct RemoteConfigProvider {
    base_url: String,
    client: reqwest::Client,
}

impl RemoteConfigProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ratemix/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn document_url(&self) -> String {
        format!("{}/{}", self.base_url, DOCUMENT_NAME)
    }
}

#[async_trait]
impl ConfigSource for RemoteConfigProvider {
    async fn fetch_document(&self) -> Result<ConfigDocument> {
        let url = self.document_url();
        debug!("Requesting configuration document from {}", url);

        let response = with_retry(
            || async {
                self.client
                    .get(&url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
            },
            3,
            500,
        )
        .await
        .with_context(|| format!("Failed to fetch {url}"))?;

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))?;
        if body.trim().is_empty() {
            return Err(anyhow!("Received empty configuration document from {}", url));
        }

        let document: ConfigDocument = serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse configuration document from {url}"))?;
        debug!(
            products = document.product_config.is_some(),
            schemes = document.bank_schemes.is_some(),
            "Fetched configuration document"
        );
        Ok(document)
    }
}
