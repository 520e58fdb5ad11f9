use super::ui;
use crate::core::product::Catalog;
use crate::core::source::ConfigSource;
use crate::core::store::{BANK_SCHEMES_KEY, DocumentStore, PRODUCT_CONFIG_KEY, save_json};
use anyhow::{Context, Result};
use tracing::{info, warn};

/// What a sync replaced in the local store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub deposits: usize,
    pub wealth: usize,
    pub schemes: usize,
    pub updated_products: bool,
    pub updated_schemes: bool,
}

/// Pulls the shared configuration document and stores the parts it carries.
pub async fn run(source: &dyn ConfigSource, store: &dyn DocumentStore) -> Result<SyncReport> {
    let spinner = ui::new_spinner("Fetching configuration document...");
    let fetched = source.fetch_document().await;
    spinner.finish_and_clear();
    let document = fetched?;

    if document.is_empty() {
        warn!("Configuration document carried neither products nor schemes");
        anyhow::bail!("Configuration document is empty, nothing to sync");
    }

    let mut report = SyncReport::default();
    if let Some(products) = &document.product_config {
        let catalog =
            Catalog::from_config(products).context("Rejected product catalog from source")?;
        save_json(store, PRODUCT_CONFIG_KEY, products).await?;
        report.deposits = catalog.deposits.len();
        report.wealth = catalog.wealth.len();
        report.updated_products = true;
    }
    if let Some(schemes) = &document.bank_schemes {
        save_json(store, BANK_SCHEMES_KEY, schemes).await?;
        report.schemes = schemes.len();
        report.updated_schemes = true;
    }

    info!(
        deposits = report.deposits,
        wealth = report.wealth,
        schemes = report.schemes,
        "Synced configuration"
    );
    if report.updated_products {
        println!(
            "Products: {} deposits, {} wealth products",
            report.deposits, report.wealth
        );
    }
    if report.updated_schemes {
        println!("Bank schemes: {}", report.schemes);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::product::{DepositRecord, ProductConfig};
    use crate::core::scheme::BankScheme;
    use crate::core::source::ConfigDocument;
    use crate::core::store::load_json;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;

    struct FixedSource(ConfigDocument);

    #[async_trait]
    impl ConfigSource for FixedSource {
        async fn fetch_document(&self) -> Result<ConfigDocument> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl ConfigSource for FailingSource {
        async fn fetch_document(&self) -> Result<ConfigDocument> {
            anyhow::bail!("network down")
        }
    }

    #[tokio::test]
    async fn test_sync_stores_both_documents() {
        let store = MemoryStore::new();
        let report = run(&FixedSource(ConfigDocument::builtin()), &store)
            .await
            .unwrap();
        assert_eq!(report.deposits, 5);
        assert_eq!(report.wealth, 4);
        assert_eq!(report.schemes, 9);

        let products: ProductConfig = load_json(&store, PRODUCT_CONFIG_KEY).await.unwrap().unwrap();
        assert_eq!(Catalog::from_config(&products).unwrap(), Catalog::builtin());
        let schemes: Vec<BankScheme> = load_json(&store, BANK_SCHEMES_KEY).await.unwrap().unwrap();
        assert_eq!(schemes.len(), 9);
    }

    #[tokio::test]
    async fn test_sync_partial_document_keeps_other_key() {
        let store = MemoryStore::new();
        let document = ConfigDocument {
            product_config: None,
            bank_schemes: Some(vec![]),
        };
        let report = run(&FixedSource(document), &store).await.unwrap();
        assert!(!report.updated_products);
        assert!(report.updated_schemes);
        assert!(store.get(PRODUCT_CONFIG_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sync_rejects_invalid_catalog() {
        let store = MemoryStore::new();
        let record = DepositRecord {
            name: "Twice".to_string(),
            client_rate: 1.0,
            ftp_rate: 2.0,
            tenor: None,
            liquidity_score: None,
        };
        let document = ConfigDocument {
            product_config: Some(ProductConfig {
                deposits: vec![record.clone(), record],
                wealth: vec![],
            }),
            bank_schemes: None,
        };
        assert!(run(&FixedSource(document), &store).await.is_err());
        assert!(store.get(PRODUCT_CONFIG_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sync_errors() {
        let store = MemoryStore::new();
        assert!(run(&FailingSource, &store).await.is_err());
        let err = run(&FixedSource(ConfigDocument::default()), &store)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
