//! The shared default-configuration document and where it comes from.
use crate::core::product::{Catalog, ProductConfig};
use crate::core::scheme::{BankScheme, builtin_schemes};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// `{productConfig, bankSchemes}`; either part may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_config: Option<ProductConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_schemes: Option<Vec<BankScheme>>,
}

impl ConfigDocument {
    pub fn builtin() -> Self {
        Self {
            product_config: Some(Catalog::builtin().to_config()),
            bank_schemes: Some(builtin_schemes()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.product_config.is_none() && self.bank_schemes.is_none()
    }
}

#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn fetch_document(&self) -> Result<ConfigDocument>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_published_default_document_matches_builtins() {
        let document: ConfigDocument =
            serde_json::from_str(include_str!("../../docs/default-config.json")).unwrap();
        let products = document.product_config.expect("productConfig present");
        assert_eq!(Catalog::from_config(&products).unwrap(), Catalog::builtin());
        assert_eq!(document.bank_schemes, Some(builtin_schemes()));
    }

    #[test]
    fn test_partial_document() {
        let document: ConfigDocument = serde_json::from_str(r#"{"bankSchemes": []}"#).unwrap();
        assert!(document.product_config.is_none());
        assert_eq!(document.bank_schemes, Some(vec![]));
        assert!(!document.is_empty());
        assert!(ConfigDocument::default().is_empty());
    }
}
