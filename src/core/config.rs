use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RemoteProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ProvidersConfig {
    pub remote: Option<RemoteProviderConfig>,
}

fn default_currency() -> String {
    "CNY".to_string()
}

fn default_liquidity_ratio() -> f64 {
    10.0
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Label printed next to amounts.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Default share (percent) held in the demand deposit.
    #[serde(default = "default_liquidity_ratio")]
    pub liquidity_ratio: f64,
    /// Optional `productConfig` JSON document overriding the stored catalog.
    pub catalog_path: Option<String>,
    pub data_path: Option<String>,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            liquidity_ratio: default_liquidity_ratio(),
            catalog_path: None,
            data_path: None,
            providers: ProvidersConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or falls back to defaults when no config
    /// file has been written yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "ratemix", "ratemix")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("org", "ratemix", "ratemix")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
currency: "USD"
liquidity_ratio: 25
catalog_path: "/tmp/products.json"
providers:
  remote:
    base_url: "http://example.com/ratemix"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.currency, "USD");
        assert_eq!(config.liquidity_ratio, 25.0);
        assert_eq!(config.catalog_path.as_deref(), Some("/tmp/products.json"));
        assert!(config.data_path.is_none());
        assert_eq!(
            config.providers.remote.unwrap().base_url,
            "http://example.com/ratemix"
        );
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("data_path: /tmp/ratemix").unwrap();
        assert_eq!(config.currency, "CNY");
        assert_eq!(config.liquidity_ratio, 10.0);
        assert!(config.providers.remote.is_none());
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/ratemix"));
    }

    #[test]
    fn test_example_config_parses() {
        let config: AppConfig =
            serde_yaml::from_str(include_str!("../../docs/example_config.yaml")).unwrap();
        assert_eq!(config.currency, "CNY");
        assert_eq!(config.liquidity_ratio, 10.0);
        assert!(config.catalog_path.is_none());
        assert!(config.providers.remote.is_some());
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let err = AppConfig::load_from_path("/nonexistent/ratemix/config.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
