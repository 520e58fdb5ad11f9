pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::allocation::{Mode, Preference};
use crate::core::config::AppConfig;
use crate::core::custom::CustomEntry;
use crate::core::product::{Catalog, ProductConfig};
use crate::core::scheme::{BankScheme, builtin_schemes};
use crate::core::solver::SolveRequest;
use crate::core::store::{BANK_SCHEMES_KEY, DocumentStore, PRODUCT_CONFIG_KEY, load_json};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub enum AppCommand {
    Solve {
        amount: f64,
        target_rate: f64,
        mode: Mode,
        liquidity_ratio: Option<f64>,
        preference: Option<Preference>,
    },
    Optimize {
        amount: f64,
        target_rate: f64,
    },
    Evaluate {
        mode: Mode,
        amount: f64,
        entries: Vec<CustomEntry>,
    },
    Suggest {
        mode: Mode,
        target_rate: f64,
        fixed: Vec<CustomEntry>,
    },
    Schemes {
        amount: f64,
        id: Option<i64>,
    },
    ScenarioSave {
        mode: Mode,
        amount: f64,
        entries: Vec<CustomEntry>,
    },
    ScenarioList,
    ScenarioDelete {
        id: i64,
    },
    Compare {
        ids: Vec<i64>,
    },
    Sync,
}

/// Picks the catalog from `catalog_path`, then the stored document, then the built-in shelf.
async fn resolve_catalog(config: &AppConfig, store: &dyn DocumentStore) -> Result<Catalog> {
    if let Some(path) = &config.catalog_path {
        debug!(path, "Loading catalog file");
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {path}"))?;
        let catalog =
            Catalog::from_json(&raw).with_context(|| format!("Invalid catalog file: {path}"))?;
        if catalog.is_empty() {
            anyhow::bail!("Catalog file has no products: {path}");
        }
        return Ok(catalog);
    }
    if let Some(products) = load_json::<ProductConfig>(store, PRODUCT_CONFIG_KEY).await? {
        let catalog =
            Catalog::from_config(&products).context("Stored product catalog is invalid")?;
        if !catalog.is_empty() {
            debug!("Using stored product catalog");
            return Ok(catalog);
        }
        warn!("Stored product catalog is empty, falling back to the built-in one");
    }
    debug!("Using built-in product catalog");
    Ok(Catalog::builtin())
}

async fn resolve_schemes(store: &dyn DocumentStore) -> Result<Vec<BankScheme>> {
    Ok(load_json(store, BANK_SCHEMES_KEY)
        .await?
        .unwrap_or_else(builtin_schemes))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("ratemix starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let documents = store::open_default(&config)?;
    let currency = config.currency.as_str();

    match command {
        AppCommand::Solve {
            amount,
            target_rate,
            mode,
            liquidity_ratio,
            preference,
        } => {
            let catalog = resolve_catalog(&config, documents.as_ref()).await?;
            let request = SolveRequest {
                amount,
                target_rate,
                mode,
                liquidity_ratio: liquidity_ratio.unwrap_or(config.liquidity_ratio),
                preference: preference.unwrap_or(Preference::Yield),
            };
            let preferences = match preference {
                Some(p) => vec![p],
                None => Preference::ALL.to_vec(),
            };
            cli::solve::run(&catalog, &request, &preferences, currency)?;
        }
        AppCommand::Optimize {
            amount,
            target_rate,
        } => {
            let catalog = resolve_catalog(&config, documents.as_ref()).await?;
            cli::optimize::run(&catalog, amount, target_rate, currency)?;
        }
        AppCommand::Evaluate {
            mode,
            amount,
            entries,
        } => {
            let catalog = resolve_catalog(&config, documents.as_ref()).await?;
            cli::custom::run_evaluate(&catalog, mode, amount, &entries, currency)?;
        }
        AppCommand::Suggest {
            mode,
            target_rate,
            fixed,
        } => {
            let catalog = resolve_catalog(&config, documents.as_ref()).await?;
            cli::custom::run_suggest(&catalog, mode, &fixed, target_rate)?;
        }
        AppCommand::Schemes { amount, id } => {
            let catalog = resolve_catalog(&config, documents.as_ref()).await?;
            let schemes = resolve_schemes(documents.as_ref()).await?;
            cli::schemes::run(&schemes, &catalog, amount, id, currency)?;
        }
        AppCommand::ScenarioSave {
            mode,
            amount,
            entries,
        } => {
            let catalog = resolve_catalog(&config, documents.as_ref()).await?;
            let book = store::ScenarioBook::new(Arc::clone(&documents));
            cli::scenarios::run_save(&book, &catalog, mode, amount, &entries).await?;
        }
        AppCommand::ScenarioList => {
            let book = store::ScenarioBook::new(Arc::clone(&documents));
            cli::scenarios::run_list(&book, currency).await?;
        }
        AppCommand::ScenarioDelete { id } => {
            let book = store::ScenarioBook::new(Arc::clone(&documents));
            cli::scenarios::run_delete(&book, id).await?;
        }
        AppCommand::Compare { ids } => {
            let catalog = resolve_catalog(&config, documents.as_ref()).await?;
            let book = store::ScenarioBook::new(Arc::clone(&documents));
            cli::scenarios::run_compare(&book, &catalog, &ids, currency).await?;
        }
        AppCommand::Sync => {
            let remote = config
                .providers
                .remote
                .as_ref()
                .context("No remote provider configured; set providers.remote.base_url")?;
            let source = providers::RemoteConfigProvider::new(&remote.base_url)?;
            cli::sync::run(&source, documents.as_ref()).await?;
        }
    }
    Ok(())
}
