pub mod disk;
pub mod memory;

use crate::core::allocation::{AllocationResult, Mode};
use crate::core::config::AppConfig;
use crate::core::scenario::Scenario;
use crate::core::store::{DocumentStore, SAVED_SCENARIOS_KEY, load_json, save_json};
use anyhow::{Result, bail};
use disk::FjallStore;
use std::sync::Arc;
use tracing::info;

/// Opens the on-disk document store under the configured data directory.
pub fn open_default(config: &AppConfig) -> Result<Arc<dyn DocumentStore>> {
    let path = config.data_dir()?.join("store");
    Ok(Arc::new(FjallStore::open(&path)?))
}

/// The list of saved scenarios, kept as one JSON array document.
pub struct ScenarioBook {
    store: Arc<dyn DocumentStore>,
}

impl ScenarioBook {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Scenario>> {
        Ok(load_json(self.store.as_ref(), SAVED_SCENARIOS_KEY)
            .await?
            .unwrap_or_default())
    }

    /// Appends `result` as "Scenario N". Ids are millisecond timestamps, bumped past any
    /// existing id so two saves in the same millisecond stay distinct.
    pub async fn save(
        &self,
        mode: Mode,
        amount: f64,
        result: &AllocationResult,
    ) -> Result<Scenario> {
        let mut scenarios = self.list().await?;
        let now = chrono::Local::now();
        let mut id = now.timestamp_millis();
        if let Some(max) = scenarios.iter().map(|s| s.id).max() {
            id = id.max(max + 1);
        }

        let scenario = Scenario::from_result(
            id,
            format!("Scenario {}", scenarios.len() + 1),
            mode,
            amount,
            result,
            now.format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        scenarios.push(scenario.clone());
        save_json(self.store.as_ref(), SAVED_SCENARIOS_KEY, &scenarios).await?;
        info!(id, name = %scenario.name, "Saved scenario");
        Ok(scenario)
    }

    /// Removes the scenario and renumbers the remaining names. Returns false for an unknown id.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let mut scenarios = self.list().await?;
        let before = scenarios.len();
        scenarios.retain(|s| s.id != id);
        if scenarios.len() == before {
            return Ok(false);
        }
        for (index, scenario) in scenarios.iter_mut().enumerate() {
            scenario.name = format!("Scenario {}", index + 1);
        }
        save_json(self.store.as_ref(), SAVED_SCENARIOS_KEY, &scenarios).await?;
        info!(id, "Deleted scenario");
        Ok(true)
    }

    /// Fetches scenarios in the order of `ids`.
    pub async fn get_many(&self, ids: &[i64]) -> Result<Vec<Scenario>> {
        let scenarios = self.list().await?;
        let mut selected = Vec::with_capacity(ids.len());
        for id in ids {
            match scenarios.iter().find(|s| s.id == *id) {
                Some(scenario) => selected.push(scenario.clone()),
                None => bail!("No saved scenario with id {id}"),
            }
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::allocation::{AllocationEntry, Preference};
    use crate::core::product::Product;
    use memory::MemoryStore;

    fn result() -> AllocationResult {
        AllocationResult::from_allocations(
            vec![
                AllocationEntry::new(&Product::deposit("Demand Deposit", 0.05, 2.4), 10.0),
                AllocationEntry::new(&Product::wealth("T+1 Redemption", 1.75, 0.1), 90.0),
            ],
            Some(Preference::Yield),
            "test",
            None,
        )
    }

    #[tokio::test]
    async fn test_save_list_delete_renumbers() {
        let book = ScenarioBook::new(Arc::new(MemoryStore::new()));
        assert!(book.list().await.unwrap().is_empty());

        let first = book.save(Mode::Mixed, 1000.0, &result()).await.unwrap();
        let second = book.save(Mode::Mixed, 500.0, &result()).await.unwrap();
        let third = book.save(Mode::Mixed, 200.0, &result()).await.unwrap();
        assert!(second.id > first.id);
        assert!(third.id > second.id);
        assert_eq!(third.name, "Scenario 3");
        assert_eq!(first.allocations.len(), 2);
        assert!((first.client_rate - (0.005 + 1.575)).abs() < 1e-9);

        assert!(book.delete(first.id).await.unwrap());
        assert!(!book.delete(first.id).await.unwrap());

        let names: Vec<String> = book
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Scenario 1", "Scenario 2"]);
    }

    #[tokio::test]
    async fn test_get_many_keeps_requested_order() {
        let book = ScenarioBook::new(Arc::new(MemoryStore::new()));
        let a = book.save(Mode::Deposit, 100.0, &result()).await.unwrap();
        let b = book.save(Mode::Deposit, 200.0, &result()).await.unwrap();

        let picked = book.get_many(&[b.id, a.id]).await.unwrap();
        assert_eq!(picked[0].amount, 200.0);
        assert_eq!(picked[1].amount, 100.0);

        let err = book.get_many(&[a.id, 42]).await.unwrap_err();
        assert!(err.to_string().contains("42"));
    }
}
