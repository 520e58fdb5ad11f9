//! Saved allocations and side-by-side comparison of two or three of them.
use crate::core::allocation::{AllocationResult, EXACT_EPS, Mode};
use crate::core::product::{Catalog, Category};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub category: Category,
    pub ratio: f64,
    pub client_rate: f64,
}

/// An allocation the user chose to keep, as stored under `savedCustomSchemes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub mode: Mode,
    pub amount: f64,
    pub allocations: Vec<ScenarioEntry>,
    pub client_rate: f64,
    pub created_at: String,
}

impl Scenario {
    pub fn from_result(
        id: i64,
        name: impl Into<String>,
        mode: Mode,
        amount: f64,
        result: &AllocationResult,
        created_at: impl Into<String>,
    ) -> Self {
        let allocations = result
            .entries
            .iter()
            .map(|e| ScenarioEntry {
                name: e.product.name.clone(),
                category: e.product.category(),
                ratio: e.ratio,
                client_rate: e.product.client_rate,
            })
            .collect();
        Self {
            id,
            name: name.into(),
            mode,
            amount,
            allocations,
            client_rate: result.client_rate,
            created_at: created_at.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompareError {
    #[error("Select 2 to 3 scenarios to compare, got {0}")]
    WrongCount(usize),
}

/// A scenario entry whose product no longer exists in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct DataInconsistency {
    pub scenario: String,
    pub product: String,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryBreakdown {
    pub name: String,
    pub category: Category,
    pub ratio: f64,
    pub client_rate: f64,
    pub amount: f64,
    pub earning: f64,
    /// Share of the scenario's total earning, in percent.
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioBreakdown {
    pub id: i64,
    pub name: String,
    pub mode: Mode,
    pub amount: f64,
    pub client_rate: f64,
    pub created_at: String,
    pub total_earning: f64,
    pub entries: Vec<EntryBreakdown>,
    pub is_best: bool,
}

impl ScenarioBreakdown {
    pub fn entry(&self, name: &str, category: Category) -> Option<&EntryBreakdown> {
        self.entries
            .iter()
            .find(|e| e.name == name && e.category == category)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub scenarios: Vec<ScenarioBreakdown>,
    /// Indices into `scenarios`, highest blended client rate first.
    pub ranking: Vec<usize>,
    /// Every product appearing in any scenario, in first-seen order.
    pub products: Vec<(String, Category)>,
    pub inconsistencies: Vec<DataInconsistency>,
}

pub fn compare(scenarios: &[Scenario], catalog: &Catalog) -> Result<Comparison, CompareError> {
    if !(2..=3).contains(&scenarios.len()) {
        return Err(CompareError::WrongCount(scenarios.len()));
    }

    let mut inconsistencies = Vec::new();
    let mut products: Vec<(String, Category)> = Vec::new();
    let mut breakdowns = Vec::with_capacity(scenarios.len());

    for scenario in scenarios {
        let mut entries = Vec::with_capacity(scenario.allocations.len());
        for alloc in &scenario.allocations {
            if !products
                .iter()
                .any(|(n, c)| n == &alloc.name && *c == alloc.category)
            {
                products.push((alloc.name.clone(), alloc.category));
            }
            if catalog.find(&alloc.name, alloc.category).is_none() {
                warn!(
                    scenario = %scenario.name,
                    product = %alloc.name,
                    "Saved product is missing from the catalog"
                );
                inconsistencies.push(DataInconsistency {
                    scenario: scenario.name.clone(),
                    product: alloc.name.clone(),
                    category: alloc.category,
                });
                continue;
            }
            let amount = scenario.amount * alloc.ratio / 100.0;
            entries.push(EntryBreakdown {
                name: alloc.name.clone(),
                category: alloc.category,
                ratio: alloc.ratio,
                client_rate: alloc.client_rate,
                amount,
                earning: amount * alloc.client_rate / 100.0,
                contribution: 0.0,
            });
        }

        let total_earning: f64 = entries.iter().map(|e| e.earning).sum();
        if total_earning > 0.0 {
            for entry in &mut entries {
                entry.contribution = entry.earning / total_earning * 100.0;
            }
        }

        breakdowns.push(ScenarioBreakdown {
            id: scenario.id,
            name: scenario.name.clone(),
            mode: scenario.mode,
            amount: scenario.amount,
            client_rate: scenario.client_rate,
            created_at: scenario.created_at.clone(),
            total_earning,
            entries,
            is_best: false,
        });
    }

    let best_rate = breakdowns
        .iter()
        .map(|b| b.client_rate)
        .fold(f64::NEG_INFINITY, f64::max);
    for breakdown in &mut breakdowns {
        breakdown.is_best = (breakdown.client_rate - best_rate).abs() < EXACT_EPS;
    }

    let mut ranking: Vec<usize> = (0..breakdowns.len()).collect();
    ranking.sort_by(|&a, &b| breakdowns[b].client_rate.total_cmp(&breakdowns[a].client_rate));

    Ok(Comparison {
        scenarios: breakdowns,
        ranking,
        products,
        inconsistencies,
    })
}
