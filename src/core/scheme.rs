//! Bank-authored preset allocations.
use crate::core::allocation::{AllocationEntry, AllocationResult, Mode, Preference, RATIO_EPS};
use crate::core::product::Catalog;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeProduct {
    pub name: String,
    pub ratio: f64,
}

/// A preset split as stored under `bankSchemes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankScheme {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub mode: Mode,
    pub preference: Preference,
    #[serde(default)]
    pub description: String,
    pub products: Vec<SchemeProduct>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemeEvaluation {
    /// Ratios do not add up to 100; the scheme is not evaluated.
    Incomplete { total_ratio: f64 },
    /// Some product names are not in the catalog.
    InvalidProducts { missing: Vec<String> },
    Valid(AllocationResult),
}

impl BankScheme {
    pub fn total_ratio(&self) -> f64 {
        self.products.iter().map(|p| p.ratio).sum()
    }

    /// Looks every product up by name, deposits first, and blends the rates.
    pub fn evaluate(&self, catalog: &Catalog) -> SchemeEvaluation {
        let total_ratio = self.total_ratio();
        if (total_ratio - 100.0).abs() > RATIO_EPS {
            return SchemeEvaluation::Incomplete { total_ratio };
        }

        let mut entries = Vec::with_capacity(self.products.len());
        let mut missing = Vec::new();
        for item in &self.products {
            match catalog.find_by_name(&item.name) {
                Some(product) => entries.push(AllocationEntry::new(product, item.ratio)),
                None => missing.push(item.name.clone()),
            }
        }
        if !missing.is_empty() {
            return SchemeEvaluation::InvalidProducts { missing };
        }

        SchemeEvaluation::Valid(AllocationResult::from_allocations(
            entries,
            Some(self.preference),
            self.description.clone(),
            None,
        ))
    }
}

fn preset(
    id: i64,
    name: &str,
    mode: Mode,
    preference: Preference,
    description: &str,
    products: &[(&str, f64)],
) -> BankScheme {
    BankScheme {
        id,
        name: name.to_string(),
        mode,
        preference,
        description: description.to_string(),
        products: products
            .iter()
            .map(|(name, ratio)| SchemeProduct {
                name: name.to_string(),
                ratio: *ratio,
            })
            .collect(),
        enabled: true,
    }
}

/// One liquidity, yield and balance preset for each allocation mode, written against the
/// built-in catalog.
pub fn builtin_schemes() -> Vec<BankScheme> {
    use Mode::*;
    use Preference::*;
    vec![
        preset(
            1,
            "Deposit liquidity plan",
            Deposit,
            Liquidity,
            "Large demand deposit share keeps funds flexible",
            &[("Demand Deposit", 40.0), ("7-Day Notice", 30.0), ("3-Month Term", 30.0)],
        ),
        preset(
            2,
            "Deposit yield plan",
            Deposit,
            Yield,
            "Longer term deposits for a higher rate",
            &[("Demand Deposit", 10.0), ("6-Month Term", 40.0), ("1-Year Term", 50.0)],
        ),
        preset(
            3,
            "Deposit balanced plan",
            Deposit,
            Balance,
            "Short, medium and long term deposits in even measure",
            &[
                ("Demand Deposit", 20.0),
                ("3-Month Term", 30.0),
                ("6-Month Term", 30.0),
                ("1-Year Term", 20.0),
            ],
        ),
        preset(
            4,
            "Wealth liquidity plan",
            Wealth,
            Liquidity,
            "Mostly T+1, redeemable at any time",
            &[("T+1 Redemption", 60.0), ("7-Day Redemption", 40.0)],
        ),
        preset(
            5,
            "Wealth yield plan",
            Wealth,
            Yield,
            "Higher-rate wealth products",
            &[("7-Day Redemption", 60.0), ("3-Month Redemption", 40.0)],
        ),
        preset(
            6,
            "Wealth balanced plan",
            Wealth,
            Balance,
            "Wealth products across several redemption periods",
            &[
                ("T+1 Redemption", 30.0),
                ("7-Day Redemption", 40.0),
                ("14-Day Redemption", 30.0),
            ],
        ),
        preset(
            7,
            "Mixed liquidity plan",
            Mixed,
            Liquidity,
            "Demand deposit plus T+1 wealth",
            &[("Demand Deposit", 35.0), ("7-Day Notice", 25.0), ("T+1 Redemption", 40.0)],
        ),
        preset(
            8,
            "Mixed yield plan",
            Mixed,
            Yield,
            "Long term deposit plus high-rate wealth",
            &[("Demand Deposit", 10.0), ("1-Year Term", 40.0), ("7-Day Redemption", 50.0)],
        ),
        preset(
            9,
            "Mixed balanced plan",
            Mixed,
            Balance,
            "Deposits and wealth products in balance",
            &[
                ("Demand Deposit", 20.0),
                ("3-Month Term", 25.0),
                ("6-Month Term", 25.0),
                ("7-Day Redemption", 30.0),
            ],
        ),
    ]
}
