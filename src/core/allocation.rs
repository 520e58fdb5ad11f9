//! Allocation value types shared by every solver.
use crate::core::product::{Category, Product, TenorClass};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Two rates closer than this are the same rate.
pub const EXACT_EPS: f64 = 0.001;
/// Two ratios (in percent) closer than this are the same ratio; entries below it are dropped.
pub const RATIO_EPS: f64 = 0.01;

/// Which product categories an allocation may draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Deposit,
    Wealth,
    Mixed,
}

impl Mode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Deposit => "Deposits only",
            Mode::Wealth => "Wealth products only",
            Mode::Mixed => "Deposits + wealth products",
        }
    }

    /// Whether the product category may appear in an allocation of this mode.
    pub fn allows(&self, category: Category) -> bool {
        match self {
            Mode::Deposit => category == Category::Deposit,
            Mode::Wealth => category == Category::Wealth,
            Mode::Mixed => true,
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Mode::Deposit => "deposit",
                Mode::Wealth => "wealth",
                Mode::Mixed => "mixed",
            }
        )
    }
}

/// Solving strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    Yield,
    Liquidity,
    Balance,
}

impl Preference {
    pub const ALL: [Preference; 3] = [Preference::Yield, Preference::Liquidity, Preference::Balance];

    pub fn display_name(&self) -> &'static str {
        match self {
            Preference::Yield => "Yield first",
            Preference::Liquidity => "Liquidity first",
            Preference::Balance => "Balanced",
        }
    }
}

impl Display for Preference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Preference::Yield => "yield",
                Preference::Liquidity => "liquidity",
                Preference::Balance => "balance",
            }
        )
    }
}

/// A share of the funds placed in one product. `ratio` is a percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub product: Product,
    pub ratio: f64,
}

impl AllocationEntry {
    pub fn new(product: &Product, ratio: f64) -> Self {
        Self {
            product: product.clone(),
            ratio,
        }
    }

    /// Currency amount placed in this entry out of `total`.
    pub fn amount(&self, total: f64) -> f64 {
        total * self.ratio / 100.0
    }
}

/// Ratio-weighted client rate and bank margin of `entries`.
pub fn blended_rates(entries: &[AllocationEntry]) -> (f64, f64) {
    entries.iter().fold((0.0, 0.0), |(client, bank), e| {
        (
            client + e.product.client_rate * e.ratio / 100.0,
            bank + e.product.margin() * e.ratio / 100.0,
        )
    })
}

/// Outcome of one solve. Never mutated once built; a new solve produces a new result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub feasible: bool,
    pub entries: Vec<AllocationEntry>,
    pub client_rate: f64,
    pub bank_rate: f64,
    pub preference: Option<Preference>,
    pub description: String,
    pub liquidity_score: f64,
}

impl AllocationResult {
    /// Builds a result from `{product, ratio}` pairs.
    ///
    /// Entries below [`RATIO_EPS`] are dropped before the blended rates are computed, so the
    /// reported rates always match the entries that are kept. When `liquidity_score` is `None`
    /// it defaults to the share held in instant-tenor deposits, i.e. the anchor.
    pub fn from_allocations(
        entries: Vec<AllocationEntry>,
        preference: Option<Preference>,
        description: impl Into<String>,
        liquidity_score: Option<f64>,
    ) -> Self {
        let entries: Vec<AllocationEntry> =
            entries.into_iter().filter(|e| e.ratio >= RATIO_EPS).collect();
        let (client_rate, bank_rate) = blended_rates(&entries);
        let liquidity_score = liquidity_score.unwrap_or_else(|| {
            entries
                .iter()
                .filter(|e| {
                    e.product.category() == Category::Deposit
                        && e.product.tenor == TenorClass::Instant
                })
                .map(|e| e.ratio)
                .sum()
        });

        Self {
            feasible: true,
            entries,
            client_rate,
            bank_rate,
            preference,
            description: description.into(),
            liquidity_score,
        }
    }

    pub fn total_ratio(&self) -> f64 {
        self.entries.iter().map(|e| e.ratio).sum()
    }

    pub fn product_count(&self) -> usize {
        self.entries.len()
    }

    /// Combined ratio held in products called `name`.
    pub fn ratio_of(&self, name: &str) -> f64 {
        self.entries
            .iter()
            .filter(|e| e.product.name == name)
            .map(|e| e.ratio)
            .sum()
    }

    /// Annual client earning on `amount`.
    pub fn client_earning(&self, amount: f64) -> f64 {
        amount * self.client_rate / 100.0
    }

    /// Annual bank earning on `amount`.
    pub fn bank_earning(&self, amount: f64) -> f64 {
        amount * self.bank_rate / 100.0
    }
}
