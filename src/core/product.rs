//! Product rate model and the immutable catalog every solve reads from.
use crate::core::allocation::Mode;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;

/// Highest client rate (percent) at which a deposit without an instant tenor still counts as
/// the demand-style anchor.
pub const ANCHOR_RATE_CEILING: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Deposit,
    Wealth,
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Category::Deposit => "deposit",
                Category::Wealth => "wealth",
            }
        )
    }
}

/// How quickly funds placed in a product can be withdrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenorClass {
    Instant,
    Short,
    Medium,
    Long,
}

impl Display for TenorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TenorClass::Instant => "instant",
                TenorClass::Short => "short",
                TenorClass::Medium => "medium",
                TenorClass::Long => "long",
            }
        )
    }
}

/// The bank-facing side of a product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProductKind {
    Deposit { ftp_rate: f64 },
    Wealth { commission_rate: f64 },
}

/// A named instrument. All rates are annualized percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub client_rate: f64,
    pub kind: ProductKind,
    pub tenor: TenorClass,
    pub liquidity_score: u8,
}

impl Product {
    /// Creates a deposit, deriving tenor and liquidity score from its name.
    pub fn deposit(name: &str, client_rate: f64, ftp_rate: f64) -> Self {
        Self {
            name: name.to_string(),
            client_rate,
            kind: ProductKind::Deposit { ftp_rate },
            tenor: infer_tenor(Category::Deposit, name),
            liquidity_score: infer_liquidity_score(Category::Deposit, name),
        }
    }

    /// Creates a wealth-management product, deriving tenor and liquidity score from its name.
    pub fn wealth(name: &str, client_rate: f64, commission_rate: f64) -> Self {
        Self {
            name: name.to_string(),
            client_rate,
            kind: ProductKind::Wealth { commission_rate },
            tenor: infer_tenor(Category::Wealth, name),
            liquidity_score: infer_liquidity_score(Category::Wealth, name),
        }
    }

    pub fn with_tenor(mut self, tenor: TenorClass) -> Self {
        self.tenor = tenor;
        self
    }

    pub fn with_liquidity_score(mut self, score: u8) -> Self {
        self.liquidity_score = score.min(100);
        self
    }

    pub fn category(&self) -> Category {
        match self.kind {
            ProductKind::Deposit { .. } => Category::Deposit,
            ProductKind::Wealth { .. } => Category::Wealth,
        }
    }

    /// The bank's own yield: FTP minus client rate for deposits, commission for wealth products.
    /// May be negative.
    pub fn margin(&self) -> f64 {
        match self.kind {
            ProductKind::Deposit { ftp_rate } => ftp_rate - self.client_rate,
            ProductKind::Wealth { commission_rate } => commission_rate,
        }
    }

    /// Whether this is an instant-tenor deposit, the usual liquid floor of an allocation.
    pub fn is_anchor(&self) -> bool {
        self.category() == Category::Deposit && self.tenor == TenorClass::Instant
    }

    /// Display label distinguishing same-named products across categories.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.category())
    }
}

/// The liquid floor product among `deposits`: the first instant-tenor deposit, or else the
/// lowest-rate deposit paying at most [`ANCHOR_RATE_CEILING`].
pub fn find_anchor(deposits: &[Product]) -> Option<&Product> {
    deposits.iter().find(|p| p.is_anchor()).or_else(|| {
        deposits
            .iter()
            .filter(|p| p.category() == Category::Deposit && p.client_rate <= ANCHOR_RATE_CEILING)
            .min_by(|a, b| a.client_rate.total_cmp(&b.client_rate))
    })
}

pub fn margin(product: &Product) -> f64 {
    product.margin()
}

pub fn liquidity_score(product: &Product) -> u8 {
    product.liquidity_score
}

pub fn tenor(product: &Product) -> TenorClass {
    product.tenor
}

const DEMAND: &[&str] = &["demand", "current account", "活期"];
const T_PLUS_ONE: &[&str] = &["t+1", "t+0"];
const SEVEN_DAY: &[&str] = &["7-day", "7 day", "7天"];
const FOURTEEN_DAY: &[&str] = &["14-day", "14 day", "14天"];
const THREE_MONTH: &[&str] = &["3-month", "3 month", "3个月"];
const SIX_MONTH: &[&str] = &["6-month", "6 month", "6个月"];

fn matches_any(name: &str, patterns: &[&str]) -> bool {
    let name = name.to_lowercase();
    patterns.iter().any(|p| name.contains(p))
}

/// Naming-convention default for a product's tenor, used only when a catalog document
/// does not state one.
pub fn infer_tenor(category: Category, name: &str) -> TenorClass {
    match category {
        Category::Deposit => {
            if matches_any(name, DEMAND) {
                TenorClass::Instant
            } else if matches_any(name, SEVEN_DAY) || matches_any(name, THREE_MONTH) {
                TenorClass::Short
            } else if matches_any(name, SIX_MONTH) {
                TenorClass::Medium
            } else {
                TenorClass::Long
            }
        }
        Category::Wealth => {
            if matches_any(name, T_PLUS_ONE) {
                TenorClass::Instant
            } else if matches_any(name, SEVEN_DAY) || matches_any(name, FOURTEEN_DAY) {
                TenorClass::Short
            } else {
                TenorClass::Medium
            }
        }
    }
}

/// Naming-convention default for a product's liquidity score (0-100).
pub fn infer_liquidity_score(category: Category, name: &str) -> u8 {
    match category {
        Category::Deposit => {
            if matches_any(name, DEMAND) {
                100
            } else if matches_any(name, SEVEN_DAY) {
                80
            } else if matches_any(name, THREE_MONTH) {
                60
            } else if matches_any(name, SIX_MONTH) {
                40
            } else {
                30
            }
        }
        Category::Wealth => {
            if matches_any(name, T_PLUS_ONE) {
                90
            } else if matches_any(name, SEVEN_DAY) {
                70
            } else if matches_any(name, FOURTEEN_DAY) {
                50
            } else {
                30
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("A {category} product has an empty name")]
    EmptyName { category: Category },

    #[error("Product '{name}' has a non-finite {field}")]
    InvalidRate { name: String, field: &'static str },

    #[error("Product '{name}' has a negative client rate: {rate}")]
    NegativeClientRate { name: String, rate: f64 },

    #[error("Duplicate {category} product name: '{name}'")]
    DuplicateName { name: String, category: Category },

    #[error("Failed to parse product catalog: {0}")]
    Parse(String),
}

/// A deposit as stored in the `productConfig` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRecord {
    pub name: String,
    pub client_rate: f64,
    pub ftp_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenor: Option<TenorClass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquidity_score: Option<u8>,
}

/// A wealth-management product as stored in the `productConfig` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WealthRecord {
    pub name: String,
    pub client_rate: f64,
    pub commission_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenor: Option<TenorClass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquidity_score: Option<u8>,
}

/// The `productConfig` document: `{deposits: [...], wealth: [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductConfig {
    #[serde(default)]
    pub deposits: Vec<DepositRecord>,
    #[serde(default)]
    pub wealth: Vec<WealthRecord>,
}

/// Read-only snapshot of the products available to a solve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub deposits: Vec<Product>,
    pub wealth: Vec<Product>,
}

impl Catalog {
    /// Validates `config` and resolves missing tenor and liquidity fields.
    pub fn from_config(config: &ProductConfig) -> Result<Self, CatalogError> {
        let mut deposits = Vec::with_capacity(config.deposits.len());
        for record in &config.deposits {
            validate_record(Category::Deposit, &record.name, record.client_rate)?;
            check_finite(&record.name, "FTP rate", record.ftp_rate)?;
            let mut product = Product::deposit(&record.name, record.client_rate, record.ftp_rate);
            if let Some(tenor) = record.tenor {
                product = product.with_tenor(tenor);
            }
            if let Some(score) = record.liquidity_score {
                product = product.with_liquidity_score(score);
            }
            deposits.push(product);
        }

        let mut wealth = Vec::with_capacity(config.wealth.len());
        for record in &config.wealth {
            validate_record(Category::Wealth, &record.name, record.client_rate)?;
            check_finite(&record.name, "commission rate", record.commission_rate)?;
            let mut product =
                Product::wealth(&record.name, record.client_rate, record.commission_rate);
            if let Some(tenor) = record.tenor {
                product = product.with_tenor(tenor);
            }
            if let Some(score) = record.liquidity_score {
                product = product.with_liquidity_score(score);
            }
            wealth.push(product);
        }

        check_unique(Category::Deposit, &deposits)?;
        check_unique(Category::Wealth, &wealth)?;

        Ok(Self { deposits, wealth })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let config: ProductConfig =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::from_config(&config)
    }

    /// Serializes back into the document shape, keeping the resolved tenor and score.
    pub fn to_config(&self) -> ProductConfig {
        let deposits = self
            .deposits
            .iter()
            .filter_map(|p| match p.kind {
                ProductKind::Deposit { ftp_rate } => Some(DepositRecord {
                    name: p.name.clone(),
                    client_rate: p.client_rate,
                    ftp_rate,
                    tenor: Some(p.tenor),
                    liquidity_score: Some(p.liquidity_score),
                }),
                ProductKind::Wealth { .. } => None,
            })
            .collect();
        let wealth = self
            .wealth
            .iter()
            .filter_map(|p| match p.kind {
                ProductKind::Wealth { commission_rate } => Some(WealthRecord {
                    name: p.name.clone(),
                    client_rate: p.client_rate,
                    commission_rate,
                    tenor: Some(p.tenor),
                    liquidity_score: Some(p.liquidity_score),
                }),
                ProductKind::Deposit { .. } => None,
            })
            .collect();
        ProductConfig { deposits, wealth }
    }

    /// The default bank product shelf.
    pub fn builtin() -> Self {
        Self {
            deposits: vec![
                Product::deposit("Demand Deposit", 0.05, 2.4),
                Product::deposit("7-Day Notice", 0.75, 1.9),
                Product::deposit("3-Month Term", 1.0, 2.0),
                Product::deposit("6-Month Term", 1.2, 2.05),
                Product::deposit("1-Year Term", 1.3, 2.15),
            ],
            wealth: vec![
                Product::wealth("T+1 Redemption", 1.75, 0.1),
                Product::wealth("7-Day Redemption", 2.08, 0.05),
                Product::wealth("14-Day Redemption", 1.87, 0.05),
                Product::wealth("3-Month Redemption", 2.0, 0.05),
            ],
        }
    }

    pub fn anchor(&self) -> Option<&Product> {
        find_anchor(&self.deposits)
    }

    /// Products eligible for an allocation `mode`.
    pub fn products_for(&self, mode: Mode) -> Vec<&Product> {
        match mode {
            Mode::Deposit => self.deposits.iter().collect(),
            Mode::Wealth => self.wealth.iter().collect(),
            Mode::Mixed => self.deposits.iter().chain(self.wealth.iter()).collect(),
        }
    }

    /// Highest client rate reachable in `mode`; 0 when the mode has no products.
    pub fn max_client_rate(&self, mode: Mode) -> f64 {
        self.products_for(mode)
            .iter()
            .map(|p| p.client_rate)
            .fold(None, |acc: Option<f64>, r| Some(acc.map_or(r, |a| a.max(r))))
            .unwrap_or(0.0)
    }

    pub fn find(&self, name: &str, category: Category) -> Option<&Product> {
        let list = match category {
            Category::Deposit => &self.deposits,
            Category::Wealth => &self.wealth,
        };
        list.iter().find(|p| p.name == name)
    }

    /// Looks a name up among deposits first, then wealth products.
    pub fn find_by_name(&self, name: &str) -> Option<&Product> {
        self.find(name, Category::Deposit)
            .or_else(|| self.find(name, Category::Wealth))
    }

    pub fn is_empty(&self) -> bool {
        self.deposits.is_empty() && self.wealth.is_empty()
    }
}

fn validate_record(category: Category, name: &str, client_rate: f64) -> Result<(), CatalogError> {
    if name.trim().is_empty() {
        return Err(CatalogError::EmptyName { category });
    }
    check_finite(name, "client rate", client_rate)?;
    if client_rate < 0.0 {
        return Err(CatalogError::NegativeClientRate {
            name: name.to_string(),
            rate: client_rate,
        });
    }
    Ok(())
}

fn check_finite(name: &str, field: &'static str, value: f64) -> Result<(), CatalogError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CatalogError::InvalidRate {
            name: name.to_string(),
            field,
        })
    }
}

fn check_unique(category: Category, products: &[Product]) -> Result<(), CatalogError> {
    for (i, product) in products.iter().enumerate() {
        if products[..i].iter().any(|p| p.name == product.name) {
            return Err(CatalogError::DuplicateName {
                name: product.name.clone(),
                category,
            });
        }
    }
    Ok(())
}
