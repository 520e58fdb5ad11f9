//! User-specified allocations: evaluating a full split and filling in a partial one.
use crate::core::allocation::{
    AllocationEntry, AllocationResult, EXACT_EPS, Mode, RATIO_EPS, blended_rates,
};
use crate::core::product::{Catalog, Category, Product};
use crate::core::solver::SolveError;
use std::str::FromStr;
use tracing::debug;

/// One user-chosen `{product, ratio}` pair, written on the command line as
/// `[deposit:|wealth:]name=ratio`.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomEntry {
    pub name: String,
    /// `None` looks the name up among deposits first, then wealth products.
    pub category: Option<Category>,
    pub ratio: f64,
}

impl FromStr for CustomEntry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (product, ratio) = s
            .rsplit_once('=')
            .ok_or_else(|| format!("expected NAME=RATIO, got '{s}'"))?;
        let ratio: f64 = ratio
            .trim()
            .parse()
            .map_err(|_| format!("invalid ratio '{ratio}' in '{s}'"))?;

        let (category, name) = match product.split_once(':') {
            Some(("deposit", name)) => (Some(Category::Deposit), name),
            Some(("wealth", name)) => (Some(Category::Wealth), name),
            _ => (None, product),
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing product name in '{s}'"));
        }

        Ok(Self {
            name: name.to_string(),
            category,
            ratio,
        })
    }
}

fn resolve<'a>(catalog: &'a Catalog, mode: Mode, entry: &CustomEntry) -> Result<&'a Product, SolveError> {
    let product = match entry.category {
        Some(category) if mode.allows(category) => catalog.find(&entry.name, category),
        Some(_) => None,
        None => [Category::Deposit, Category::Wealth]
            .into_iter()
            .filter(|c| mode.allows(*c))
            .find_map(|c| catalog.find(&entry.name, c)),
    };
    product.ok_or_else(|| {
        SolveError::InvalidInput(format!(
            "unknown product '{}' for {} allocations",
            entry.name, mode
        ))
    })
}

/// Resolves every entry with a positive ratio. Zero ratios are skipped, negative ones rejected.
fn resolve_all(
    catalog: &Catalog,
    mode: Mode,
    entries: &[CustomEntry],
) -> Result<Vec<AllocationEntry>, SolveError> {
    let mut resolved: Vec<AllocationEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        if !entry.ratio.is_finite() || entry.ratio < 0.0 {
            return Err(SolveError::InvalidInput(format!(
                "ratio for '{}' must be zero or more, got {}",
                entry.name, entry.ratio
            )));
        }
        if entry.ratio == 0.0 {
            continue;
        }
        let product = resolve(catalog, mode, entry)?;
        if resolved
            .iter()
            .any(|e| e.product.name == product.name && e.product.category() == product.category())
        {
            return Err(SolveError::InvalidInput(format!(
                "'{}' is listed more than once",
                product.label()
            )));
        }
        resolved.push(AllocationEntry::new(product, entry.ratio));
    }
    Ok(resolved)
}

/// Computes the blended rates of a user-specified split. The ratios must add up to 100.
pub fn evaluate(
    catalog: &Catalog,
    mode: Mode,
    entries: &[CustomEntry],
) -> Result<AllocationResult, SolveError> {
    let resolved = resolve_all(catalog, mode, entries)?;
    if resolved.is_empty() {
        return Err(SolveError::InvalidInput(
            "configure at least one product".to_string(),
        ));
    }
    let total: f64 = resolved.iter().map(|e| e.ratio).sum();
    if (total - 100.0).abs() > RATIO_EPS {
        return Err(SolveError::InvalidInput(format!(
            "product ratios must add up to 100%, got {total:.2}%"
        )));
    }

    Ok(AllocationResult::from_allocations(
        resolved,
        None,
        "Custom allocation",
        None,
    ))
}

/// How a suggested allocation's blended rate compares to the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetFit {
    Met,
    Above(f64),
    Below(f64),
}

impl TargetFit {
    fn new(predicted: f64, target: f64) -> Self {
        let diff = predicted - target;
        if diff.abs() < EXACT_EPS {
            TargetFit::Met
        } else if diff > 0.0 {
            TargetFit::Above(diff)
        } else {
            TargetFit::Below(-diff)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub fixed: Vec<AllocationEntry>,
    pub suggested: Vec<AllocationEntry>,
    /// Percentage left over by the fixed entries.
    pub remaining: f64,
    /// Rate the remaining percentage needs to average for the blend to hit the target.
    pub required_rate: f64,
    pub predicted_rate: f64,
    pub fit: TargetFit,
}

impl Suggestion {
    /// The fixed and suggested entries as one allocation.
    pub fn to_result(&self) -> AllocationResult {
        let entries = self
            .fixed
            .iter()
            .chain(self.suggested.iter())
            .cloned()
            .collect();
        AllocationResult::from_allocations(
            entries,
            None,
            "Custom allocation with suggested remainder",
            None,
        )
    }
}

fn round_to_five(value: f64) -> f64 {
    (value / 5.0).round() * 5.0
}

/// Proposes ratios for the products not in `fixed` so the whole split moves toward `target`.
///
/// Remaining products are visited highest rate first. Each one except the last takes half of
/// what is left when its rate covers the rate the remainder needs, or 60% when it does not,
/// rounded to a multiple of 5 and at least 5. The last product takes whatever is left.
///
/// Returns `Ok(None)` when the fixed entries already fill 100% or no other product is left.
pub fn suggest(
    catalog: &Catalog,
    mode: Mode,
    fixed: &[CustomEntry],
    target: f64,
) -> Result<Option<Suggestion>, SolveError> {
    if !target.is_finite() || target < 0.0 {
        return Err(SolveError::InvalidInput(format!(
            "target rate must be zero or more, got {target}"
        )));
    }

    let fixed = resolve_all(catalog, mode, fixed)?;
    let fixed_ratio: f64 = fixed.iter().map(|e| e.ratio).sum();
    if fixed_ratio >= 100.0 {
        debug!(fixed_ratio, "Nothing left to suggest");
        return Ok(None);
    }

    let mut available: Vec<&Product> = catalog
        .products_for(mode)
        .into_iter()
        .filter(|p| {
            !fixed
                .iter()
                .any(|e| e.product.name == p.name && e.product.category() == p.category())
        })
        .collect();
    if available.is_empty() {
        return Ok(None);
    }
    available.sort_by(|a, b| b.client_rate.total_cmp(&a.client_rate));

    let (fixed_rate, _) = blended_rates(&fixed);
    let remaining = 100.0 - fixed_ratio;
    let required_rate = (target - fixed_rate) / (remaining / 100.0);

    let mut suggested = Vec::with_capacity(available.len());
    let mut left = remaining;
    let last = available.len() - 1;
    for (i, product) in available.iter().enumerate() {
        if left <= 0.0 {
            break;
        }
        let share = if i == last {
            left
        } else {
            let portion = if product.client_rate >= required_rate {
                left / 2.0
            } else {
                left * 0.6
            };
            round_to_five(portion).max(5.0).min(left)
        };
        suggested.push(AllocationEntry::new(product, share));
        left -= share;
    }

    let (suggested_rate, _) = blended_rates(&suggested);
    let predicted_rate = fixed_rate + suggested_rate;
    Ok(Some(Suggestion {
        fixed,
        suggested,
        remaining,
        required_rate,
        predicted_rate,
        fit: TargetFit::new(predicted_rate, target),
    }))
}
