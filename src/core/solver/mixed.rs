//! Solver over deposits and wealth products together, anchored on the demand deposit.
use super::{SolveError, all_anchor, anchored_result, required_rate, sort_by_rate, within_range, yield_fill};
use crate::core::allocation::{AllocationEntry, AllocationResult, Preference};
use crate::core::product::{Catalog, Category, Product, TenorClass};
use tracing::debug;

pub fn solve_mixed(
    catalog: &Catalog,
    target: f64,
    floor: f64,
    preference: Preference,
) -> Result<Vec<AllocationResult>, SolveError> {
    let anchor = catalog.anchor().ok_or(SolveError::MissingAnchor)?;
    if floor >= 100.0 {
        return Ok(vec![all_anchor(anchor, preference)]);
    }

    let mut others: Vec<&Product> = catalog
        .deposits
        .iter()
        .filter(|p| !std::ptr::eq(*p, anchor))
        .chain(catalog.wealth.iter())
        .collect();
    sort_by_rate(&mut others);

    let required = required_rate(target, anchor.client_rate, floor);
    if !within_range(&others, required) {
        debug!(required, "Required mixed rate is out of range");
        return Ok(Vec::new());
    }

    let result = match preference {
        Preference::Yield => mixed_yield(anchor, &others, required, floor),
        Preference::Liquidity => Some(mixed_liquidity(anchor, &others, floor)),
        Preference::Balance => mixed_balance(anchor, &others, floor),
    };
    Ok(result.into_iter().collect())
}

fn mixed_yield(
    anchor: &Product,
    others: &[&Product],
    required: f64,
    floor: f64,
) -> Option<AllocationResult> {
    let mut entries = vec![AllocationEntry::new(anchor, floor)];
    entries.extend(yield_fill(others, required, 100.0 - floor)?);
    Some(anchored_result(
        anchor,
        entries,
        Preference::Yield,
        "Highest-rate products across deposits and wealth above the liquidity floor",
    ))
}

fn mixed_liquidity(anchor: &Product, others: &[&Product], floor: f64) -> AllocationResult {
    let floor = floor.max((floor + 15.0).min(35.0));
    let budget = 100.0 - floor;

    let mut candidates = others.to_vec();
    candidates.sort_by(|a, b| {
        b.liquidity_score
            .cmp(&a.liquidity_score)
            .then(b.client_rate.total_cmp(&a.client_rate))
    });

    let instant_wealth = candidates
        .iter()
        .copied()
        .find(|p| p.category() == Category::Wealth && p.tenor == TenorClass::Instant);
    let short_deposit = candidates
        .iter()
        .copied()
        .find(|p| p.category() == Category::Deposit && p.tenor == TenorClass::Short);

    let mut entries = vec![AllocationEntry::new(anchor, floor)];
    match (instant_wealth, short_deposit) {
        (Some(wealth), Some(deposit)) => {
            entries.push(AllocationEntry::new(wealth, 0.6 * budget));
            entries.push(AllocationEntry::new(deposit, 0.4 * budget));
        }
        (Some(wealth), None) => {
            match candidates.iter().copied().find(|p| !std::ptr::eq(*p, wealth)) {
                Some(next) => {
                    entries.push(AllocationEntry::new(wealth, 0.7 * budget));
                    entries.push(AllocationEntry::new(next, 0.3 * budget));
                }
                None => entries.push(AllocationEntry::new(wealth, budget)),
            }
        }
        (None, _) => match candidates.as_slice() {
            [] => entries[0].ratio = 100.0,
            [only] => entries.push(AllocationEntry::new(only, budget)),
            [first, second, ..] => {
                entries.push(AllocationEntry::new(first, 0.6 * budget));
                entries.push(AllocationEntry::new(second, 0.4 * budget));
            }
        },
    }

    anchored_result(
        anchor,
        entries,
        Preference::Liquidity,
        "Most liquid deposits and wealth products; approximates the target, not bank-margin optimal",
    )
}

fn mixed_balance(anchor: &Product, others: &[&Product], floor: f64) -> Option<AllocationResult> {
    let floor = floor.max(15.0);
    let budget = 100.0 - floor;

    let deposits: Vec<&Product> = others
        .iter()
        .copied()
        .filter(|p| p.category() == Category::Deposit)
        .collect();
    let wealth: Vec<&Product> = others
        .iter()
        .copied()
        .filter(|p| p.category() == Category::Wealth)
        .collect();

    let deposit_pick = highest_margin(deposits.iter().copied().filter(|p| p.tenor == TenorClass::Medium))
        .or_else(|| highest_margin(deposits.iter().copied()));
    let wealth_pick = highest_margin(wealth.iter().copied().filter(|p| p.tenor == TenorClass::Short))
        .or_else(|| highest_margin(wealth.iter().copied()));

    let mut entries = vec![AllocationEntry::new(anchor, floor)];
    match (deposit_pick, wealth_pick) {
        (Some(deposit), Some(wealth)) => {
            entries.push(AllocationEntry::new(deposit, budget / 2.0));
            entries.push(AllocationEntry::new(wealth, budget / 2.0));
        }
        (Some(single), None) | (None, Some(single)) => {
            entries.push(AllocationEntry::new(single, budget))
        }
        (None, None) => return None,
    }

    Some(anchored_result(
        anchor,
        entries,
        Preference::Balance,
        "Even split between a deposit and a wealth product; approximates the target, not bank-margin optimal",
    ))
}

/// First product with the strictly highest margin.
fn highest_margin<'a>(products: impl Iterator<Item = &'a Product>) -> Option<&'a Product> {
    products.fold(None, |best: Option<&Product>, p| match best {
        Some(b) if b.margin() >= p.margin() => Some(b),
        _ => Some(p),
    })
}
