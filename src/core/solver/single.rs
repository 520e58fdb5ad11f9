//! Solvers over one homogeneous product list.
use super::{
    SolveError, adjust_toward_target, all_anchor, anchored_result, interpolation_ratio, required_rate,
    sort_by_rate, within_range, yield_fill,
};
use crate::core::allocation::{AllocationEntry, AllocationResult, Preference, RATIO_EPS, blended_rates};
use crate::core::product::{Product, TenorClass, find_anchor};
use tracing::debug;

const HEURISTIC_NOTE: &str = "approximates the target, not bank-margin optimal";

/// Deposit-only allocation. The anchor (see [`find_anchor`]) always holds
/// at least `floor` percent.
///
/// Returns an empty vector when the target cannot be reached with the non-anchor deposits.
pub fn solve_deposits(
    deposits: &[Product],
    target: f64,
    floor: f64,
    preference: Preference,
) -> Result<Vec<AllocationResult>, SolveError> {
    let anchor = find_anchor(deposits).ok_or(SolveError::MissingAnchor)?;

    if floor >= 100.0 {
        return Ok(vec![all_anchor(anchor, preference)]);
    }

    let mut others: Vec<&Product> = deposits
        .iter()
        .filter(|p| !std::ptr::eq(*p, anchor))
        .collect();
    sort_by_rate(&mut others);

    let required = required_rate(target, anchor.client_rate, floor);
    if !within_range(&others, required) {
        debug!(required, "Required deposit rate is out of range");
        return Ok(Vec::new());
    }

    let result = match preference {
        Preference::Yield => deposit_yield(anchor, &others, required, floor),
        Preference::Liquidity => deposit_liquidity(anchor, &others, target, floor),
        Preference::Balance => deposit_balance(anchor, &others, required, target, floor),
    };
    Ok(result.into_iter().collect())
}

fn deposit_yield(
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
        "Highest-rate deposits above the liquidity floor",
    ))
}

fn deposit_liquidity(
    anchor: &Product,
    others: &[&Product],
    target: f64,
    floor: f64,
) -> Option<AllocationResult> {
    let floor = floor.max((floor + 20.0).min(40.0));
    let budget = 100.0 - floor;
    let required = required_rate(target, anchor.client_rate, floor);

    let mut shorts: Vec<&Product> = others
        .iter()
        .copied()
        .filter(|p| p.tenor == TenorClass::Short)
        .collect();
    shorts.sort_by(|a, b| b.client_rate.total_cmp(&a.client_rate));

    let mut entries = vec![AllocationEntry::new(anchor, floor)];
    match shorts.as_slice() {
        [] => {
            let lowest = others.first()?;
            entries.push(AllocationEntry::new(lowest, budget));
        }
        [only] => entries.push(AllocationEntry::new(only, budget)),
        [high, low, ..] => {
            let share = if required < low.client_rate {
                0.5
            } else if required > high.client_rate {
                1.0
            } else {
                interpolation_ratio(required, low.client_rate, high.client_rate)
            };
            entries.push(AllocationEntry::new(high, share * budget));
            entries.push(AllocationEntry::new(low, (1.0 - share) * budget));
        }
    }

    Some(anchored_result(
        anchor,
        entries,
        Preference::Liquidity,
        format!("Raised liquidity floor with short-tenor deposits; {HEURISTIC_NOTE}"),
    ))
}

fn deposit_balance(
    anchor: &Product,
    others: &[&Product],
    required: f64,
    target: f64,
    floor: f64,
) -> Option<AllocationResult> {
    let mut picks: Vec<&Product> = [TenorClass::Short, TenorClass::Medium, TenorClass::Long]
        .iter()
        .filter_map(|tenor| others.iter().copied().find(|p| p.tenor == *tenor))
        .collect();
    if picks.is_empty() {
        picks = bracketing(others, required);
    }
    if picks.is_empty() {
        return None;
    }
    picks.sort_by(|a, b| b.margin().total_cmp(&a.margin()));

    let budget = 100.0 - floor;
    let mut ratios = Vec::with_capacity(picks.len());
    let mut allocated = 0.0;
    for _ in 1..picks.len() {
        let share = (0.4 * budget).min(budget - allocated - 10.0).max(0.0);
        ratios.push(share);
        allocated += share;
    }
    ratios.push(budget - allocated);

    let blend = |ratios: &[f64]| {
        let mut entries = vec![AllocationEntry::new(anchor, floor)];
        entries.extend(picks.iter().zip(ratios).map(|(p, r)| AllocationEntry::new(p, *r)));
        entries
    };

    let (current, _) = blended_rates(&blend(&ratios));
    if (current - target).abs() > RATIO_EPS {
        adjust_toward_target(&picks, &mut ratios, current, target);
    }

    Some(anchored_result(
        anchor,
        blend(&ratios),
        Preference::Balance,
        format!("Spread across short, medium and long tenors; {HEURISTIC_NOTE}"),
    ))
}

/// The adjacent pair of `sorted` (ascending) that brackets `required`, or the single product
/// when there is only one.
fn bracketing<'a>(sorted: &[&'a Product], required: f64) -> Vec<&'a Product> {
    match sorted {
        [] => Vec::new(),
        [only] => vec![*only],
        _ => sorted
            .windows(2)
            .find(|w| required >= w[0].client_rate && required <= w[1].client_rate)
            .map(|w| vec![w[0], w[1]])
            .unwrap_or_default(),
    }
}

/// Wealth allocations have no anchor; the score is the share redeemable at once.
fn wealth_result(
    entries: Vec<AllocationEntry>,
    preference: Preference,
    description: impl Into<String>,
) -> AllocationResult {
    let instant_share = entries
        .iter()
        .filter(|e| e.product.tenor == TenorClass::Instant)
        .map(|e| e.ratio)
        .sum();
    AllocationResult::from_allocations(entries, Some(preference), description, Some(instant_share))
}

/// Wealth-only allocation. There is no anchor and no liquidity floor.
pub fn solve_wealth(
    wealth: &[Product],
    target: f64,
    preference: Preference,
) -> Vec<AllocationResult> {
    let mut sorted: Vec<&Product> = wealth.iter().collect();
    sort_by_rate(&mut sorted);
    if !within_range(&sorted, target) {
        debug!(target, "Target is out of the wealth product range");
        return Vec::new();
    }

    let result = match preference {
        Preference::Yield => wealth_yield(&sorted, target),
        Preference::Liquidity => {
            wealth_liquidity(&sorted, target).or_else(|| wealth_yield(&sorted, target))
        }
        Preference::Balance => wealth_balance(&sorted, target),
    };
    result.into_iter().collect()
}

fn wealth_yield(sorted: &[&Product], target: f64) -> Option<AllocationResult> {
    let entries = yield_fill(sorted, target, 100.0)?;
    Some(wealth_result(entries, Preference::Yield, "Highest-rate wealth products"))
}

/// `None` when the list has neither an instant nor a short-tenor product.
fn wealth_liquidity(sorted: &[&Product], target: f64) -> Option<AllocationResult> {
    let entries = if let Some(instant) = sorted.iter().copied().find(|p| p.tenor == TenorClass::Instant)
    {
        let rest: Vec<&Product> = sorted
            .iter()
            .copied()
            .filter(|p| !std::ptr::eq(*p, instant))
            .collect();
        // The other half must average this for the blend to hit the target.
        let required = 2.0 * target - instant.client_rate;

        let mut entries = vec![AllocationEntry::new(instant, 50.0)];
        if let Some(idx) = rest.iter().position(|p| p.client_rate >= required) {
            let high = rest[idx];
            match idx.checked_sub(1).map(|i| rest[i]) {
                Some(low) if required > low.client_rate => {
                    let share = interpolation_ratio(required, low.client_rate, high.client_rate);
                    entries.push(AllocationEntry::new(high, share * 50.0));
                    entries.push(AllocationEntry::new(low, (1.0 - share) * 50.0));
                }
                _ => entries.push(AllocationEntry::new(high, 50.0)),
            }
        } else if let Some(highest) = rest.last() {
            entries.push(AllocationEntry::new(highest, 50.0));
        } else {
            entries[0].ratio = 100.0;
        }
        entries
    } else {
        let mut shorts: Vec<&Product> = sorted
            .iter()
            .copied()
            .filter(|p| p.tenor == TenorClass::Short)
            .collect();
        shorts.sort_by(|a, b| b.liquidity_score.cmp(&a.liquidity_score));
        match shorts.as_slice() {
            [] => return None,
            [only] => vec![AllocationEntry::new(only, 100.0)],
            [first, second, ..] => vec![
                AllocationEntry::new(first, 60.0),
                AllocationEntry::new(second, 40.0),
            ],
        }
    };

    Some(wealth_result(
        entries,
        Preference::Liquidity,
        format!("Most liquid wealth products first; {HEURISTIC_NOTE}"),
    ))
}

fn wealth_balance(sorted: &[&Product], target: f64) -> Option<AllocationResult> {
    let last = sorted.len().checked_sub(1)?;
    let mut picks: Vec<&Product> = Vec::with_capacity(3);
    let mut ratios: Vec<f64> = Vec::with_capacity(3);
    for (idx, share) in [(0, 25.0), (sorted.len() / 2, 35.0), (last, 40.0)] {
        let product = sorted[idx];
        match picks.iter().position(|p| std::ptr::eq(*p, product)) {
            Some(pos) => ratios[pos] += share,
            None => {
                picks.push(product);
                ratios.push(share);
            }
        }
    }

    let entries = |ratios: &[f64]| -> Vec<AllocationEntry> {
        picks
            .iter()
            .zip(ratios)
            .map(|(p, r)| AllocationEntry::new(p, *r))
            .collect()
    };
    let (current, _) = blended_rates(&entries(&ratios));
    if (current - target).abs() > RATIO_EPS {
        adjust_toward_target(&picks, &mut ratios, current, target);
    }

    Some(wealth_result(
        entries(&ratios),
        Preference::Balance,
        format!("Low, middle and high rate wealth products; {HEURISTIC_NOTE}"),
    ))
}
