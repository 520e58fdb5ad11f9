//! Exhaustive search over every one- and two-product allocation for the highest bank margin.
use crate::core::allocation::{
    AllocationEntry, AllocationResult, EXACT_EPS, Mode, RATIO_EPS, blended_rates,
};
use crate::core::product::{Catalog, Product};
use crate::core::solver::{SolveError, SolveOutcome, interpolation_ratio};
use tracing::debug;

/// Finds the allocation of at most two products, drawn from deposits and wealth products
/// together, that hits `target` and pays the bank the most.
///
/// Every unordered pair is tried, so the cost is quadratic in the catalog size. Ties keep the
/// first allocation found.
pub fn optimize(catalog: &Catalog, target: f64) -> Result<SolveOutcome, SolveError> {
    if !target.is_finite() || target < 0.0 {
        return Err(SolveError::InvalidInput(format!(
            "target rate must be zero or more, got {target}"
        )));
    }

    let products = catalog.products_for(Mode::Mixed);
    let mut best: Option<Vec<AllocationEntry>> = None;
    let mut best_bank_rate = f64::NEG_INFINITY;

    for i in 0..products.len() {
        for j in i..products.len() {
            let Some(entries) = candidate(products[i], products[j], i == j, target) else {
                continue;
            };
            let (_, bank_rate) = blended_rates(&entries);
            if bank_rate > best_bank_rate {
                best_bank_rate = bank_rate;
                best = Some(entries);
            }
        }
    }

    match best {
        Some(entries) => {
            debug!(bank_rate = best_bank_rate, "Optimizer found an allocation");
            Ok(SolveOutcome::Feasible(vec![AllocationResult::from_allocations(
                entries,
                None,
                "Highest bank margin among all one- and two-product allocations",
                None,
            )]))
        }
        None => Ok(SolveOutcome::Infeasible {
            target_rate: target,
            max_achievable: catalog.max_client_rate(Mode::Mixed),
        }),
    }
}

fn candidate(
    a: &Product,
    b: &Product,
    single: bool,
    target: f64,
) -> Option<Vec<AllocationEntry>> {
    if single {
        return ((a.client_rate - target).abs() < EXACT_EPS)
            .then(|| vec![AllocationEntry::new(a, 100.0)]);
    }

    let entries = if (a.client_rate - b.client_rate).abs() < EXACT_EPS {
        vec![AllocationEntry::new(a, 50.0), AllocationEntry::new(b, 50.0)]
    } else {
        let (low, high) = if a.client_rate < b.client_rate { (a, b) } else { (b, a) };
        if target < low.client_rate || target > high.client_rate {
            return None;
        }
        let share = interpolation_ratio(target, low.client_rate, high.client_rate) * 100.0;
        vec![
            AllocationEntry::new(high, share),
            AllocationEntry::new(low, 100.0 - share),
        ]
    };

    let (client_rate, _) = blended_rates(&entries);
    ((client_rate - target).abs() < RATIO_EPS).then_some(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selects_highest_margin() {
        let catalog = Catalog {
            deposits: vec![
                Product::deposit("Promo A", 1.0, 3.35),
                Product::deposit("Promo B", 1.0, 2.65),
            ],
            wealth: vec![],
        };
        let outcome = optimize(&catalog, 1.0).unwrap();
        let result = &outcome.results()[0];
        assert_eq!(result.product_count(), 1);
        assert_eq!(result.ratio_of("Promo A"), 100.0);
        assert!((result.bank_rate - 2.35).abs() < 1e-9);
        assert_eq!(result.preference, None);
    }

    #[test]
    fn test_pair_interpolation_on_builtin_catalog() {
        let catalog = Catalog::builtin();
        let outcome = optimize(&catalog, 1.5).unwrap();
        let result = &outcome.results()[0];
        assert!((result.client_rate - 1.5).abs() < RATIO_EPS);
        assert!(result.product_count() <= 2);
        // The demand deposit carries by far the largest margin.
        assert!(result.ratio_of("Demand Deposit") > 0.0);

        for (i, a) in catalog.products_for(Mode::Mixed).iter().enumerate() {
            for b in catalog.products_for(Mode::Mixed).iter().skip(i) {
                if let Some(entries) = candidate(a, b, std::ptr::eq(*a, *b), 1.5) {
                    let (_, bank) = blended_rates(&entries);
                    assert!(bank <= result.bank_rate + 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_ties_keep_first_found() {
        let catalog = Catalog {
            deposits: vec![
                Product::deposit("First", 1.0, 2.0),
                Product::deposit("Second", 1.0, 2.0),
            ],
            wealth: vec![],
        };
        let outcome = optimize(&catalog, 1.0).unwrap();
        assert_eq!(outcome.results()[0].ratio_of("First"), 100.0);
    }

    #[test]
    fn test_infeasible_reports_max() {
        let catalog = Catalog::builtin();
        assert_eq!(
            optimize(&catalog, 5.0).unwrap(),
            SolveOutcome::Infeasible {
                target_rate: 5.0,
                max_achievable: 2.08
            }
        );
        assert!(matches!(
            optimize(&catalog, -1.0),
            Err(SolveError::InvalidInput(_))
        ));
    }
}
