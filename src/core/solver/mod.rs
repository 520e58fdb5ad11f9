//! Target-rate allocation solvers.
//!
//! [`solve`] validates a [`SolveRequest`] and dispatches to the single-category solver
//! (deposits only or wealth products only) or to the mixed-category solver. Every solver is a
//! pure function of the catalog snapshot and the request, so solving several preferences at
//! once needs no coordination.

pub mod mixed;
pub mod single;

use crate::core::allocation::{AllocationEntry, AllocationResult, EXACT_EPS, Mode, Preference};
use crate::core::product::{Catalog, Product};
use thiserror::Error;
use tracing::debug;

/// Failures that stop a solve before any allocation is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The catalog has no instant-tenor deposit to act as the liquidity floor.
    #[error("No demand deposit found in the catalog; deposit and mixed allocations need one")]
    MissingAnchor,
}

/// What the caller asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveRequest {
    /// Funds to allocate, in currency units.
    pub amount: f64,
    /// Target blended client rate, in percent.
    pub target_rate: f64,
    pub mode: Mode,
    /// Minimum percentage held in the demand deposit. Ignored for wealth-only allocations.
    pub liquidity_ratio: f64,
    pub preference: Preference,
}

impl SolveRequest {
    pub fn validate(&self) -> Result<(), SolveError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(SolveError::InvalidInput(format!(
                "amount must be a positive number, got {}",
                self.amount
            )));
        }
        if !self.target_rate.is_finite() || self.target_rate < 0.0 {
            return Err(SolveError::InvalidInput(format!(
                "target rate must be zero or more, got {}",
                self.target_rate
            )));
        }
        if self.mode != Mode::Wealth
            && (!self.liquidity_ratio.is_finite()
                || !(0.0..=100.0).contains(&self.liquidity_ratio))
        {
            return Err(SolveError::InvalidInput(format!(
                "liquidity ratio must be between 0 and 100, got {}",
                self.liquidity_ratio
            )));
        }
        Ok(())
    }

    /// The anchor floor actually applied: always 0 for wealth-only allocations.
    pub fn liquidity_floor(&self) -> f64 {
        match self.mode {
            Mode::Wealth => 0.0,
            Mode::Deposit | Mode::Mixed => self.liquidity_ratio,
        }
    }

    pub fn with_preference(self, preference: Preference) -> Self {
        Self { preference, ..self }
    }
}

/// Result of a solve that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Feasible(Vec<AllocationResult>),
    /// No allocation reaches the target; `max_achievable` is the best rate the mode offers.
    Infeasible {
        target_rate: f64,
        max_achievable: f64,
    },
}

impl SolveOutcome {
    pub fn results(&self) -> &[AllocationResult] {
        match self {
            SolveOutcome::Feasible(results) => results,
            SolveOutcome::Infeasible { .. } => &[],
        }
    }

    pub fn is_feasible(&self) -> bool {
        matches!(self, SolveOutcome::Feasible(_))
    }
}

/// Validates `request` and solves it against `catalog`.
pub fn solve(catalog: &Catalog, request: &SolveRequest) -> Result<SolveOutcome, SolveError> {
    request.validate()?;
    debug!(?request, "Solving allocation");

    let floor = request.liquidity_floor();
    let results = match request.mode {
        Mode::Deposit => single::solve_deposits(
            &catalog.deposits,
            request.target_rate,
            floor,
            request.preference,
        )?,
        Mode::Wealth => {
            single::solve_wealth(&catalog.wealth, request.target_rate, request.preference)
        }
        Mode::Mixed => {
            mixed::solve_mixed(catalog, request.target_rate, floor, request.preference)?
        }
    };

    if results.is_empty() {
        let max_achievable = catalog.max_client_rate(request.mode);
        debug!(
            target_rate = request.target_rate,
            max_achievable, "No feasible allocation"
        );
        return Ok(SolveOutcome::Infeasible {
            target_rate: request.target_rate,
            max_achievable,
        });
    }
    Ok(SolveOutcome::Feasible(results))
}

/// Client rate the non-anchor part of the funds must average so that the whole allocation
/// hits `target`, given `floor` percent parked at `anchor_rate`.
pub fn required_rate(target: f64, anchor_rate: f64, floor: f64) -> f64 {
    (target * 100.0 - anchor_rate * floor) / (100.0 - floor)
}

/// Share of the higher-rate product in a two-product blend that averages `required`.
pub fn interpolation_ratio(required: f64, low: f64, high: f64) -> f64 {
    if (high - low).abs() < EXACT_EPS {
        return 0.5;
    }
    ((required - low) / (high - low)).clamp(0.0, 1.0)
}

pub(crate) fn sort_by_rate(products: &mut [&Product]) {
    products.sort_by(|a, b| a.client_rate.total_cmp(&b.client_rate));
}

/// Whether `required` lies in the client-rate range of `sorted` (ascending).
pub(crate) fn within_range(sorted: &[&Product], required: f64) -> bool {
    match (sorted.first(), sorted.last()) {
        (Some(min), Some(max)) => {
            required >= min.client_rate - EXACT_EPS && required <= max.client_rate + EXACT_EPS
        }
        _ => false,
    }
}

/// Highest-rate-first scan over `sorted` (ascending): a product carrying exactly the required
/// rate takes the whole `budget`, otherwise the adjacent pair bracketing it is interpolated.
pub(crate) fn yield_fill(
    sorted: &[&Product],
    required: f64,
    budget: f64,
) -> Option<Vec<AllocationEntry>> {
    for i in (0..sorted.len()).rev() {
        let high = sorted[i];
        if (high.client_rate - required).abs() <= EXACT_EPS {
            return Some(vec![AllocationEntry::new(high, budget)]);
        }
        if i > 0 {
            let low = sorted[i - 1];
            if required >= low.client_rate && required <= high.client_rate {
                let share = interpolation_ratio(required, low.client_rate, high.client_rate);
                return Some(vec![
                    AllocationEntry::new(high, share * budget),
                    AllocationEntry::new(low, (1.0 - share) * budget),
                ]);
            }
        }
    }
    None
}

/// Moves funds from the lowest- to the highest-rate product among `picks` so the blend
/// lands on `target`. Skipped when it would drive either ratio negative.
pub(crate) fn adjust_toward_target(
    picks: &[&Product],
    ratios: &mut [f64],
    current_rate: f64,
    target: f64,
) {
    let (Some(low), Some(high)) = (
        (0..picks.len()).min_by(|&a, &b| picks[a].client_rate.total_cmp(&picks[b].client_rate)),
        (0..picks.len()).max_by(|&a, &b| picks[a].client_rate.total_cmp(&picks[b].client_rate)),
    ) else {
        return;
    };
    let spread = picks[high].client_rate - picks[low].client_rate;
    if spread < EXACT_EPS {
        return;
    }

    let shift = (target - current_rate) / spread * 100.0;
    if ratios[low] - shift >= 0.0 && ratios[high] + shift >= 0.0 {
        ratios[high] += shift;
        ratios[low] -= shift;
    } else {
        debug!(shift, "Skipping rate adjustment that would drive a ratio negative");
    }
}

/// Builds a result whose liquidity score is the share held in `anchor`.
pub(crate) fn anchored_result(
    anchor: &Product,
    entries: Vec<AllocationEntry>,
    preference: Preference,
    description: impl Into<String>,
) -> AllocationResult {
    let anchor_share = entries
        .iter()
        .filter(|e| e.product == *anchor)
        .map(|e| e.ratio)
        .sum();
    AllocationResult::from_allocations(entries, Some(preference), description, Some(anchor_share))
}

/// The whole amount parked in the anchor.
pub(crate) fn all_anchor(anchor: &Product, preference: Preference) -> AllocationResult {
    AllocationResult::from_allocations(
        vec![AllocationEntry::new(anchor, 100.0)],
        Some(preference),
        "Fully liquid: all funds held in the demand deposit",
        Some(100.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::allocation::RATIO_EPS;

    fn request(mode: Mode, target_rate: f64, liquidity_ratio: f64) -> SolveRequest {
        SolveRequest {
            amount: 1000.0,
            target_rate,
            mode,
            liquidity_ratio,
            preference: Preference::Yield,
        }
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let mut bad = request(Mode::Deposit, 1.0, 10.0);
        bad.amount = 0.0;
        assert!(matches!(bad.validate(), Err(SolveError::InvalidInput(_))));

        let bad = request(Mode::Deposit, -0.1, 10.0);
        assert!(matches!(bad.validate(), Err(SolveError::InvalidInput(_))));

        let bad = request(Mode::Deposit, f64::NAN, 10.0);
        assert!(matches!(bad.validate(), Err(SolveError::InvalidInput(_))));

        let bad = request(Mode::Mixed, 1.0, 100.5);
        assert!(matches!(bad.validate(), Err(SolveError::InvalidInput(_))));

        // Liquidity ratio is ignored for wealth-only allocations.
        let ok = request(Mode::Wealth, 1.0, 150.0);
        assert!(ok.validate().is_ok());
        assert_eq!(ok.liquidity_floor(), 0.0);

        assert!(request(Mode::Deposit, 0.0, 0.0).validate().is_ok());
        assert!(request(Mode::Deposit, 1.0, 100.0).validate().is_ok());
    }

    #[test]
    fn test_invalid_input_is_reported_before_missing_anchor() {
        let catalog = Catalog {
            deposits: vec![Product::deposit("1-Year Term", 1.3, 2.15)],
            wealth: vec![],
        };
        let mut bad = request(Mode::Deposit, 1.0, 10.0);
        bad.amount = -5.0;
        assert!(matches!(
            solve(&catalog, &bad),
            Err(SolveError::InvalidInput(_))
        ));
        assert_eq!(
            solve(&catalog, &request(Mode::Deposit, 1.0, 10.0)),
            Err(SolveError::MissingAnchor)
        );
    }

    #[test]
    fn test_all_anchor_scenario() {
        let catalog = Catalog {
            deposits: vec![Product::deposit("activity", 0.05, 2.4).with_tenor(
                crate::core::product::TenorClass::Instant,
            )],
            wealth: vec![],
        };
        let outcome = solve(&catalog, &request(Mode::Deposit, 0.05, 100.0)).unwrap();
        let result = &outcome.results()[0];
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].product.name, "activity");
        assert_eq!(result.entries[0].ratio, 100.0);
        assert!((result.client_rate - 0.05).abs() < 1e-9);
        assert!((result.bank_rate - 2.35).abs() < 1e-9);
    }

    #[test]
    fn test_all_anchor_from_document_without_tenor() {
        let catalog = Catalog::from_json(
            r#"{"deposits": [{"name": "activity", "clientRate": 0.05, "ftpRate": 2.4}], "wealth": []}"#,
        )
        .unwrap();
        let outcome = solve(&catalog, &request(Mode::Deposit, 0.05, 100.0)).unwrap();
        let result = &outcome.results()[0];
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].product.name, "activity");
        assert_eq!(result.entries[0].ratio, 100.0);
        assert!((result.client_rate - 0.05).abs() < 1e-9);
        assert!((result.bank_rate - 2.35).abs() < 1e-9);
    }

    #[test]
    fn test_target_above_max_is_infeasible_for_every_mode() {
        let catalog = Catalog::builtin();
        for mode in [Mode::Deposit, Mode::Wealth, Mode::Mixed] {
            for preference in Preference::ALL {
                let req = request(mode, 3.0, 10.0).with_preference(preference);
                let outcome = solve(&catalog, &req).unwrap();
                assert_eq!(
                    outcome,
                    SolveOutcome::Infeasible {
                        target_rate: 3.0,
                        max_achievable: catalog.max_client_rate(mode),
                    },
                    "{mode} / {preference}"
                );
            }
        }
    }

    #[test]
    fn test_feasible_results_are_well_formed() {
        let catalog = Catalog::builtin();
        let cases = [
            (Mode::Deposit, 1.0, 10.0),
            (Mode::Deposit, 1.1, 0.0),
            (Mode::Wealth, 1.9, 0.0),
            (Mode::Mixed, 1.5, 10.0),
            (Mode::Mixed, 1.2, 0.0),
        ];
        for (mode, target, floor) in cases {
            for preference in Preference::ALL {
                let req = request(mode, target, floor).with_preference(preference);
                let outcome = solve(&catalog, &req).unwrap();
                for result in outcome.results() {
                    assert!(
                        (result.total_ratio() - 100.0).abs() < RATIO_EPS,
                        "{mode} / {preference}: total {}",
                        result.total_ratio()
                    );
                    assert!(result.entries.iter().all(|e| e.ratio >= 0.0));
                    let (client, bank) = crate::core::allocation::blended_rates(&result.entries);
                    assert!((result.client_rate - client).abs() < 1e-6);
                    assert!((result.bank_rate - bank).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_solve_is_deterministic() {
        let catalog = Catalog::builtin();
        for preference in Preference::ALL {
            let req = request(Mode::Mixed, 1.4, 15.0).with_preference(preference);
            assert_eq!(solve(&catalog, &req), solve(&catalog, &req));
        }
    }

    #[test]
    fn test_interpolation_ratio() {
        assert!((interpolation_ratio(1.15, 1.0, 1.3) - 0.5).abs() < 1e-9);
        assert_eq!(interpolation_ratio(1.0, 1.0, 1.0), 0.5);
        assert_eq!(interpolation_ratio(2.0, 1.0, 1.5), 1.0);
    }

    #[test]
    fn test_required_rate() {
        // 10% at 0.05 plus 90% at r must average 1.0.
        let r = required_rate(1.0, 0.05, 10.0);
        assert!((0.05 * 0.1 + r * 0.9 - 1.0).abs() < 1e-9);
        assert_eq!(required_rate(1.2, 0.05, 0.0), 1.2);
    }
}
