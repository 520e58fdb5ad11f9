use super::{solve::render_outcome, ui};
use crate::core::optimizer;
use crate::core::product::Catalog;
use crate::core::solver::SolveOutcome;
use anyhow::Result;
use tracing::info;

/// Searches every one- and two-product mix for the best bank margin at `target_rate`.
pub fn run(catalog: &Catalog, amount: f64, target_rate: f64, currency: &str) -> Result<SolveOutcome> {
    if !amount.is_finite() || amount <= 0.0 {
        anyhow::bail!("Amount must be a positive number, got {amount}");
    }
    info!(target_rate, "Running margin optimizer");

    let outcome = optimizer::optimize(catalog, target_rate)?;
    println!(
        "\n{}: {:.2} {currency} at {:.2}%",
        ui::style_text("Highest bank margin", ui::StyleType::Title),
        amount,
        target_rate,
    );
    println!("{}", render_outcome(&outcome, amount, currency));
    ui::print_separator();
    Ok(outcome)
}
