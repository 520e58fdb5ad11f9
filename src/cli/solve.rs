use super::ui;
use crate::core::allocation::{AllocationResult, Preference};
use crate::core::product::Catalog;
use crate::core::solver::{self, SolveOutcome, SolveRequest};
use anyhow::Result;
use comfy_table::Cell;
use tracing::info;

impl AllocationResult {
    /// Renders the entries of this result for `amount` as a table followed by a summary.
    pub fn display_as_table(&self, amount: f64, currency: &str) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Product"),
            ui::header_cell("Type"),
            ui::header_cell("Tenor"),
            ui::header_cell("Ratio"),
            ui::header_cell("Amount"),
            ui::header_cell("Client Rate"),
            ui::header_cell("Annual Earning"),
        ]);

        for entry in &self.entries {
            let product_amount = entry.amount(amount);
            table.add_row(vec![
                Cell::new(&entry.product.name),
                Cell::new(entry.product.category().to_string()),
                Cell::new(entry.product.tenor.to_string()),
                ui::percent_cell(entry.ratio),
                ui::amount_cell(product_amount, currency),
                ui::percent_cell(entry.product.client_rate),
                ui::amount_cell(product_amount * entry.product.client_rate / 100.0, currency),
            ]);
        }

        let mut out = format!("{table}\n");
        out.push_str(&format!(
            "{} {}   {} {}   {} {}\n",
            ui::style_text("Client rate:", ui::StyleType::TotalLabel),
            ui::style_text(&format!("{:.2}%", self.client_rate), ui::StyleType::TotalValue),
            ui::style_text("Bank rate:", ui::StyleType::TotalLabel),
            ui::style_text(&format!("{:.2}%", self.bank_rate), ui::StyleType::TotalValue),
            ui::style_text("Liquidity score:", ui::StyleType::TotalLabel),
            format!("{:.0}", self.liquidity_score),
        ));
        out.push_str(&format!(
            "Client earning: {:.2} {currency}   Bank earning: {:.2} {currency}   Products: {}\n",
            self.client_earning(amount),
            self.bank_earning(amount),
            self.product_count(),
        ));
        if !self.description.is_empty() {
            out.push_str(&ui::style_text(&self.description, ui::StyleType::Subtle));
            out.push('\n');
        }
        out
    }
}

fn heading(result: &AllocationResult) -> String {
    let label = result
        .preference
        .map_or("Recommended allocation", |p| p.display_name());
    ui::style_text(label, ui::StyleType::Title)
}

/// Renders every result of `outcome`, or the infeasibility message.
pub fn render_outcome(outcome: &SolveOutcome, amount: f64, currency: &str) -> String {
    match outcome {
        SolveOutcome::Feasible(results) => results
            .iter()
            .map(|r| format!("\n{}\n\n{}", heading(r), r.display_as_table(amount, currency)))
            .collect::<Vec<_>>()
            .join("\n"),
        SolveOutcome::Infeasible {
            target_rate,
            max_achievable,
        } => ui::style_text(
            &format!(
                "Cannot reach the target rate of {target_rate:.2}%. The best these products can do is {max_achievable:.2}%. Lower the target or pick another allocation mode."
            ),
            ui::StyleType::Error,
        ),
    }
}

/// Solves `request` for each of `preferences` and prints the results.
pub fn run(
    catalog: &Catalog,
    request: &SolveRequest,
    preferences: &[Preference],
    currency: &str,
) -> Result<Vec<SolveOutcome>> {
    info!(
        mode = %request.mode,
        target = request.target_rate,
        "Solving allocation"
    );
    println!(
        "\n{} ({}): {:.2} {currency} at {:.2}%",
        ui::style_text("Allocation", ui::StyleType::Title),
        request.mode.display_name(),
        request.amount,
        request.target_rate,
    );

    let mut outcomes = Vec::with_capacity(preferences.len());
    for preference in preferences {
        let outcome = solver::solve(catalog, &request.with_preference(*preference))?;
        let infeasible = !outcome.is_feasible();
        println!("{}", render_outcome(&outcome, request.amount, currency));
        outcomes.push(outcome);
        // The target range does not depend on the preference.
        if infeasible {
            break;
        }
    }
    ui::print_separator();
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::allocation::Mode;

    fn request() -> SolveRequest {
        SolveRequest {
            amount: 1000.0,
            target_rate: 1.0,
            mode: Mode::Deposit,
            liquidity_ratio: 10.0,
            preference: Preference::Yield,
        }
    }

    #[test]
    fn test_display_as_table_lists_entries_and_totals() {
        let outcome = solver::solve(&Catalog::builtin(), &request()).unwrap();
        let text = outcome.results()[0].display_as_table(1000.0, "CNY");
        assert!(text.contains("Demand Deposit"));
        assert!(text.contains("100.00 CNY"));
        assert!(text.contains("Client rate:"));
        assert!(text.contains("Bank rate:"));
    }

    #[test]
    fn test_render_infeasible() {
        let outcome = SolveOutcome::Infeasible {
            target_rate: 3.0,
            max_achievable: 1.3,
        };
        let text = render_outcome(&outcome, 1000.0, "CNY");
        assert!(text.contains("3.00%"));
        assert!(text.contains("1.30%"));
    }

    #[test]
    fn test_run_all_preferences() {
        let outcomes = run(&Catalog::builtin(), &request(), &Preference::ALL, "CNY").unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.is_feasible()));
    }

    #[test]
    fn test_run_stops_after_infeasible() {
        let mut req = request();
        req.target_rate = 5.0;
        let outcomes = run(&Catalog::builtin(), &req, &Preference::ALL, "CNY").unwrap();
        assert_eq!(outcomes.len(), 1);
    }

    #[test]
    fn test_run_rejects_invalid_input() {
        let mut req = request();
        req.amount = 0.0;
        assert!(run(&Catalog::builtin(), &req, &[Preference::Yield], "CNY").is_err());
    }
}
