use super::ui;
use crate::core::allocation::{AllocationResult, Mode};
use crate::core::custom::{self, CustomEntry, Suggestion, TargetFit};
use crate::core::product::Catalog;
use anyhow::Result;
use comfy_table::Cell;
use tracing::info;

/// Prints the blended rates of a user-specified split.
pub fn run_evaluate(
    catalog: &Catalog,
    mode: Mode,
    amount: f64,
    entries: &[CustomEntry],
    currency: &str,
) -> Result<AllocationResult> {
    if !amount.is_finite() || amount <= 0.0 {
        anyhow::bail!("Amount must be a positive number, got {amount}");
    }
    let result = custom::evaluate(catalog, mode, entries)?;
    info!(client_rate = result.client_rate, "Evaluated custom allocation");

    println!(
        "\n{} ({})\n",
        ui::style_text("Custom allocation", ui::StyleType::Title),
        mode.display_name()
    );
    println!("{}", result.display_as_table(amount, currency));
    Ok(result)
}

impl Suggestion {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Product"),
            ui::header_cell("Type"),
            ui::header_cell("Client Rate"),
            ui::header_cell("Ratio"),
            ui::header_cell("Source"),
        ]);
        let rows = self
            .fixed
            .iter()
            .map(|e| (e, "fixed"))
            .chain(self.suggested.iter().map(|e| (e, "suggested")));
        for (entry, source) in rows {
            table.add_row(vec![
                Cell::new(&entry.product.name),
                Cell::new(entry.product.category().to_string()),
                ui::percent_cell(entry.product.client_rate),
                ui::percent_cell(entry.ratio),
                Cell::new(source),
            ]);
        }

        let fit = match self.fit {
            TargetFit::Met => ui::style_text("Meets the target rate", ui::StyleType::TotalValue),
            TargetFit::Above(diff) => ui::style_text(
                &format!("Above the target rate by {diff:.2}%"),
                ui::StyleType::Warning,
            ),
            TargetFit::Below(diff) => ui::style_text(
                &format!("Below the target rate by {diff:.2}%"),
                ui::StyleType::Error,
            ),
        };
        format!(
            "{table}\nFixed: {:.0}%, remaining: {:.0}% (needs {:.2}%)\nPredicted rate: {}\n{fit}\n",
            100.0 - self.remaining,
            self.remaining,
            self.required_rate,
            ui::style_text(&format!("{:.2}%", self.predicted_rate), ui::StyleType::TotalValue),
        )
    }
}

/// Prints a proposed fill for the part of the split not covered by `fixed`.
pub fn run_suggest(
    catalog: &Catalog,
    mode: Mode,
    fixed: &[CustomEntry],
    target_rate: f64,
) -> Result<Option<Suggestion>> {
    let suggestion = custom::suggest(catalog, mode, fixed, target_rate)?;
    match &suggestion {
        Some(s) => {
            info!(predicted = s.predicted_rate, "Suggested remainder");
            println!(
                "\n{}\n",
                ui::style_text("Suggested allocation", ui::StyleType::Title)
            );
            println!("{}", s.display_as_table());
        }
        None => println!(
            "{}",
            ui::style_text(
                "Nothing to suggest: the split is already full or no other product is available",
                ui::StyleType::Subtle
            )
        ),
    }
    Ok(suggestion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_table() {
        let fixed = vec!["Demand Deposit=10".parse().unwrap()];
        let suggestion = run_suggest(&Catalog::builtin(), Mode::Deposit, &fixed, 1.0)
            .unwrap()
            .unwrap();
        let text = suggestion.display_as_table();
        assert!(text.contains("suggested"));
        assert!(text.contains("Above the target rate"));
    }

    #[test]
    fn test_run_evaluate_rejects_incomplete_split() {
        let entries = vec!["Demand Deposit=50".parse().unwrap()];
        assert!(run_evaluate(&Catalog::builtin(), Mode::Deposit, 1000.0, &entries, "CNY").is_err());
    }
}
