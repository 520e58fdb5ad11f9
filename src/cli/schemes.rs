use super::ui;
use crate::core::product::Catalog;
use crate::core::scheme::{BankScheme, SchemeEvaluation};
use anyhow::Result;
use comfy_table::Cell;
use tracing::warn;

impl BankScheme {
    /// One-line summary of the scheme's split.
    pub fn products_summary(&self) -> String {
        self.products
            .iter()
            .map(|p| format!("{} {:.0}%", p.name, p.ratio))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Renders the overview table of `schemes` evaluated against `catalog`.
pub fn render_overview(schemes: &[BankScheme], catalog: &Catalog, amount: f64, currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Scheme"),
        ui::header_cell("Type"),
        ui::header_cell("Preference"),
        ui::header_cell("Products"),
        ui::header_cell("Client Rate"),
        ui::header_cell("Bank Rate"),
        ui::header_cell("Client Earning"),
    ]);

    for scheme in schemes {
        let mut row = vec![
            Cell::new(scheme.id),
            Cell::new(&scheme.name),
            Cell::new(scheme.mode.display_name()),
            Cell::new(scheme.preference.display_name()),
            Cell::new(scheme.products_summary()),
        ];
        match scheme.evaluate(catalog) {
            SchemeEvaluation::Valid(result) => {
                row.push(ui::highlight_cell(format!("{:.2}%", result.client_rate)));
                row.push(ui::percent_cell(result.bank_rate));
                row.push(ui::amount_cell(result.client_earning(amount), currency));
            }
            SchemeEvaluation::Incomplete { total_ratio } => {
                warn!(scheme = %scheme.name, total_ratio, "Scheme ratios do not add up to 100");
                row.push(Cell::new(format!("ratios total {total_ratio:.2}%")));
                row.push(ui::na_cell(true));
                row.push(ui::na_cell(true));
            }
            SchemeEvaluation::InvalidProducts { missing } => {
                warn!(scheme = %scheme.name, ?missing, "Scheme names unknown products");
                row.push(Cell::new(format!("unknown: {}", missing.join(", "))));
                row.push(ui::na_cell(true));
                row.push(ui::na_cell(true));
            }
        }
        table.add_row(row);
    }
    table.to_string()
}

/// Prints the enabled schemes, or the one matching `id` in detail.
pub fn run(
    schemes: &[BankScheme],
    catalog: &Catalog,
    amount: f64,
    id: Option<i64>,
    currency: &str,
) -> Result<()> {
    if let Some(id) = id {
        let scheme = schemes
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| anyhow::anyhow!("No bank scheme with id {id}"))?;
        println!(
            "\n{} ({}, {})\n{}\n",
            ui::style_text(&scheme.name, ui::StyleType::Title),
            scheme.mode.display_name(),
            scheme.preference.display_name(),
            scheme.description,
        );
        match scheme.evaluate(catalog) {
            SchemeEvaluation::Valid(result) => println!("{}", result.display_as_table(amount, currency)),
            SchemeEvaluation::Incomplete { total_ratio } => anyhow::bail!(
                "Scheme '{}' ratios add up to {total_ratio:.2}%, not 100%",
                scheme.name
            ),
            SchemeEvaluation::InvalidProducts { missing } => anyhow::bail!(
                "Scheme '{}' uses products missing from the catalog: {}",
                scheme.name,
                missing.join(", ")
            ),
        }
        return Ok(());
    }

    let enabled: Vec<BankScheme> = schemes.iter().filter(|s| s.enabled).cloned().collect();
    if enabled.is_empty() {
        println!(
            "{}",
            ui::style_text("No bank schemes are enabled", ui::StyleType::Subtle)
        );
        return Ok(());
    }
    println!(
        "\n{} for {:.2} {currency}\n",
        ui::style_text("Bank schemes", ui::StyleType::Title),
        amount
    );
    println!("{}", render_overview(&enabled, catalog, amount, currency));
    Ok(())
}
