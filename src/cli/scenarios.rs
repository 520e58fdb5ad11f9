use super::ui;
use crate::core::allocation::Mode;
use crate::core::custom::{self, CustomEntry};
use crate::core::product::Catalog;
use crate::core::scenario::{self, Comparison, Scenario};
use crate::store::ScenarioBook;
use anyhow::Result;
use comfy_table::Cell;
use tracing::info;

impl Comparison {
    /// Renders the per-product breakdown, the totals and the ranking.
    pub fn display_as_table(&self, currency: &str) -> String {
        let mut table = ui::new_styled_table();
        let mut header = vec![ui::header_cell("Product"), ui::header_cell("Type")];
        for scenario in &self.scenarios {
            let title = if scenario.is_best {
                format!("{} ★ best", scenario.name)
            } else {
                scenario.name.clone()
            };
            header.push(ui::header_cell(&title));
        }
        table.set_header(header);

        for (name, category) in &self.products {
            let mut row = vec![Cell::new(name), Cell::new(category.to_string())];
            for scenario in &self.scenarios {
                row.push(match scenario.entry(name, *category) {
                    Some(e) => Cell::new(format!(
                        "{:.2}% | {:.2} {currency}\n+{:.2} ({:.1}%)",
                        e.ratio, e.amount, e.earning, e.contribution
                    )),
                    None => ui::na_cell(false),
                });
            }
            table.add_row(row);
        }

        let mut rate_row = vec![Cell::new("Client rate"), Cell::new("")];
        let mut earning_row = vec![Cell::new("Annual earning"), Cell::new("")];
        for scenario in &self.scenarios {
            let rate = format!("{:.2}%", scenario.client_rate);
            rate_row.push(if scenario.is_best {
                ui::highlight_cell(rate)
            } else {
                ui::percent_cell(scenario.client_rate)
            });
            earning_row.push(ui::amount_cell(scenario.total_earning, currency));
        }
        table.add_row(rate_row);
        table.add_row(earning_row);

        let mut out = format!("{table}\n");
        for (place, index) in self.ranking.iter().enumerate() {
            let s = &self.scenarios[*index];
            let line = format!(
                "{}. {} ({}, {:.2} {currency}, saved {}): {:.2}%",
                place + 1,
                s.name,
                s.mode.display_name(),
                s.amount,
                s.created_at,
                s.client_rate
            );
            if s.is_best {
                out.push_str(&format!("{} {line}\n", ui::style_text(" BEST ", ui::StyleType::Best)));
            } else {
                out.push_str(&format!("       {line}\n"));
            }
        }

        if !self.inconsistencies.is_empty() {
            out.push_str(&ui::style_text(
                "\nSome saved products are no longer in the catalog:\n",
                ui::StyleType::Warning,
            ));
            for issue in &self.inconsistencies {
                out.push_str(&format!(
                    "  - {}: {} ({})\n",
                    issue.scenario, issue.product, issue.category
                ));
            }
        }
        out
    }
}

fn render_list(scenarios: &[Scenario], currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Name"),
        ui::header_cell("Type"),
        ui::header_cell("Amount"),
        ui::header_cell("Client Rate"),
        ui::header_cell("Products"),
        ui::header_cell("Saved"),
    ]);
    for s in scenarios {
        let products = s
            .allocations
            .iter()
            .map(|a| format!("{} {:.0}%", a.name, a.ratio))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(s.id),
            Cell::new(&s.name),
            Cell::new(s.mode.display_name()),
            ui::amount_cell(s.amount, currency),
            ui::percent_cell(s.client_rate),
            Cell::new(products),
            Cell::new(&s.created_at),
        ]);
    }
    table.to_string()
}

/// Evaluates a custom split and keeps it as a new scenario.
pub async fn run_save(
    book: &ScenarioBook,
    catalog: &Catalog,
    mode: Mode,
    amount: f64,
    entries: &[CustomEntry],
) -> Result<Scenario> {
    if !amount.is_finite() || amount <= 0.0 {
        anyhow::bail!("Amount must be a positive number, got {amount}");
    }
    let result = custom::evaluate(catalog, mode, entries)?;
    let scenario = book.save(mode, amount, &result).await?;
    println!(
        "Saved {} (id {}) at {:.2}%",
        ui::style_text(&scenario.name, ui::StyleType::TotalLabel),
        scenario.id,
        scenario.client_rate
    );
    Ok(scenario)
}

pub async fn run_list(book: &ScenarioBook, currency: &str) -> Result<Vec<Scenario>> {
    let scenarios = book.list().await?;
    if scenarios.is_empty() {
        println!("{}", ui::style_text("No saved scenarios", ui::StyleType::Subtle));
    } else {
        println!("{}", render_list(&scenarios, currency));
    }
    Ok(scenarios)
}

pub async fn run_delete(book: &ScenarioBook, id: i64) -> Result<()> {
    if !book.delete(id).await? {
        anyhow::bail!("No saved scenario with id {id}");
    }
    println!("Deleted scenario {id}");
    Ok(())
}

/// Compares two or three saved scenarios side by side.
pub async fn run_compare(
    book: &ScenarioBook,
    catalog: &Catalog,
    ids: &[i64],
    currency: &str,
) -> Result<Comparison> {
    let scenarios = book.get_many(ids).await?;
    let comparison = scenario::compare(&scenarios, catalog)?;
    info!(
        count = comparison.scenarios.len(),
        inconsistencies = comparison.inconsistencies.len(),
        "Compared scenarios"
    );
    println!(
        "\n{}\n",
        ui::style_text("Scenario comparison", ui::StyleType::Title)
    );
    println!("{}", comparison.display_as_table(currency));
    Ok(comparison)
}
