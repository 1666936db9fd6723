use std::collections::HashSet;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::filter::rows_for_buyer;
use crate::data::model::{DealDataset, ExpandedDeal, format_date};
use crate::report::tables::{ReportRow, summary_rows};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Per-buyer summaries (central panel)
// ---------------------------------------------------------------------------

/// Render the per-buyer narrative view in the central panel.
pub fn buyer_view(ui: &mut Ui, state: &AppState) {
    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a deal table to begin  (File → Open…)");
            });
            return;
        }
    };

    ui.heading("PE/VC Deal Explorer");
    ui.separator();

    // Empty selection is its own state, not "show everything".
    if state.selected_buyers.is_empty() {
        ui.label("Please select at least one buyer from the filter panel.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for buyer in &state.selected_buyers {
                ui.separator();
                ui.heading(format!("Summary for: {buyer}"));

                let deals = buyer_deals(dataset, &state.visible_indices, buyer);
                if deals.is_empty() {
                    // A selected buyer can lose all deals to a later filter
                    // tweak; warn instead of erroring.
                    ui.label(RichText::new("No deals found.").color(Color32::YELLOW));
                    continue;
                }

                summary_lines(ui, &deals);

                ui.strong("Investments");
                investments_grid(ui, buyer, &deals);
                ui.add_space(6.0);

                ui.strong("Co-investors");
                co_investors_grid(ui, buyer, &deals);
                ui.add_space(6.0);
            }
        });
}

/// This buyer's filtered deals: exact duplicates (target, date, value)
/// dropped, remainder sorted ascending by date. Mirrors what the report
/// sheets show for the same buyer.
fn buyer_deals<'a>(
    dataset: &'a DealDataset,
    indices: &[usize],
    buyer: &str,
) -> Vec<&'a ExpandedDeal> {
    let mut seen = HashSet::new();
    let mut deals: Vec<&ExpandedDeal> = rows_for_buyer(dataset, indices, buyer)
        .into_iter()
        .map(|i| &dataset.rows[i])
        .filter(|d| {
            seen.insert((
                d.target.clone(),
                d.date,
                d.value.map(f64::to_bits),
            ))
        })
        .collect();
    deals.sort_by_key(|d| d.date);
    deals
}

fn summary_lines(ui: &mut Ui, deals: &[&ExpandedDeal]) {
    let rows: Vec<ReportRow> = deals.iter().filter_map(|d| ReportRow::from_expanded(d)).collect();
    let Some(summary) = summary_rows(&rows).into_iter().next() else {
        return;
    };
    ui.label(format!("Total deals: {}", summary.deal_count));
    ui.label(format!(
        "First investment: {}",
        format_date(summary.first_date)
    ));
    ui.label(format!(
        "Most recent investment: {}",
        format_date(summary.last_date)
    ));
    ui.label(format!("Min deal value: ${:.2} mn", summary.min_value));
    ui.label(format!("Max deal value: ${:.2} mn", summary.max_value));
    ui.add_space(6.0);
}

fn investments_grid(ui: &mut Ui, buyer: &str, deals: &[&ExpandedDeal]) {
    egui::Grid::new(format!("investments_{buyer}"))
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            ui.strong("Date");
            ui.strong("Target company");
            ui.strong("Value (USD mn)");
            ui.strong("Deal type");
            ui.end_row();

            for deal in deals {
                ui.label(deal.date.map(format_date).unwrap_or_default());
                ui.label(&deal.target);
                ui.label(format!("{:.2}", deal.value.unwrap_or_default()));
                ui.label(&deal.deal_type);
                ui.end_row();
            }
        });
}

fn co_investors_grid(ui: &mut Ui, buyer: &str, deals: &[&ExpandedDeal]) {
    egui::Grid::new(format!("co_investors_{buyer}"))
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            ui.strong("Date");
            ui.strong("Target company");
            ui.strong("Co-investors");
            ui.strong("Deal type");
            ui.end_row();

            for deal in deals {
                ui.label(deal.date.map(format_date).unwrap_or_default());
                ui.label(&deal.target);
                ui.label(deal.co_investors().join(", "));
                ui.label(&deal.deal_type);
                ui.end_row();
            }
        });
}
