use std::sync::Arc;

use eframe::egui::{self, Color32, DragValue, ProgressBar, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::state::{AppState, ExportState};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets and export
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Date range ----
            ui.strong("From date");
            ui.add(DatePickerButton::new(&mut state.from_date).id_salt("from_date"));
            ui.strong("To date");
            ui.add(DatePickerButton::new(&mut state.to_date).id_salt("to_date"));
            ui.separator();

            // ---- Minimum deal value ----
            ui.strong("Minimum deal value (USD mn)");
            if let Some((lo, hi)) = dataset.value_range {
                ui.add(
                    DragValue::new(&mut state.min_value)
                        .range(lo..=hi)
                        .speed(1.0)
                        .fixed_decimals(2),
                );
                ui.label(format!("Min: {lo:.2}, Max: {hi:.2}"));
            }
            ui.separator();

            // ---- Buyer multi-select (options come from the filtered set) ----
            let options = state.buyer_options();
            let header_text = format!(
                "Buyers  ({}/{})",
                state.selected_buyers.len(),
                options.len()
            );
            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.selected_buyers = options.clone();
                        }
                        if ui.small_button("None").clicked() {
                            state.selected_buyers.clear();
                        }
                    });
                    for buyer in &options {
                        let mut checked = state.selected_buyers.contains(buyer);
                        if ui.checkbox(&mut checked, buyer).changed() {
                            state.toggle_buyer(buyer);
                        }
                    }
                });
            ui.separator();

            export_section(ui, state);
        });

    // Recompute the filtered set after any widget changes.
    state.refilter();
}

// ---------------------------------------------------------------------------
// Export section
// ---------------------------------------------------------------------------

enum ExportAction {
    None,
    Begin,
    Save(Arc<Vec<u8>>),
}

fn export_section(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Export filtered buyers");

    // Empty filtered set: the report builder is never reached from here.
    if state.visible_indices.is_empty() {
        ui.label("No deals match the current filters.");
        return;
    }

    let mut action = ExportAction::None;
    match &state.export {
        ExportState::Idle => {
            if ui.button("Generate Excel output").clicked() {
                action = ExportAction::Begin;
            }
        }
        ExportState::Preparing { progress } => {
            ui.label("Preparing your Excel file…");
            ui.add(ProgressBar::new(*progress).show_percentage());
        }
        ExportState::Ready { bytes } => {
            ui.label("File is ready!");
            if ui.button("Save Output.xlsx…").clicked() {
                action = ExportAction::Save(Arc::clone(bytes));
            }
            if ui.button("Regenerate").clicked() {
                action = ExportAction::Begin;
            }
        }
    }

    match action {
        ExportAction::None => {}
        ExportAction::Begin => state.begin_export(),
        ExportAction::Save(bytes) => save_workbook(state, &bytes),
    }
}

fn save_workbook(state: &mut AppState, bytes: &[u8]) {
    let file = rfd::FileDialog::new()
        .set_title("Save deal report")
        .set_file_name("Output.xlsx")
        .add_filter("Excel workbook", &["xlsx"])
        .save_file();

    if let Some(path) = file {
        match std::fs::write(&path, bytes) {
            Ok(()) => log::info!("Saved report to {}", path.display()),
            Err(e) => {
                log::error!("Failed to save report: {e}");
                state.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} deals loaded, {} rows in range",
                ds.records.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open deal table")
        .add_filter("Supported files", &["xlsx", "xls", "xlsm", "csv"])
        .add_filter("Excel", &["xlsx", "xls", "xlsm"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.load_from(&path);
    }
}
