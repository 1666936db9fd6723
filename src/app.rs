use std::path::Path;

use eframe::egui;

use crate::state::AppState;
use crate::ui::{buyers, panels};

/// The source table lives at a fixed, known location; loaded once per
/// process on startup when present.
const DEFAULT_DATASET: &str = "Deal Screening Data.xlsx";

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DealExplorerApp {
    pub state: AppState,
}

impl DealExplorerApp {
    pub fn new() -> Self {
        let mut state = AppState::default();
        let default = Path::new(DEFAULT_DATASET);
        if default.exists() {
            state.load_from(default);
        }
        Self { state }
    }
}

impl Default for DealExplorerApp {
    fn default() -> Self {
        Self::new()
    }
}

impl eframe::App for DealExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Pump the export progress bar while one is running.
        if self.state.advance_export() {
            ctx.request_repaint();
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters and export ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: per-buyer summaries ----
        egui::CentralPanel::default().show(ctx, |ui| {
            buyers::buyer_view(ui, &self.state);
        });
    }
}
