use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::data::cache;
use crate::data::filter::{FilterCriteria, buyer_options, filtered_indices};
use crate::data::model::DealDataset;
use crate::report::tables::{details_table, report_rows, summary_rows};
use crate::report::workbook::build_workbook;

// ---------------------------------------------------------------------------
// Export lifecycle
// ---------------------------------------------------------------------------

/// Per-frame advance of the export progress bar. Cosmetic feedback only; the
/// workbook is built once when the bar completes.
const EXPORT_PROGRESS_STEP: f32 = 0.04;

/// State of the spreadsheet export.
pub enum ExportState {
    Idle,
    /// Progress bar running; the workbook is built when it reaches 1.0.
    Preparing { progress: f32 },
    /// Finished artifact held in memory until saved or invalidated.
    Ready { bytes: Arc<Vec<u8>> },
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until a file loads).
    pub dataset: Option<Arc<DealDataset>>,

    /// Path the dataset came from.
    pub source_path: Option<PathBuf>,

    /// Date-range filter bounds (inclusive).
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,

    /// Minimum deal value filter, USD millions.
    pub min_value: f64,

    /// Buyers picked in the multi-select. Empty means "nothing selected",
    /// which is a distinct display state from "all buyers".
    pub selected_buyers: BTreeSet<String>,

    /// Indices of expanded rows passing the date/value filters (cached).
    pub visible_indices: Vec<usize>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Spreadsheet export lifecycle.
    pub export: ExportState,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            source_path: None,
            from_date: NaiveDate::default(),
            to_date: NaiveDate::default(),
            min_value: 0.0,
            selected_buyers: BTreeSet::new(),
            visible_indices: Vec::new(),
            status_message: None,
            export: ExportState::Idle,
        }
    }
}

impl AppState {
    /// Load a source table through the process-wide cache and make it the
    /// active dataset. A failure leaves the previous dataset untouched.
    pub fn load_from(&mut self, path: &Path) {
        match cache::load(path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} deals ({} buyer rows) from {}",
                    dataset.records.len(),
                    dataset.len(),
                    path.display()
                );
                self.source_path = Some(path.to_path_buf());
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a loaded dataset and seed the filter controls from its ranges.
    pub fn set_dataset(&mut self, dataset: Arc<DealDataset>) {
        if let Some((lo, hi)) = dataset.date_range {
            self.from_date = lo;
            self.to_date = hi;
        }
        self.min_value = dataset.value_range.map(|(lo, _)| lo).unwrap_or(0.0);
        self.selected_buyers.clear();
        self.visible_indices = Vec::new();
        self.status_message = None;
        self.export = ExportState::Idle;
        self.dataset = Some(dataset);
        self.refilter();
    }

    /// The active date/value criteria.
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            from: self.from_date,
            to: self.to_date,
            min_value: self.min_value,
        }
    }

    /// Recompute `visible_indices` from the current criteria. When the
    /// filtered set actually changes, the buyer selection is pruned to names
    /// still on offer and any prepared export artifact is discarded as stale.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else { return };
        let indices = filtered_indices(ds, &self.criteria());
        if indices == self.visible_indices {
            return;
        }
        let options = buyer_options(ds, &indices);
        self.selected_buyers.retain(|b| options.contains(b));
        self.visible_indices = indices;
        self.export = ExportState::Idle;
    }

    /// Buyer names offered in the multi-select, derived from the filtered set.
    pub fn buyer_options(&self) -> BTreeSet<String> {
        match &self.dataset {
            Some(ds) => buyer_options(ds, &self.visible_indices),
            None => BTreeSet::new(),
        }
    }

    pub fn toggle_buyer(&mut self, buyer: &str) {
        if !self.selected_buyers.remove(buyer) {
            self.selected_buyers.insert(buyer.to_string());
        }
    }

    // -- Export lifecycle -------------------------------------------------

    /// Start the export cycle. Exporting an empty filtered set is prevented
    /// here, at the presentation boundary.
    pub fn begin_export(&mut self) {
        if self.visible_indices.is_empty() {
            return;
        }
        self.export = ExportState::Preparing { progress: 0.0 };
    }

    /// Advance the progress bar one frame; build the workbook on completion.
    /// Returns true while an export is running, so the caller keeps
    /// repainting.
    pub fn advance_export(&mut self) -> bool {
        let ExportState::Preparing { progress } = &mut self.export else {
            return false;
        };
        *progress += EXPORT_PROGRESS_STEP;
        if *progress >= 1.0 {
            self.finish_export();
        }
        true
    }

    fn finish_export(&mut self) {
        let Some(ds) = &self.dataset else {
            self.export = ExportState::Idle;
            return;
        };
        let rows = report_rows(ds, &self.visible_indices);
        let summary = summary_rows(&rows);
        let details = details_table(&rows);
        match build_workbook(&summary, &details) {
            Ok(bytes) => {
                log::info!("Prepared Output.xlsx ({} bytes)", bytes.len());
                self.export = ExportState::Ready {
                    bytes: Arc::new(bytes),
                };
            }
            Err(e) => {
                log::error!("Failed to build workbook: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
                self.export = ExportState::Idle;
            }
        }
    }
}
