use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::DealDataset;

// ---------------------------------------------------------------------------
// Filter criteria: date window plus minimum deal value
// ---------------------------------------------------------------------------

/// The date/value part of the active filter. The selected-buyer set is held
/// separately in the app state because buyer options are themselves derived
/// from the rows this criteria admits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterCriteria {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Minimum deal value in USD millions.
    pub min_value: f64,
}

/// Return indices of expanded rows that pass the date/value criteria.
///
/// Pure and order-preserving: applying it twice with the same criteria gives
/// the same indices. A row passes when:
/// * its date parsed and lies within `[from, to]` (both bounds inclusive), and
/// * its value parsed and is at least `min_value`.
///
/// Rows with a missing date or value never pass; malformed source rows are
/// silently excluded rather than surfaced as errors.
pub fn filtered_indices(dataset: &DealDataset, criteria: &FilterCriteria) -> Vec<usize> {
    dataset
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            let Some(date) = row.date else { return false };
            let Some(value) = row.value else { return false };
            date >= criteria.from && date <= criteria.to && value >= criteria.min_value
        })
        .map(|(i, _)| i)
        .collect()
}

/// Buyer names present in the filtered rows, sorted and deduplicated.
///
/// Options are derived from the already date/value-filtered set so buyers
/// with no deals in range never show up as choices.
pub fn buyer_options(dataset: &DealDataset, indices: &[usize]) -> BTreeSet<String> {
    indices
        .iter()
        .map(|&i| dataset.rows[i].buyer.clone())
        .collect()
}

/// Restrict filtered indices to rows belonging to one buyer, preserving order.
pub fn rows_for_buyer(dataset: &DealDataset, indices: &[usize], buyer: &str) -> Vec<usize> {
    indices
        .iter()
        .copied()
        .filter(|&i| dataset.rows[i].buyer == buyer)
        .collect()
}
