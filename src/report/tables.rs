use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::data::model::{DealDataset, ExpandedDeal};

// ---------------------------------------------------------------------------
// ReportRow – a filtered row with date and value statically present
// ---------------------------------------------------------------------------

/// One (deal, buyer) pair admitted by the filters. The filter engine only
/// passes rows whose date and value parsed, so both are plain fields here.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub buyer: String,
    pub target: String,
    pub date: NaiveDate,
    pub value: f64,
}

impl ReportRow {
    /// Typed extraction from an expanded row; `None` when date or value is
    /// missing (such rows never pass the filters in the first place).
    pub fn from_expanded(row: &ExpandedDeal) -> Option<Self> {
        Some(ReportRow {
            buyer: row.buyer.clone(),
            target: row.target.clone(),
            date: row.date?,
            value: row.value?,
        })
    }
}

/// Materialise the filtered indices into report rows.
pub fn report_rows(dataset: &DealDataset, indices: &[usize]) -> Vec<ReportRow> {
    indices
        .iter()
        .filter_map(|&i| ReportRow::from_expanded(&dataset.rows[i]))
        .collect()
}

/// Drop exact-duplicate deals per buyer (same buyer, target, date, value),
/// keeping first occurrences. Guards against a deal string that listed the
/// same buyer twice being counted twice.
fn dedup_rows(rows: &[ReportRow]) -> Vec<ReportRow> {
    let mut seen: HashSet<(String, String, NaiveDate, u64)> = HashSet::new();
    rows.iter()
        .filter(|r| {
            seen.insert((
                r.buyer.clone(),
                r.target.clone(),
                r.date,
                r.value.to_bits(),
            ))
        })
        .cloned()
        .collect()
}

/// Round a deal value to 2 decimal places, the precision shown everywhere.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Buyer summary – one aggregated row per buyer
// ---------------------------------------------------------------------------

/// Aggregated statistics for one buyer over the filtered (deduplicated) set.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyerSummary {
    pub buyer: String,
    pub deal_count: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub min_value: f64,
    pub max_value: f64,
}

/// Group the filtered rows by buyer and aggregate. Grouping key is exact
/// buyer-name equality (names are trimmed at expansion time); output is
/// sorted by buyer name.
pub fn summary_rows(rows: &[ReportRow]) -> Vec<BuyerSummary> {
    let deduped = dedup_rows(rows);
    let mut grouped: BTreeMap<&str, Vec<&ReportRow>> = BTreeMap::new();
    for row in &deduped {
        grouped.entry(&row.buyer).or_default().push(row);
    }

    grouped
        .into_iter()
        .map(|(buyer, deals)| {
            let first_date = deals.iter().map(|d| d.date).min().unwrap_or_default();
            let last_date = deals.iter().map(|d| d.date).max().unwrap_or_default();
            let min_value = deals.iter().map(|d| d.value).fold(f64::INFINITY, f64::min);
            let max_value = deals
                .iter()
                .map(|d| d.value)
                .fold(f64::NEG_INFINITY, f64::max);
            BuyerSummary {
                buyer: buyer.to_string(),
                deal_count: deals.len(),
                first_date,
                last_date,
                min_value: round2(min_value),
                max_value: round2(max_value),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Deal details – one wide row per buyer
// ---------------------------------------------------------------------------

/// One deal flattened into the (date, target, value) column group.
#[derive(Debug, Clone, PartialEq)]
pub struct DealTriple {
    pub date: NaiveDate,
    pub target: String,
    pub value: f64,
}

/// One buyer's deals, sorted ascending by date.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailsRow {
    pub buyer: String,
    pub deals: Vec<DealTriple>,
}

/// The wide details table with its fixed two-phase schema: `max_deals` is
/// computed over all buyers first, and every row then spans
/// `1 + 3 * max_deals` columns, shorter rows padded with empty cells.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailsTable {
    pub max_deals: usize,
    pub rows: Vec<DetailsRow>,
}

impl DetailsTable {
    /// Total column count of the rendered table.
    pub fn column_count(&self) -> usize {
        1 + 3 * self.max_deals
    }

    /// The fixed header set: "Buyer Name", then one Date/Deal/Deal Value
    /// group per slot up to `max_deals`.
    pub fn column_headers(&self) -> Vec<String> {
        let mut headers = vec!["Buyer Name".to_string()];
        for i in 1..=self.max_deals {
            headers.push(format!("Date {i}"));
            headers.push(format!("Deal {i}"));
            headers.push(format!("Deal Value {i} (in Mn USD)"));
        }
        headers
    }
}

/// Build the details table: dedup, group by buyer, sort each buyer's deals
/// ascending by date, and size the schema from the largest group. Output rows
/// are sorted by buyer name, matching the summary sheet.
pub fn details_table(rows: &[ReportRow]) -> DetailsTable {
    let mut grouped: BTreeMap<String, Vec<DealTriple>> = BTreeMap::new();
    for row in dedup_rows(rows) {
        grouped.entry(row.buyer).or_default().push(DealTriple {
            date: row.date,
            target: row.target,
            value: round2(row.value),
        });
    }

    let mut details_rows = Vec::with_capacity(grouped.len());
    for (buyer, mut deals) in grouped {
        deals.sort_by_key(|d| d.date);
        details_rows.push(DetailsRow { buyer, deals });
    }

    let max_deals = details_rows.iter().map(|r| r.deals.len()).max().unwrap_or(0);
    DetailsTable {
        max_deals,
        rows: details_rows,
    }
}
