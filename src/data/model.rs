use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// DealRecord – one row of the source table
// ---------------------------------------------------------------------------

/// A single transaction as it appears in the source file.
///
/// Dates and values that failed to parse are carried as `None` so that a
/// malformed row degrades to "excluded by the filters" instead of aborting
/// the load.
#[derive(Debug, Clone, PartialEq)]
pub struct DealRecord {
    pub target: String,
    pub date: Option<NaiveDate>,
    /// Deal value in USD millions.
    pub value: Option<f64>,
    pub deal_type: String,
    /// Raw comma-separated buyer list, exactly as found in the source.
    pub buyers_raw: String,
}

impl DealRecord {
    /// Split the raw buyer field into clean buyer names: split on commas,
    /// trim whitespace, drop empty tokens.
    pub fn buyer_tokens(&self) -> Vec<String> {
        self.buyers_raw
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ExpandedDeal – one (deal, buyer) pair
// ---------------------------------------------------------------------------

/// A deal record duplicated once per associated buyer. All fields other than
/// `buyer` are shared with the source record; `buyers_raw` is kept so the
/// co-investor view can be derived.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedDeal {
    pub buyer: String,
    pub target: String,
    pub date: Option<NaiveDate>,
    pub value: Option<f64>,
    pub deal_type: String,
    pub buyers_raw: String,
}

impl ExpandedDeal {
    /// Buyers on the same deal other than this row's own buyer.
    pub fn co_investors(&self) -> Vec<String> {
        self.buyers_raw
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != self.buyer)
            .map(str::to_string)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// DealDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset: original records plus the buyer-expanded view,
/// with precomputed ranges for initialising the filter controls.
#[derive(Debug, Clone)]
pub struct DealDataset {
    /// Source rows, one per transaction (never mutated after load).
    pub records: Vec<DealRecord>,
    /// Expanded rows, one per (deal, buyer) pair. A record whose buyer field
    /// yields no valid token contributes nothing here.
    pub rows: Vec<ExpandedDeal>,
    /// Min/max over rows with a parsed date.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Min/max over rows with a parsed value.
    pub value_range: Option<(f64, f64)>,
}

impl DealDataset {
    /// Expand the loaded records into one row per buyer and index the ranges.
    pub fn from_records(records: Vec<DealRecord>) -> Self {
        let mut rows = Vec::new();
        for rec in &records {
            for buyer in rec.buyer_tokens() {
                rows.push(ExpandedDeal {
                    buyer,
                    target: rec.target.clone(),
                    date: rec.date,
                    value: rec.value,
                    deal_type: rec.deal_type.clone(),
                    buyers_raw: rec.buyers_raw.clone(),
                });
            }
        }

        let mut date_range: Option<(NaiveDate, NaiveDate)> = None;
        let mut value_range: Option<(f64, f64)> = None;
        for row in &rows {
            if let Some(d) = row.date {
                date_range = Some(match date_range {
                    Some((lo, hi)) => (lo.min(d), hi.max(d)),
                    None => (d, d),
                });
            }
            if let Some(v) = row.value {
                value_range = Some(match value_range {
                    Some((lo, hi)) => (lo.min(v), hi.max(v)),
                    None => (v, v),
                });
            }
        }

        DealDataset {
            records,
            rows,
            date_range,
            value_range,
        }
    }

    /// Number of expanded rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the expanded view is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Render a date the way the report and the per-buyer views show it.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}
