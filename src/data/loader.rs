use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, open_workbook_auto};
use chrono::NaiveDate;

use super::model::{DealDataset, DealRecord};

// Required source columns, matched by exact header text.
pub const COL_TARGET: &str = "Target Company Name";
pub const COL_DATE: &str = "Date";
pub const COL_VALUE: &str = "Deal Value (USD mn)";
pub const COL_TYPE: &str = "Deal Type";
pub const COL_BUYERS: &str = "Buyer (s)";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a deal dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xls` – spreadsheet, first sheet, header row first
/// * `.csv`           – same columns, header row first
///
/// A missing required column or an unreadable file is a fatal error. Cells
/// whose date or value cannot be parsed load as missing and are left to the
/// filters to exclude.
pub fn load_file(path: &Path) -> Result<DealDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xls" | "xlsm" => load_spreadsheet(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Column lookup
// ---------------------------------------------------------------------------

struct ColumnIndices {
    target: usize,
    date: usize,
    value: usize,
    deal_type: usize,
    buyers: usize,
}

fn locate_columns(headers: &[String]) -> Result<ColumnIndices> {
    let find = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .with_context(|| format!("source table is missing the '{name}' column"))
    };
    Ok(ColumnIndices {
        target: find(COL_TARGET)?,
        date: find(COL_DATE)?,
        value: find(COL_VALUE)?,
        deal_type: find(COL_TYPE)?,
        buyers: find(COL_BUYERS)?,
    })
}

// ---------------------------------------------------------------------------
// Spreadsheet loader (calamine)
// ---------------------------------------------------------------------------

fn load_spreadsheet(path: &Path) -> Result<DealDataset> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open spreadsheet: {}", path.display()))?;

    let range = workbook
        .worksheet_range_at(0)
        .context("workbook contains no sheets")?
        .context("failed to read the first sheet")?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .context("sheet has no header row")?
        .iter()
        .map(cell_to_string)
        .collect();
    let cols = locate_columns(&headers)?;

    let empty = Data::Empty;
    let mut records = Vec::new();
    for row in rows {
        let cell = |idx: usize| row.get(idx).unwrap_or(&empty);
        records.push(DealRecord {
            target: cell_to_string(cell(cols.target)).trim().to_string(),
            date: cell_to_date(cell(cols.date)),
            value: cell_to_value(cell(cols.value)),
            deal_type: cell_to_string(cell(cols.deal_type)).trim().to_string(),
            buyers_raw: cell_to_string(cell(cols.buyers)),
        });
    }

    Ok(DealDataset::from_records(records))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.to_string(),
        Data::DateTimeIso(v) => v.to_string(),
        Data::DurationIso(v) => v.to_string(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}

fn cell_to_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|ndt| ndt.date()),
        Data::DateTimeIso(s) | Data::String(s) => parse_date_str(s),
        _ => None,
    }
}

fn cell_to_value(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(v) => Some(*v),
        Data::Int(v) => Some(*v as f64),
        Data::String(s) => parse_value_str(s),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<DealDataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let cols = locate_columns(&headers)?;

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let field = |idx: usize| record.get(idx).unwrap_or("");
        records.push(DealRecord {
            target: field(cols.target).trim().to_string(),
            date: parse_date_str(field(cols.date)),
            value: parse_value_str(field(cols.value)),
            deal_type: field(cols.deal_type).trim().to_string(),
            buyers_raw: field(cols.buyers).to_string(),
        });
    }

    Ok(DealDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// Field parsing
// ---------------------------------------------------------------------------

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

/// Parse a date string against the accepted formats; anything else is missing.
fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    // ISO datetime strings carry a time suffix; the date prefix is enough.
    let date_part = s.split(['T', ' ']).next().unwrap_or(s);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Parse a deal value, tolerating thousands separators; anything else is missing.
fn parse_value_str(s: &str) -> Option<f64> {
    s.trim().replace(',', "").parse::<f64>().ok()
}
