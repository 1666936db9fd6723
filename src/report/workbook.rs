use anyhow::Result;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::color::{FILL_TINTS, fill_for_slot, light_palette};
use crate::data::model::format_date;

use super::tables::{BuyerSummary, DetailsTable};

// ---------------------------------------------------------------------------
// Styled two-sheet workbook
// ---------------------------------------------------------------------------

/// Build the export workbook: a "Buyer Summary" sheet and a "Buyer Deal
/// Details" sheet, returned as finished `.xlsx` bytes.
///
/// Styling: thin borders and centered alignment on every cell, bold header
/// row, column widths sized to the longest rendered value, and a light fill
/// cycling per deal-triple slot on the details sheet.
///
/// Precondition: the filtered set is non-empty. Callers check emptiness and
/// show a no-op state instead of invoking the builder.
pub fn build_workbook(summary: &[BuyerSummary], details: &DetailsTable) -> Result<Vec<u8>> {
    debug_assert!(
        !summary.is_empty(),
        "export requested for an empty filtered set"
    );

    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Buyer Summary")?;
    write_grid(sheet, &summary_grid(summary), |_| None)?;

    let palette = light_palette(FILL_TINTS);
    let sheet = workbook.add_worksheet();
    sheet.set_name("Buyer Deal Details")?;
    write_grid(sheet, &details_grid(details), |col| {
        // Buyer Name column stays unfilled; each 3-column triple group takes
        // the tint of its slot index.
        (col > 0).then(|| fill_for_slot(&palette, (col - 1) / 3).to_string())
    })?;

    Ok(workbook.save_to_buffer()?)
}

// ---------------------------------------------------------------------------
// Grid rendering
// ---------------------------------------------------------------------------

enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    /// Length of the value as it will appear in the sheet, for the
    /// width-sizing heuristic.
    fn rendered_len(&self) -> usize {
        match self {
            Cell::Text(s) => s.chars().count(),
            Cell::Number(n) => format!("{n}").len(),
            Cell::Empty => 0,
        }
    }
}

fn summary_grid(summary: &[BuyerSummary]) -> Vec<Vec<Cell>> {
    let header = [
        "Buyer Name",
        "Number of Deals",
        "First Deal Date",
        "Last Deal Date",
        "Min Deal Value (USD mn)",
        "Max Deal Value (USD mn)",
    ];
    let mut grid = vec![header.iter().map(|h| Cell::Text(h.to_string())).collect()];
    for row in summary {
        grid.push(vec![
            Cell::Text(row.buyer.clone()),
            Cell::Number(row.deal_count as f64),
            Cell::Text(format_date(row.first_date)),
            Cell::Text(format_date(row.last_date)),
            Cell::Number(row.min_value),
            Cell::Number(row.max_value),
        ]);
    }
    grid
}

fn details_grid(details: &DetailsTable) -> Vec<Vec<Cell>> {
    let mut grid = vec![
        details
            .column_headers()
            .into_iter()
            .map(Cell::Text)
            .collect::<Vec<_>>(),
    ];
    for row in &details.rows {
        let mut cells = Vec::with_capacity(details.column_count());
        cells.push(Cell::Text(row.buyer.clone()));
        for deal in &row.deals {
            cells.push(Cell::Text(format_date(deal.date)));
            cells.push(Cell::Text(deal.target.clone()));
            cells.push(Cell::Number(deal.value));
        }
        // Buyers with fewer deals than the widest one pad with empty cells.
        cells.resize_with(details.column_count(), || Cell::Empty);
        grid.push(cells);
    }
    grid
}

/// Write one grid: bold header row, bordered/centered cells, auto-sized
/// columns, optional per-column background fill on data rows.
fn write_grid(
    sheet: &mut Worksheet,
    grid: &[Vec<Cell>],
    fill_for_col: impl Fn(usize) -> Option<String>,
) -> Result<(), XlsxError> {
    let base = Format::new()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let header = base.clone().set_bold();

    let n_cols = grid.first().map_or(0, Vec::len);
    let col_formats: Vec<Format> = (0..n_cols)
        .map(|col| match fill_for_col(col) {
            Some(color) => base.clone().set_background_color(color.as_str()),
            None => base.clone(),
        })
        .collect();

    for (row_idx, row) in grid.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let format = if row_idx == 0 {
                &header
            } else {
                &col_formats[col_idx]
            };
            let (r, c) = (row_idx as u32, col_idx as u16);
            match cell {
                Cell::Text(s) => sheet.write_string_with_format(r, c, s, format)?,
                Cell::Number(n) => sheet.write_number_with_format(r, c, *n, format)?,
                Cell::Empty => sheet.write_blank(r, c, format)?,
            };
        }
    }

    // Length-based width heuristic, matching what the cells will display.
    for col in 0..n_cols {
        let max_len = grid
            .iter()
            .filter_map(|row| row.get(col))
            .map(Cell::rendered_len)
            .max()
            .unwrap_or(0);
        sheet.set_column_width(col as u16, (max_len + 2) as f64)?;
    }

    Ok(())
}
