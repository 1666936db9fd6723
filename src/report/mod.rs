/// Report layer: aggregate the filtered rows into the buyer summary and the
/// wide deal-details table, then render both as a styled in-memory workbook.
pub mod tables;
pub mod workbook;
