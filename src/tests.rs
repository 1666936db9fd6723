use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;

use crate::data::cache;
use crate::data::filter::{FilterCriteria, buyer_options, filtered_indices, rows_for_buyer};
use crate::data::loader::load_file;
use crate::data::model::{DealDataset, DealRecord, format_date};
use crate::report::tables::{ReportRow, details_table, round2, summary_rows};
use crate::report::workbook::build_workbook;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("deal-explorer-{prefix}-{nanos}"))
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
}

fn deal(target: &str, date: Option<&str>, value: Option<f64>, buyers: &str) -> DealRecord {
    DealRecord {
        target: target.to_string(),
        date: date.map(d),
        value,
        deal_type: "Buyout".to_string(),
        buyers_raw: buyers.to_string(),
    }
}

fn report_row(buyer: &str, target: &str, date: &str, value: f64) -> ReportRow {
    ReportRow {
        buyer: buyer.to_string(),
        target: target.to_string(),
        date: d(date),
        value,
    }
}

fn wide_criteria() -> FilterCriteria {
    FilterCriteria {
        from: d("2000-01-01"),
        to: d("2030-12-31"),
        min_value: 0.0,
    }
}

const CSV_HEADER: &str = "Target Company Name,Date,Deal Value (USD mn),Deal Type,Buyer (s)";

fn write_csv(prefix: &str, rows: &[&str]) -> PathBuf {
    let dir = unique_test_dir(prefix);
    fs::create_dir_all(&dir).expect("should create temp dir");
    let path = dir.join("deals.csv");
    let mut content = String::from(CSV_HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    fs::write(&path, content).expect("should write fixture csv");
    path
}

// ---------------------------------------------------------------------------
// Expansion
// ---------------------------------------------------------------------------

#[test]
fn expansion_creates_one_row_per_buyer() {
    let ds = DealDataset::from_records(vec![deal(
        "Acme",
        Some("2021-03-15"),
        Some(12.5),
        "Alpha Capital,  Beta Partners , Gamma Fund",
    )]);

    assert_eq!(ds.records.len(), 1);
    assert_eq!(ds.rows.len(), 3, "3 buyer tokens should give 3 rows");

    let buyers: Vec<&str> = ds.rows.iter().map(|r| r.buyer.as_str()).collect();
    assert_eq!(buyers, vec!["Alpha Capital", "Beta Partners", "Gamma Fund"]);

    // Rows differ only in the buyer field.
    for row in &ds.rows {
        assert_eq!(row.target, "Acme");
        assert_eq!(row.date, Some(d("2021-03-15")));
        assert_eq!(row.value, Some(12.5));
    }
}

#[test]
fn record_with_no_valid_buyer_is_dropped_from_expansion() {
    // Deliberate lossy behavior: a deal that cannot be attributed to any
    // buyer contributes nothing to the expanded view.
    let ds = DealDataset::from_records(vec![
        deal("Orphan Co", Some("2021-01-01"), Some(5.0), " ,  , "),
        deal("Kept Co", Some("2021-02-01"), Some(6.0), "Alpha"),
    ]);

    assert_eq!(ds.records.len(), 2, "source records are never mutated");
    assert_eq!(ds.rows.len(), 1);
    assert_eq!(ds.rows[0].target, "Kept Co");
}

#[test]
fn co_investors_exclude_the_rows_own_buyer() {
    let ds = DealDataset::from_records(vec![deal(
        "Acme",
        Some("2021-01-01"),
        Some(5.0),
        "Alpha, Beta, Gamma",
    )]);

    let alpha_row = ds.rows.iter().find(|r| r.buyer == "Alpha").unwrap();
    assert_eq!(alpha_row.co_investors(), vec!["Beta", "Gamma"]);
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

#[test]
fn csv_loader_parses_and_expands() {
    let path = write_csv(
        "csv-load",
        &[
            "Acme,2021-03-15,12.5,Buyout,\"Alpha, Beta\"",
            "Widgets,2022-07-01,3.25,Growth,Gamma",
        ],
    );

    let ds = load_file(&path).expect("load should succeed");
    assert_eq!(ds.records.len(), 2);
    assert_eq!(ds.rows.len(), 3);
    assert_eq!(ds.date_range, Some((d("2021-03-15"), d("2022-07-01"))));
    assert_eq!(ds.value_range, Some((3.25, 12.5)));

    fs::remove_dir_all(path.parent().unwrap()).expect("should cleanup temp dir");
}

#[test]
fn unparseable_date_and_value_load_as_missing() {
    let path = write_csv(
        "csv-missing",
        &["Acme,not-a-date,not-a-number,Buyout,Alpha"],
    );

    let ds = load_file(&path).expect("malformed cells should not fail the load");
    assert_eq!(ds.rows.len(), 1);
    assert_eq!(ds.rows[0].date, None);
    assert_eq!(ds.rows[0].value, None);

    fs::remove_dir_all(path.parent().unwrap()).expect("should cleanup temp dir");
}

#[test]
fn loader_accepts_multiple_date_formats() {
    let path = write_csv(
        "csv-dates",
        &[
            "A,2021-03-15,1.0,Buyout,Alpha",
            "B,15-03-2021,1.0,Buyout,Alpha",
            "C,15/03/2021,1.0,Buyout,Alpha",
        ],
    );

    let ds = load_file(&path).expect("load should succeed");
    for row in &ds.rows {
        assert_eq!(row.date, Some(d("2021-03-15")));
    }

    fs::remove_dir_all(path.parent().unwrap()).expect("should cleanup temp dir");
}

#[test]
fn missing_required_column_is_fatal() {
    let dir = unique_test_dir("csv-bad-header");
    fs::create_dir_all(&dir).expect("should create temp dir");
    let path = dir.join("deals.csv");
    fs::write(&path, "Target Company Name,Date,Deal Type,Buyer (s)\nAcme,2021-01-01,Buyout,Alpha")
        .expect("should write fixture csv");

    let err = load_file(&path).expect_err("load should fail loudly");
    assert!(
        err.to_string().contains("Deal Value (USD mn)"),
        "error should name the missing column: {err:#}"
    );

    fs::remove_dir_all(&dir).expect("should cleanup temp dir");
}

#[test]
fn unsupported_extension_is_rejected() {
    let err = load_file(std::path::Path::new("deals.parquet")).expect_err("should fail");
    assert!(err.to_string().contains("parquet"));
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[test]
fn cache_returns_the_same_dataset_per_path() {
    let path = write_csv("cache-hit", &["Acme,2021-03-15,12.5,Buyout,Alpha"]);

    let first = cache::load(&path).expect("first load");
    let second = cache::load(&path).expect("second load");
    assert!(
        Arc::ptr_eq(&first, &second),
        "same path should hit the cached dataset"
    );

    fs::remove_dir_all(path.parent().unwrap()).expect("should cleanup temp dir");
}

#[test]
fn cache_invalidation_hook_forces_a_reparse() {
    let path = write_csv("cache-invalidate", &["Acme,2021-03-15,12.5,Buyout,Alpha"]);

    let first = cache::load(&path).expect("first load");
    cache::invalidate_all();
    let second = cache::load(&path).expect("load after invalidation");
    assert!(!Arc::ptr_eq(&first, &second), "invalidation should reparse");

    fs::remove_dir_all(path.parent().unwrap()).expect("should cleanup temp dir");
}

// ---------------------------------------------------------------------------
// Filter engine
// ---------------------------------------------------------------------------

fn filter_fixture() -> DealDataset {
    DealDataset::from_records(vec![
        deal("A", Some("2021-01-10"), Some(5.0), "Alpha"),
        deal("B", Some("2021-06-01"), Some(50.0), "Beta"),
        deal("C", Some("2022-01-10"), Some(2.0), "Gamma"),
        deal("D", None, Some(99.0), "Delta"),
        deal("E", Some("2021-03-03"), None, "Epsilon"),
    ])
}

#[test]
fn filter_is_idempotent_and_order_preserving() {
    let ds = filter_fixture();
    let criteria = wide_criteria();

    let once = filtered_indices(&ds, &criteria);
    let twice = filtered_indices(&ds, &criteria);
    assert_eq!(once, twice, "same criteria must give the same result set");

    let mut sorted = once.clone();
    sorted.sort_unstable();
    assert_eq!(once, sorted, "source order is preserved");
}

#[test]
fn date_bounds_are_inclusive() {
    let ds = DealDataset::from_records(vec![
        deal("Before", Some("2021-01-09"), Some(1.0), "Alpha"),
        deal("AtFrom", Some("2021-01-10"), Some(1.0), "Alpha"),
        deal("Inside", Some("2021-03-01"), Some(1.0), "Alpha"),
        deal("AtTo", Some("2021-06-10"), Some(1.0), "Alpha"),
        deal("After", Some("2021-06-11"), Some(1.0), "Alpha"),
    ]);
    let criteria = FilterCriteria {
        from: d("2021-01-10"),
        to: d("2021-06-10"),
        min_value: 0.0,
    };

    let names: Vec<&str> = filtered_indices(&ds, &criteria)
        .into_iter()
        .map(|i| ds.rows[i].target.as_str())
        .collect();
    assert_eq!(names, vec!["AtFrom", "Inside", "AtTo"]);
}

#[test]
fn minimum_value_is_an_inclusive_threshold() {
    let ds = DealDataset::from_records(vec![
        deal("Under", Some("2021-01-01"), Some(9.99), "Alpha"),
        deal("Exact", Some("2021-01-01"), Some(10.0), "Alpha"),
        deal("Over", Some("2021-01-01"), Some(10.01), "Alpha"),
    ]);
    let criteria = FilterCriteria {
        min_value: 10.0,
        ..wide_criteria()
    };

    let names: Vec<&str> = filtered_indices(&ds, &criteria)
        .into_iter()
        .map(|i| ds.rows[i].target.as_str())
        .collect();
    assert_eq!(names, vec!["Exact", "Over"]);
}

#[test]
fn rows_with_missing_date_or_value_never_pass() {
    let ds = filter_fixture();
    let indices = filtered_indices(&ds, &wide_criteria());

    for &i in &indices {
        assert!(ds.rows[i].date.is_some());
        assert!(ds.rows[i].value.is_some());
    }
    assert_eq!(indices.len(), 3, "the two malformed rows are excluded");
}

#[test]
fn buyer_options_come_from_the_filtered_set_only() {
    let ds = filter_fixture();
    // Window that only admits deal B.
    let criteria = FilterCriteria {
        from: d("2021-05-01"),
        to: d("2021-07-01"),
        min_value: 0.0,
    };

    let indices = filtered_indices(&ds, &criteria);
    let options = buyer_options(&ds, &indices);
    assert_eq!(options.len(), 1);
    assert!(options.contains("Beta"));
    assert!(
        !options.contains("Alpha"),
        "buyers with no deals in range must not be offered"
    );
}

#[test]
fn selecting_a_buyer_with_no_deals_in_range_yields_an_empty_listing() {
    let ds = filter_fixture();
    let indices = filtered_indices(&ds, &wide_criteria());

    // The UI renders a warning line for this; the core must simply return
    // nothing rather than erroring.
    let rows = rows_for_buyer(&ds, &indices, "Nobody Capital");
    assert!(rows.is_empty());
}

// ---------------------------------------------------------------------------
// Report tables
// ---------------------------------------------------------------------------

#[test]
fn summary_aggregates_count_dates_and_value_extremes() {
    let rows = vec![
        report_row("Alpha", "A", "2021-01-01", 2.5),
        report_row("Alpha", "B", "2021-06-01", 7.0),
        report_row("Alpha", "C", "2022-03-01", 3.25),
    ];

    let summary = summary_rows(&rows);
    assert_eq!(summary.len(), 1);
    let s = &summary[0];
    assert_eq!(s.buyer, "Alpha");
    assert_eq!(s.deal_count, 3);
    assert_eq!(s.first_date, d("2021-01-01"));
    assert_eq!(s.last_date, d("2022-03-01"));
    assert_eq!(s.min_value, 2.5);
    assert_eq!(s.max_value, 7.0);
}

#[test]
fn summary_values_round_to_two_decimals() {
    let rows = vec![
        report_row("Alpha", "A", "2021-01-01", 3.14159),
        report_row("Alpha", "B", "2021-02-01", 9.876),
    ];

    let s = &summary_rows(&rows)[0];
    assert_eq!(s.min_value, 3.14);
    assert_eq!(s.max_value, 9.88);
    assert_eq!(round2(12.0), 12.0);
}

#[test]
fn details_width_follows_the_largest_buyer() {
    let mut rows = vec![report_row("One", "Solo", "2021-01-01", 1.0)];
    for i in 0..3 {
        rows.push(report_row("Three", &format!("T{i}"), "2021-02-01", 1.0));
    }
    for i in 0..5 {
        rows.push(report_row("Five", &format!("F{i}"), "2021-03-01", 1.0));
    }

    let table = details_table(&rows);
    assert_eq!(table.max_deals, 5);
    assert_eq!(table.column_count(), 16, "1 + 3*5 columns");
    let headers = table.column_headers();
    assert_eq!(headers.len(), 16);
    assert_eq!(headers[0], "Buyer Name");
    assert_eq!(
        headers[13..].to_vec(),
        vec!["Date 5", "Deal 5", "Deal Value 5 (in Mn USD)"]
    );

    let one = table.rows.iter().find(|r| r.buyer == "One").unwrap();
    // 1 deal fills 3 columns; the remaining 16 - 1 - 3 = 12 render empty.
    assert_eq!(table.column_count() - 1 - 3 * one.deals.len(), 12);
}

#[test]
fn details_triples_are_sorted_ascending_by_date() {
    let rows = vec![
        report_row("Alpha", "Late", "2022-05-01", 1.0),
        report_row("Alpha", "Early", "2021-01-01", 2.0),
        report_row("Alpha", "Middle", "2021-08-01", 3.0),
    ];

    let table = details_table(&rows);
    let targets: Vec<&str> = table.rows[0].deals.iter().map(|t| t.target.as_str()).collect();
    assert_eq!(targets, vec!["Early", "Middle", "Late"]);
}

#[test]
fn duplicate_deals_collapse_in_both_tables() {
    // Same buyer, target, date, value listed twice — e.g. a buyer string
    // that named the buyer twice before expansion.
    let rows = vec![
        report_row("Alpha", "Acme", "2021-01-01", 5.0),
        report_row("Alpha", "Acme", "2021-01-01", 5.0),
        report_row("Alpha", "Other", "2021-02-01", 6.0),
    ];

    let summary = summary_rows(&rows);
    assert_eq!(summary[0].deal_count, 2);

    let table = details_table(&rows);
    assert_eq!(table.rows[0].deals.len(), 2);
}

#[test]
fn near_duplicates_are_kept() {
    // Differing value ⇒ not an exact duplicate ⇒ both count.
    let rows = vec![
        report_row("Alpha", "Acme", "2021-01-01", 5.0),
        report_row("Alpha", "Acme", "2021-01-01", 5.5),
    ];

    assert_eq!(summary_rows(&rows)[0].deal_count, 2);
}

// ---------------------------------------------------------------------------
// Workbook
// ---------------------------------------------------------------------------

#[test]
fn workbook_builds_a_nonempty_xlsx_buffer() {
    let rows = vec![
        report_row("Alpha", "Acme", "2021-01-01", 2.5),
        report_row("Alpha", "Widgets", "2021-06-01", 7.0),
        report_row("Beta", "Gizmos", "2021-03-01", 3.25),
    ];
    let summary = summary_rows(&rows);
    let details = details_table(&rows);

    let bytes = build_workbook(&summary, &details).expect("workbook should build");
    assert!(
        bytes.starts_with(b"PK\x03\x04"),
        "xlsx output is a zip container"
    );
}

#[test]
fn workbook_building_does_not_mutate_its_input() {
    let rows = vec![
        report_row("Alpha", "Acme", "2021-01-01", 2.5),
        report_row("Beta", "Gizmos", "2021-03-01", 3.25),
    ];
    let summary = summary_rows(&rows);
    let details = details_table(&rows);
    let summary_before = summary.clone();
    let details_before = details.clone();

    build_workbook(&summary, &details).expect("workbook should build");

    assert_eq!(summary, summary_before);
    assert_eq!(details, details_before);
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

#[test]
fn dates_render_day_first() {
    assert_eq!(format_date(d("2021-03-05")), "05-03-2021");
}
