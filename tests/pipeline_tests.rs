//! End-to-end pipeline tests
//!
//! Builds a small data directory (annual CSVs plus monthly workbooks) in a
//! temp dir and checks the four persisted tables byte for byte.

use pretty_assertions::assert_eq;
use regstats::types::{SourceKind, TableKind};
use regstats::{Pipeline, PipelineConfig};
use rust_xlsxwriter::Workbook;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ANNUAL_HEADER: &str = "Vehicle Class Wise Registrations\nState: All,,,,,,,\n,,,,,,,\nS No,Vehicle Category,2025,2024,2023,2022,2021,TOTAL\n";

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// A monthly cell as it appears in a published workbook
#[derive(Clone, Copy)]
enum Cell {
    Num(f64),
    Text(&'static str),
    Blank,
}

// ═══════════════════════════════════════════════════════════════════════════
// FIXTURES
// ═══════════════════════════════════════════════════════════════════════════

fn data_dir(dir: &TempDir) -> PathBuf {
    dir.path().join("data")
}

fn write_annual(dir: &TempDir, file: &str, body: &str) {
    let yearly = data_dir(dir).join("yearly");
    fs::create_dir_all(&yearly).unwrap();
    fs::write(yearly.join(file), format!("{}{}", ANNUAL_HEADER, body)).unwrap();
}

/// Monthly workbook: title rows, a header row, then one row per entity
fn write_monthly(dir: &TempDir, file: &str, label_header: &str, rows: &[(&str, Vec<Cell>)]) {
    write_monthly_columns(dir, file, label_header, &MONTHS, true, rows);
}

fn write_monthly_columns(
    dir: &TempDir,
    file: &str,
    label_header: &str,
    months: &[&str],
    with_total: bool,
    rows: &[(&str, Vec<Cell>)],
) {
    let monthly = data_dir(dir).join("monthly");
    fs::create_dir_all(&monthly).unwrap();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Month Wise Registrations").unwrap();
    sheet.write_string(1, 0, "State: All").unwrap();

    sheet.write_string(3, 0, "S No").unwrap();
    sheet.write_string(3, 1, label_header).unwrap();
    for (i, month) in months.iter().enumerate() {
        sheet.write_string(3, 2 + i as u16, *month).unwrap();
    }
    if with_total {
        sheet.write_string(3, 2 + months.len() as u16, "TOTAL").unwrap();
    }

    for (r, (label, cells)) in rows.iter().enumerate() {
        let row = 4 + r as u32;
        sheet.write_number(row, 0, (r + 1) as f64).unwrap();
        sheet.write_string(row, 1, *label).unwrap();
        for (c, cell) in cells.iter().enumerate() {
            let col = 2 + c as u16;
            match cell {
                Cell::Num(n) => {
                    sheet.write_number(row, col, *n).unwrap();
                }
                Cell::Text(t) => {
                    sheet.write_string(row, col, *t).unwrap();
                }
                Cell::Blank => {}
            }
        }
    }
    workbook.save(monthly.join(file)).unwrap();
}

fn every_month(n: f64) -> Vec<Cell> {
    vec![Cell::Num(n); 12]
}

fn config_for(dir: &TempDir) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.data_dir = data_dir(dir);
    config.output_dir = data_dir(dir).join("processed");
    config
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

fn standard_dataset(dir: &TempDir) {
    write_annual(
        dir,
        "2021-2025_VCLASS.csv",
        "1,TWO WHEELER(NT),110,100,80,60,50,400\n\
         2,TWO WHEELER(T),0,0,0,0,0,0\n\
         3,THREE WHEELER(T),5,4,0,0,0,9\n\
         4,LIGHT MOTOR VEHICLE,12,12,12,12,12,60\n\
         5,FOUR WHEELER (Invalid Carriage),\"1,000\",\"1,000\",\"1,000\",\"1,000\",\"1,000\",\"5,000\"\n",
    );
    write_annual(
        dir,
        "2021-2025_MAKER.csv",
        "1,HONDA MOTORCYCLE AND SCOOTER INDIA (P) LTD,120,100,,,,220\n\
         2,\"TATA MOTORS, LTD\",0,50,40,-,-,90\n",
    );
    write_monthly(
        dir,
        "2023_monthly_VC.xlsx",
        "Vehicle Category",
        &[("TWO WHEELER(NT)", every_month(5.0))],
    );
    write_monthly(
        dir,
        "2024_monthly_VC.xlsx",
        "Vehicle Category",
        &[("TWO WHEELER(NT)", every_month(10.0))],
    );

    let mut honda = vec![Cell::Num(10.0), Cell::Num(10.0), Cell::Num(10.0)];
    honda.extend([Cell::Num(0.0); 6]);
    honda.extend([Cell::Num(5.0), Cell::Blank, Cell::Blank]);
    let mut tvs = vec![Cell::Text("1,200")];
    tvs.extend([Cell::Blank; 11]);
    write_monthly(
        dir,
        "2024_monthly_MAKER.xlsx",
        "Maker",
        &[("HONDA", honda), ("TVS", tvs)],
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// FULL RUN
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_group_yoy_table() {
    let dir = TempDir::new().unwrap();
    standard_dataset(&dir);
    let config = config_for(&dir);
    let output = config.output_dir.clone();

    Pipeline::new(config).run().unwrap();

    assert_eq!(
        read(&output.join(TableKind::AnnualCategory.file_name())),
        "Group,Year,Registrations,YoY_pct\n\
         2W,2021,50,\n\
         2W,2022,60,20.00\n\
         2W,2023,80,33.33\n\
         2W,2024,100,25.00\n\
         2W,2025,110,10.00\n\
         3W,2021,0,\n\
         3W,2022,0,\n\
         3W,2023,0,\n\
         3W,2024,4,\n\
         3W,2025,5,25.00\n\
         4W,2021,1012,\n\
         4W,2022,1012,0.00\n\
         4W,2023,1012,0.00\n\
         4W,2024,1012,0.00\n\
         4W,2025,1012,0.00\n"
    );
}

#[test]
fn test_maker_yoy_table() {
    let dir = TempDir::new().unwrap();
    standard_dataset(&dir);
    let config = config_for(&dir);
    let output = config.output_dir.clone();

    Pipeline::new(config).run().unwrap();

    // Null years are dropped, so growth resumes only where a predecessor exists
    assert_eq!(
        read(&output.join(TableKind::AnnualMaker.file_name())),
        "Maker,Year,Registrations,YoY_pct\n\
         HONDA MOTORCYCLE AND SCOOTER INDIA (P) LTD,2024,100,\n\
         HONDA MOTORCYCLE AND SCOOTER INDIA (P) LTD,2025,120,20.00\n\
         \"TATA MOTORS, LTD\",2023,40,\n\
         \"TATA MOTORS, LTD\",2024,50,25.00\n\
         \"TATA MOTORS, LTD\",2025,0,-100.00\n"
    );
}

#[test]
fn test_quarterly_tables() {
    let dir = TempDir::new().unwrap();
    standard_dataset(&dir);
    let config = config_for(&dir);
    let output = config.output_dir.clone();

    Pipeline::new(config).run().unwrap();

    assert_eq!(
        read(&output.join(TableKind::QuarterlyCategory.file_name())),
        "Group,Year,Quarter,Year_Quarter,Registrations,QoQ_pct\n\
         2W,2023,Q1,2023-Q1,15,\n\
         2W,2023,Q2,2023-Q2,15,0.00\n\
         2W,2023,Q3,2023-Q3,15,0.00\n\
         2W,2023,Q4,2023-Q4,15,0.00\n\
         2W,2024,Q1,2024-Q1,30,100.00\n\
         2W,2024,Q2,2024-Q2,30,0.00\n\
         2W,2024,Q3,2024-Q3,30,0.00\n\
         2W,2024,Q4,2024-Q4,30,0.00\n"
    );

    assert_eq!(
        read(&output.join(TableKind::QuarterlyMaker.file_name())),
        "Maker,Year,Quarter,Year_Quarter,Registrations,QoQ_pct\n\
         HONDA,2024,Q1,2024-Q1,30,\n\
         HONDA,2024,Q2,2024-Q2,0,-100.00\n\
         HONDA,2024,Q3,2024-Q3,0,\n\
         HONDA,2024,Q4,2024-Q4,5,\n\
         TVS,2024,Q1,2024-Q1,1200,\n\
         TVS,2024,Q2,2024-Q2,0,-100.00\n\
         TVS,2024,Q3,2024-Q3,0,\n\
         TVS,2024,Q4,2024-Q4,0,\n"
    );
}

#[test]
fn test_rerun_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    standard_dataset(&dir);
    let config = config_for(&dir);
    let output = config.output_dir.clone();
    let pipeline = Pipeline::new(config);

    pipeline.run().unwrap();
    let first: Vec<Vec<u8>> = TableKind::ALL
        .iter()
        .map(|k| fs::read(output.join(k.file_name())).unwrap())
        .collect();

    pipeline.run().unwrap();
    let second: Vec<Vec<u8>> = TableKind::ALL
        .iter()
        .map(|k| fs::read(output.join(k.file_name())).unwrap())
        .collect();

    assert_eq!(first, second);
    assert!(!output.join("maker_yoy.csv.tmp").exists());
}

#[test]
fn test_report_counts() {
    let dir = TempDir::new().unwrap();
    standard_dataset(&dir);
    let run = Pipeline::new(config_for(&dir)).run().unwrap();
    let report = &run.report;

    assert!(report.is_complete());
    assert_eq!(report.tables.len(), 4);
    assert!(report.unwritten.is_empty());
    // 2021, 2022, 2025 category workbooks; 2021-2023, 2025 maker workbooks
    assert_eq!(report.missing.len(), 7);
    assert!(report.drift.is_empty());
    assert!(report.diagnostics.is_empty());

    let group = &report.tables[0];
    assert_eq!(group.kind, TableKind::AnnualCategory);
    assert_eq!(group.rows, 15);
    assert_eq!(group.undefined_growth, 3);
}

// ═══════════════════════════════════════════════════════════════════════════
// DEGRADED SOURCES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_unreadable_workbook_is_skipped() {
    let dir = TempDir::new().unwrap();
    standard_dataset(&dir);
    fs::write(
        data_dir(&dir).join("monthly").join("2022_monthly_MAKER.xlsx"),
        b"not a workbook",
    )
    .unwrap();

    let config = config_for(&dir);
    let output = config.output_dir.clone();
    let run = Pipeline::new(config).run().unwrap();

    assert!(!run.report.is_complete());
    assert_eq!(run.report.skipped.len(), 1);
    assert_eq!(run.report.skipped[0].kind, SourceKind::MonthlyMaker);
    assert_eq!(run.report.skipped[0].year, Some(2022));
    // The 2024 workbook still feeds the table
    assert!(read(&output.join("maker_quarterly_qoq.csv")).contains("TVS,2024,Q1,2024-Q1,1200,"));
}

#[test]
fn test_truncated_workbook_reports_drift() {
    let dir = TempDir::new().unwrap();
    write_monthly_columns(
        &dir,
        "2024_monthly_MAKER.xlsx",
        "Maker",
        &MONTHS[..6],
        false,
        &[("HONDA", vec![Cell::Num(1.0); 6])],
    );

    let config = config_for(&dir);
    let output = config.output_dir.clone();
    let run = Pipeline::new(config).run().unwrap();

    assert_eq!(run.report.drift.len(), 1);
    let drift = &run.report.drift[0];
    assert_eq!(drift.found, 8);
    assert_eq!(drift.dropped.first().map(String::as_str), Some("JUL"));
    assert_eq!(drift.dropped.last().map(String::as_str), Some("TOTAL"));

    assert_eq!(
        read(&output.join("maker_quarterly_qoq.csv")),
        "Maker,Year,Quarter,Year_Quarter,Registrations,QoQ_pct\n\
         HONDA,2024,Q1,2024-Q1,3,\n\
         HONDA,2024,Q2,2024-Q2,3,0.00\n"
    );
}

#[test]
fn test_unmatched_categories_are_reported_not_summed() {
    let dir = TempDir::new().unwrap();
    write_annual(
        &dir,
        "2021-2025_VCLASS.csv",
        "1,TWO WHEELER(NT),1,1,1,1,1,5\n2,AGRICULTURAL TRACTOR,9,9,9,9,9,45\n",
    );

    let config = config_for(&dir);
    let output = config.output_dir.clone();
    let run = Pipeline::new(config).run().unwrap();

    assert_eq!(run.report.diagnostics.len(), 1);
    assert!(run.report.diagnostics[0].is_unmatched());
    let table = read(&output.join("vehicle_category_group_yoy.csv"));
    assert!(table.contains("2W,2025,1,0.00"));
    assert!(!table.contains("3W"));
    assert!(!table.contains("4W"));
}
