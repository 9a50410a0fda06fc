//! Persisting output tables
//!
//! CSV is the contract consumed by the dashboard; the workbook export is a
//! convenience copy of the same four tables.

mod workbook;

pub use workbook::export_workbook;

use crate::error::PipelineResult;
use crate::types::{CleanTable, LongObservation, SourceKind, TableKind};
use std::fs;
use std::path::{Path, PathBuf};

/// Cell text of one output row, in header order
pub fn table_row(kind: TableKind, obs: &LongObservation) -> Vec<String> {
    let mut row = vec![obs.entity.clone(), obs.period.year().to_string()];
    if kind.is_quarterly() {
        let quarter = obs.period.quarter().map(|q| q.label()).unwrap_or_default();
        row.push(quarter.to_string());
        row.push(obs.period.to_string());
    }
    row.push(obs.value.to_string());
    row.push(obs.growth.as_cell());
    row
}

/// Write a table, replacing any previous file wholesale.
///
/// Returns the number of data rows written.
pub fn write_table(path: &Path, kind: TableKind, rows: &[LongObservation]) -> PipelineResult<usize> {
    let staged = stage_table(path, kind, rows)?;
    staged.commit()?;
    Ok(rows.len())
}

/// A fully written table waiting to be renamed over its target
#[derive(Debug)]
pub struct StagedTable {
    tmp: PathBuf,
    target: PathBuf,
}

impl StagedTable {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Move the staged file into place
    pub fn commit(self) -> PipelineResult<()> {
        fs::rename(&self.tmp, &self.target)?;
        Ok(())
    }

    /// Remove the staged file, leaving the target untouched
    pub fn discard(self) {
        let _ = fs::remove_file(&self.tmp);
    }
}

/// Write a table to a sibling `.csv.tmp` file without touching the target.
///
/// A failed write removes the partial temp file.
pub fn stage_table(
    path: &Path,
    kind: TableKind,
    rows: &[LongObservation],
) -> PipelineResult<StagedTable> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("csv.tmp");
    let written = write_rows(&tmp, kind, rows);
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(StagedTable {
        tmp,
        target: path.to_path_buf(),
    })
}

fn write_rows(tmp: &Path, kind: TableKind, rows: &[LongObservation]) -> PipelineResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(tmp)?;
    writer.write_record(kind.headers())?;
    for obs in rows {
        writer.write_record(table_row(kind, obs))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a cleaned source table back out in wide form.
///
/// Columns are `S No`, the label column, then the period columns the source
/// actually carried; null values are empty cells.
pub fn write_clean_table(path: &Path, kind: SourceKind, table: &CleanTable) -> PipelineResult<usize> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)?;

    let mut headers = vec!["S No".to_string(), kind.label_header().to_string()];
    headers.extend(table.columns.iter().map(|c| c.label()));
    writer.write_record(&headers)?;

    for record in &table.records {
        let mut row = vec![record.ordinal.to_string(), record.label.clone()];
        row.extend(
            record
                .values
                .iter()
                .map(|v| v.map(|n| n.to_string()).unwrap_or_default()),
        );
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(table.records.len())
}
