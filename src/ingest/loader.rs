//! Tabular loader: irregular source sheet → `CleanTable`

use super::normalizer::parse_ordinal;
use super::sources::read_grid;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{CleanRecord, CleanTable, PeriodColumn, RawRecord, SchemaDrift};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Declared column layout of a source sheet.
///
/// Columns are named by position: ordinal, label, the period columns in
/// source order, then optional trailing columns (`TOTAL`). Header text in
/// the sheet itself is never consulted.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    /// Leading title/metadata rows to skip
    pub header_rows: usize,
    pub periods: Vec<PeriodColumn>,
    pub trailing: Vec<String>,
    /// Worksheet name for workbook sources
    pub sheet: Option<String>,
}

impl TableSchema {
    /// Ordinal and label
    pub const ID_COLUMNS: usize = 2;

    /// Names of every declared column, in position order
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec!["S No".to_string(), "Label".to_string()];
        names.extend(self.periods.iter().map(|p| p.label()));
        names.extend(self.trailing.iter().cloned());
        names
    }

    /// Columns a source must carry to keep every period
    pub fn required_width(&self) -> usize {
        Self::ID_COLUMNS + self.periods.len()
    }
}

/// Loads one source sheet against a declared schema
pub struct TableLoader {
    path: PathBuf,
    schema: TableSchema,
}

impl TableLoader {
    pub fn new<P: AsRef<Path>>(path: P, schema: TableSchema) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            schema,
        }
    }

    /// Read and clean the source file
    pub fn load(&self) -> PipelineResult<CleanTable> {
        debug!(path = %self.path.display(), "loading source");
        let grid = read_grid(&self.path, self.schema.sheet.as_deref())?;
        self.load_grid(grid)
    }

    /// Clean an already-read grid of cell text
    pub fn load_grid(&self, grid: Vec<Vec<String>>) -> PipelineResult<CleanTable> {
        let body: Vec<Vec<String>> = grid.into_iter().skip(self.schema.header_rows).collect();
        let width = body.iter().map(Vec::len).max().unwrap_or(0);

        if width == 0 {
            return Err(PipelineError::Schema {
                path: self.path.clone(),
                reason: format!(
                    "no columns after skipping {} header rows",
                    self.schema.header_rows
                ),
            });
        }

        let drift = self.check_width(width);
        let period_count = width
            .saturating_sub(TableSchema::ID_COLUMNS)
            .min(self.schema.periods.len());
        let columns = self.schema.periods[..period_count].to_vec();

        let records: Vec<CleanRecord> = body
            .iter()
            .filter_map(|row| raw_record(row, period_count))
            .map(RawRecord::clean)
            .collect();

        debug!(
            path = %self.path.display(),
            records = records.len(),
            columns = columns.len(),
            "source cleaned"
        );

        Ok(CleanTable {
            source: self.path.clone(),
            columns,
            records,
            drift,
        })
    }

    /// Compare the source width to the declared layout.
    ///
    /// Missing period columns are drift and get a warning; a missing
    /// trailing column only gets a debug line.
    fn check_width(&self, width: usize) -> Option<SchemaDrift> {
        let names = self.schema.column_names();
        let required = self.schema.required_width();

        if width < required {
            let drift = SchemaDrift {
                source: self.path.clone(),
                expected: names.len(),
                found: width,
                dropped: names[width..].to_vec(),
            };
            warn!("schema drift: {}", drift);
            return Some(drift);
        }

        if width < names.len() {
            debug!(
                path = %self.path.display(),
                missing = ?&names[width..],
                "optional trailing columns absent"
            );
        } else if width > names.len() {
            let drift = SchemaDrift {
                source: self.path.clone(),
                expected: names.len(),
                found: width,
                dropped: Vec::new(),
            };
            warn!("schema drift: {} (extra columns ignored)", drift);
            return Some(drift);
        }
        None
    }
}

/// Turn one grid row into a record, or `None` for non-data rows
fn raw_record(row: &[String], period_count: usize) -> Option<RawRecord> {
    let ordinal = parse_ordinal(row.first()?)?;
    let label = row.get(1).map(|s| s.trim()).unwrap_or_default();
    if label.is_empty() {
        return None;
    }

    let cells = (0..period_count)
        .map(|i| {
            row.get(TableSchema::ID_COLUMNS + i)
                .cloned()
                .unwrap_or_default()
        })
        .collect();

    Some(RawRecord {
        ordinal,
        label: label.to_string(),
        cells,
    })
}
