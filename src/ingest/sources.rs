//! Raw sheet readers
//!
//! Both readers produce a text grid indexed from the first physical row of
//! the file or sheet, blank rows included, so header-row skipping means the
//! same thing for either format. File handles live only for the duration of the read call.

use crate::error::{PipelineError, PipelineResult};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::debug;

/// Tabular source formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Workbook,
}

impl SourceFormat {
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(SourceFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(SourceFormat::Workbook),
            _ => None,
        }
    }
}

/// Read a source file into rows of cell text.
///
/// `sheet` selects a worksheet for workbook sources; the first sheet is
/// used when it is `None`. Rows may have different lengths.
pub fn read_grid(path: &Path, sheet: Option<&str>) -> PipelineResult<Vec<Vec<String>>> {
    if !path.exists() {
        return Err(PipelineError::NotFound(path.to_path_buf()));
    }

    let format = SourceFormat::detect(path)
        .ok_or_else(|| PipelineError::UnsupportedFormat(path.to_path_buf()))?;

    let grid = match format {
        SourceFormat::Csv => read_csv_grid(path)?,
        SourceFormat::Workbook => read_workbook_grid(path, sheet)?,
    };
    debug!(path = %path.display(), rows = grid.len(), "read source grid");
    Ok(grid)
}

fn read_csv_grid(path: &Path) -> PipelineResult<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| PipelineError::read_failure(path, e))?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    // First physical line not yet covered by a grid row
    let mut next_line: u64 = 1;
    for record in reader.byte_records() {
        let record = record.map_err(|e| PipelineError::read_failure(path, e))?;

        // The reader skips blank lines; restore them as empty rows so
        // header skipping counts physical lines, as for workbooks.
        if let Some(position) = record.position() {
            while next_line < position.line() {
                rows.push(Vec::new());
                next_line += 1;
            }
        }
        let embedded_newlines = record
            .iter()
            .map(|field| field.iter().filter(|&&b| b == b'\n').count() as u64)
            .sum::<u64>();
        next_line += 1 + embedded_newlines;

        // Published exports are not reliably UTF-8
        rows.push(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        );
    }
    Ok(rows)
}

fn read_workbook_grid(path: &Path, sheet: Option<&str>) -> PipelineResult<Vec<Vec<String>>> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| PipelineError::read_failure(path, e))?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| PipelineError::read_failure(path, "workbook has no worksheets"))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| PipelineError::read_failure(path, format!("sheet '{}': {}", sheet_name, e)))?;

    Ok(range_to_grid(&range))
}

/// Lay a worksheet range out at its absolute sheet position.
///
/// calamine trims leading empty rows and columns off a range; they are
/// restored as empty cells so row offsets match the sheet.
fn range_to_grid(range: &Range<Data>) -> Vec<Vec<String>> {
    let Some((first_row, first_col)) = range.start() else {
        return Vec::new();
    };

    let mut grid: Vec<Vec<String>> = vec![Vec::new(); first_row as usize];
    for row in range.rows() {
        let mut cells = vec![String::new(); first_col as usize];
        cells.extend(row.iter().map(cell_text));
        grid.push(cells);
    }
    grid
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        // Whole floats print without a fraction (1234.0 → "1234")
        Data::Float(f) => f.to_string(),
        other => other.to_string(),
    }
}
