//! Excel workbook export of the output tables

use super::table_row;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{LongObservation, TableKind};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;

/// Write each table to its own worksheet of a single workbook.
///
/// Counts and growth are numeric cells; absent or undefined growth is left
/// blank, matching the CSV tables.
pub fn export_workbook(path: &Path, tables: &[(TableKind, Vec<LongObservation>)]) -> PipelineResult<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let percent = Format::new().set_num_format("0.00");

    for (kind, rows) in tables {
        let worksheet = workbook.add_worksheet();
        write_sheet(worksheet, *kind, rows, &header, &percent)
            .map_err(|e| PipelineError::Export(format!("worksheet '{}': {}", kind.sheet_name(), e)))?;
    }

    workbook
        .save(path)
        .map_err(|e| PipelineError::Export(format!("failed to save {}: {}", path.display(), e)))?;
    Ok(())
}

fn write_sheet(
    worksheet: &mut Worksheet,
    kind: TableKind,
    rows: &[LongObservation],
    header: &Format,
    percent: &Format,
) -> Result<(), XlsxError> {
    worksheet.set_name(kind.sheet_name())?;

    let headers = kind.headers();
    for (col, name) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, header)?;
    }

    let value_col = (headers.len() - 2) as u16;
    let growth_col = (headers.len() - 1) as u16;

    for (idx, obs) in rows.iter().enumerate() {
        let row = (idx + 1) as u32;
        let text = table_row(kind, obs);

        worksheet.write_string(row, 0, &obs.entity)?;
        worksheet.write_number(row, 1, obs.period.year())?;
        if kind.is_quarterly() {
            worksheet.write_string(row, 2, &text[2])?;
            worksheet.write_string(row, 3, &text[3])?;
        }
        worksheet.write_number(row, value_col, obs.value as f64)?;
        if let Some(pct) = obs.growth.percent() {
            worksheet.write_number_with_format(row, growth_col, pct, percent)?;
        }
    }

    worksheet.autofit();
    Ok(())
}
