//! Wide → long reshaping

use crate::types::{CleanTable, LongRow, Period, PeriodColumn, WideRow};
use tracing::debug;

/// Wide rows of an annual table, one cell per declared year column
pub fn annual_rows(table: &CleanTable) -> Vec<WideRow> {
    table
        .records
        .iter()
        .map(|record| WideRow {
            entity: record.label.clone(),
            cells: table
                .columns
                .iter()
                .zip(&record.values)
                .filter_map(|(column, value)| match column {
                    PeriodColumn::Year(year) => Some((Period::Year(*year), *value)),
                    PeriodColumn::Month(_) => None,
                })
                .collect(),
        })
        .collect()
}

/// One long row per (entity, period) cell holding a count.
///
/// Null cells are dropped rather than kept, and so are negative values,
/// which cannot be registration counts.
pub fn to_long(rows: &[WideRow]) -> Vec<LongRow> {
    let mut long = Vec::new();
    for row in rows {
        for (period, value) in &row.cells {
            match value.map(u64::try_from) {
                Some(Ok(count)) => long.push(LongRow {
                    entity: row.entity.clone(),
                    period: *period,
                    value: count,
                }),
                Some(Err(_)) => {
                    debug!(entity = %row.entity, %period, "dropping negative value");
                }
                None => {}
            }
        }
    }
    long
}
