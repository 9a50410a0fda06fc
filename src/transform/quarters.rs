//! Monthly → quarterly aggregation

use crate::types::{CleanTable, Period, PeriodColumn, Quarter, WideRow};

/// Roll one year's monthly table up into quarters.
///
/// Each quarter is the sum of its months, with a null month counting as
/// zero. A quarter is only produced when at least one of its month columns
/// exists in the source table; a truncated sheet never yields fabricated
/// zero quarters.
pub fn aggregate_quarters(table: &CleanTable, year: i32) -> Vec<WideRow> {
    let layout: Vec<(Quarter, Vec<usize>)> = Quarter::ALL
        .into_iter()
        .map(|quarter| {
            let indices = quarter
                .months()
                .into_iter()
                .filter_map(|month| table.column_index(PeriodColumn::Month(month)))
                .collect::<Vec<_>>();
            (quarter, indices)
        })
        .filter(|(_, indices)| !indices.is_empty())
        .collect();

    table
        .records
        .iter()
        .map(|record| WideRow {
            entity: record.label.clone(),
            cells: layout
                .iter()
                .map(|(quarter, indices)| {
                    let total = indices
                        .iter()
                        .filter_map(|&i| record.values.get(i).copied().flatten())
                        .fold(0i64, |acc, v| acc.saturating_add(v));
                    (
                        Period::Quarter {
                            year,
                            quarter: *quarter,
                        },
                        Some(total),
                    )
                })
                .collect(),
        })
        .collect()
}
