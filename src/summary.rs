//! Read-back of persisted tables for headline summaries
//!
//! Reads the CSV tables the way a dashboard consumer does: an empty
//! growth cell means "no value" and never takes part in best/worst
//! comparisons.

use crate::error::{PipelineError, PipelineResult};
use crate::types::TableKind;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

/// One row of a persisted table
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub entity: String,
    pub year: i32,
    /// `Year_Quarter` for quarterly tables
    pub period: String,
    pub registrations: u64,
    pub growth: Option<f64>,
}

/// Best and worst growth entity within one period
#[derive(Debug, Clone, PartialEq)]
pub struct Performers {
    pub best: SummaryRow,
    pub worst: SummaryRow,
}

/// Load a persisted output table
pub fn read_table(path: &Path, kind: TableKind) -> PipelineResult<Vec<SummaryRow>> {
    if !path.exists() {
        return Err(PipelineError::NotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let column = |name: &str| -> PipelineResult<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PipelineError::Schema {
                path: path.to_path_buf(),
                reason: format!("missing column '{}'", name),
            })
    };

    let entity_col = column(kind.entity_header())?;
    let year_col = column("Year")?;
    let period_col = if kind.is_quarterly() {
        column("Year_Quarter")?
    } else {
        year_col
    };
    let value_col = column("Registrations")?;
    let growth_col = column(kind.growth_header())?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |idx: usize| record.get(idx).unwrap_or_default().trim();

        let (Ok(year), Ok(registrations)) = (
            field(year_col).parse::<i32>(),
            field(value_col).parse::<u64>(),
        )
        else {
            continue;
        };
        rows.push(SummaryRow {
            entity: field(entity_col).to_string(),
            year,
            period: field(period_col).to_string(),
            registrations,
            growth: field(growth_col).parse().ok(),
        });
    }
    Ok(rows)
}

/// Most recent period present in a table
pub fn latest_period(rows: &[SummaryRow]) -> Option<&str> {
    rows.iter()
        .max_by(|a, b| a.year.cmp(&b.year).then_with(|| a.period.cmp(&b.period)))
        .map(|r| r.period.as_str())
}

/// Best and worst growth in `period`, ignoring rows with no growth value.
///
/// Ties resolve to the alphabetically first entity.
pub fn performers(rows: &[SummaryRow], period: &str) -> Option<Performers> {
    let candidates: Vec<&SummaryRow> = rows
        .iter()
        .filter(|r| r.period == period && r.growth.is_some())
        .collect();

    let by_growth = |a: &&SummaryRow, b: &&SummaryRow| -> Ordering {
        let (ga, gb) = (a.growth.unwrap_or_default(), b.growth.unwrap_or_default());
        ga.partial_cmp(&gb).unwrap_or(Ordering::Equal)
    };

    let best = candidates
        .iter()
        .copied()
        .max_by(|a, b| by_growth(a, b).then_with(|| b.entity.cmp(&a.entity)))?;
    let worst = candidates
        .iter()
        .copied()
        .min_by(|a, b| by_growth(a, b).then_with(|| a.entity.cmp(&b.entity)))?;

    Some(Performers {
        best: best.clone(),
        worst: worst.clone(),
    })
}

/// Entities ranked by registrations summed over every period
pub fn top_by_registrations(rows: &[SummaryRow], limit: usize) -> Vec<(String, u64)> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.entity.as_str()).or_default() += row.registrations;
    }

    let mut ranked: Vec<(String, u64)> = totals
        .into_iter()
        .map(|(entity, total)| (entity.to_string(), total))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}
