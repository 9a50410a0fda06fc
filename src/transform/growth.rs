//! Period-over-period growth

use crate::types::{Growth, LongObservation, LongRow, Period};
use std::collections::BTreeMap;
use tracing::warn;

/// Percentage change from `prev` to `value`, rounded to 2 decimals.
///
/// Rounding is half away from zero. A zero baseline has no defined
/// percentage and yields `Growth::Undefined`.
pub fn percent_change(prev: u64, value: u64) -> Growth {
    if prev == 0 {
        return Growth::Undefined;
    }
    let pct = 100.0 * (value as f64 - prev as f64) / prev as f64;
    Growth::Percent(round2(pct))
}

fn round2(x: f64) -> f64 {
    let rounded = (x * 100.0).round() / 100.0;
    // -0.0 would print as "-0.00"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Attach growth to every observation.
///
/// Rows are keyed by (entity, period); duplicate keys are summed. Growth
/// compares each period against the value at its immediate predecessor
/// period, so the first period of an entity and any period following a
/// gap get `Growth::Absent`. Output is ordered by entity, then period.
pub fn compute_growth(rows: Vec<LongRow>) -> Vec<LongObservation> {
    let mut series: BTreeMap<String, BTreeMap<Period, u64>> = BTreeMap::new();
    for row in rows {
        match series.get_mut(&row.entity).and_then(|p| p.get_mut(&row.period)) {
            Some(existing) => {
                warn!(
                    entity = %row.entity,
                    period = %row.period,
                    "duplicate entity row, summing values"
                );
                *existing = existing.saturating_add(row.value);
            }
            None => {
                series
                    .entry(row.entity)
                    .or_default()
                    .insert(row.period, row.value);
            }
        }
    }

    let mut observations = Vec::new();
    for (entity, periods) in &series {
        for (period, value) in periods {
            let growth = match periods.get(&period.predecessor()) {
                Some(prev) => percent_change(*prev, *value),
                None => Growth::Absent,
            };
            observations.push(LongObservation {
                entity: entity.clone(),
                period: *period,
                value: *value,
                growth,
            });
        }
    }
    observations
}
