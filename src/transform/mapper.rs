//! Category mapper: detailed vehicle categories → canonical groups
//!
//! Rules are evaluated in configured order and a label is assigned to the
//! first rule with a matching keyword, so no row is ever counted twice.
//! Labels matching no rule, or more than one group, are reported back as
//! diagnostics for the operator.

use crate::config::GroupRule;
use crate::types::{CanonicalGroup, CleanRecord, CleanTable};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

/// A category label that did not map to exactly one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingDiagnostic {
    pub source: PathBuf,
    pub label: String,
    /// Every group with a matching keyword, in rule order
    pub matched: Vec<CanonicalGroup>,
}

impl MappingDiagnostic {
    pub fn is_unmatched(&self) -> bool {
        self.matched.is_empty()
    }
}

impl fmt::Display for MappingDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unmatched() {
            write!(f, "'{}' matched no group (excluded)", self.label)
        } else {
            let groups: Vec<&str> = self.matched.iter().map(|g| g.code()).collect();
            write!(
                f,
                "'{}' matched {} (counted under {})",
                self.label,
                groups.join(", "),
                groups[0]
            )
        }
    }
}

/// Result of mapping one category table
#[derive(Debug, Clone, PartialEq)]
pub struct MappingOutcome {
    /// One record per group with at least one assigned row, labelled by group code
    pub table: CleanTable,
    pub diagnostics: Vec<MappingDiagnostic>,
}

/// Keyword rule set with case-folded keywords
pub struct CategoryMapper {
    rules: Vec<(CanonicalGroup, Vec<String>)>,
}

impl CategoryMapper {
    pub fn new(rules: &[GroupRule]) -> Self {
        let rules = rules
            .iter()
            .map(|rule| {
                let keywords = rule
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_uppercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (rule.group, keywords)
            })
            .collect();
        Self { rules }
    }

    /// Groups whose keywords occur in `label`, in rule order, without repeats
    pub fn classify(&self, label: &str) -> Vec<CanonicalGroup> {
        let folded = label.to_uppercase();
        let mut matched = Vec::new();
        for (group, keywords) in &self.rules {
            if matched.contains(group) {
                continue;
            }
            if keywords.iter().any(|k| folded.contains(k.as_str())) {
                matched.push(*group);
            }
        }
        matched
    }

    /// Sum every period column per group.
    ///
    /// Null cells count as zero. A group with no assigned rows is left out
    /// of the output entirely.
    pub fn map(&self, table: &CleanTable) -> MappingOutcome {
        let width = table.columns.len();
        let mut totals: BTreeMap<CanonicalGroup, Vec<i64>> = BTreeMap::new();
        let mut diagnostics: Vec<MappingDiagnostic> = Vec::new();

        for record in &table.records {
            let matched = self.classify(&record.label);

            if matched.len() != 1 && !diagnostics.iter().any(|d| d.label == record.label) {
                let diagnostic = MappingDiagnostic {
                    source: table.source.clone(),
                    label: record.label.clone(),
                    matched: matched.clone(),
                };
                warn!(source = %table.source.display(), "category mapping: {}", diagnostic);
                diagnostics.push(diagnostic);
            }

            let Some(group) = matched.first() else {
                continue;
            };
            let sums = totals.entry(*group).or_insert_with(|| vec![0; width]);
            for (sum, value) in sums.iter_mut().zip(&record.values) {
                *sum = sum.saturating_add(value.unwrap_or(0));
            }
        }

        let records = totals
            .into_iter()
            .enumerate()
            .map(|(idx, (group, sums))| CleanRecord {
                ordinal: idx as i64 + 1,
                label: group.code().to_string(),
                values: sums.into_iter().map(Some).collect(),
            })
            .collect();

        MappingOutcome {
            table: CleanTable {
                source: table.source.clone(),
                columns: table.columns.clone(),
                records,
                drift: table.drift.clone(),
            },
            diagnostics,
        }
    }
}
