//! Pipeline orchestration
//!
//! Two independent flows over the configured sources:
//!
//! - annual: category + maker tables → groups / makers → YoY tables
//! - monthly: one workbook per year and kind → quarters → QoQ tables
//!
//! A source that cannot be read is skipped and reported; the rest of the
//! run carries on. Every table is rebuilt from scratch on each run.

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::ingest::TableLoader;
use crate::transform::{
    aggregate_quarters, annual_rows, compute_growth, to_long, CategoryMapper, MappingDiagnostic,
};
use crate::types::{CleanTable, Growth, LongObservation, SchemaDrift, SourceKind, TableKind, WideRow};
use crate::writer::{stage_table, StagedTable};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

/// A source file that was skipped because it could not be loaded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSource {
    pub kind: SourceKind,
    pub year: Option<i32>,
    pub path: PathBuf,
    pub reason: String,
}

/// One persisted output table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableOutput {
    pub kind: TableKind,
    pub path: PathBuf,
    pub rows: usize,
    /// Rows whose growth was undefined (zero baseline)
    pub undefined_growth: usize,
}

/// Everything an operator should know about a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub tables: Vec<TableOutput>,
    /// Tables not written because none of their sources loaded
    pub unwritten: Vec<TableKind>,
    pub skipped: Vec<SkippedSource>,
    /// Monthly sources not present for a configured year
    pub missing: Vec<PathBuf>,
    pub drift: Vec<SchemaDrift>,
    pub diagnostics: Vec<MappingDiagnostic>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            tables: Vec::new(),
            unwritten: Vec::new(),
            skipped: Vec::new(),
            missing: Vec::new(),
            drift: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// A computed output table and how many sources fed it
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltTable {
    pub kind: TableKind,
    pub rows: Vec<LongObservation>,
    pub sources: usize,
}

/// Result of a full run: the report plus the tables as written
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub report: RunReport,
    pub tables: Vec<BuiltTable>,
}

impl PipelineRun {
    /// Tables that were written, paired with their kind
    pub fn written(&self) -> Vec<(TableKind, Vec<LongObservation>)> {
        self.tables
            .iter()
            .filter(|t| t.sources > 0)
            .map(|t| (t.kind, t.rows.clone()))
            .collect()
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    mapper: CategoryMapper,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let mapper = CategoryMapper::new(&config.groups);
        Self { config, mapper }
    }

    /// Compute and persist all four tables
    pub fn run(&self) -> PipelineResult<PipelineRun> {
        let mut report = RunReport::new();
        info!(
            data_dir = %self.config.data_dir.display(),
            output_dir = %self.config.output_dir.display(),
            "pipeline run started"
        );

        let tables = self.build(&mut report);

        std::fs::create_dir_all(&self.config.output_dir)?;

        // All tables are staged before any replaces its previous file
        let mut staged: Vec<(StagedTable, &BuiltTable)> = Vec::new();
        for table in &tables {
            if table.sources == 0 {
                warn!(table = %table.kind, "no sources loaded, table not written");
                report.unwritten.push(table.kind);
                continue;
            }

            let path = self.config.output_dir.join(table.kind.file_name());
            match stage_table(&path, table.kind, &table.rows) {
                Ok(file) => staged.push((file, table)),
                Err(e) => {
                    warn!(table = %table.kind, "write failed, keeping previous tables: {}", e);
                    for (file, _) in staged {
                        file.discard();
                    }
                    return Err(e);
                }
            }
        }

        for (file, table) in staged {
            let path = file.target().to_path_buf();
            file.commit()?;
            info!(table = %table.kind, rows = table.rows.len(), path = %path.display(), "table written");
            report.tables.push(TableOutput {
                kind: table.kind,
                path,
                rows: table.rows.len(),
                undefined_growth: table
                    .rows
                    .iter()
                    .filter(|o| o.growth == Growth::Undefined)
                    .count(),
            });
        }

        Ok(PipelineRun { report, tables })
    }

    /// Compute all four tables without touching the output directory
    pub fn build(&self, report: &mut RunReport) -> Vec<BuiltTable> {
        vec![
            self.annual_table(SourceKind::AnnualCategory, report),
            self.annual_table(SourceKind::AnnualMaker, report),
            self.quarterly_table(SourceKind::MonthlyCategory, report),
            self.quarterly_table(SourceKind::MonthlyMaker, report),
        ]
    }

    fn annual_table(&self, kind: SourceKind, report: &mut RunReport) -> BuiltTable {
        let (path, table_kind) = match kind {
            SourceKind::AnnualCategory => {
                (self.config.annual_category_path(), TableKind::AnnualCategory)
            }
            _ => (self.config.annual_maker_path(), TableKind::AnnualMaker),
        };

        let mut rows = Vec::new();
        let mut sources = 0;
        if let Some(table) = self.load(kind, None, path, report) {
            sources = 1;
            rows = to_long(&annual_rows(&table));
        }

        BuiltTable {
            kind: table_kind,
            rows: compute_growth(rows),
            sources,
        }
    }

    fn quarterly_table(&self, kind: SourceKind, report: &mut RunReport) -> BuiltTable {
        let table_kind = match kind {
            SourceKind::MonthlyCategory => TableKind::QuarterlyCategory,
            _ => TableKind::QuarterlyMaker,
        };

        let mut wide: Vec<WideRow> = Vec::new();
        let mut sources = 0;
        for &year in &self.config.monthly.years {
            let path = self.config.monthly_path(kind, year);
            if !path.exists() {
                info!(year, path = %path.display(), "no {} source for {}, skipping", table_kind, year);
                report.missing.push(path);
                continue;
            }
            if let Some(table) = self.load(kind, Some(year), path, report) {
                sources += 1;
                wide.extend(aggregate_quarters(&table, year));
            }
        }

        BuiltTable {
            kind: table_kind,
            rows: compute_growth(to_long(&wide)),
            sources,
        }
    }

    /// Load one source, mapping categories to groups where needed.
    ///
    /// Failures are logged and recorded in the report, never propagated.
    fn load(
        &self,
        kind: SourceKind,
        year: Option<i32>,
        path: PathBuf,
        report: &mut RunReport,
    ) -> Option<CleanTable> {
        let loader = TableLoader::new(&path, self.config.schema(kind));
        let table = match loader.load() {
            Ok(table) => table,
            Err(e) => {
                match year {
                    Some(year) => warn!("skipping {:?} source for {}: {}", kind, year, e),
                    None => warn!("skipping {:?} source: {}", kind, e),
                }
                report.skipped.push(SkippedSource {
                    kind,
                    year,
                    path,
                    reason: e.to_string(),
                });
                return None;
            }
        };

        info!(
            path = %path.display(),
            records = table.records.len(),
            "loaded {:?} source",
            kind
        );
        if let Some(drift) = &table.drift {
            report.drift.push(drift.clone());
        }

        match kind {
            SourceKind::AnnualCategory | SourceKind::MonthlyCategory => {
                let outcome = self.mapper.map(&table);
                // One entry per label across every source of the run
                for diagnostic in outcome.diagnostics {
                    if !report.diagnostics.iter().any(|d| d.label == diagnostic.label) {
                        report.diagnostics.push(diagnostic);
                    }
                }
                Some(outcome.table)
            }
            SourceKind::AnnualMaker | SourceKind::MonthlyMaker => Some(table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Period;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "Registrations\nAll States\n,,,,,,,\n";

    fn setup(category: Option<&str>, maker: Option<&str>) -> (TempDir, PipelineConfig) {
        let dir = TempDir::new().unwrap();
        let yearly = dir.path().join("data").join("yearly");
        fs::create_dir_all(&yearly).unwrap();
        if let Some(body) = category {
            fs::write(yearly.join("2021-2025_VCLASS.csv"), format!("{}{}", HEADER, body)).unwrap();
        }
        if let Some(body) = maker {
            fs::write(yearly.join("2021-2025_MAKER.csv"), format!("{}{}", HEADER, body)).unwrap();
        }
        let config = PipelineConfig::default().resolve_relative_to(dir.path());
        (dir, config)
    }

    #[test]
    fn test_annual_flow_builds_group_and_maker_tables() {
        let (_dir, config) = setup(
            Some("1,TWO WHEELER(NT),\"1,00\",100,80,,,180\n2,TRACTOR,5,5,5,5,5,25\n"),
            Some("1,HONDA,10,0,50,,,60\n"),
        );
        let pipeline = Pipeline::new(config);
        let mut report = RunReport::new();
        let tables = pipeline.build(&mut report);

        let groups = &tables[0];
        assert_eq!(groups.kind, TableKind::AnnualCategory);
        let years: Vec<(Period, u64, Growth)> =
            groups.rows.iter().map(|o| (o.period, o.value, o.growth)).collect();
        // Null cells of a matched category count as zero in the group sum
        assert_eq!(
            years,
            vec![
                (Period::Year(2021), 0, Growth::Absent),
                (Period::Year(2022), 0, Growth::Undefined),
                (Period::Year(2023), 80, Growth::Undefined),
                (Period::Year(2024), 100, Growth::Percent(25.0)),
                (Period::Year(2025), 100, Growth::Percent(0.0)),
            ]
        );
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].label, "TRACTOR");

        let makers = &tables[1];
        let growth: Vec<Growth> = makers.rows.iter().map(|o| o.growth).collect();
        assert_eq!(
            growth,
            vec![Growth::Absent, Growth::Percent(-100.0), Growth::Undefined]
        );
    }

    #[test]
    fn test_missing_annual_source_is_skipped_not_fatal() {
        let (_dir, config) = setup(None, Some("1,HONDA,10,20,,,,30\n"));
        let output_dir = config.output_dir.clone();
        let run = Pipeline::new(config).run().unwrap();

        assert_eq!(run.report.skipped.len(), 1);
        assert_eq!(run.report.skipped[0].kind, SourceKind::AnnualCategory);
        assert!(run.report.unwritten.contains(&TableKind::AnnualCategory));
        assert!(!output_dir.join(TableKind::AnnualCategory.file_name()).exists());
        assert!(output_dir.join(TableKind::AnnualMaker.file_name()).exists());
    }

    #[test]
    fn test_missing_monthly_years_are_not_failures() {
        let (_dir, config) = setup(Some("1,TWO WHEELER,1,1,1,1,1,5\n"), Some("1,HONDA,1,1,1,1,1,5\n"));
        let run = Pipeline::new(config).run().unwrap();

        assert!(run.report.is_complete());
        assert_eq!(run.report.missing.len(), 10);
        assert_eq!(
            run.report.unwritten,
            vec![TableKind::QuarterlyCategory, TableKind::QuarterlyMaker]
        );
    }

    #[test]
    fn test_unmatched_label_reported_once_across_years() {
        let (dir, mut config) = setup(None, None);
        config.monthly.category_pattern = "{year}_monthly_VC.csv".to_string();
        let monthly = dir.path().join("data").join("monthly");
        fs::create_dir_all(&monthly).unwrap();
        for year in [2023, 2024] {
            fs::write(
                monthly.join(format!("{}_monthly_VC.csv", year)),
                format!(
                    "{}1,TWO WHEELER(NT),1,1,1,1,1,1,1,1,1,1,1,1,12\n2,TRACTOR,2,2,2,2,2,2,2,2,2,2,2,2,24\n",
                    HEADER
                ),
            )
            .unwrap();
        }

        let pipeline = Pipeline::new(config);
        let mut report = RunReport::new();
        let tables = pipeline.build(&mut report);

        assert_eq!(tables[2].sources, 2);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].label, "TRACTOR");
    }

    #[test]
    fn test_failed_write_keeps_previous_tables() {
        let (_dir, config) = setup(
            Some("1,TWO WHEELER,1,1,1,1,1,5\n"),
            Some("1,HONDA,1,1,1,1,1,5\n"),
        );
        let output_dir = config.output_dir.clone();
        fs::create_dir_all(&output_dir).unwrap();
        let groups = output_dir.join(TableKind::AnnualCategory.file_name());
        fs::write(&groups, "previous run\n").unwrap();
        // A directory where the maker temp file should go makes staging fail
        fs::create_dir_all(output_dir.join("maker_yoy.csv.tmp")).unwrap();

        assert!(Pipeline::new(config).run().is_err());
        assert_eq!(fs::read_to_string(&groups).unwrap(), "previous run\n");
        assert!(!output_dir.join("vehicle_category_group_yoy.csv.tmp").exists());
    }
}
