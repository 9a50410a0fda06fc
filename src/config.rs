//! Pipeline configuration
//!
//! Everything has a default that matches the standard data layout:
//!
//! ```yaml
//! data_dir: data
//! output_dir: data/processed
//! annual:
//!   category_file: yearly/2021-2025_VCLASS.csv
//!   maker_file: yearly/2021-2025_MAKER.csv
//!   years: [2025, 2024, 2023, 2022, 2021]
//! monthly:
//!   dir: monthly
//!   years: [2021, 2022, 2023, 2024, 2025]
//!   category_pattern: "{year}_monthly_VC.xlsx"
//!   maker_pattern: "{year}_monthly_MAKER.xlsx"
//! groups:
//!   - group: 2W
//!     keywords: [TWO WHEELER]
//! ```
//!
//! Relative `data_dir`/`output_dir` resolve against the config file's
//! directory; source paths resolve against `data_dir`.

use crate::error::{PipelineError, PipelineResult};
use crate::ingest::TableSchema;
use crate::types::{CanonicalGroup, Month, PeriodColumn, SourceKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Leading title/metadata rows in every published sheet
pub const DEFAULT_HEADER_ROWS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Worksheet to read from workbook sources (first sheet when unset)
    pub sheet: Option<String>,
    pub annual: AnnualConfig,
    pub monthly: MonthlyConfig,
    /// Ordered category rules; the first rule whose keyword matches wins
    pub groups: Vec<GroupRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnualConfig {
    pub category_file: PathBuf,
    pub maker_file: PathBuf,
    /// Year columns in the order they appear in the source
    pub years: Vec<i32>,
    pub header_rows: usize,
    pub trailing_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonthlyConfig {
    pub dir: PathBuf,
    /// Years to look for; a year without a file is skipped
    pub years: Vec<i32>,
    pub category_pattern: String,
    pub maker_pattern: String,
    pub header_rows: usize,
    pub trailing_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupRule {
    pub group: CanonicalGroup,
    pub keywords: Vec<String>,
}

impl GroupRule {
    fn new(group: CanonicalGroup, keywords: &[&str]) -> Self {
        Self {
            group,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("data/processed"),
            sheet: None,
            annual: AnnualConfig::default(),
            monthly: MonthlyConfig::default(),
            groups: default_group_rules(),
        }
    }
}

impl Default for AnnualConfig {
    fn default() -> Self {
        Self {
            category_file: PathBuf::from("yearly/2021-2025_VCLASS.csv"),
            maker_file: PathBuf::from("yearly/2021-2025_MAKER.csv"),
            years: vec![2025, 2024, 2023, 2022, 2021],
            header_rows: DEFAULT_HEADER_ROWS,
            trailing_columns: vec!["TOTAL".to_string()],
        }
    }
}

impl Default for MonthlyConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("monthly"),
            years: (2021..=2025).collect(),
            category_pattern: "{year}_monthly_VC.xlsx".to_string(),
            maker_pattern: "{year}_monthly_MAKER.xlsx".to_string(),
            header_rows: DEFAULT_HEADER_ROWS,
            trailing_columns: vec!["TOTAL".to_string()],
        }
    }
}

/// The standard 2W/3W/4W roll-up of the published category taxonomy
pub fn default_group_rules() -> Vec<GroupRule> {
    vec![
        GroupRule::new(CanonicalGroup::TwoWheeler, &["TWO WHEELER"]),
        GroupRule::new(CanonicalGroup::ThreeWheeler, &["THREE WHEELER"]),
        GroupRule::new(
            CanonicalGroup::FourWheeler,
            &[
                "FOUR WHEELER",
                "LIGHT MOTOR VEHICLE",
                "MEDIUM MOTOR VEHICLE",
                "HEAVY MOTOR VEHICLE",
                "LIGHT PASSENGER VEHICLE",
                "MEDIUM PASSENGER VEHICLE",
                "HEAVY PASSENGER VEHICLE",
                "LIGHT GOODS VEHICLE",
                "MEDIUM GOODS VEHICLE",
                "HEAVY GOODS VEHICLE",
            ],
        ),
    ]
}

impl PipelineConfig {
    /// Load and validate a YAML config file
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let config = config.resolve_relative_to(base);
        config.validate()?;
        Ok(config)
    }

    /// Anchor relative data/output directories at `base`
    pub fn resolve_relative_to(mut self, base: &Path) -> Self {
        if self.data_dir.is_relative() {
            self.data_dir = base.join(&self.data_dir);
        }
        if self.output_dir.is_relative() {
            self.output_dir = base.join(&self.output_dir);
        }
        self
    }

    pub fn validate(&self) -> PipelineResult<()> {
        check_years("annual.years", &self.annual.years)?;
        check_years("monthly.years", &self.monthly.years)?;

        if self.groups.is_empty() {
            return Err(PipelineError::Config(
                "at least one group rule is required".to_string(),
            ));
        }
        for rule in &self.groups {
            if rule.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(PipelineError::Config(format!(
                    "group rule {} has no keywords",
                    rule.group
                )));
            }
        }

        for (name, pattern) in [
            ("monthly.category_pattern", &self.monthly.category_pattern),
            ("monthly.maker_pattern", &self.monthly.maker_pattern),
        ] {
            if !pattern.contains("{year}") {
                return Err(PipelineError::Config(format!(
                    "{} must contain a {{year}} placeholder",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn annual_category_path(&self) -> PathBuf {
        self.data_dir.join(&self.annual.category_file)
    }

    pub fn annual_maker_path(&self) -> PathBuf {
        self.data_dir.join(&self.annual.maker_file)
    }

    /// Monthly source path for a given year
    pub fn monthly_path(&self, kind: SourceKind, year: i32) -> PathBuf {
        let pattern = match kind {
            SourceKind::MonthlyMaker | SourceKind::AnnualMaker => &self.monthly.maker_pattern,
            SourceKind::MonthlyCategory | SourceKind::AnnualCategory => {
                &self.monthly.category_pattern
            }
        };
        self.data_dir
            .join(&self.monthly.dir)
            .join(pattern.replace("{year}", &year.to_string()))
    }

    /// Declared column layout for a kind of source sheet
    pub fn schema(&self, kind: SourceKind) -> TableSchema {
        if kind.is_monthly() {
            TableSchema {
                header_rows: self.monthly.header_rows,
                periods: Month::ALL.into_iter().map(PeriodColumn::Month).collect(),
                trailing: self.monthly.trailing_columns.clone(),
                sheet: self.sheet.clone(),
            }
        } else {
            TableSchema {
                header_rows: self.annual.header_rows,
                periods: self
                    .annual
                    .years
                    .iter()
                    .copied()
                    .map(PeriodColumn::Year)
                    .collect(),
                trailing: self.annual.trailing_columns.clone(),
                sheet: self.sheet.clone(),
            }
        }
    }
}

fn check_years(name: &str, years: &[i32]) -> PipelineResult<()> {
    if years.is_empty() {
        return Err(PipelineError::Config(format!("{} must not be empty", name)));
    }
    let mut seen = HashSet::new();
    for year in years {
        if !seen.insert(year) {
            return Err(PipelineError::Config(format!(
                "{} lists {} more than once",
                name, year
            )));
        }
    }
    Ok(())
}
