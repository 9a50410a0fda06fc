use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::ingest::normalize_count;

//==============================================================================
// Calendar Periods
//==============================================================================

/// Calendar month, as labelled in monthly source sheets (JAN..DEC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    /// Upper-case three letter label used as the column name
    pub fn label(self) -> &'static str {
        match self {
            Month::Jan => "JAN",
            Month::Feb => "FEB",
            Month::Mar => "MAR",
            Month::Apr => "APR",
            Month::May => "MAY",
            Month::Jun => "JUN",
            Month::Jul => "JUL",
            Month::Aug => "AUG",
            Month::Sep => "SEP",
            Month::Oct => "OCT",
            Month::Nov => "NOV",
            Month::Dec => "DEC",
        }
    }

    /// Parse a month label, case-insensitive
    pub fn from_label(label: &str) -> Option<Month> {
        let label = label.trim();
        Month::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(label))
    }

    /// Calendar quarter this month belongs to
    pub fn quarter(self) -> Quarter {
        match self {
            Month::Jan | Month::Feb | Month::Mar => Quarter::Q1,
            Month::Apr | Month::May | Month::Jun => Quarter::Q2,
            Month::Jul | Month::Aug | Month::Sep => Quarter::Q3,
            Month::Oct | Month::Nov | Month::Dec => Quarter::Q4,
        }
    }
}

/// Fixed calendar quarter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    pub fn number(self) -> u8 {
        match self {
            Quarter::Q1 => 1,
            Quarter::Q2 => 2,
            Quarter::Q3 => 3,
            Quarter::Q4 => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        }
    }

    /// The three months summed into this quarter
    pub fn months(self) -> [Month; 3] {
        match self {
            Quarter::Q1 => [Month::Jan, Month::Feb, Month::Mar],
            Quarter::Q2 => [Month::Apr, Month::May, Month::Jun],
            Quarter::Q3 => [Month::Jul, Month::Aug, Month::Sep],
            Quarter::Q4 => [Month::Oct, Month::Nov, Month::Dec],
        }
    }
}

/// Ordered period key of a long-format observation.
///
/// A single table only ever holds one variant, so the derived ordering
/// (year first, then quarter) is the chronological one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    Year(i32),
    Quarter { year: i32, quarter: Quarter },
}

impl Period {
    pub fn year(&self) -> i32 {
        match self {
            Period::Year(year) => *year,
            Period::Quarter { year, .. } => *year,
        }
    }

    pub fn quarter(&self) -> Option<Quarter> {
        match self {
            Period::Year(_) => None,
            Period::Quarter { quarter, .. } => Some(*quarter),
        }
    }

    /// The period immediately before this one (Q1 wraps to Q4 of the prior year)
    pub fn predecessor(&self) -> Period {
        match *self {
            Period::Year(year) => Period::Year(year - 1),
            Period::Quarter { year, quarter } => match quarter {
                Quarter::Q1 => Period::Quarter {
                    year: year - 1,
                    quarter: Quarter::Q4,
                },
                Quarter::Q2 => Period::Quarter {
                    year,
                    quarter: Quarter::Q1,
                },
                Quarter::Q3 => Period::Quarter {
                    year,
                    quarter: Quarter::Q2,
                },
                Quarter::Q4 => Period::Quarter {
                    year,
                    quarter: Quarter::Q3,
                },
            },
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Year(year) => write!(f, "{}", year),
            Period::Quarter { year, quarter } => write!(f, "{}-{}", year, quarter.label()),
        }
    }
}

/// A declared period column of a source table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodColumn {
    Year(i32),
    Month(Month),
}

impl PeriodColumn {
    pub fn label(&self) -> String {
        match self {
            PeriodColumn::Year(year) => year.to_string(),
            PeriodColumn::Month(month) => month.label().to_string(),
        }
    }
}

//==============================================================================
// Canonical Vehicle Groups
//==============================================================================

/// Coarse vehicle class that detailed source categories roll up into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CanonicalGroup {
    #[serde(rename = "2W")]
    TwoWheeler,
    #[serde(rename = "3W")]
    ThreeWheeler,
    #[serde(rename = "4W")]
    FourWheeler,
}

impl CanonicalGroup {
    pub const ALL: [CanonicalGroup; 3] = [
        CanonicalGroup::TwoWheeler,
        CanonicalGroup::ThreeWheeler,
        CanonicalGroup::FourWheeler,
    ];

    /// Short code written to the `Group` column
    pub fn code(self) -> &'static str {
        match self {
            CanonicalGroup::TwoWheeler => "2W",
            CanonicalGroup::ThreeWheeler => "3W",
            CanonicalGroup::FourWheeler => "4W",
        }
    }
}

impl fmt::Display for CanonicalGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CanonicalGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CanonicalGroup::ALL
            .into_iter()
            .find(|g| g.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown vehicle group '{}'", s))
    }
}

//==============================================================================
// Source Records
//==============================================================================

/// A data row as read from a source sheet, before numeric cleanup.
///
/// Only rows with an integer ordinal and a non-empty label become records;
/// everything else is a title, header or footer artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub ordinal: i64,
    pub label: String,
    /// One cell per period column present in the source, in declared order
    pub cells: Vec<String>,
}

impl RawRecord {
    /// Normalize every period cell into a nullable count
    pub fn clean(self) -> CleanRecord {
        CleanRecord {
            ordinal: self.ordinal,
            label: self.label,
            values: self.cells.iter().map(|c| normalize_count(c)).collect(),
        }
    }
}

/// A source row with period values coerced to nullable integers
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub ordinal: i64,
    pub label: String,
    pub values: Vec<Option<i64>>,
}

/// A loaded source table: the period columns actually present plus its rows
#[derive(Debug, Clone, PartialEq)]
pub struct CleanTable {
    pub source: PathBuf,
    pub columns: Vec<PeriodColumn>,
    pub records: Vec<CleanRecord>,
    /// Set when the source width differed from the declared period columns
    pub drift: Option<SchemaDrift>,
}

/// Mismatch between a source's width and its declared columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDrift {
    pub source: PathBuf,
    pub expected: usize,
    pub found: usize,
    /// Declared columns the source did not carry
    pub dropped: Vec<String>,
}

impl fmt::Display for SchemaDrift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {} columns, found {}",
            self.source.display(),
            self.expected,
            self.found
        )?;
        if !self.dropped.is_empty() {
            write!(f, " (missing {})", self.dropped.join(", "))?;
        }
        Ok(())
    }
}

impl CleanTable {
    /// Position of a period column, if the source carried it
    pub fn column_index(&self, column: PeriodColumn) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }
}

/// One entity with its (period, value) cells, i.e. a wide-format row
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub entity: String,
    pub cells: Vec<(Period, Option<i64>)>,
}

/// One (entity, period, value) row of a long-format table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongRow {
    pub entity: String,
    pub period: Period,
    pub value: u64,
}

//==============================================================================
// Output Observations
//==============================================================================

/// Period-over-period growth of an observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Growth {
    /// No usable prior period (first period, or a gap before this one)
    Absent,
    /// Prior period value was zero
    Undefined,
    /// Percentage change, rounded to 2 decimals
    Percent(f64),
}

impl Growth {
    pub fn percent(&self) -> Option<f64> {
        match self {
            Growth::Percent(pct) => Some(*pct),
            _ => None,
        }
    }

    /// Text written to the output table: 2 decimals, or empty
    pub fn as_cell(&self) -> String {
        match self {
            Growth::Percent(pct) => format!("{:.2}", pct),
            Growth::Absent | Growth::Undefined => String::new(),
        }
    }
}

/// The persisted unit of output
#[derive(Debug, Clone, PartialEq)]
pub struct LongObservation {
    pub entity: String,
    pub period: Period,
    pub value: u64,
    pub growth: Growth,
}

//==============================================================================
// Table Kinds
//==============================================================================

/// The four persisted output tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    AnnualCategory,
    AnnualMaker,
    QuarterlyCategory,
    QuarterlyMaker,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::AnnualCategory,
        TableKind::AnnualMaker,
        TableKind::QuarterlyCategory,
        TableKind::QuarterlyMaker,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            TableKind::AnnualCategory => "vehicle_category_group_yoy.csv",
            TableKind::AnnualMaker => "maker_yoy.csv",
            TableKind::QuarterlyCategory => "vehicle_category_quarterly_qoq.csv",
            TableKind::QuarterlyMaker => "maker_quarterly_qoq.csv",
        }
    }

    /// Worksheet name in the combined workbook export
    pub fn sheet_name(self) -> &'static str {
        match self {
            TableKind::AnnualCategory => "Group YoY",
            TableKind::AnnualMaker => "Maker YoY",
            TableKind::QuarterlyCategory => "Group QoQ",
            TableKind::QuarterlyMaker => "Maker QoQ",
        }
    }

    pub fn is_quarterly(self) -> bool {
        matches!(self, TableKind::QuarterlyCategory | TableKind::QuarterlyMaker)
    }

    pub fn entity_header(self) -> &'static str {
        match self {
            TableKind::AnnualCategory | TableKind::QuarterlyCategory => "Group",
            TableKind::AnnualMaker | TableKind::QuarterlyMaker => "Maker",
        }
    }

    pub fn growth_header(self) -> &'static str {
        if self.is_quarterly() {
            "QoQ_pct"
        } else {
            "YoY_pct"
        }
    }

    /// Full header row of the persisted table
    pub fn headers(self) -> Vec<&'static str> {
        let mut headers = vec![self.entity_header(), "Year"];
        if self.is_quarterly() {
            headers.extend(["Quarter", "Year_Quarter"]);
        }
        headers.extend(["Registrations", self.growth_header()]);
        headers
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableKind::AnnualCategory => "annual category groups",
            TableKind::AnnualMaker => "annual makers",
            TableKind::QuarterlyCategory => "quarterly category groups",
            TableKind::QuarterlyMaker => "quarterly makers",
        };
        f.write_str(name)
    }
}

/// The four kinds of source sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    AnnualCategory,
    AnnualMaker,
    MonthlyCategory,
    MonthlyMaker,
}

impl SourceKind {
    /// Header of the label column in cleaned output
    pub fn label_header(self) -> &'static str {
        match self {
            SourceKind::AnnualCategory | SourceKind::MonthlyCategory => "Vehicle Category",
            SourceKind::AnnualMaker | SourceKind::MonthlyMaker => "Maker",
        }
    }

    pub fn is_monthly(self) -> bool {
        matches!(self, SourceKind::MonthlyCategory | SourceKind::MonthlyMaker)
    }
}
