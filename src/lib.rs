//! regstats - vehicle registration statistics pipeline
//!
//! Turns published registration sheets (annual category/maker tables and
//! monthly per-year workbooks) into four analysis-ready tables:
//!
//! - `vehicle_category_group_yoy.csv`: 2W/3W/4W totals per year with YoY %
//! - `maker_yoy.csv`: per-maker totals per year with YoY %
//! - `vehicle_category_quarterly_qoq.csv`: group totals per quarter with QoQ %
//! - `maker_quarterly_qoq.csv`: per-maker totals per quarter with QoQ %
//!
//! # Example
//!
//! ```no_run
//! use regstats::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(PipelineConfig::default());
//! let run = pipeline.run()?;
//!
//! for table in &run.report.tables {
//!     println!("{}: {} rows", table.path.display(), table.rows);
//! }
//! # Ok::<(), regstats::PipelineError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod summary;
pub mod transform;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{Pipeline, PipelineRun, RunReport};
pub use types::{CanonicalGroup, Growth, LongObservation, Period, SourceKind, TableKind};
