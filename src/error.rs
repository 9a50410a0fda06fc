use std::path::PathBuf;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Source not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read '{}': {reason}", path.display())]
    Source { path: PathBuf, reason: String },

    #[error("Unsupported source format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Schema error in '{}': {reason}", path.display())]
    Schema { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Run incomplete: {0} source(s) skipped")]
    Incomplete(usize),
}

impl PipelineError {
    /// Shorthand for a read failure on a specific file.
    pub fn read_failure(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PipelineError::Source {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
