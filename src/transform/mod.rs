//! Reshaping and metric derivation over cleaned tables

pub mod growth;
pub mod mapper;
pub mod quarters;
pub mod reshape;

pub use growth::{compute_growth, percent_change};
pub use mapper::{CategoryMapper, MappingDiagnostic, MappingOutcome};
pub use quarters::aggregate_quarters;
pub use reshape::{annual_rows, to_long};
