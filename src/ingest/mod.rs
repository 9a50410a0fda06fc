//! Source ingestion: raw sheet reading, numeric cleanup and schema mapping
//!
//! - `sources`: CSV and Excel workbooks → rectangular text grid
//! - `normalizer`: messy cell text → nullable counts
//! - `loader`: text grid + declared schema → `CleanTable`

mod loader;
mod normalizer;
mod sources;

pub use loader::{TableLoader, TableSchema};
pub use normalizer::{normalize_count, parse_ordinal};
pub use sources::{read_grid, SourceFormat};
