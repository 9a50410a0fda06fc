//! CLI command handlers

pub mod commands;

pub use commands::{clean, resolve_config, run, summary, watch};
