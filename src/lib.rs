//! Point-of-sale ECL
//!
//! Extracts every table of a point-of-sale database, cleans it and loads it
//! into an analytical PostgreSQL database as `<table>_clean`, then optionally
//! builds aggregate sales report tables on top.
//!
//! The run is a [`Pipeline`] of three stages:
//! - [`SqlSource`]: lists and reads the source tables
//! - [`Cleaner`]: normalizes names, dates and numbers, drops bad rows
//! - [`PgDestination`]: replaces each destination table with `COPY`

pub mod clean;
pub mod cli;
pub mod config;
pub mod etl;
pub mod reports;
pub mod store;
pub mod table;

// Re-exports for convenience
pub use clean::{Cleaner, RuleSet};
pub use etl::{AllowList, Catalog, Extractor, Loader, Pipeline, RunOutcome, RunSummary, Transformer};
pub use store::{LoadStrategy, PgDestination, SqlSource};
pub use table::{Column, ColumnKind, Table, Value};
