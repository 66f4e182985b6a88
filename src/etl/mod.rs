//! Core ETL (Extract, Transform, Load) abstractions
//!
//! This module provides the trait seams of the pipeline and the driver that
//! runs them table by table:
//! - [`Catalog`] lists the tables of a source store
//! - [`Extractor`] reads one table
//! - [`Transformer`] cleans it
//! - [`Loader`] replaces the destination table
//! - [`Pipeline`] orchestrates the four and records a [`RunOutcome`] per table

mod catalog;
mod extract;
mod load;
mod outcome;
mod pipeline;
mod transform;

pub use catalog::{AllowList, Catalog, EmptyTablePolicy};
pub use extract::Extractor;
pub use load::{Loader, clean_table_name};
pub use outcome::{RunOutcome, RunSummary, TableOutcome};
pub use pipeline::Pipeline;
pub use transform::Transformer;
