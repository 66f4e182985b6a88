//! Source catalog trait and table selection

use eyre::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Catalog trait for enumerating and managing the tables of a source store
///
/// The catalog owns the source connection, so it is also responsible for
/// releasing it once the pipeline is done.
pub trait Catalog: Send + Sync {
    /// List the ordinary user tables of the store (no system tables, no views)
    ///
    /// # Errors
    /// Returns an error if the metadata query fails
    fn list_tables(&self) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;

    /// Drop a table from the source store
    ///
    /// # Errors
    /// Returns an error if the statement fails
    fn drop_table(&self, table: &str) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Release the source connection
    fn close(&self) -> impl std::future::Future<Output = ()> + Send;
}

/// Set of table names the pipeline is restricted to
///
/// Names are compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AllowList {
    tables: BTreeSet<String>,
}

impl AllowList {
    pub fn new<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tables: tables
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains(&table.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }
}

impl FromStr for AllowList {
    type Err = std::convert::Infallible;

    /// Parse a comma-separated list of table names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s.split(',')))
    }
}

/// What to do with a source table that has no rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyTablePolicy {
    /// Leave the source table alone
    #[default]
    Keep,
    /// Drop the empty table from the source store
    DropSource,
}

impl FromStr for EmptyTablePolicy {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "keep" => Ok(EmptyTablePolicy::Keep),
            "drop_source" => Ok(EmptyTablePolicy::DropSource),
            other => Err(eyre::eyre!(
                "Unknown empty table policy '{}', expected 'keep' or 'drop_source'",
                other
            )),
        }
    }
}

impl fmt::Display for EmptyTablePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyTablePolicy::Keep => write!(f, "keep"),
            EmptyTablePolicy::DropSource => write!(f, "drop_source"),
        }
    }
}
