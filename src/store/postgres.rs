//! Analytical destination: PostgreSQL loaded with `COPY`

use super::{encode_row, quote_ident, redact_url, sql_type, staging_name};
use crate::etl::Loader;
use crate::reports::SqlExecutor;
use crate::table::Table;
use async_trait::async_trait;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Rows sent per `COPY` data message
const COPY_CHUNK_ROWS: usize = 10_000;

/// How a cleaned table replaces its destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStrategy {
    /// Drop, create and copy into the destination table in one transaction
    #[default]
    Replace,
    /// Copy into `<table>__staging`, then swap it into place in the same
    /// transaction
    Staging,
}

impl FromStr for LoadStrategy {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Ok(LoadStrategy::Replace),
            "staging" => Ok(LoadStrategy::Staging),
            other => Err(eyre::eyre!(
                "Unknown load strategy '{}', expected 'replace' or 'staging'",
                other
            )),
        }
    }
}

impl fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStrategy::Replace => write!(f, "replace"),
            LoadStrategy::Staging => write!(f, "staging"),
        }
    }
}

/// Statements of one table load, in execution order
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadPlan {
    /// Drop and create the table the rows are copied into
    pub prepare: Vec<String>,
    /// `COPY ... FROM STDIN`, absent for a table without columns
    pub copy: Option<String>,
    /// Statements run after the copy succeeded
    pub finish: Vec<String>,
}

impl LoadPlan {
    pub(crate) fn new(strategy: LoadStrategy, table: &str, data: &Table) -> Self {
        let target = match strategy {
            LoadStrategy::Replace => table.to_string(),
            LoadStrategy::Staging => staging_name(table),
        };

        let definitions: Vec<String> = data
            .columns()
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} {}", quote_ident(&column.name), sql_type(data, i)))
            .collect();
        let column_list: Vec<String> = data
            .columns()
            .iter()
            .map(|column| quote_ident(&column.name))
            .collect();

        let prepare = vec![
            format!("DROP TABLE IF EXISTS {}", quote_ident(&target)),
            format!(
                "CREATE TABLE {} ({})",
                quote_ident(&target),
                definitions.join(", ")
            ),
        ];

        let copy = (!column_list.is_empty()).then(|| {
            format!(
                "COPY {} ({}) FROM STDIN",
                quote_ident(&target),
                column_list.join(", ")
            )
        });

        let finish = match strategy {
            LoadStrategy::Replace => Vec::new(),
            LoadStrategy::Staging => vec![
                format!("DROP TABLE IF EXISTS {}", quote_ident(table)),
                format!(
                    "ALTER TABLE {} RENAME TO {}",
                    quote_ident(&target),
                    quote_ident(table)
                ),
            ],
        };

        Self {
            prepare,
            copy,
            finish,
        }
    }
}

/// Destination PostgreSQL database
///
/// Each [`load`](Loader::load) runs in its own transaction; a failure rolls
/// back that table only.
#[derive(Debug, Clone)]
pub struct PgDestination {
    pool: PgPool,
    strategy: LoadStrategy,
}

impl PgDestination {
    /// Connect to the destination database
    ///
    /// # Errors
    /// Returns an error if the URL is not a PostgreSQL URL or the connection
    /// fails
    pub async fn connect(url: &str) -> Result<Self> {
        if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
            eyre::bail!(
                "Unsupported destination URL '{}', expected postgres://",
                redact_url(url)
            );
        }

        log::info!("Connecting to destination {}", redact_url(url));
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .with_context(|| format!("Failed to connect to destination {}", redact_url(url)))?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            strategy: LoadStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: LoadStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Loader for PgDestination {
    type Item = Table;

    async fn load(&self, table: &str, item: Self::Item) -> Result<usize> {
        let plan = LoadPlan::new(self.strategy, table, &item);

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start load transaction")?;

        for statement in &plan.prepare {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to run: {}", statement))?;
        }

        if let Some(copy) = &plan.copy {
            let copied = copy_rows(&mut tx, copy, &item).await?;
            log::debug!("COPY wrote {} row(s) into {}", copied, table);
        }

        for statement in &plan.finish {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to run: {}", statement))?;
        }

        tx.commit()
            .await
            .with_context(|| format!("Failed to commit load of {}", table))?;

        Ok(item.row_count())
    }

    async fn close(&self) {
        self.pool.close().await;
        log::debug!("Destination connection closed");
    }
}

/// Stream all rows through `COPY ... FROM STDIN` in fixed-size chunks
async fn copy_rows(conn: &mut PgConnection, statement: &str, table: &Table) -> Result<u64> {
    let mut writer = conn
        .copy_in_raw(statement)
        .await
        .context("Failed to initiate COPY command")?;

    for chunk in table.rows().chunks(COPY_CHUNK_ROWS) {
        let mut buf = String::new();
        for row in chunk {
            encode_row(row, &mut buf);
        }
        writer
            .send(buf.into_bytes())
            .await
            .context("Failed to send data chunk via COPY")?;
    }

    writer
        .finish()
        .await
        .context("Failed to finish COPY command")
}

impl SqlExecutor for PgDestination {
    async fn execute_in_transaction(&self, statements: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to start transaction")?;
        for statement in statements {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to run: {}", statement))?;
        }
        tx.commit().await.context("Failed to commit transaction")?;
        Ok(())
    }
}
