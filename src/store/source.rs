//! Source store: catalog and full-table extraction

use super::{quote_ident, redact_url};
use crate::etl::{Catalog, Extractor};
use crate::table::{Table, Value};
use bigdecimal::ToPrimitive;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use eyre::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use serde_json::Value as JsonValue;
use sqlx::types::BigDecimal;
use sqlx::{Column as _, Row, TypeInfo as _, ValueRef as _};
use std::time::Duration;

const LIST_PG_TABLES: &str = "SELECT table_name::text FROM information_schema.tables \
     WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
     ORDER BY table_name";

const LIST_PG_COLUMNS: &str = "SELECT column_name::text, udt_name::text \
     FROM information_schema.columns \
     WHERE table_schema = current_schema() AND table_name = $1 \
     ORDER BY ordinal_position";

/// Column types read natively, anything else is read through a text cast
const PG_NATIVE_TYPES: [&str; 18] = [
    "bool",
    "int2",
    "int4",
    "int8",
    "float4",
    "float8",
    "numeric",
    "text",
    "varchar",
    "bpchar",
    "name",
    "timestamp",
    "timestamptz",
    "date",
    "time",
    "json",
    "jsonb",
    "bytea",
];

const LIST_SQLITE_TABLES: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
     ORDER BY name";

/// Point-of-sale source database
///
/// The backend is picked from the URL scheme: `postgres://` or
/// `postgresql://` for PostgreSQL, `sqlite:` for SQLite. SQLite sources use a
/// single connection.
#[derive(Debug, Clone)]
pub enum SqlSource {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

impl SqlSource {
    /// Connect to the source database
    ///
    /// # Errors
    /// Returns an error for an unsupported URL scheme or a failed connection
    pub async fn connect(url: &str) -> Result<Self> {
        log::info!("Connecting to source {}", redact_url(url));

        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            let pool = PgPoolOptions::new()
                .max_connections(2)
                .acquire_timeout(Duration::from_secs(10))
                .connect(url)
                .await
                .with_context(|| format!("Failed to connect to source {}", redact_url(url)))?;
            Ok(Self::Postgres(pool))
        } else if url.starts_with("sqlite:") {
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(url)
                .await
                .with_context(|| format!("Failed to open source {}", redact_url(url)))?;
            Ok(Self::Sqlite(pool))
        } else {
            eyre::bail!(
                "Unsupported source URL '{}', expected postgres:// or sqlite:",
                redact_url(url)
            )
        }
    }

    pub fn from_pg_pool(pool: PgPool) -> Self {
        Self::Postgres(pool)
    }

    pub fn from_sqlite_pool(pool: SqlitePool) -> Self {
        Self::Sqlite(pool)
    }
}

impl Catalog for SqlSource {
    async fn list_tables(&self) -> Result<Vec<String>> {
        let tables = match self {
            Self::Postgres(pool) => sqlx::query_scalar::<_, String>(LIST_PG_TABLES)
                .fetch_all(pool)
                .await
                .context("Failed to query information_schema.tables")?,
            Self::Sqlite(pool) => sqlx::query_scalar::<_, String>(LIST_SQLITE_TABLES)
                .fetch_all(pool)
                .await
                .context("Failed to query sqlite_master")?,
        };
        Ok(tables)
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        let sql = format!("DROP TABLE {}", quote_ident(table));
        match self {
            Self::Postgres(pool) => {
                sqlx::query(&sql).execute(pool).await?;
            }
            Self::Sqlite(pool) => {
                sqlx::query(&sql).execute(pool).await?;
            }
        }
        Ok(())
    }

    async fn close(&self) {
        match self {
            Self::Postgres(pool) => pool.close().await,
            Self::Sqlite(pool) => pool.close().await,
        }
        log::debug!("Source connection closed");
    }
}

impl Extractor for SqlSource {
    type Item = Table;

    async fn extract(&self, table: &str) -> Result<Self::Item> {
        let (names, rows) = match self {
            Self::Postgres(pool) => {
                let columns = sqlx::query_as::<_, (String, String)>(LIST_PG_COLUMNS)
                    .bind(table)
                    .fetch_all(pool)
                    .await
                    .with_context(|| format!("Failed to list columns of {}", table))?;
                let sql = format!(
                    "SELECT {} FROM {}",
                    pg_projection(&columns),
                    quote_ident(table)
                );
                let rows = sqlx::query(&sql)
                    .fetch_all(pool)
                    .await
                    .with_context(|| format!("Failed to read {}", table))?;
                let names = rows.first().map(|row| {
                    row.columns()
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect::<Vec<_>>()
                });
                let values = rows
                    .iter()
                    .map(decode_pg_row)
                    .collect::<Result<Vec<_>>>()
                    .with_context(|| format!("Failed to decode {}", table))?;
                (names, values)
            }
            Self::Sqlite(pool) => {
                let sql = format!("SELECT * FROM {}", quote_ident(table));
                let rows = sqlx::query(&sql)
                    .fetch_all(pool)
                    .await
                    .with_context(|| format!("Failed to read {}", table))?;
                let names = rows.first().map(|row| {
                    row.columns()
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect::<Vec<_>>()
                });
                let values = rows
                    .iter()
                    .map(decode_sqlite_row)
                    .collect::<Result<Vec<_>>>()
                    .with_context(|| format!("Failed to decode {}", table))?;
                (names, values)
            }
        };

        // A result without rows carries no column list
        Table::new(names.unwrap_or_default(), rows)
    }
}

/// Select list casting columns of unsupported types to text
///
/// An empty column list selects `*`, so a missing table still fails on read.
fn pg_projection(columns: &[(String, String)]) -> String {
    if columns.is_empty() {
        return "*".to_string();
    }

    columns
        .iter()
        .map(|(name, udt)| {
            let quoted = quote_ident(name);
            if PG_NATIVE_TYPES.contains(&udt.as_str()) {
                quoted
            } else {
                format!("{quoted}::text AS {quoted}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn decode_pg_row(row: &PgRow) -> Result<Vec<Value>> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let ty = column.type_info().name();
            let value: Value = match ty {
                "BOOL" => row.try_get::<Option<bool>, _>(i)?.into(),
                "INT2" => row.try_get::<Option<i16>, _>(i)?.map(i64::from).into(),
                "INT4" => row.try_get::<Option<i32>, _>(i)?.map(i64::from).into(),
                "INT8" => row.try_get::<Option<i64>, _>(i)?.into(),
                "FLOAT4" => row.try_get::<Option<f32>, _>(i)?.map(f64::from).into(),
                "FLOAT8" => row.try_get::<Option<f64>, _>(i)?.into(),
                "NUMERIC" => match row.try_get::<Option<BigDecimal>, _>(i)? {
                    Some(decimal) => match decimal.to_f64() {
                        Some(v) => Value::Float(v),
                        None => eyre::bail!(
                            "NUMERIC value {} in column {} does not fit a float",
                            decimal,
                            column.name()
                        ),
                    },
                    None => Value::Null,
                },
                "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
                    row.try_get::<Option<String>, _>(i)?.into()
                }
                "TIMESTAMP" => row.try_get::<Option<NaiveDateTime>, _>(i)?.into(),
                "TIMESTAMPTZ" => row
                    .try_get::<Option<DateTime<Utc>>, _>(i)?
                    .map(|ts| ts.naive_utc())
                    .into(),
                "DATE" => row
                    .try_get::<Option<NaiveDate>, _>(i)?
                    .map(|date| date.and_time(NaiveTime::MIN))
                    .into(),
                "TIME" => row
                    .try_get::<Option<NaiveTime>, _>(i)?
                    .map(|time| time.to_string())
                    .into(),
                "JSON" | "JSONB" => row
                    .try_get::<Option<JsonValue>, _>(i)?
                    .map(|json| json.to_string())
                    .into(),
                "BYTEA" => match row.try_get::<Option<Vec<u8>>, _>(i)? {
                    Some(bytes) => Value::Bytes(bytes),
                    None => Value::Null,
                },
                other => eyre::bail!(
                    "Unsupported column type {} for column {}",
                    other,
                    column.name()
                ),
            };
            Ok(value)
        })
        .collect()
}

fn decode_sqlite_row(row: &SqliteRow) -> Result<Vec<Value>> {
    (0..row.len())
        .map(|i| {
            let raw = row.try_get_raw(i)?;
            if raw.is_null() {
                return Ok(Value::Null);
            }
            // Storage class of this value, not the declared column type
            let class = raw.type_info().name().to_string();
            let value = match class.as_str() {
                "INTEGER" => Value::Int(row.try_get::<i64, _>(i)?),
                "REAL" => Value::Float(row.try_get::<f64, _>(i)?),
                "TEXT" => Value::Text(row.try_get::<String, _>(i)?),
                "BLOB" => Value::Bytes(row.try_get::<Vec<u8>, _>(i)?),
                other => eyre::bail!(
                    "Unsupported SQLite value of type {} in column {}",
                    other,
                    row.columns()[i].name()
                ),
            };
            Ok(value)
        })
        .collect()
}
