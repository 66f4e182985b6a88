//! Relational stores backed by `sqlx`
//!
//! - [`SqlSource`]: the point-of-sale database the tables are read from
//!   (PostgreSQL or SQLite, chosen by URL scheme)
//! - [`PgDestination`]: the analytical PostgreSQL database the cleaned tables
//!   are bulk-loaded into with `COPY`

mod copy;
mod identifier;
mod postgres;
mod source;

pub use copy::{encode_row, sql_type};
pub use identifier::{quote_ident, staging_name};
pub use postgres::{LoadStrategy, PgDestination};
pub use source::SqlSource;

use url::Url;

/// Render a connection URL with its password hidden, for logging
///
/// # Example
/// ```
/// use pos_ecl::store::redact_url;
///
/// assert_eq!(
///     redact_url("postgres://etl:s3cret@db:5432/pos"),
///     "postgres://etl:***@db:5432/pos"
/// );
/// assert_eq!(redact_url("sqlite::memory:"), "sqlite::memory:");
/// ```
pub fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            if url.set_password(Some("***")).is_ok() {
                url.to_string()
            } else {
                raw.to_string()
            }
        }
        _ => raw.to_string(),
    }
}
