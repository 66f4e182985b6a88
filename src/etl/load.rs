//! Loader trait for loading data to destinations

use async_trait::async_trait;
use eyre::Result;

/// Loader trait for replacing a destination table
///
/// # Example
/// ```no_run
/// use pos_ecl::etl::Loader;
/// use pos_ecl::table::Table;
/// use async_trait::async_trait;
/// use eyre::Result;
///
/// struct CountingLoader;
///
/// #[async_trait]
/// impl Loader for CountingLoader {
///     type Item = Table;
///
///     async fn load(&self, _table: &str, item: Self::Item) -> Result<usize> {
///         Ok(item.row_count())
///     }
/// }
/// ```
#[async_trait]
pub trait Loader: Send + Sync {
    /// The type of data loaded into one table
    type Item: Send;

    /// Replace `table` with `item`
    ///
    /// Returns the number of rows loaded
    ///
    /// # Errors
    /// Returns an error if any step of the replacement fails
    async fn load(&self, table: &str, item: Self::Item) -> Result<usize>;

    /// Release the destination connection
    async fn close(&self) {}
}

/// Destination table name for a source table: lower-cased with a `_clean` suffix
///
/// ```
/// assert_eq!(pos_ecl::etl::clean_table_name("VentaTickets"), "ventatickets_clean");
/// ```
pub fn clean_table_name(source: &str) -> String {
    format!("{}_clean", source.to_lowercase())
}
