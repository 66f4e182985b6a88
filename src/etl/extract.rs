//! Extractor trait for reading source tables

use eyre::Result;

/// Extractor trait for reading one named table from a source
///
/// Implementors define how a table is read:
/// - SQL stores (`SELECT *`)
/// - In-memory fixtures for tests
///
/// # Example
/// ```no_run
/// use pos_ecl::etl::Extractor;
/// use pos_ecl::table::Table;
/// use eyre::Result;
///
/// struct FixtureExtractor {
///     table: Table,
/// }
///
/// impl Extractor for FixtureExtractor {
///     type Item = Table;
///
///     async fn extract(&self, _table: &str) -> Result<Self::Item> {
///         Ok(self.table.clone())
///     }
/// }
/// ```
pub trait Extractor: Send + Sync {
    /// The type of data extracted for one table
    type Item: Send;

    /// Read the full contents of `table`
    ///
    /// # Errors
    /// Returns an error if the read fails (permissions, missing relation,
    /// unsupported column types, driver errors)
    fn extract(&self, table: &str) -> impl std::future::Future<Output = Result<Self::Item>> + Send;
}
