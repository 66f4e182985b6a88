//! Transformer trait for data transformation

use eyre::Result;

/// Transformer trait for transforming extracted data
///
/// Implementors define how data is changed between extraction and loading,
/// e.g. the [`Cleaner`](crate::clean::Cleaner).
///
/// # Example
/// ```
/// use pos_ecl::etl::Transformer;
/// use pos_ecl::table::Table;
/// use eyre::Result;
///
/// struct FirstRows(usize);
///
/// impl Transformer for FirstRows {
///     type Input = Table;
///     type Output = Table;
///
///     fn transform(&self, input: Self::Input) -> Result<Self::Output> {
///         let (columns, mut rows) = input.into_parts();
///         rows.truncate(self.0);
///         Table::from_parts(columns, rows)
///     }
/// }
/// ```
pub trait Transformer: Send + Sync {
    /// Input item type
    type Input: Send;

    /// Output item type after transformation
    type Output: Send;

    /// Transform a single item
    ///
    /// # Errors
    /// Returns an error if transformation fails
    fn transform(&self, input: Self::Input) -> Result<Self::Output>;
}
