/// Quote an SQL identifier, doubling embedded double quotes
///
/// Quoting preserves case and lets reserved words be used as table or column
/// names.
///
/// ```
/// use pos_ecl::store::quote_ident;
///
/// assert_eq!(quote_ident("VENTATICKETS"), "\"VENTATICKETS\"");
/// assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
/// ```
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Name of the table a staged load copies into before the swap
pub fn staging_name(table: &str) -> String {
    format!("{table}__staging")
}
