//! In-memory tabular data
//!
//! A [`Table`] is an ordered schema of named, typed columns plus the rows
//! extracted from a source table. Column kinds are inferred from the values
//! themselves, so the pipeline can work on tables whose shape is only known at
//! runtime.

mod value;

pub use value::Value;

use eyre::Result;

/// Classification of a column, inferred from its non-null values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
    Timestamp,
    /// Booleans, bytes, mixed values or columns with no data at all
    Other,
}

impl ColumnKind {
    /// Infer the kind of a column from its values
    ///
    /// Nulls are ignored. Integers mixed with floats widen to [`ColumnKind::Float`];
    /// any other mix is [`ColumnKind::Other`].
    ///
    /// # Example
    /// ```
    /// use pos_ecl::table::{ColumnKind, Value};
    ///
    /// let values = vec![Value::Int(1), Value::Null, Value::Float(2.5)];
    /// assert_eq!(ColumnKind::infer(&values), ColumnKind::Float);
    /// ```
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut inferred: Option<ColumnKind> = None;

        for value in values {
            let kind = match value {
                Value::Null => continue,
                Value::Int(_) => ColumnKind::Integer,
                Value::Float(_) => ColumnKind::Float,
                Value::Text(_) => ColumnKind::Text,
                Value::Timestamp(_) => ColumnKind::Timestamp,
                Value::Bool(_) | Value::Bytes(_) => return ColumnKind::Other,
            };

            inferred = Some(match (inferred, kind) {
                (None, kind) => kind,
                (Some(current), kind) if current == kind => current,
                (Some(ColumnKind::Integer), ColumnKind::Float)
                | (Some(ColumnKind::Float), ColumnKind::Integer) => ColumnKind::Float,
                _ => return ColumnKind::Other,
            });
        }

        inferred.unwrap_or(ColumnKind::Other)
    }
}

/// A named column and its inferred kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Schema plus rows of one extracted table
///
/// Every row holds exactly one value per column, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table from column names and rows, inferring each column's kind
    ///
    /// # Errors
    /// Returns an error if any row does not have one value per column
    pub fn new(names: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        check_widths(names.len(), &rows)?;

        let columns = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let kind = ColumnKind::infer(rows.iter().map(|row| &row[index]));
                Column::new(name, kind)
            })
            .collect();

        Ok(Self { columns, rows })
    }

    /// Build a table from an explicit schema
    ///
    /// # Errors
    /// Returns an error if any row does not have one value per column
    pub fn from_parts(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Result<Self> {
        check_widths(columns.len(), &rows)?;
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Values of one column, top to bottom
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Value at a row for a named column
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[index])
    }

    pub fn into_parts(self) -> (Vec<Column>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }
}

fn check_widths(width: usize, rows: &[Vec<Value>]) -> Result<()> {
    if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
        eyre::bail!(
            "Row {} has {} value(s) but the table has {} column(s)",
            index,
            row.len(),
            width
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_infer_kinds_per_column() {
        let table = Table::new(
            names(&["id", "nombre", "total", "flag", "empty"]),
            vec![
                vec![
                    Value::Int(1),
                    Value::from("ana"),
                    Value::Int(3),
                    Value::Bool(true),
                    Value::Null,
                ],
                vec![
                    Value::Int(2),
                    Value::Null,
                    Value::Float(2.5),
                    Value::Bool(false),
                    Value::Null,
                ],
            ],
        )
        .unwrap();

        let kinds: Vec<ColumnKind> = table.columns().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Integer,
                ColumnKind::Text,
                ColumnKind::Float,
                ColumnKind::Other,
                ColumnKind::Other,
            ]
        );
    }

    #[test]
    fn test_mixed_text_and_numbers_is_other() {
        let values = vec![Value::Int(1), Value::from("x")];
        assert_eq!(ColumnKind::infer(&values), ColumnKind::Other);
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let result = Table::new(
            names(&["a", "b"]),
            vec![vec![Value::Int(1), Value::Int(2)], vec![Value::Int(3)]],
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Row 1 has 1 value(s)"));
    }

    #[test]
    fn test_value_lookup() {
        let table = Table::new(names(&["a"]), vec![vec![Value::Int(7)]]).unwrap();
        assert_eq!(table.value(0, "a"), Some(&Value::Int(7)));
        assert_eq!(table.value(0, "missing"), None);
        assert_eq!(table.value(5, "a"), None);
    }
}
