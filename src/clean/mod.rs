//! Column-driven cleaning of extracted tables
//!
//! The [`Cleaner`] applies a fixed sequence of rules to every column of a
//! [`Table`], chosen by the column's inferred kind and its name:
//!
//! 1. Text columns are trimmed; name-like columns are normalized
//!    (see [`NamePolicy`]) and, with the legacy rules, key-like columns are
//!    upper-cased.
//! 2. Date-like columns are parsed as timestamps truncated to whole seconds.
//!    A row whose date fails to parse is dropped.
//! 3. Numeric columns are re-coerced, unparseable values become null.
//! 4. Floating-point columns are rounded to two decimals.
//! 5. Rows where every value is null are dropped.

mod numeric;
mod rules;
mod temporal;
mod text;

pub use numeric::round_decimal;
pub use rules::{NamePolicy, RulePreset, RuleSet};
pub use temporal::parse_timestamp;
pub use text::{SENTINEL, title_case};

use crate::etl::Transformer;
use crate::table::{ColumnKind, Table, Value};
use eyre::Result;

/// Decimal places kept for floating-point columns
pub const DECIMAL_PLACES: usize = 2;

/// Row counts of one cleaning pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanStats {
    pub rows_before: usize,
    pub rows_after: usize,
    /// Rows dropped because a date-like column did not parse
    pub invalid_dates: usize,
    /// Rows dropped because every value was null
    pub empty_rows: usize,
}

/// Applies a [`RuleSet`] to whole tables
///
/// # Example
/// ```
/// use pos_ecl::clean::Cleaner;
/// use pos_ecl::table::{Table, Value};
///
/// let table = Table::new(
///     vec!["nombre".to_string(), "total".to_string()],
///     vec![vec![Value::from("  ANA lopez "), Value::Float(10.456)]],
/// )?;
///
/// let cleaned = Cleaner::default().clean(table)?;
/// assert_eq!(cleaned.value(0, "nombre"), Some(&Value::from("Ana Lopez")));
/// assert_eq!(cleaned.value(0, "total"), Some(&Value::Float(10.46)));
/// # Ok::<(), eyre::Report>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    rules: RuleSet,
}

impl Cleaner {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Clean a table, discarding the statistics
    ///
    /// # Errors
    /// Returns an error if the cleaned rows no longer fit the schema
    pub fn clean(&self, input: Table) -> Result<Table> {
        Ok(self.clean_with_stats(input)?.0)
    }

    /// Clean a table and report how many rows each filter removed
    ///
    /// # Errors
    /// Returns an error if the cleaned rows no longer fit the schema
    pub fn clean_with_stats(&self, input: Table) -> Result<(Table, CleanStats)> {
        let (mut columns, mut rows) = input.into_parts();
        let rows_before = rows.len();

        // Date failures are collected across all columns and applied once
        let mut invalid = vec![false; rows.len()];

        for (index, column) in columns.iter_mut().enumerate() {
            if column.kind == ColumnKind::Text {
                self.clean_text(&column.name, index, &mut rows);
            }

            if self.rules.is_date_like(&column.name)
                && matches!(
                    column.kind,
                    ColumnKind::Text | ColumnKind::Timestamp | ColumnKind::Other
                )
            {
                for (row, flag) in rows.iter_mut().zip(invalid.iter_mut()) {
                    row[index] = match parse_timestamp(&row[index]) {
                        Some(ts) => Value::Timestamp(ts),
                        None => {
                            *flag = true;
                            Value::Null
                        }
                    };
                }
                column.kind = ColumnKind::Timestamp;
            }

            match column.kind {
                ColumnKind::Integer => {
                    for row in rows.iter_mut() {
                        let value = std::mem::replace(&mut row[index], Value::Null);
                        row[index] = numeric::coerce_integer(value);
                    }
                }
                ColumnKind::Float => {
                    for row in rows.iter_mut() {
                        let value = std::mem::replace(&mut row[index], Value::Null);
                        row[index] = match numeric::coerce_float(value) {
                            Value::Float(v) => Value::Float(round_decimal(v, DECIMAL_PLACES)),
                            other => other,
                        };
                    }
                }
                _ => {}
            }
        }

        let mut stats = CleanStats {
            rows_before,
            ..CleanStats::default()
        };

        let rows: Vec<Vec<Value>> = rows
            .into_iter()
            .zip(invalid)
            .filter_map(|(row, invalid_date)| {
                if invalid_date {
                    stats.invalid_dates += 1;
                    None
                } else if row.iter().all(Value::is_null) {
                    stats.empty_rows += 1;
                    None
                } else {
                    Some(row)
                }
            })
            .collect();
        stats.rows_after = rows.len();

        log::debug!(
            "Cleaned {} row(s) into {} ({} invalid date(s), {} empty row(s))",
            stats.rows_before,
            stats.rows_after,
            stats.invalid_dates,
            stats.empty_rows
        );

        let table = Table::from_parts(columns, rows)?;
        Ok((table, stats))
    }

    fn clean_text(&self, name: &str, index: usize, rows: &mut [Vec<Value>]) {
        let name_like = self.rules.is_name_like(name);
        let key_like = !name_like && self.rules.is_key_like(name);

        for row in rows.iter_mut() {
            if let Value::Text(text) = &row[index] {
                let trimmed = text.trim();
                let cleaned = if name_like {
                    text::normalize_name(trimmed, self.rules.name_policy)
                } else if key_like {
                    trimmed.to_uppercase()
                } else {
                    trimmed.to_string()
                };
                row[index] = Value::Text(cleaned);
            }
        }
    }
}

impl Transformer for Cleaner {
    type Input = Table;
    type Output = Table;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        self.clean(input)
    }
}
