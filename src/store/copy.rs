//! PostgreSQL `COPY ... FROM STDIN` text-format encoding
//!
//! Rows are written tab-separated, newline-terminated, with `\N` for null.
//! Backslash, tab, newline and carriage return inside values are escaped, so
//! an empty string and a null stay distinct.

use crate::table::{ColumnKind, Table, Value};
use std::fmt::Write as _;

/// Destination column type for a column of `table`
///
/// Columns of kind [`ColumnKind::Other`] look at their values: all booleans
/// give `BOOLEAN`, all bytes give `BYTEA`, anything else falls back to `TEXT`.
pub fn sql_type(table: &Table, index: usize) -> &'static str {
    match table.columns()[index].kind {
        ColumnKind::Integer => "BIGINT",
        ColumnKind::Float => "DOUBLE PRECISION",
        ColumnKind::Timestamp => "TIMESTAMP",
        ColumnKind::Text => "TEXT",
        ColumnKind::Other => {
            let mut values = table.column_values(index).filter(|v| !v.is_null());
            match values.next() {
                None => "TEXT",
                Some(Value::Bool(_)) if values.all(|v| matches!(v, Value::Bool(_))) => "BOOLEAN",
                Some(Value::Bytes(_)) if values.all(|v| matches!(v, Value::Bytes(_))) => "BYTEA",
                Some(_) => "TEXT",
            }
        }
    }
}

/// Append one row in COPY text format, including the trailing newline
pub fn encode_row(row: &[Value], out: &mut String) {
    for (i, value) in row.iter().enumerate() {
        if i > 0 {
            out.push('\t');
        }
        encode_value(value, out);
    }
    out.push('\n');
}

fn encode_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("\\N"),
        Value::Bool(true) => out.push('t'),
        Value::Bool(false) => out.push('f'),
        Value::Int(v) => {
            let _ = write!(out, "{v}");
        }
        Value::Float(v) if v.is_nan() => out.push_str("NaN"),
        Value::Float(v) if v.is_infinite() => {
            out.push_str(if *v > 0.0 { "Infinity" } else { "-Infinity" })
        }
        Value::Float(v) => {
            let _ = write!(out, "{v}");
        }
        Value::Text(text) => escape_into(text, out),
        Value::Timestamp(ts) => {
            let _ = write!(out, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f"));
        }
        // bytea hex input; the backslash itself has to be escaped in COPY text
        Value::Bytes(bytes) => {
            out.push_str("\\\\x");
            out.push_str(&hex::encode(bytes));
        }
    }
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
}
