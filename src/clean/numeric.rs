//! Numeric coercion and fixed-precision rounding

use crate::table::Value;
use bigdecimal::{BigDecimal, RoundingMode};
use std::str::FromStr;

/// Coerce a cell of an integer column, unparseable values become null
pub fn coerce_integer(value: Value) -> Value {
    match value {
        Value::Int(_) | Value::Null => value,
        Value::Float(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Value::Int(v as i64),
        Value::Text(text) => text.trim().parse().map_or(Value::Null, Value::Int),
        _ => Value::Null,
    }
}

/// Coerce a cell of a floating-point column, unparseable values become null
pub fn coerce_float(value: Value) -> Value {
    let number = match value {
        Value::Float(v) => Some(v),
        Value::Int(v) => Some(v as f64),
        Value::Text(text) => text.trim().parse().ok(),
        _ => None,
    };
    number
        .filter(|v| !v.is_nan())
        .map_or(Value::Null, Value::Float)
}

/// Round to `places` decimals, half away from zero
///
/// Rounding works on the shortest decimal representation of the value, so
/// `19.995` rounds to `20.0` even though its binary value is slightly below
/// the midpoint.
pub fn round_decimal(value: f64, places: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let Ok(decimal) = BigDecimal::from_str(&value.to_string()) else {
        return value;
    };
    decimal
        .with_scale_round(places as i64, RoundingMode::HalfUp)
        .to_string()
        .parse()
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_decimal(19.995, 2), 20.0);
        assert_eq!(round_decimal(2.675, 2), 2.68);
        assert_eq!(round_decimal(-1.005, 2), -1.01);
        assert_eq!(round_decimal(1.234, 2), 1.23);
        assert_eq!(round_decimal(-0.004, 2), 0.0);
    }

    #[test]
    fn test_round_extreme_magnitudes() {
        assert_eq!(round_decimal(1e300, 2), 1e300);
        assert_eq!(round_decimal(1e-300, 2), 0.0);
    }

    #[test]
    fn test_round_is_stable() {
        for v in [19.99, 0.1, 5.0, 1e20, -3.5] {
            assert_eq!(round_decimal(v, 2), v);
            assert_eq!(round_decimal(round_decimal(v, 2), 2), round_decimal(v, 2));
        }
        assert!(round_decimal(f64::NAN, 2).is_nan());
        assert_eq!(round_decimal(f64::INFINITY, 2), f64::INFINITY);
    }

    #[test]
    fn test_coerce_float() {
        assert_eq!(coerce_float(Value::Int(2)), Value::Float(2.0));
        assert_eq!(coerce_float(Value::from(" 3.25 ")), Value::Float(3.25));
        assert_eq!(coerce_float(Value::from("abc")), Value::Null);
        assert_eq!(coerce_float(Value::Float(f64::NAN)), Value::Null);
        assert_eq!(coerce_float(Value::Bool(true)), Value::Null);
    }

    #[test]
    fn test_coerce_integer() {
        assert_eq!(coerce_integer(Value::Int(7)), Value::Int(7));
        assert_eq!(coerce_integer(Value::Float(4.0)), Value::Int(4));
        assert_eq!(coerce_integer(Value::Float(4.5)), Value::Null);
        assert_eq!(coerce_integer(Value::from("12")), Value::Int(12));
        assert_eq!(coerce_integer(Value::from("12x")), Value::Null);
    }
}
