//! Loose (type-coercing) comparison of JSON values.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::{Number, Value};

use crate::numeric::parse_numeric;

/// Truthiness of a value: `null`, `false`, `0`, `0.0`, `""`, `"0"` and empty
/// containers are falsy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Text form of a value as used for substring and pattern matching.
///
/// `true` becomes `"1"`, `false` and `null` become `""`, and containers are
/// rendered as compact JSON.
pub fn to_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null | Value::Bool(false) => Cow::Borrowed(""),
        Value::Bool(true) => Cow::Borrowed("1"),
        Value::Number(n) => Cow::Owned(number_text(n)),
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

/// Loose equality: `loose_compare(a, b) == Some(Ordering::Equal)`.
pub fn loose_equal(a: &Value, b: &Value) -> bool {
    loose_compare(a, b) == Some(Ordering::Equal)
}

/// Orders two values after scalar coercion.
///
/// Returns `None` when the values are not comparable (for example two
/// mappings with different key sets).
pub fn loose_compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, Value::String(s)) => Some("".cmp(s.as_str())),
        (Value::String(s), Value::Null) => Some(s.as_str().cmp("")),
        (Value::Bool(_), _) | (_, Value::Bool(_)) | (Value::Null, _) | (_, Value::Null) => {
            Some(truthy(a).cmp(&truthy(b)))
        }
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::Number(x), Value::String(s)) => match parse_numeric(s) {
            Some(f) => x.as_f64().and_then(|n| n.partial_cmp(&f)),
            None => Some(number_text(x).as_str().cmp(s.as_str())),
        },
        (Value::String(_), Value::Number(_)) => loose_compare(b, a).map(Ordering::reverse),
        (Value::String(x), Value::String(y)) => match (parse_numeric(x), parse_numeric(y)) {
            (Some(l), Some(r)) => l.partial_cmp(&r),
            _ => Some(x.cmp(y)),
        },
        (Value::Array(x), Value::Array(y)) => {
            if x.len() != y.len() {
                return Some(x.len().cmp(&y.len()));
            }
            for (l, r) in x.iter().zip(y) {
                match loose_compare(l, r)? {
                    Ordering::Equal => continue,
                    other => return Some(other),
                }
            }
            Some(Ordering::Equal)
        }
        (Value::Object(x), Value::Object(y)) => {
            if x.len() != y.len() {
                return Some(x.len().cmp(&y.len()));
            }
            for (k, l) in x {
                match loose_compare(l, y.get(k)?)? {
                    Ordering::Equal => continue,
                    other => return Some(other),
                }
            }
            Some(Ordering::Equal)
        }
        (Value::Array(_), Value::Object(_)) | (Value::Object(_), Value::Array(_)) => None,
        (Value::Array(_) | Value::Object(_), _) => Some(Ordering::Greater),
        (_, Value::Array(_) | Value::Object(_)) => Some(Ordering::Less),
    }
}

fn compare_numbers(x: &Number, y: &Number) -> Option<Ordering> {
    match (integer(x), integer(y)) {
        (Some(l), Some(r)) => Some(l.cmp(&r)),
        _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
    }
}

fn integer(n: &Number) -> Option<i128> {
    if n.is_f64() {
        return None;
    }
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() => f.to_string(),
        _ => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_strings_compare_as_numbers() {
        assert!(loose_equal(&json!("10"), &json!(10)));
        assert!(loose_equal(&json!("1.0"), &json!(1)));
        assert_eq!(loose_compare(&json!("9"), &json!("10")), Some(Ordering::Less));
    }

    #[test]
    fn non_numeric_strings_compare_as_text() {
        assert_eq!(loose_compare(&json!("b"), &json!("a")), Some(Ordering::Greater));
        assert!(!loose_equal(&json!("abc"), &json!(0)));
    }

    #[test]
    fn booleans_and_null_use_truthiness() {
        assert!(loose_equal(&json!(true), &json!("yes")));
        assert!(loose_equal(&json!(false), &json!(0)));
        assert!(loose_equal(&json!(null), &json!(0)));
        assert!(loose_equal(&json!(null), &json!("")));
        assert!(!loose_equal(&json!(null), &json!("0")));
    }

    #[test]
    fn float_text_drops_trailing_zero() {
        assert_eq!(to_text(&json!(1.0)), "1");
        assert_eq!(to_text(&json!(2.5)), "2.5");
        assert_eq!(to_text(&json!(true)), "1");
    }

    #[test]
    fn containers_outrank_scalars() {
        assert_eq!(loose_compare(&json!([1]), &json!(5)), Some(Ordering::Greater));
        assert_eq!(loose_compare(&json!({"a": 1}), &json!({"b": 1})), None);
    }
}
