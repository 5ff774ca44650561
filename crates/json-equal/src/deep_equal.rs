use serde_json::{Number, Value};

/// Strict recursive equality.
///
/// Mappings compare without regard to key order. Numbers compare only within
/// the same kind: an integer never equals a float.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => number_equal(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| deep_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, l)| y.get(k).is_some_and(|r| deep_equal(l, r)))
        }
        _ => false,
    }
}

fn number_equal(x: &Number, y: &Number) -> bool {
    match (x.is_f64(), y.is_f64()) {
        (false, false) => x.as_i64() == y.as_i64() && x.as_u64() == y.as_u64(),
        (true, true) => x.as_f64() == y.as_f64(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mapping_order_is_ignored() {
        assert!(deep_equal(&json!({"a": 1, "b": 2}), &json!({"b": 2, "a": 1})));
    }

    #[test]
    fn integer_and_float_differ() {
        assert!(!deep_equal(&json!(1), &json!(1.0)));
        assert!(deep_equal(&json!(1.5), &json!(1.5)));
    }

    #[test]
    fn negative_and_unsigned_integers() {
        assert!(deep_equal(&json!(-3), &json!(-3)));
        assert!(!deep_equal(&json!(-3), &json!(3)));
        assert!(deep_equal(&json!(u64::MAX), &json!(u64::MAX)));
    }
}
