//! json-store-equal - Equality and ordering rules for JSON values.
//!
//! Provides two families of comparison over [`serde_json::Value`]:
//!
//! - [`deep_equal`]: strict structural equality. Integers and floats are
//!   different types, so `1` and `1.0` are not equal.
//! - [`loose_equal`] / [`loose_compare`]: scalar-coercing comparison used by
//!   query predicates. Numeric strings compare as numbers, booleans compare by
//!   truthiness, and `null` compares as the empty string against strings.
//!
//! [`type_name`] gives the type label reported by type-safe replacement.

mod deep_equal;
mod loose;
mod numeric;

pub use deep_equal::deep_equal;
pub use loose::{loose_compare, loose_equal, to_text, truthy};
pub use numeric::{is_numeric, parse_numeric};

use serde_json::Value;

/// Type label of a value: `null`, `boolean`, `integer`, `float`, `string`,
/// `sequence` or `mapping`.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Returns `true` for sequences and mappings.
pub fn is_container(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}
