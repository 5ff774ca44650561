//! Literal coercion and quote-aware list splitting shared by predicates and
//! callback arguments.

use json_store_equal::{is_numeric, parse_numeric};
use serde_json::{Number, Value};

/// Coerces a literal token into a typed value.
///
/// Numeric text with a fractional part becomes a float. Integral text becomes
/// an integer only when written canonically (optional sign, no leading zeros,
/// no exponent or decimal point); `"007"` and `"1.0"` stay text. `true`/`TRUE`,
/// `false` and `null`/`NULL` become their JSON counterparts. Everything else
/// stays text.
pub fn typify(raw: &str) -> Value {
    if is_numeric(raw) {
        if let Some(number) = parse_numeric(raw)
            .filter(|n| n.fract() != 0.0)
            .and_then(Number::from_f64)
        {
            return Value::Number(number);
        }
        return canonical_int(raw)
            .map_or_else(|| Value::String(raw.to_string()), |int| Value::Number(int.into()));
    }
    match raw {
        "true" | "TRUE" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" | "NULL" => Value::Null,
        _ => Value::String(raw.to_string()),
    }
}

fn canonical_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let digits = raw.strip_prefix(&['+', '-'][..]).unwrap_or(raw);
    let canonical = digits == "0"
        || (digits.starts_with(|c: char| matches!(c, '1'..='9'))
            && digits.bytes().all(|b| b.is_ascii_digit()));
    if !canonical {
        return None;
    }
    raw.strip_prefix('+').unwrap_or(raw).parse().ok()
}

/// Splits `text` on `delimiter`, honouring fields enclosed in `quote`.
///
/// A doubled quote inside an enclosed field is a literal quote. A backslash
/// keeps the following character inside the field verbatim (both characters
/// are kept). Unquoted fields are trimmed.
pub fn split_quoted(text: &str, delimiter: char, quote: char) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let mut fields = Vec::new();
    let mut chars = text.chars().peekable();
    loop {
        while matches!(chars.peek(), Some(' ' | '\t')) {
            chars.next();
        }
        let mut field = String::new();
        let enclosed = chars.peek() == Some(&quote);
        if enclosed {
            chars.next();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    field.push(c);
                    if let Some(escaped) = chars.next() {
                        field.push(escaped);
                    }
                } else if c != quote {
                    field.push(c);
                } else if chars.peek() == Some(&quote) {
                    chars.next();
                    field.push(quote);
                } else {
                    break;
                }
            }
        }
        let mut tail = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == delimiter {
                closed = true;
                break;
            }
            tail.push(c);
        }
        if enclosed {
            field.push_str(tail.trim_end());
        } else {
            field = tail.trim().to_string();
        }
        fields.push(field);
        if !closed {
            break;
        }
    }
    fields
}

/// Removes backslash escapes: `\x` becomes `x`, `\\` becomes `\`.
pub fn strip_slashes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Integer prefix of `text`, or `0` when it has none.
pub(crate) fn leading_int(text: &str) -> i64 {
    let text = text.trim();
    let digits_end = text
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+'))))
        .map_or(text.len(), |(i, _)| i);
    text[..digits_end].parse().unwrap_or(0)
}
