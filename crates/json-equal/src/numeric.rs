/// Whether `text` is a numeric string.
///
/// Accepts an optional sign, decimal digits with an optional fraction, and an
/// optional exponent. Surrounding whitespace is allowed. Hex, `inf` and `nan`
/// are not numeric.
pub fn is_numeric(text: &str) -> bool {
    let bytes = text.trim().as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    let int_digits = count_digits(&bytes[i..]);
    i += int_digits;
    let mut frac_digits = 0;
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        frac_digits = count_digits(&bytes[i..]);
        i += frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return false;
    }
    if matches!(bytes.get(i), Some(b'e') | Some(b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }
        let exp_digits = count_digits(&bytes[i..]);
        if exp_digits == 0 {
            return false;
        }
        i += exp_digits;
    }
    i == bytes.len()
}

/// Parses a numeric string into an `f64`, or `None` when it is not numeric.
pub fn parse_numeric(text: &str) -> Option<f64> {
    if !is_numeric(text) {
        return None;
    }
    text.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
