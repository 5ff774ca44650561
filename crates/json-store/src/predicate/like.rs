//! SQL `LIKE` patterns.

use regex::{Regex, RegexBuilder};

/// Compiles a `LIKE` pattern into an anchored, case-insensitive regex.
///
/// `%` matches any run of characters (consecutive `%` collapse), `_` matches
/// one character and a backslash makes the next character literal.
pub fn like_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut source = String::from("^");
    let mut chars = pattern.chars();
    let mut last_was_any = false;
    while let Some(c) = chars.next() {
        match c {
            '%' => {
                if !last_was_any {
                    source.push_str(".*?");
                }
                last_was_any = true;
                continue;
            }
            '_' => source.push('.'),
            '\\' => match chars.next() {
                Some(escaped) => source.push_str(&regex::escape(&escaped.to_string())),
                None => source.push_str(&regex::escape("\\")),
            },
            other => source.push_str(&regex::escape(&other.to_string())),
        }
        last_was_any = false;
    }
    source.push('$');
    RegexBuilder::new(&source)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
}

/// Whether `value` matches the `LIKE` pattern.
pub fn is_like(value: &str, pattern: &str) -> bool {
    like_regex(pattern).is_ok_and(|re| re.is_match(value))
}
