//! Predicate clauses: `key<op>literal` tests and key lists, evaluated
//! against one scalar member of a candidate container.

mod like;

pub use like::{is_like, like_regex};

use std::cmp::Ordering;

use json_store_equal::{deep_equal, loose_compare, loose_equal, parse_numeric, to_text};
use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::config::Config;
use crate::error::QueryError;
use crate::literal::{leading_int, split_quoted, typify};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `!%`
    NotContains,
    /// `%`
    Contains,
    /// `>%`: the literal is a prefix pattern (`literal%`).
    StartsLike,
    /// `<%`: the literal is a suffix pattern (`%literal`).
    EndsLike,
    /// `!->`
    NotIn,
    /// `->`
    In,
    /// `!<>`
    NotBetween,
    /// `<>`
    Between,
    /// `*`
    Any,
    /// `==`
    Identical,
    /// `!==`
    NotIdentical,
    /// `!=`
    NotEqual,
    /// `>=`
    GreaterEqual,
    /// `<=`
    LessEqual,
    /// `=`
    Equal,
    /// `>`
    Greater,
    /// `<`
    Less,
}

/// Operator tokens in match priority at one position.
const OPERATORS: [(&str, Operator); 17] = [
    ("!%", Operator::NotContains),
    ("%", Operator::Contains),
    (">%", Operator::StartsLike),
    ("<%", Operator::EndsLike),
    ("!->", Operator::NotIn),
    ("->", Operator::In),
    ("!<>", Operator::NotBetween),
    ("<>", Operator::Between),
    ("*", Operator::Any),
    ("==", Operator::Identical),
    ("!==", Operator::NotIdentical),
    ("!=", Operator::NotEqual),
    (">=", Operator::GreaterEqual),
    ("<=", Operator::LessEqual),
    ("=", Operator::Equal),
    (">", Operator::Greater),
    ("<", Operator::Less),
];

impl Operator {
    pub fn as_str(self) -> &'static str {
        OPERATORS
            .iter()
            .find(|(_, op)| *op == self)
            .map(|(token, _)| *token)
            .unwrap_or("")
    }
}

/// Literal forms with their own meaning.
#[derive(Debug, Clone)]
enum Special {
    /// `=*`: non-null and non-empty.
    NonEmpty,
    /// `=/body/flags`
    Pattern(Regex),
    /// `={prop}`: equal to the sibling member `prop`.
    Sibling(String),
    /// Compiled pattern of `>%` / `<%`.
    Like(Regex),
}

#[derive(Debug, Clone)]
pub struct Comparison {
    key: String,
    op: Operator,
    raw: String,
    literal: Value,
    special: Option<Special>,
}

impl Comparison {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operator(&self) -> Operator {
        self.op
    }

    /// The typified literal.
    pub fn literal(&self) -> &Value {
        &self.literal
    }
}

#[derive(Debug, Clone)]
pub enum Clause {
    /// Bare comma-separated key list: matches members by name.
    Keys(Vec<String>),
    Compare(Comparison),
    /// Index, `first`/`last` or callback text: never matches.
    Inert,
}

impl Clause {
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        Self::parse_quoted(text, '\'')
    }

    /// Like [`Clause::parse`]; `quote` encloses items of a key list.
    pub fn parse_quoted(text: &str, quote: char) -> Result<Self, QueryError> {
        let text = text.trim();
        if is_inert(text) {
            return Ok(Self::Inert);
        }
        let Some((at, token, op)) = find_operator(text) else {
            return Ok(Self::Keys(split_quoted(text, ',', quote)));
        };
        let key = text[..at].trim().to_string();
        let raw = text[at + token.len()..].trim().to_string();
        let literal = typify(&raw);
        let special = match op {
            Operator::Equal => equal_special(&raw)?,
            Operator::StartsLike => Some(Special::Like(like_or_invalid(&format!("{raw}%"))?)),
            Operator::EndsLike => Some(Special::Like(like_or_invalid(&format!("%{raw}"))?)),
            _ => None,
        };
        Ok(Self::Compare(Comparison {
            key,
            op,
            raw,
            literal,
            special,
        }))
    }

    /// Tests the member `key: value`; `scope` is the container holding it.
    pub fn matches(&self, key: &str, value: &Value, scope: Option<&Value>, config: &Config) -> bool {
        match self {
            Self::Inert => false,
            Self::Keys(keys) => keys.iter().any(|wanted| config.keys_match(wanted, key)),
            Self::Compare(cmp) => config.keys_match(&cmp.key, key) && cmp.test(value, scope),
        }
    }
}

impl Comparison {
    fn test(&self, value: &Value, scope: Option<&Value>) -> bool {
        let ordering = || loose_compare(value, &self.literal);
        match self.op {
            Operator::Equal => match &self.special {
                Some(Special::NonEmpty) => !is_empty_value(value),
                Some(Special::Pattern(re)) => re.is_match(&to_text(value)),
                Some(Special::Sibling(prop)) => scope
                    .and_then(|s| s.get(prop))
                    .is_some_and(|sibling| loose_equal(value, sibling)),
                _ => loose_equal(value, &self.literal),
            },
            Operator::Identical => deep_equal(value, &self.literal),
            Operator::NotIdentical => !deep_equal(value, &self.literal),
            Operator::NotEqual => !loose_equal(value, &self.literal),
            Operator::Greater => ordering() == Some(Ordering::Greater),
            Operator::GreaterEqual => matches!(ordering(), Some(Ordering::Greater | Ordering::Equal)),
            Operator::Less => ordering() == Some(Ordering::Less),
            Operator::LessEqual => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
            Operator::Contains => contains(value, &self.literal),
            Operator::NotContains => !contains(value, &self.literal),
            Operator::StartsLike | Operator::EndsLike => match &self.special {
                Some(Special::Like(re)) => re.is_match(&to_text(value)),
                _ => false,
            },
            Operator::Between => integral(value).is_some_and(|n| self.in_range(n)),
            Operator::NotBetween => integral(value).is_some_and(|n| !self.in_range(n)),
            Operator::In => self.in_list(value),
            Operator::NotIn => !self.in_list(value),
            Operator::Any => true,
        }
    }

    fn in_range(&self, n: i64) -> bool {
        let mut bounds = self.raw.split(',').map(|b| leading_int(b.trim()));
        match (bounds.next(), bounds.next()) {
            (Some(a), Some(b)) => (a.min(b)..=a.max(b)).contains(&n),
            _ => false,
        }
    }

    fn in_list(&self, value: &Value) -> bool {
        self.raw
            .trim_matches(|c| c == ' ' || c == ',')
            .split(',')
            .any(|item| loose_equal(value, &Value::String(item.trim().to_string())))
    }
}

fn find_operator(text: &str) -> Option<(usize, &'static str, Operator)> {
    (0..text.len())
        .filter(|i| text.is_char_boundary(*i))
        .find_map(|i| {
            OPERATORS
                .iter()
                .find(|(token, _)| text[i..].starts_with(token))
                .map(|(token, op)| (i, *token, *op))
        })
}

fn is_inert(text: &str) -> bool {
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }
    if text.eq_ignore_ascii_case("first") || text.eq_ignore_ascii_case("last") {
        return true;
    }
    if text.contains("::") {
        return true;
    }
    match text.split_once('|') {
        Some((name, _)) => {
            !name.is_empty()
                && name
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b':')
        }
        None => false,
    }
}

fn equal_special(raw: &str) -> Result<Option<Special>, QueryError> {
    if raw == "*" {
        return Ok(Some(Special::NonEmpty));
    }
    if raw.len() >= 2 && raw.starts_with('{') && raw.ends_with('}') {
        let prop = raw[1..raw.len() - 1].trim().to_string();
        return Ok(Some(Special::Sibling(prop)));
    }
    if raw.starts_with('/') && raw.matches('/').count() == 2 {
        if let Some((body, flags)) = raw[1..].split_once('/') {
            if flags.chars().all(|f| "imsxu".contains(f)) {
                let re = RegexBuilder::new(body)
                    .case_insensitive(flags.contains('i'))
                    .multi_line(flags.contains('m'))
                    .dot_matches_new_line(flags.contains('s'))
                    .ignore_whitespace(flags.contains('x'))
                    .build()
                    .map_err(|err| QueryError::InvalidArgument(format!("{raw}: {err}")))?;
                return Ok(Some(Special::Pattern(re)));
            }
        }
    }
    Ok(None)
}

fn like_or_invalid(pattern: &str) -> Result<Regex, QueryError> {
    like_regex(pattern).map_err(|err| QueryError::InvalidArgument(format!("{pattern}: {err}")))
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn contains(value: &Value, literal: &Value) -> bool {
    to_text(value)
        .to_lowercase()
        .contains(&to_text(literal).to_lowercase())
}

/// Integral numeric value of a number or numeric string.
fn integral(value: &Value) -> Option<i64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_numeric(s)?,
        _ => return None,
    };
    (n.fract() == 0.0 && n.abs() < i64::MAX as f64).then_some(n as i64)
}
