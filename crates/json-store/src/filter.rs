//! Result filters: index, range and callback commands applied to a result
//! set.

use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use crate::engine::Context;
use crate::error::{FilterError, StoreError};
use crate::gateway::CallSpec;
use crate::literal::leading_int;
use crate::selection::Selection;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `''` or `*`: the result set unchanged.
    All,
    /// `n`, `-n`, `first` (0) or `last` (-1).
    Index(i64),
    /// `a..b`, inclusive, either order.
    Range(i64, i64),
    /// `a.b`: the single index `ceil(a + (b - a) / 2)`.
    Midpoint(i64, i64),
    /// `a,b,c`
    List(Vec<i64>),
    /// `!a,b`
    Except(Vec<i64>),
    /// `a+b`: `a..=a+b`.
    Span(i64, i64),
    /// `>a`: every index after `a`.
    After(i64),
    /// `<a`: every index before `a`.
    Before(i64),
    /// `%n`: `0` keeps all, `1` odd indices, otherwise multiples of `n`.
    Modulo(i64),
    Call(CallSpec),
}

impl From<i64> for Filter {
    fn from(index: i64) -> Self {
        Self::Index(index)
    }
}

impl From<CallSpec> for Filter {
    fn from(spec: CallSpec) -> Self {
        Self::Call(spec)
    }
}

impl FromStr for Filter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, '\'')
    }
}

impl Filter {
    pub fn first() -> Self {
        Self::Index(0)
    }

    pub fn last() -> Self {
        Self::Index(-1)
    }

    /// Parses a filter; `quote` encloses callback arguments.
    pub fn parse(text: &str, quote: char) -> Result<Self, FilterError> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("first") {
            return Ok(Self::first());
        }
        if text.eq_ignore_ascii_case("last") {
            return Ok(Self::last());
        }
        if let Some(index) = signed_int(text) {
            return Ok(Self::Index(index));
        }
        if text.is_empty() || text == "*" {
            return Ok(Self::All);
        }
        if CallSpec::looks_like(text) {
            return CallSpec::parse(text, quote).map(Self::Call);
        }
        if let Some((a, b)) = text.split_once("..") {
            return Ok(Self::Range(leading_int(a), leading_int(b)));
        }
        if let Some((a, b)) = text.split_once('.') {
            return Ok(Self::Midpoint(leading_int(a), leading_int(b)));
        }
        if let Some(rest) = text.strip_prefix('!') {
            return Ok(Self::Except(int_list(rest)));
        }
        if text.contains(',') {
            return Ok(Self::List(int_list(text)));
        }
        if let Some((a, b)) = text.split_once('+') {
            return Ok(Self::Span(leading_int(a), leading_int(b)));
        }
        if let Some(rest) = text.strip_prefix('>') {
            return Ok(Self::After(leading_int(rest)));
        }
        if let Some(rest) = text.strip_prefix('<') {
            return Ok(Self::Before(leading_int(rest)));
        }
        if let Some(rest) = text.strip_prefix('%') {
            return Ok(Self::Modulo(leading_int(rest)));
        }
        Err(FilterError::Unrecognized(text.to_string()))
    }

    /// Whether the command keeps the element at `index`.
    ///
    /// `All`, `Index` and `Call` are handled by [`apply`].
    fn keeps(&self, index: usize) -> bool {
        let i = index as i64;
        match self {
            Self::All => true,
            Self::Index(_) | Self::Call(_) => false,
            Self::Range(a, b) => (*a.min(b)..=*a.max(b)).contains(&i),
            Self::Midpoint(a, b) => {
                let (a, b) = (*a as f64, *b as f64);
                (a + (b - a) / 2.0).ceil() as i64 == i
            }
            Self::List(list) => list.contains(&i),
            Self::Except(list) => !list.contains(&i),
            Self::Span(a, b) => {
                let end = a.saturating_add(*b);
                (*a.min(&end)..=*a.max(&end)).contains(&i)
            }
            Self::After(a) => i > *a,
            Self::Before(a) => i < *a,
            Self::Modulo(0) => true,
            Self::Modulo(1) => i % 2 == 1,
            Self::Modulo(n) => (index as u64) % n.unsigned_abs() == 0,
        }
    }
}

/// Applies `filter` to `subject`.
///
/// Index and projection commands address the elements of a sequence, the
/// values of a mapping, or nothing for a scalar. A callback's return value
/// replaces the result set.
pub fn apply(
    root: &mut Value,
    ctx: &Context<'_>,
    subject: Selection,
    filter: &Filter,
) -> Result<Selection, StoreError> {
    let always_array = ctx.config.filter_always_returns_array;
    debug!(filter = ?filter, "applying filter");
    match filter {
        Filter::All => Ok(subject),
        Filter::Call(spec) => {
            let input = subject.to_value(root);
            let output = ctx.callbacks.invoke(spec, input, root, ctx.config)?;
            Ok(Selection::Detached(if always_array {
                into_sequence(output)
            } else {
                output
            }))
        }
        Filter::Index(index) => {
            let mut elements = elements(root, &subject);
            let len = elements.len() as i64;
            let at = if *index < 0 { len + index } else { *index };
            if at < 0 || at >= len {
                return empty(always_array);
            }
            let picked = elements.swap_remove(at as usize);
            Ok(if always_array {
                Selection::Collection(vec![picked])
            } else {
                picked
            })
        }
        command => {
            let picked: Vec<Selection> = elements(root, &subject)
                .into_iter()
                .enumerate()
                .filter(|(i, _)| command.keeps(*i))
                .map(|(_, element)| element)
                .collect();
            if picked.is_empty() {
                return empty(always_array);
            }
            Ok(Selection::Collection(picked))
        }
    }
}

fn elements(root: &Value, subject: &Selection) -> Vec<Selection> {
    subject
        .children(root)
        .into_iter()
        .map(|(_, child)| child)
        .collect()
}

fn empty(always_array: bool) -> Result<Selection, StoreError> {
    if always_array {
        Ok(Selection::Collection(Vec::new()))
    } else {
        Err(FilterError::Empty.into())
    }
}

fn into_sequence(value: Value) -> Value {
    match value {
        Value::Array(_) => value,
        Value::Null => Value::Array(Vec::new()),
        other => Value::Array(vec![other]),
    }
}

fn signed_int(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn int_list(text: &str) -> Vec<i64> {
    text.split(',').filter_map(|item| signed_int(item.trim())).collect()
}
