//! Multi-clause queries joined by `&&` / `||`.

use std::str::FromStr;

use serde_json::Value;
use tracing::{debug, trace};

use crate::config::Config;
use crate::error::QueryError;
use crate::predicate::Clause;
use crate::selection::{push_unique, Kind, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    /// Scan the running result set.
    And,
    /// Rescan the base node and union into the running set.
    Or,
}

impl Connector {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    fn parse_token(text: &str) -> Option<Self> {
        match text.trim() {
            "&&" => Some(Self::And),
            "||" => Some(Self::Or),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Term {
    pub connector: Connector,
    pub clause: Clause,
}

/// Clauses evaluated flat, left to right. The connector of the first term is
/// ignored.
#[derive(Debug, Clone, Default)]
pub struct Query {
    terms: Vec<Term>,
}

impl Query {
    /// Parses `a=1&&b>2||c`.
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        Self::parse_quoted(text, '\'')
    }

    /// Like [`Query::parse`]; `quote` encloses items of key-list clauses.
    pub fn parse_quoted(text: &str, quote: char) -> Result<Self, QueryError> {
        let mut query = Self::default();
        query.push_text(text, Connector::And, quote)?;
        Ok(query)
    }

    /// Builds a query from list items. Items `"&&"` and `"||"` set the
    /// connector of the next clause; adjacent clauses default to `&&`.
    pub fn from_parts<I, S>(parts: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut query = Self::default();
        let mut pending = Connector::And;
        for part in parts {
            let part = part.as_ref();
            if let Some(connector) = Connector::parse_token(part) {
                pending = connector;
                continue;
            }
            query.push_text(part, pending, '\'')?;
            pending = Connector::And;
        }
        Ok(query)
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn push_text(&mut self, text: &str, first: Connector, quote: char) -> Result<(), QueryError> {
        let mut connector = first;
        let mut rest = text;
        loop {
            let split = [Connector::And, Connector::Or]
                .into_iter()
                .filter_map(|c| rest.find(c.as_str()).map(|at| (at, c)))
                .min_by_key(|(at, _)| *at);
            let (clause, next) = match split {
                Some((at, c)) => (&rest[..at], Some((c, &rest[at + 2..]))),
                None => (rest, None),
            };
            if !clause.trim().is_empty() {
                self.terms.push(Term {
                    connector,
                    clause: Clause::parse_quoted(clause, quote)?,
                });
            }
            match next {
                Some((c, tail)) => {
                    connector = c;
                    rest = tail;
                }
                None => return Ok(()),
            }
        }
    }
}

impl FromStr for Query {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Runs `query` against `base`, returning the matched containers.
///
/// An empty result is [`QueryError::NoMatch`].
pub fn select(
    root: &Value,
    config: &Config,
    base: &Selection,
    query: &Query,
    path: &str,
) -> Result<Selection, QueryError> {
    let mut running: Vec<Selection> = Vec::new();
    for (i, term) in query.terms().iter().enumerate() {
        if i == 0 {
            running = scan_clause(root, config, base, &term.clause);
            debug!(path = %path, matches = running.len(), "first clause");
            continue;
        }
        match term.connector {
            Connector::And => {
                let scope = Selection::Collection(std::mem::take(&mut running));
                running = scan_clause(root, config, &scope, &term.clause);
            }
            Connector::Or => {
                for found in scan_clause(root, config, base, &term.clause) {
                    push_unique(&mut running, found);
                }
            }
        }
        debug!(path = %path, connector = term.connector.as_str(), matches = running.len(), "clause");
    }
    if running.is_empty() {
        return Err(QueryError::NoMatch {
            path: path.trim().to_string(),
        });
    }
    Ok(Selection::Collection(running))
}

/// Every container at or below `base` holding a scalar member that
/// satisfies `clause`, in document order.
pub fn scan_clause(root: &Value, config: &Config, base: &Selection, clause: &Clause) -> Vec<Selection> {
    let mut found = Vec::new();
    scan(root, config, base, clause, &mut found);
    found
}

fn scan(root: &Value, config: &Config, node: &Selection, clause: &Clause, found: &mut Vec<Selection>) {
    let scope = match node {
        Selection::Collection(_) => None,
        _ => node.view(root),
    };
    let mut matched = false;
    for (component, child) in node.children(root) {
        let Some(value) = child.view(root) else {
            continue;
        };
        if Kind::of(&value).is_container() {
            scan(root, config, &child, clause, found);
        } else if !matched {
            let key = component.to_string();
            if clause.matches(&key, &value, scope.as_deref(), config) {
                trace!(key = %key, "clause matched");
                push_unique(found, node.clone());
                matched = true;
            }
        }
    }
}
