//! Read pipeline: resolve, query, filter, then the empty-result policy.

use json_store_path::Cursor;
use serde_json::Value;

use crate::config::Config;
use crate::error::{settle, Outcome, QueryError, StoreError};
use crate::filter::{self, Filter};
use crate::gateway::CallbackRegistry;
use crate::query::{select, Query};
use crate::resolve::resolve;
use crate::selection::Selection;

/// Configuration and callables borrowed for the duration of one call.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub config: &'a Config,
    pub callbacks: &'a CallbackRegistry,
}

impl<'a> Context<'a> {
    pub fn new(config: &'a Config, callbacks: &'a CallbackRegistry) -> Self {
        Self { config, callbacks }
    }
}

/// Where a read or write applies: a path below a base location, optionally
/// narrowed by a query and a filter.
#[derive(Debug, Clone, Default)]
pub struct Target {
    pub base: Cursor,
    pub path: String,
    pub query: Option<Query>,
    pub filter: Option<Filter>,
}

impl Target {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// A path relative to `base` instead of the tree root.
    pub fn at(base: Cursor, path: impl Into<String>) -> Self {
        Self {
            base,
            ..Self::new(path)
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    /// Parses and attaches a query string.
    pub fn query(self, text: &str) -> Result<Self, QueryError> {
        Ok(self.with_query(Query::parse(text)?))
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl From<&str> for Target {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Target {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<&String> for Target {
    fn from(path: &String) -> Self {
        Self::new(path.as_str())
    }
}

impl From<Cursor> for Target {
    fn from(base: Cursor) -> Self {
        Self::at(base, "/")
    }
}

impl From<&Cursor> for Target {
    fn from(base: &Cursor) -> Self {
        Self::at(base.clone(), "/")
    }
}

/// Resolves `path` under `base`, runs `query` and `filter`, and applies the
/// empty-result policy.
///
/// With `return_by_reference` off, a found selection is detached from the
/// tree.
pub fn find(
    root: &mut Value,
    ctx: &Context<'_>,
    base: &Selection,
    path: &str,
    query: Option<&Query>,
    filter: Option<&Filter>,
) -> Result<Outcome, StoreError> {
    let outcome = settle(ctx.config, find_selection(root, ctx, base, path, query, filter))?;
    Ok(match outcome {
        Outcome::Found(selection) if !ctx.config.return_by_reference => {
            Outcome::Found(selection.detach(root))
        }
        other => other,
    })
}

/// [`find`] for a [`Target`].
pub fn find_target(root: &mut Value, ctx: &Context<'_>, target: &Target) -> Result<Outcome, StoreError> {
    let base = Selection::Node(target.base.clone());
    find(
        root,
        ctx,
        &base,
        &target.path,
        target.query.as_ref(),
        target.filter.as_ref(),
    )
}

/// Like [`find`] but without the empty-result policy: absence is an error.
pub fn find_selection(
    root: &mut Value,
    ctx: &Context<'_>,
    base: &Selection,
    path: &str,
    query: Option<&Query>,
    filter: Option<&Filter>,
) -> Result<Selection, StoreError> {
    let resolved = resolve(root, base, path)?;
    let selected = match query {
        Some(query) if !query.is_empty() => select(root, ctx.config, &resolved, query, path)?,
        _ => resolved,
    };
    match filter {
        Some(filter) => filter::apply(root, ctx, selected, filter),
        None => Ok(selected),
    }
}
