//! Error types and the empty-result policy.

use json_store_path::PathSyntaxError;
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::selection::Selection;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("NOT_FOUND: nothing at {path}")]
    NotFound { path: String },
    #[error("INVALID_PATH: {0}")]
    InvalidArgument(String),
}

impl From<PathSyntaxError> for PathError {
    fn from(err: PathSyntaxError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("NO_MATCH: query matched nothing under {path}")]
    NoMatch { path: String },
    #[error("INVALID_QUERY: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("UNRECOGNIZED_FILTER: {0}")]
    Unrecognized(String),
    #[error("EMPTY: filter selected nothing")]
    Empty,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("NOT_ALLOWED: callback {0} is not allowed")]
    NotAllowed(String),
    #[error("INVALID_CALLBACK: {0}")]
    Invalid(String),
    #[error("CALLBACK_FAILED: {0}")]
    Failed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("TYPE_MISMATCH: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("INVALID_TARGET: {0}")]
    InvalidTarget(String),
    #[error("MERGE_TYPES: cannot merge {from} into {into}")]
    MergeTypes {
        from: &'static str,
        into: &'static str,
    },
}

/// Any failure of a store read or write.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Mutation(#[from] MutationError),
    #[error("INVALID_JSON: {0}")]
    Json(String),
}

impl From<PathSyntaxError> for StoreError {
    fn from(err: PathSyntaxError) -> Self {
        Self::Path(err.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl StoreError {
    /// Whether this error only reports that nothing was found.
    ///
    /// Absence errors are subject to [`Config::throw_on_empty`]; every other
    /// error always propagates.
    pub fn is_absence(&self) -> bool {
        matches!(
            self,
            Self::Path(PathError::NotFound { .. })
                | Self::Query(QueryError::NoMatch { .. })
                | Self::Filter(FilterError::Empty)
        )
    }
}

/// Result of a read after the empty-result policy was applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Found(Selection),
    /// Nothing was found and the configured default stands in.
    Default(Value),
}

impl Outcome {
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default(_))
    }

    /// Materializes the outcome against `root`.
    pub fn into_value(self, root: &Value) -> Value {
        match self {
            Self::Found(selection) => selection.to_value(root),
            Self::Default(value) => value,
        }
    }
}

/// Applies the empty-result policy to a read.
pub(crate) fn settle(
    config: &Config,
    result: Result<Selection, StoreError>,
) -> Result<Outcome, StoreError> {
    match result {
        Ok(selection) => Ok(Outcome::Found(selection)),
        Err(err) if err.is_absence() && !config.throw_on_empty => {
            Ok(Outcome::Default(config.default_value.clone()))
        }
        Err(err) => Err(err),
    }
}

/// Applies the empty-result policy to a write: absence becomes `Ok(None)`.
pub(crate) fn settle_write<T>(
    config: &Config,
    result: Result<Option<T>, StoreError>,
) -> Result<Option<T>, StoreError> {
    match result {
        Err(err) if err.is_absence() && !config.throw_on_empty => Ok(None),
        other => other,
    }
}
