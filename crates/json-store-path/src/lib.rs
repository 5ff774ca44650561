//! Slash-path grammar for JSON trees.
//!
//! A path is a `/`-separated list of segments resolved against a base node:
//!
//! - `key` selects a mapping member, `3` a sequence element (or the mapping
//!   member named `"3"`).
//! - `.` is the current node, `..` its first child, `*` flattens children.
//! - `//key` collects every descendant named `key`; `//*` collects all
//!   immediate children.
//! - `\/`, `'/'` and `"/"` are literal slashes inside a segment.
//!
//! [`parse_path`] produces a [`PathExpr`]; [`Cursor`] addresses a concrete
//! location inside a [`serde_json::Value`] tree; [`split_write_path`] and
//! [`branch_keys`] decompose paths for write operations.

mod cursor;
mod escape;
mod expr;
mod write;

pub use cursor::{Cursor, PathComponent};
pub use escape::{escape_component, unescape_component};
pub use expr::{parse_path, DescendKey, PathExpr, Segment, Step};
pub use write::{branch_keys, index_of, split_write_path, WritePath};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathSyntaxError {
    #[error("recursive descent needs a key after `//`")]
    EmptyDescentKey,
    #[error("`//{0}` is not a valid recursive descent")]
    NavigationDescent(String),
    #[error("`{0}` cannot be created as a branch")]
    UnwritableBranch(String),
}
