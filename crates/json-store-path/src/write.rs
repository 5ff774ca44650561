//! Path decomposition for write operations.

use crate::escape::{escape_component, pieces};
use crate::PathSyntaxError;

const TRAILING_NOISE: &[char] = &['/', '.', '*', ' '];

/// A write path split into the parent to resolve and the final key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePath {
    pub parent: String,
    /// `None` when the path designates the base node itself.
    pub key: Option<String>,
}

/// Splits a write path at its last unescaped slash.
///
/// Trailing `/`, `.`, `*` and spaces are stripped first, so `"/a/b/*"`
/// writes to `b` under `/a`.
pub fn split_write_path(path: &str) -> WritePath {
    let trimmed = path.trim().trim_end_matches(TRAILING_NOISE);
    let mut parts = pieces(trimmed);
    let key = parts
        .pop()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());
    let parent = parts
        .iter()
        .map(|p| escape_component(p))
        .collect::<Vec<_>>()
        .join("/");
    WritePath {
        parent: if parent.is_empty() { "/".to_string() } else { parent },
        key,
    }
}

/// Literal keys of a write path, used to create missing branches.
///
/// Trailing navigation is stripped as in [`split_write_path`] and `.` steps
/// are skipped. `..`, `*` and `//` select existing nodes only, so they are
/// rejected.
pub fn branch_keys(path: &str) -> Result<Vec<String>, PathSyntaxError> {
    let trimmed = path
        .trim()
        .trim_start_matches('/')
        .trim_end_matches(TRAILING_NOISE);
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let mut keys = Vec::new();
    for piece in pieces(trimmed) {
        match piece.trim() {
            "." => {}
            "" => return Err(PathSyntaxError::UnwritableBranch("//".into())),
            step @ (".." | "*") => return Err(PathSyntaxError::UnwritableBranch(step.into())),
            key => keys.push(key.to_string()),
        }
    }
    Ok(keys)
}

/// Parses an all-digit key as a sequence index.
pub fn index_of(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}
