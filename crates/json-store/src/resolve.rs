//! Path resolution against a tree.

use json_store_path::{parse_path, DescendKey, Segment, Step};
use serde_json::Value;
use tracing::trace;

use crate::error::PathError;
use crate::selection::{Kind, Selection};

/// Resolves `path` relative to `base`.
///
/// Every step must succeed: a missing member, an out of range index or an
/// empty expansion fails the whole resolution with [`PathError::NotFound`].
pub fn resolve(root: &Value, base: &Selection, path: &str) -> Result<Selection, PathError> {
    let expr = parse_path(path)?;
    let not_found = || PathError::NotFound {
        path: path.trim().to_string(),
    };

    let mut current = base.clone();
    for step in expr.steps() {
        current = match step {
            Step::Walk(segments) => {
                for segment in segments {
                    trace!(path = %path, segment = ?segment, "resolving segment");
                    current = walk_segment(root, &current, segment).ok_or_else(not_found)?;
                }
                current
            }
            Step::Descend(key) => {
                let found = descend(root, &current, key);
                trace!(path = %path, key = ?key, matches = found.len(), "recursive descent");
                if found.is_empty() {
                    return Err(not_found());
                }
                Selection::Collection(found)
            }
        };
    }
    Ok(current)
}

fn walk_segment(root: &Value, current: &Selection, segment: &Segment) -> Option<Selection> {
    match segment {
        Segment::Current => Some(current.clone()),
        Segment::FirstChild => current
            .children(root)
            .into_iter()
            .next()
            .map(|(_, child)| child),
        Segment::Wildcard => expand(root, current),
        Segment::Index(index) => match current.kind(root)? {
            Kind::Sequence => current.element(root, *index),
            Kind::Mapping => current.member(root, &index.to_string()),
            Kind::Scalar => None,
        },
        Segment::Key(key) => current.member(root, key),
    }
}

/// `*`: one level of flattening.
///
/// A mapping yields its values. On a sequence, mapping children contribute
/// their values while sequence and scalar children are kept whole. A scalar
/// expands to itself.
fn expand(root: &Value, current: &Selection) -> Option<Selection> {
    let items: Vec<Selection> = match current.kind(root)? {
        Kind::Scalar => return Some(current.clone()),
        Kind::Mapping => current.children(root).into_iter().map(|(_, c)| c).collect(),
        Kind::Sequence => {
            let mut items = Vec::new();
            for (_, child) in current.children(root) {
                if child.kind(root) == Some(Kind::Mapping) {
                    items.extend(child.children(root).into_iter().map(|(_, c)| c));
                } else {
                    items.push(child);
                }
            }
            items
        }
    };
    if items.is_empty() {
        None
    } else {
        Some(Selection::Collection(items))
    }
}

/// `//key` and `//*`.
///
/// `//*` collects the immediate children. `//key` walks every container and
/// collects children named `key`, without looking inside a collected match.
fn descend(root: &Value, current: &Selection, key: &DescendKey) -> Vec<Selection> {
    match key {
        DescendKey::Any => current
            .children(root)
            .into_iter()
            .map(|(_, child)| child)
            .collect(),
        DescendKey::Key(key) => {
            let mut found = Vec::new();
            collect_named(root, current, key, &mut found);
            found
        }
    }
}

fn collect_named(root: &Value, current: &Selection, key: &str, found: &mut Vec<Selection>) {
    for (component, child) in current.children(root) {
        if component.matches_key(key) {
            found.push(child);
        } else if child.kind(root).is_some_and(Kind::is_container) {
            collect_named(root, &child, key, found);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn get(doc: &Value, path: &str) -> Result<Value, PathError> {
        resolve(doc, &Selection::root(), path).map(|s| s.to_value(doc))
    }

    #[test]
    fn walks_keys_and_indices() {
        let doc = json!({"book": [{"title": "A"}, {"title": "B"}], "2": "two"});
        assert_eq!(get(&doc, "/book/1/title"), Ok(json!("B")));
        assert_eq!(get(&doc, "/2"), Ok(json!("two")));
        assert_eq!(get(&doc, "/"), Ok(doc.clone()));
    }

    #[test]
    fn missing_segments_fail_whole_path() {
        let doc = json!({"book": [{"title": "A"}]});
        assert!(matches!(get(&doc, "/book/3"), Err(PathError::NotFound { .. })));
        assert!(matches!(get(&doc, "/book/title"), Err(PathError::NotFound { .. })));
        assert!(matches!(get(&doc, "/nope/x"), Err(PathError::NotFound { .. })));
    }

    #[test]
    fn null_member_exists() {
        let doc = json!({"a": null});
        assert_eq!(get(&doc, "/a"), Ok(json!(null)));
    }

    #[test]
    fn wildcard_flattening() {
        assert_eq!(get(&json!({"x": 1, "y": 2}), "*"), Ok(json!([1, 2])));
        let doc = json!({"s": [{"a": 1, "b": 2}, [3, 4], 5]});
        assert_eq!(get(&doc, "/s/*"), Ok(json!([1, 2, [3, 4], 5])));
        assert_eq!(get(&json!({"n": 7}), "/n/*"), Ok(json!(7)));
        assert!(get(&json!({"e": {}}), "/e/*").is_err());
    }

    #[test]
    fn first_child() {
        let doc = json!({"m": {"k": "v", "j": "w"}, "e": []});
        assert_eq!(get(&doc, "/m/.."), Ok(json!("v")));
        assert!(get(&doc, "/e/..").is_err());
        assert_eq!(get(&doc, "/m/."), Ok(json!({"k": "v", "j": "w"})));
    }

    #[test]
    fn recursive_descent_dedup() {
        let doc = json!({"books": [{"price": 10}, {"meta": {"price": 20}}]});
        assert_eq!(get(&doc, "/books//price"), Ok(json!([10, 20])));
    }

    #[test]
    fn nested_match_is_suppressed() {
        let doc = json!({"a": {"x": {"x": 1}}, "b": {"x": 2}});
        assert_eq!(get(&doc, "//x"), Ok(json!([{"x": 1}, 2])));
    }

    #[test]
    fn descend_then_walk() {
        let doc = json!({"store": {"book": [{"author": "N"}, {"author": "E"}]}});
        assert_eq!(get(&doc, "//book/0/1/author"), Ok(json!("E")));
        assert!(get(&doc, "//book/1").is_err());
        assert_eq!(get(&doc, "/store//*"), Ok(json!([[{"author": "N"}, {"author": "E"}]])));
    }

    #[test]
    fn resolution_aliases_the_tree() {
        let doc = json!({"a": {"b": [1, 2]}});
        let sel = resolve(&doc, &Selection::root(), "/a/b/1").unwrap();
        assert_eq!(
            sel.cursor().map(|c| c.pointer()),
            Some("/a/b/1".to_string())
        );
    }

    #[test]
    fn invalid_path_syntax() {
        let doc = json!({});
        assert!(matches!(get(&doc, "/a//."), Err(PathError::InvalidArgument(_))));
    }
}
