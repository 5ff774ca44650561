//! Depth-first tree walking.

use std::ops::ControlFlow;

use json_store_path::{Cursor, PathComponent};
use serde_json::Value;

/// Walks every node under `value`, children before their parent.
///
/// The callback receives the node's key (`None` for the starting node), the
/// node itself and its location relative to the starting node. Returning
/// [`ControlFlow::Break`] stops the walk.
pub fn walk<F>(value: &mut Value, callback: &mut F) -> ControlFlow<()>
where
    F: FnMut(Option<&PathComponent>, &mut Value, &Cursor) -> ControlFlow<()>,
{
    walk_at(value, &Cursor::root(), callback)
}

fn walk_at<F>(value: &mut Value, at: &Cursor, callback: &mut F) -> ControlFlow<()>
where
    F: FnMut(Option<&PathComponent>, &mut Value, &Cursor) -> ControlFlow<()>,
{
    match value {
        Value::Array(items) => {
            for (index, item) in items.iter_mut().enumerate() {
                walk_at(item, &at.child(index), callback)?;
            }
        }
        Value::Object(map) => {
            for (key, item) in map.iter_mut() {
                walk_at(item, &at.child(key.as_str()), callback)?;
            }
        }
        _ => {}
    }
    callback(at.last(), value, at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walks_scalar() {
        let mut visited = vec![];
        let mut value = json!(42);
        let _ = walk(&mut value, &mut |key, v, _| {
            visited.push((key.cloned(), v.clone()));
            ControlFlow::Continue(())
        });
        assert_eq!(visited, vec![(None, json!(42))]);
    }

    #[test]
    fn children_before_parent() {
        let mut value = json!({"a": 1, "b": [2, 3]});
        let mut paths = vec![];
        let _ = walk(&mut value, &mut |_, _, at| {
            paths.push(at.to_string());
            ControlFlow::Continue(())
        });
        assert_eq!(paths, vec!["/a", "/b/0", "/b/1", "/b", "/"]);
    }

    #[test]
    fn rewrites_in_place() {
        let mut value = json!({"a": 1, "b": [2, {"c": 3}]});
        let _ = walk(&mut value, &mut |_, v, _| {
            if let Some(n) = v.as_i64() {
                *v = json!(n * 10);
            }
            ControlFlow::Continue(())
        });
        assert_eq!(value, json!({"a": 10, "b": [20, {"c": 30}]}));
    }

    #[test]
    fn break_stops_walk() {
        let mut value = json!([1, 2, 3, 4]);
        let mut count = 0;
        let flow = walk(&mut value, &mut |_, v, _| {
            count += 1;
            if *v == json!(2) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(flow, ControlFlow::Break(()));
        assert_eq!(count, 2);
    }

    #[test]
    fn keys_and_indices() {
        let mut value = json!({"k": ["x"]});
        let mut keys = vec![];
        let _ = walk(&mut value, &mut |key, _, _| {
            keys.push(key.map(ToString::to_string));
            ControlFlow::Continue(())
        });
        assert_eq!(keys, vec![Some("0".to_string()), Some("k".to_string()), None]);
    }
}
