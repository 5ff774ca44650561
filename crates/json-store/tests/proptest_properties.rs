//! Property-based tests for reads and writes against generated trees.
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use json_store::{Position, Store};

// ============================================================================
// Strategies
// ============================================================================

fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(key_strategy(), 1..4).prop_map(|keys| format!("/{}", keys.join("/")))
}

fn leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        3 => leaf_strategy(),
        1 => prop::collection::vec(leaf_strategy(), 0..4).prop_map(Value::from),
    ]
}

fn ints_strategy() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(any::<i64>(), 1..20)
}

// ============================================================================
// Write properties
// ============================================================================

proptest! {
    /// set p v → get p returns v
    #[test]
    fn prop_set_get_roundtrip(path in path_strategy(), value in value_strategy()) {
        let mut store = Store::new(json!({}));
        store.set(path.as_str(), value.clone()).unwrap();
        prop_assert_eq!(store.get(path.as_str()).unwrap(), value);
    }

    /// replace on an existing location is read back exactly
    #[test]
    fn prop_replace_roundtrip(path in path_strategy(), first in value_strategy(), second in value_strategy()) {
        let mut store = Store::new(json!({}));
        store.set(path.as_str(), first).unwrap();
        store.replace(path.as_str(), second.clone(), false).unwrap();
        prop_assert_eq!(store.get(path.as_str()).unwrap(), second);
    }

    /// add twice leaves the tree as after the first add
    #[test]
    fn prop_add_only_idempotent(path in path_strategy(), first in value_strategy(), second in value_strategy()) {
        let mut store = Store::new(json!({}));
        store.add(path.as_str(), first.clone()).unwrap();
        let after_first = store.tree().clone();
        store.add(path.as_str(), second).unwrap();
        prop_assert_eq!(store.tree(), &after_first);
        prop_assert_eq!(store.get(path.as_str()).unwrap(), first);
    }

    /// inject at i behaves like Vec::insert, appending past the end
    #[test]
    fn prop_inject_matches_vec_insert(items in ints_strategy(), index in 0usize..30, value in any::<i64>()) {
        let mut store = Store::new(json!({"l": items.clone()}));
        store.inject("/l", json!(value), Some(Position::At(index))).unwrap();

        let mut expected = items;
        expected.insert(index.min(expected.len()), value);
        prop_assert_eq!(store.get("/l").unwrap(), json!(expected));
    }

    /// remove renumbers like Vec::remove
    #[test]
    fn prop_remove_matches_vec_remove(items in ints_strategy(), index in 0usize..20) {
        prop_assume!(index < items.len());
        let mut store = Store::new(json!({"l": items.clone()}));
        store.remove(format!("/l/{index}")).unwrap();

        let mut expected = items;
        expected.remove(index);
        prop_assert_eq!(store.get("/l").unwrap(), json!(expected));
    }
}

// ============================================================================
// Read properties
// ============================================================================

proptest! {
    /// `*` on a mapping yields its values in insertion order
    #[test]
    fn prop_wildcard_flattens_in_order(entries in prop::collection::vec((key_strategy(), any::<i64>()), 1..8)) {
        let mut map = Map::new();
        for (key, value) in entries {
            map.insert(key, json!(value));
        }
        let expected: Vec<Value> = map.values().cloned().collect();
        let mut store = Store::new(Value::Object(map));
        prop_assert_eq!(store.get("/*").unwrap(), Value::Array(expected));
    }

    /// `a..b` returns the inclusive index range, in order
    #[test]
    fn prop_filter_range(items in ints_strategy(), a in 0usize..20, b in 0usize..20) {
        let mut store = Store::new(json!(items.clone()));
        let found = store.find("/", None, Some(format!("{a}..{b}").as_str()));
        let expected: Vec<i64> = items
            .iter()
            .enumerate()
            .filter(|(i, _)| (a.min(b)..=a.max(b)).contains(i))
            .map(|(_, v)| *v)
            .collect();
        if expected.is_empty() {
            prop_assert!(found.unwrap_err().is_absence());
        } else {
            prop_assert_eq!(found.unwrap(), json!(expected));
        }
    }

    /// `-1` is the last element
    #[test]
    fn prop_negative_index_is_last(items in ints_strategy()) {
        let mut store = Store::new(json!(items.clone()));
        let last = items.last().copied();
        prop_assert_eq!(store.find("/", None, Some("-1")).unwrap(), json!(last));
    }

    /// OR of two equality clauses returns each matching element once
    #[test]
    fn prop_or_dedup(values in prop::collection::vec(0i64..4, 1..12), x in 0i64..4, y in 0i64..4) {
        let doc: Vec<Value> = values.iter().enumerate().map(|(i, v)| json!({"i": i, "v": v})).collect();
        let mut store = Store::new(Value::Array(doc));
        let found = store.find("/", Some(format!("v={x}||v={y}").as_str()), None);

        let mut expected: Vec<usize> = values.iter().enumerate().filter(|(_, v)| **v == x).map(|(i, _)| i).collect();
        if x != y {
            expected.extend(values.iter().enumerate().filter(|(_, v)| **v == y).map(|(i, _)| i));
        }
        if expected.is_empty() {
            prop_assert!(found.unwrap_err().is_absence());
        } else {
            let got: Vec<usize> = found
                .unwrap()
                .as_array()
                .unwrap()
                .iter()
                .map(|item| item["i"].as_u64().unwrap() as usize)
                .collect();
            prop_assert_eq!(got, expected);
        }
    }
}
