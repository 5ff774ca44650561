//! In-place writes: overwrite, add, append/prepend, inject, remove, reset and
//! branch extension.

use std::str::FromStr;

use json_store_equal::{is_container, type_name};
use json_store_path::{branch_keys, index_of, split_write_path, Cursor, PathComponent, WritePath};
use serde_json::{Map, Value};
use tracing::debug;

use crate::engine::{find_selection, Context, Target};
use crate::error::{settle_write, MutationError, PathError, StoreError};
use crate::filter::Filter;
use crate::resolve::resolve;
use crate::selection::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Replace an existing value.
    Overwrite,
    /// Write only when nothing exists yet.
    AddOnly,
    /// Push onto a sequence at a position; replaces non-sequences.
    AppendOrPrepend,
    /// Splice into a sequence, shifting later elements.
    InjectAtIndex,
    Remove,
    /// Replace the value with `null`, keeping its key.
    Reset,
    /// Create missing branches, then set the value.
    ExtendBranches,
}

impl Mode {
    /// Whether an unresolvable parent creates the missing branches.
    pub fn can_extend(self) -> bool {
        matches!(
            self,
            Self::AppendOrPrepend | Self::InjectAtIndex | Self::AddOnly | Self::ExtendBranches
        )
    }

    /// Whether the final key must already exist.
    fn needs_existing(self) -> bool {
        matches!(self, Self::Overwrite | Self::Remove | Self::Reset)
    }
}

/// Position inside a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    First,
    Last,
    At(usize),
}

impl Position {
    /// `-1` (any negative) is [`Position::Last`], `0` is [`Position::First`].
    pub fn from_index(index: i64) -> Self {
        match index {
            i if i < 0 => Self::Last,
            0 => Self::First,
            i => Self::At(i as usize),
        }
    }
}

impl FromStr for Position {
    type Err = MutationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            t if t.eq_ignore_ascii_case("first") => Ok(Self::First),
            t if t.eq_ignore_ascii_case("last") => Ok(Self::Last),
            t => t
                .parse::<i64>()
                .map(Self::from_index)
                .map_err(|_| MutationError::InvalidTarget(format!("{t} is not a position"))),
        }
    }
}

/// One write request.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub mode: Mode,
    pub value: Value,
    pub position: Option<Position>,
    /// Overwrites must keep the runtime type of the existing value.
    pub typesafe: bool,
}

impl Mutation {
    pub fn new(mode: Mode, value: Value) -> Self {
        Self {
            mode,
            value,
            position: None,
            typesafe: false,
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn with_typesafe(mut self, typesafe: bool) -> Self {
        self.typesafe = typesafe;
        self
    }

    /// Position used when the target is a sequence, if any.
    fn sequence_position(&self) -> Option<Position> {
        match self.mode {
            Mode::AppendOrPrepend | Mode::ExtendBranches => self.position,
            Mode::InjectAtIndex => Some(self.position.unwrap_or(Position::Last)),
            _ => None,
        }
    }

    /// Value stored where nothing exists yet under `key`. A positional write
    /// to a named key starts a new sequence; an index key already names the
    /// element slot.
    fn into_fresh(self, key: Option<&str>) -> Value {
        let element = key.and_then(index_of).is_some();
        match self.mode {
            Mode::AppendOrPrepend | Mode::InjectAtIndex
                if !element && self.sequence_position().is_some() =>
            {
                Value::Array(vec![self.value])
            }
            _ => self.value,
        }
    }
}

/// Applies `mutation` at `target`.
///
/// Returns the location the value now occupies (the parent for
/// [`Mode::Remove`]), or `None` when the target was absent and
/// `throw_on_empty` is off.
pub fn apply(
    root: &mut Value,
    ctx: &Context<'_>,
    target: &Target,
    mutation: Mutation,
) -> Result<Option<Cursor>, StoreError> {
    debug!(path = %target.path, mode = ?mutation.mode, "applying mutation");
    settle_write(ctx.config, apply_strict(root, ctx, target, mutation).map(Some))
}

fn apply_strict(
    root: &mut Value,
    ctx: &Context<'_>,
    target: &Target,
    mutation: Mutation,
) -> Result<Cursor, StoreError> {
    let WritePath { parent, key } = split_write_path(&target.path);
    let base = Selection::Node(target.base.clone());
    let resolved = match (&target.query, &target.filter) {
        (Some(query), filter) => {
            let filter = filter.clone().unwrap_or_else(Filter::first);
            find_selection(root, ctx, &base, &parent, Some(query), Some(&filter))
        }
        (None, Some(filter)) => find_selection(root, ctx, &base, &parent, None, Some(filter)),
        (None, None) => resolve(root, &base, &parent).map_err(StoreError::from),
    };

    let parent = match resolved {
        Ok(parent) => parent,
        Err(err) if err.is_absence() && mutation.mode.can_extend() && target.query.is_none() => {
            debug!(path = %target.path, "extending missing branches");
            let value = mutation.into_fresh(key.as_deref());
            return extend(root, &target.base, &target.path, value);
        }
        Err(err) => return Err(err),
    };
    let (container, key) = locate(parent, key)?;
    write(root, &container, key, mutation)
}

/// Maps a resolved parent to a tree location. Writes through a collection
/// element go to that element's origin.
fn locate(parent: Selection, key: Option<String>) -> Result<(Cursor, Option<String>), StoreError> {
    match parent {
        Selection::Node(cursor) => Ok((cursor, key)),
        Selection::Collection(items) => {
            let origin = key
                .as_deref()
                .and_then(index_of)
                .and_then(|index| items.into_iter().nth(index));
            match origin {
                Some(Selection::Node(cursor)) => {
                    let last = cursor.last().map(ToString::to_string);
                    match cursor.parent() {
                        Some(container) => Ok((container, last)),
                        None => Ok((cursor, None)),
                    }
                }
                _ => Err(MutationError::InvalidTarget(format!(
                    "{} does not address a tree node inside the result set",
                    key.unwrap_or_default()
                ))
                .into()),
            }
        }
        Selection::Detached(_) => {
            Err(MutationError::InvalidTarget("result is not part of the tree".into()).into())
        }
    }
}

fn write(
    root: &mut Value,
    cursor: &Cursor,
    key: Option<String>,
    mutation: Mutation,
) -> Result<Cursor, StoreError> {
    let container = cursor.get_mut(root).ok_or_else(|| PathError::NotFound {
        path: cursor.to_string(),
    })?;
    let Some(key) = key else {
        return match mutation.mode {
            Mode::AddOnly => Ok(cursor.clone()),
            Mode::Remove => {
                Err(MutationError::InvalidTarget("cannot remove the base node".into()).into())
            }
            Mode::Reset => {
                *container = Value::Null;
                Ok(cursor.clone())
            }
            _ => write_slot(container, cursor.clone(), mutation),
        };
    };

    if mutation.mode == Mode::InjectAtIndex {
        if let (Value::Array(items), Some(index)) = (&mut *container, index_of(&key)) {
            let at = insert_at(items, Position::At(index), mutation.value);
            return Ok(cursor.child(at));
        }
    }

    if mutation.mode == Mode::ExtendBranches && !is_container(container) {
        *container = empty_branch(index_of(&key).is_some());
    }

    let existing = match &*container {
        Value::Object(map) => map.contains_key(&key).then(|| PathComponent::Key(key.clone())),
        Value::Array(items) => index_of(&key)
            .filter(|index| *index < items.len())
            .map(PathComponent::Index),
        _ => None,
    };

    let Some(component) = existing else {
        if mutation.mode.needs_existing() {
            return Err(PathError::NotFound {
                path: cursor.child(key).to_string(),
            }
            .into());
        }
        let value = mutation.into_fresh(Some(&key));
        return insert_new(container, cursor, key, value);
    };

    let slot_cursor = cursor.child(component.clone());
    match mutation.mode {
        Mode::AddOnly => return Ok(slot_cursor),
        Mode::Remove => {
            match (container, &component) {
                (Value::Object(map), PathComponent::Key(key)) => {
                    map.shift_remove(key);
                }
                (Value::Array(items), PathComponent::Index(index)) => {
                    items.remove(*index);
                }
                _ => {}
            }
            return Ok(cursor.clone());
        }
        _ => {}
    }
    let slot = match (container, &component) {
        (Value::Object(map), PathComponent::Key(key)) => map.get_mut(key),
        (Value::Array(items), PathComponent::Index(index)) => items.get_mut(*index),
        _ => None,
    }
    .ok_or_else(|| PathError::NotFound {
        path: slot_cursor.to_string(),
    })?;
    if mutation.mode == Mode::Reset {
        *slot = Value::Null;
        return Ok(slot_cursor);
    }
    write_slot(slot, slot_cursor, mutation)
}

/// Writes into an existing value: positional for sequences, otherwise a
/// (possibly type-checked) replacement.
fn write_slot(slot: &mut Value, cursor: Cursor, mutation: Mutation) -> Result<Cursor, StoreError> {
    let position = mutation.sequence_position();
    if let (Value::Array(items), Some(position)) = (&mut *slot, position) {
        let at = if mutation.mode == Mode::ExtendBranches {
            overwrite_at(items, position, mutation.value)
        } else {
            insert_at(items, position, mutation.value)
        };
        return Ok(cursor.child(at));
    }
    if mutation.typesafe && type_name(slot) != type_name(&mutation.value) {
        return Err(MutationError::TypeMismatch {
            expected: type_name(slot),
            found: type_name(&mutation.value),
        }
        .into());
    }
    *slot = mutation.value;
    Ok(cursor)
}

fn insert_new(container: &mut Value, cursor: &Cursor, key: String, value: Value) -> Result<Cursor, StoreError> {
    match container {
        Value::Object(map) => {
            map.insert(key.clone(), value);
            Ok(cursor.child(key))
        }
        Value::Array(items) if index_of(&key).is_some() => {
            items.push(value);
            Ok(cursor.child(items.len() - 1))
        }
        Value::Array(_) => Err(MutationError::InvalidTarget(format!(
            "{key} is not a sequence index"
        ))
        .into()),
        other => Err(MutationError::InvalidTarget(format!(
            "cannot write {key} under type {}",
            type_name(other)
        ))
        .into()),
    }
}

/// Splices `value` in; positions past the end append.
fn insert_at(items: &mut Vec<Value>, position: Position, value: Value) -> usize {
    match position {
        Position::First => {
            items.insert(0, value);
            0
        }
        Position::At(index) if index < items.len() => {
            items.insert(index, value);
            index
        }
        Position::Last | Position::At(_) => {
            items.push(value);
            items.len() - 1
        }
    }
}

/// Replaces the element at `position`; positions past the end append.
fn overwrite_at(items: &mut Vec<Value>, position: Position, value: Value) -> usize {
    let index = match position {
        Position::First => 0,
        Position::Last => items.len().saturating_sub(1),
        Position::At(index) => index,
    };
    match items.get_mut(index) {
        Some(slot) => {
            *slot = value;
            index
        }
        None => {
            items.push(value);
            items.len() - 1
        }
    }
}

/// Creates every missing branch of `path` below `base`, then sets the final
/// key to `value`.
///
/// Missing or scalar intermediates become a sequence when the next key is an
/// index and a mapping otherwise. A scalar base is replaced the same way.
fn extend(root: &mut Value, base: &Cursor, path: &str, value: Value) -> Result<Cursor, StoreError> {
    let keys = branch_keys(path).map_err(PathError::from)?;
    let node = base.get_mut(root).ok_or_else(|| PathError::NotFound {
        path: base.to_string(),
    })?;
    let Some(first) = keys.first() else {
        *node = value;
        return Ok(base.clone());
    };
    if !is_container(node) {
        *node = empty_branch(index_of(first).is_some());
    }

    let mut value = Some(value);
    let mut cursor = base.clone();
    let mut node = node;
    for (i, key) in keys.iter().enumerate() {
        let last = i + 1 == keys.len();
        let next_is_index = keys.get(i + 1).is_some_and(|k| index_of(k).is_some());
        let mut fill = || {
            if last {
                value.take().unwrap_or_default()
            } else {
                empty_branch(next_is_index)
            }
        };
        node = match node {
            Value::Object(map) => {
                cursor = cursor.child(key.as_str());
                let slot = map.entry(key.clone()).or_insert(Value::Null);
                if last || !is_container(slot) {
                    *slot = fill();
                }
                slot
            }
            Value::Array(items) => {
                let index = match index_of(key) {
                    Some(index) if index < items.len() => {
                        if last || !is_container(&items[index]) {
                            items[index] = fill();
                        }
                        index
                    }
                    Some(_) => {
                        items.push(fill());
                        items.len() - 1
                    }
                    None => {
                        return Err(MutationError::InvalidTarget(format!(
                            "{key} is not a sequence index"
                        ))
                        .into())
                    }
                };
                cursor = cursor.child(index);
                &mut items[index]
            }
            other => {
                return Err(MutationError::InvalidTarget(format!(
                    "cannot extend through type {}",
                    type_name(other)
                ))
                .into())
            }
        };
    }
    Ok(cursor)
}

fn empty_branch(sequence: bool) -> Value {
    if sequence {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::gateway::CallbackRegistry;
    use serde_json::json;

    fn run(tree: &mut Value, target: impl Into<Target>, mutation: Mutation) -> Result<Option<Cursor>, StoreError> {
        let config = Config::default();
        let registry = CallbackRegistry::new();
        apply(tree, &Context::new(&config, &registry), &target.into(), mutation)
    }

    #[test]
    fn overwrite_existing() {
        let mut tree = json!({"a": {"b": 1}});
        let at = run(&mut tree, "/a/b", Mutation::new(Mode::Overwrite, json!(5))).unwrap();
        assert_eq!(tree, json!({"a": {"b": 5}}));
        assert_eq!(at.map(|c| c.pointer()), Some("/a/b".to_string()));
    }

    #[test]
    fn overwrite_missing_is_absent() {
        let mut tree = json!({"a": {}});
        let err = run(&mut tree, "/a/b", Mutation::new(Mode::Overwrite, json!(5))).unwrap_err();
        assert!(err.is_absence());
        let err = run(&mut tree, "/x/y", Mutation::new(Mode::Overwrite, json!(5))).unwrap_err();
        assert!(err.is_absence());
        assert_eq!(tree, json!({"a": {}}));
    }

    #[test]
    fn typesafe_guard() {
        let mut tree = json!({"name": "x"});
        let err = run(
            &mut tree,
            "/name",
            Mutation::new(Mode::Overwrite, json!(1)).with_typesafe(true),
        )
        .unwrap_err();
        assert_eq!(
            err,
            StoreError::from(MutationError::TypeMismatch {
                expected: "string",
                found: "integer"
            })
        );
        assert_eq!(tree, json!({"name": "x"}));
    }

    #[test]
    fn add_only_keeps_first_value() {
        let mut tree = json!({});
        run(&mut tree, "/k", Mutation::new(Mode::AddOnly, json!(1))).unwrap();
        run(&mut tree, "/k", Mutation::new(Mode::AddOnly, json!(2))).unwrap();
        assert_eq!(tree, json!({"k": 1}));
    }

    #[test]
    fn append_and_prepend() {
        let mut tree = json!({"l": [1, 2]});
        let append = Mutation::new(Mode::AppendOrPrepend, json!(3)).with_position(Position::Last);
        let at = run(&mut tree, "/l", append).unwrap();
        assert_eq!(at.map(|c| c.pointer()), Some("/l/2".to_string()));
        let prepend = Mutation::new(Mode::AppendOrPrepend, json!(0)).with_position(Position::First);
        run(&mut tree, "/l", prepend).unwrap();
        let middle = Mutation::new(Mode::AppendOrPrepend, json!(9)).with_position(Position::At(2));
        run(&mut tree, "/l", middle).unwrap();
        assert_eq!(tree, json!({"l": [0, 1, 9, 2, 3]}));
    }

    #[test]
    fn append_to_missing_starts_sequence() {
        let mut tree = json!({});
        let append = Mutation::new(Mode::AppendOrPrepend, json!(1)).with_position(Position::Last);
        run(&mut tree, "/log", append.clone()).unwrap();
        run(&mut tree, "/deep/log", append).unwrap();
        run(&mut tree, "/plain", Mutation::new(Mode::AppendOrPrepend, json!(2))).unwrap();
        assert_eq!(tree, json!({"log": [1], "deep": {"log": [1]}, "plain": 2}));
    }

    #[test]
    fn inject_shifts_indices() {
        let mut tree = json!(["a", "b", "c"]);
        run(&mut tree, "/1", Mutation::new(Mode::InjectAtIndex, json!("x"))).unwrap();
        assert_eq!(tree, json!(["a", "x", "b", "c"]));
        run(&mut tree, "/", Mutation::new(Mode::InjectAtIndex, json!("z"))).unwrap();
        assert_eq!(tree, json!(["a", "x", "b", "c", "z"]));
    }

    #[test]
    fn remove_and_reset() {
        let mut tree = json!({"a": 1, "b": 2, "c": [1, 2, 3]});
        run(&mut tree, "/a", Mutation::new(Mode::Remove, Value::Null)).unwrap();
        run(&mut tree, "/c/0", Mutation::new(Mode::Remove, Value::Null)).unwrap();
        run(&mut tree, "/b", Mutation::new(Mode::Reset, Value::Null)).unwrap();
        assert_eq!(tree, json!({"b": null, "c": [2, 3]}));
        let keys: Vec<&String> = tree.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "c"]);
        run(&mut tree, "/", Mutation::new(Mode::Reset, Value::Null)).unwrap();
        assert_eq!(tree, json!(null));
    }

    #[test]
    fn extend_creates_branches() {
        let mut tree = json!({"keep": true});
        let at = run(&mut tree, "/a/0/b", Mutation::new(Mode::ExtendBranches, json!(5))).unwrap();
        assert_eq!(tree, json!({"keep": true, "a": [{"b": 5}]}));
        assert_eq!(at.map(|c| c.pointer()), Some("/a/0/b".to_string()));

        run(&mut tree, "/keep/x", Mutation::new(Mode::ExtendBranches, json!(1))).unwrap();
        assert_eq!(tree["keep"], json!({"x": 1}));
    }

    #[test]
    fn extend_null_root() {
        let mut tree = Value::Null;
        run(&mut tree, "/3/x", Mutation::new(Mode::ExtendBranches, json!("v"))).unwrap();
        assert_eq!(tree, json!([{"x": "v"}]));
    }

    #[test]
    fn extend_replaces_scalar_base() {
        let mut tree = json!(5);
        let at = run(&mut tree, "/s/a", Mutation::new(Mode::ExtendBranches, json!(1))).unwrap();
        assert_eq!(tree, json!({"s": {"a": 1}}));
        assert_eq!(at.map(|c| c.pointer()), Some("/s/a".to_string()));
    }

    #[test]
    fn inject_into_missing_sequence_stores_element() {
        let mut tree = json!({});
        run(&mut tree, "/x/2", Mutation::new(Mode::InjectAtIndex, json!("v"))).unwrap();
        assert_eq!(tree, json!({"x": ["v"]}));
    }

    #[test]
    fn extend_overwrites_sequence_positions() {
        let mut tree = json!({"l": [1, 2, 3]});
        let last = Mutation::new(Mode::ExtendBranches, json!(9)).with_position(Position::Last);
        run(&mut tree, "/l", last).unwrap();
        let beyond = Mutation::new(Mode::ExtendBranches, json!(7)).with_position(Position::At(10));
        run(&mut tree, "/l", beyond).unwrap();
        assert_eq!(tree, json!({"l": [1, 2, 9, 7]}));
    }

    #[test]
    fn invalid_targets() {
        let mut tree = json!({"l": [1], "s": "text"});
        assert!(matches!(
            run(&mut tree, "/l/name", Mutation::new(Mode::AddOnly, json!(1))),
            Err(StoreError::Mutation(MutationError::InvalidTarget(_)))
        ));
        assert!(matches!(
            run(&mut tree, "/s/x", Mutation::new(Mode::AddOnly, json!(1))),
            Err(StoreError::Mutation(MutationError::InvalidTarget(_)))
        ));
        assert!(matches!(
            run(&mut tree, "/", Mutation::new(Mode::Remove, Value::Null)),
            Err(StoreError::Mutation(MutationError::InvalidTarget(_)))
        ));
    }

    #[test]
    fn write_through_query_redirects_to_origin() {
        let mut tree = json!({"books": [{"id": 1, "t": "a"}, {"id": 2, "t": "b"}]});
        let target = Target::new("/books/t").query("id=2").unwrap();
        let at = run(&mut tree, target, Mutation::new(Mode::Overwrite, json!("B"))).unwrap();
        assert_eq!(tree["books"][1]["t"], json!("B"));
        assert_eq!(at.map(|c| c.pointer()), Some("/books/1/t".to_string()));
    }

    #[test]
    fn write_through_collection_element() {
        let mut tree = json!({"a": {"x": 1}, "b": {"x": 2}});
        run(&mut tree, "//x/1", Mutation::new(Mode::Overwrite, json!(20))).unwrap();
        assert_eq!(tree, json!({"a": {"x": 1}, "b": {"x": 20}}));
    }

    #[test]
    fn quiet_policy_returns_none() {
        let config = Config::default().with_throw_on_empty(false);
        let registry = CallbackRegistry::new();
        let mut tree = json!({});
        let out = apply(
            &mut tree,
            &Context::new(&config, &registry),
            &Target::new("/missing"),
            Mutation::new(Mode::Remove, Value::Null),
        );
        assert_eq!(out, Ok(None));
    }

    #[test]
    fn positions_from_text() {
        assert_eq!("first".parse::<Position>(), Ok(Position::First));
        assert_eq!("LAST".parse::<Position>(), Ok(Position::Last));
        assert_eq!("-1".parse::<Position>(), Ok(Position::Last));
        assert_eq!("0".parse::<Position>(), Ok(Position::First));
        assert_eq!("4".parse::<Position>(), Ok(Position::At(4)));
        assert!("x".parse::<Position>().is_err());
    }
}
