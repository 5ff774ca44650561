//! Views onto a tree: aliased locations, synthetic collections and detached
//! values.

use std::borrow::Cow;

use json_store_equal::deep_equal;
use json_store_path::{Cursor, PathComponent};
use serde_json::Value;

/// Shape of a node as seen by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Scalar,
    Sequence,
    Mapping,
}

impl Kind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Array(_) => Self::Sequence,
            Value::Object(_) => Self::Mapping,
            _ => Self::Scalar,
        }
    }

    pub fn is_container(self) -> bool {
        self != Self::Scalar
    }
}

/// A resolved result.
///
/// `Node` aliases a location of the live tree: reading it re-walks the cursor,
/// and writing through it changes the tree every other holder sees.
/// `Collection` is a synthetic sequence built by `*`, `//` or a query; its
/// elements keep their own origin. `Detached` owns a value that has no
/// location in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Node(Cursor),
    Collection(Vec<Selection>),
    Detached(Value),
}

impl Default for Selection {
    fn default() -> Self {
        Self::root()
    }
}

impl From<Cursor> for Selection {
    fn from(cursor: Cursor) -> Self {
        Self::Node(cursor)
    }
}

impl Selection {
    pub fn root() -> Self {
        Self::Node(Cursor::root())
    }

    /// Location aliased by this selection, if it is a single tree node.
    pub fn cursor(&self) -> Option<&Cursor> {
        match self {
            Self::Node(cursor) => Some(cursor),
            _ => None,
        }
    }

    /// Current value of the selection, or `None` when a cursor no longer
    /// points into `root`.
    pub fn view<'a>(&'a self, root: &'a Value) -> Option<Cow<'a, Value>> {
        match self {
            Self::Node(cursor) => cursor.get(root).map(Cow::Borrowed),
            Self::Detached(value) => Some(Cow::Borrowed(value)),
            Self::Collection(items) => Some(Cow::Owned(Value::Array(
                items.iter().map(|item| item.to_value(root)).collect(),
            ))),
        }
    }

    /// Deep copy of the current value; dangling cursors read as `null`.
    pub fn to_value(&self, root: &Value) -> Value {
        self.view(root).map(Cow::into_owned).unwrap_or(Value::Null)
    }

    /// Copy of this selection that no longer aliases the tree.
    pub fn detach(&self, root: &Value) -> Self {
        Self::Detached(self.to_value(root))
    }

    pub fn kind(&self, root: &Value) -> Option<Kind> {
        match self {
            Self::Node(cursor) => cursor.get(root).map(Kind::of),
            Self::Detached(value) => Some(Kind::of(value)),
            Self::Collection(_) => Some(Kind::Sequence),
        }
    }

    /// Number of elements of a collection, or `None` for other selections.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Collection(items) => Some(items.len()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Immediate children in document order, keyed by their component.
    pub fn children(&self, root: &Value) -> Vec<(PathComponent, Selection)> {
        match self {
            Self::Node(cursor) => match cursor.get(root) {
                Some(Value::Object(map)) => map
                    .keys()
                    .map(|key| {
                        let component = PathComponent::Key(key.clone());
                        (component.clone(), Self::Node(cursor.child(component)))
                    })
                    .collect(),
                Some(Value::Array(items)) => (0..items.len())
                    .map(|i| (PathComponent::Index(i), Self::Node(cursor.child(i))))
                    .collect(),
                _ => Vec::new(),
            },
            Self::Detached(Value::Object(map)) => map
                .iter()
                .map(|(key, value)| (PathComponent::Key(key.clone()), Self::Detached(value.clone())))
                .collect(),
            Self::Detached(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, value)| (PathComponent::Index(i), Self::Detached(value.clone())))
                .collect(),
            Self::Detached(_) => Vec::new(),
            Self::Collection(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| (PathComponent::Index(i), item.clone()))
                .collect(),
        }
    }

    /// Mapping member named `key`.
    pub fn member(&self, root: &Value, key: &str) -> Option<Selection> {
        match self {
            Self::Node(cursor) => match cursor.get(root)? {
                Value::Object(map) if map.contains_key(key) => Some(Self::Node(cursor.child(key))),
                _ => None,
            },
            Self::Detached(Value::Object(map)) => map.get(key).cloned().map(Self::Detached),
            _ => None,
        }
    }

    /// Sequence element at `index`.
    pub fn element(&self, root: &Value, index: usize) -> Option<Selection> {
        match self {
            Self::Node(cursor) => match cursor.get(root)? {
                Value::Array(items) if index < items.len() => Some(Self::Node(cursor.child(index))),
                _ => None,
            },
            Self::Detached(Value::Array(items)) => items.get(index).cloned().map(Self::Detached),
            Self::Collection(items) => items.get(index).cloned(),
            _ => None,
        }
    }

    /// Identity used to deduplicate results: aliased nodes by location,
    /// detached values by strict deep equality.
    pub fn same_as(&self, other: &Selection) -> bool {
        match (self, other) {
            (Self::Node(a), Self::Node(b)) => a == b,
            (Self::Detached(a), Self::Detached(b)) => deep_equal(a, b),
            (Self::Collection(a), Self::Collection(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            _ => false,
        }
    }
}

/// Pushes `selection` unless an identical one is already present.
pub(crate) fn push_unique(into: &mut Vec<Selection>, selection: Selection) {
    if !into.iter().any(|existing| existing.same_as(&selection)) {
        into.push(selection);
    }
}
