//! Concrete locations inside a JSON tree.

use std::fmt;

use serde_json::Value;

use crate::escape::{escape_component, escape_pointer_token};

/// One step of a [`Cursor`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathComponent {
    Key(String),
    Index(usize),
}

impl PathComponent {
    /// Whether this component is spelled `key` in a path.
    pub fn matches_key(&self, key: &str) -> bool {
        match self {
            Self::Key(k) => k == key,
            Self::Index(index) => key.parse::<usize>().is_ok_and(|n| n == *index)
                && key.bytes().all(|b| b.is_ascii_digit()),
        }
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathComponent {
    fn from(value: &str) -> Self {
        Self::Key(value.to_string())
    }
}

impl From<String> for PathComponent {
    fn from(value: String) -> Self {
        Self::Key(value)
    }
}

impl From<usize> for PathComponent {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

/// Address of a node: the components leading to it from the tree root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Cursor {
    components: Vec<PathComponent>,
}

impl Cursor {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(components: Vec<PathComponent>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[PathComponent] {
        &self.components
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.components.len()
    }

    pub fn child(&self, component: impl Into<PathComponent>) -> Self {
        let mut components = Vec::with_capacity(self.components.len() + 1);
        components.extend_from_slice(&self.components);
        components.push(component.into());
        Self { components }
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.components.split_last()?;
        Some(Self {
            components: rest.to_vec(),
        })
    }

    pub fn last(&self) -> Option<&PathComponent> {
        self.components.last()
    }

    /// Whether `self` is `prefix` or lies below it.
    pub fn starts_with(&self, prefix: &Cursor) -> bool {
        self.components.starts_with(&prefix.components)
    }

    /// Joins `other` below this cursor.
    pub fn join(&self, other: &Cursor) -> Self {
        let mut components = self.components.clone();
        components.extend_from_slice(&other.components);
        Self { components }
    }

    /// RFC 6901 JSON Pointer for this location.
    pub fn pointer(&self) -> String {
        if self.components.is_empty() {
            return String::new();
        }
        let mut out = String::new();
        for component in &self.components {
            out.push('/');
            match component {
                PathComponent::Key(key) => out.push_str(&escape_pointer_token(key)),
                PathComponent::Index(index) => out.push_str(&index.to_string()),
            }
        }
        out
    }

    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.components
            .iter()
            .try_fold(root, |node, component| match (node, component) {
                (Value::Object(map), PathComponent::Key(key)) => map.get(key),
                (Value::Array(items), PathComponent::Index(index)) => items.get(*index),
                _ => None,
            })
    }

    pub fn get_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        let mut node = root;
        for component in &self.components {
            node = match (node, component) {
                (Value::Object(map), PathComponent::Key(key)) => map.get_mut(key)?,
                (Value::Array(items), PathComponent::Index(index)) => items.get_mut(*index)?,
                _ => return None,
            };
        }
        Some(node)
    }
}

/// Formats as a slash path that resolves back to the same node.
impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return f.write_str("/");
        }
        for component in &self.components {
            f.write_str("/")?;
            match component {
                PathComponent::Key(key) => f.write_str(&escape_component(key))?,
                PathComponent::Index(index) => write!(f, "{index}")?,
            }
        }
        Ok(())
    }
}

impl FromIterator<PathComponent> for Cursor {
    fn from_iter<T: IntoIterator<Item = PathComponent>>(iter: T) -> Self {
        Self {
            components: iter.into_iter().collect(),
        }
    }
}
