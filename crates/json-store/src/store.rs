//! [`Store`]: one tree together with its configuration and callables.

use std::borrow::Cow;
use std::ops::ControlFlow;

use json_store_equal::type_name;
use json_store_path::{Cursor, PathComponent};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::engine::{find_selection, find_target, Context, Target};
use crate::error::{settle, MutationError, Outcome, StoreError};
use crate::filter::{self, Filter};
use crate::gateway::CallbackRegistry;
use crate::mutation::{self, Mode, Mutation, Position};
use crate::query::Query;
use crate::selection::Selection;
use crate::walk::walk;

/// Owns a tree and runs reads and writes against it.
///
/// Reads return materialised values ([`Store::get`]) or selections that alias
/// tree locations ([`Store::alias`]). A selection stays valid until a write
/// changes the shape above it.
///
/// [`Store::query`] enters query mode: later queries and writes are relative
/// to the pending result until [`Store::result`] is called.
#[derive(Debug, Default)]
pub struct Store {
    tree: Value,
    config: Config,
    callbacks: CallbackRegistry,
    pending: Option<Selection>,
}

impl Store {
    pub fn new(tree: Value) -> Self {
        Self {
            tree,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_callbacks(mut self, callbacks: CallbackRegistry) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn from_json_str(text: &str) -> Result<Self, StoreError> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    pub fn tree(&self) -> &Value {
        &self.tree
    }

    pub fn into_tree(self) -> Value {
        self.tree
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn registry(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    pub fn registry_mut(&mut self) -> &mut CallbackRegistry {
        &mut self.callbacks
    }

    fn split(&mut self) -> (&mut Value, Context<'_>) {
        (&mut self.tree, Context::new(&self.config, &self.callbacks))
    }

    /// Builds a target from query and filter strings.
    pub fn target(
        &self,
        path: &str,
        query: Option<&str>,
        filter: Option<&str>,
    ) -> Result<Target, StoreError> {
        let mut target = Target::new(path);
        let quote = self.config.parameter_quote_char;
        if let Some(query) = query {
            target = target.with_query(Query::parse_quoted(query, quote)?);
        }
        if let Some(filter) = filter {
            target = target.with_filter(Filter::parse(filter, quote)?);
        }
        Ok(target)
    }

    // ---------------------------------------------------------------- reads

    /// Value at `target`, or the configured default when nothing is there.
    pub fn get(&mut self, target: impl Into<Target>) -> Result<Value, StoreError> {
        let target = target.into();
        let (tree, ctx) = self.split();
        let outcome = find_target(tree, &ctx, &target)?;
        Ok(outcome.into_value(tree))
    }

    pub fn find(
        &mut self,
        path: &str,
        query: Option<&str>,
        filter: Option<&str>,
    ) -> Result<Value, StoreError> {
        let target = self.target(path, query, filter)?;
        self.get(target)
    }

    /// Selection at `target`. It aliases the tree unless
    /// `return_by_reference` is off; a default stands in as a detached value.
    pub fn alias(&mut self, target: impl Into<Target>) -> Result<Selection, StoreError> {
        let target = target.into();
        let (tree, ctx) = self.split();
        Ok(match find_target(tree, &ctx, &target)? {
            Outcome::Found(selection) => selection,
            Outcome::Default(value) => Selection::Detached(value),
        })
    }

    /// Current value behind `selection`.
    pub fn view(&self, selection: &Selection) -> Option<Value> {
        selection.view(&self.tree).map(Cow::into_owned)
    }

    /// Whether anything exists at `target`, regardless of `throw_on_empty`.
    pub fn has(&mut self, target: impl Into<Target>) -> Result<bool, StoreError> {
        let target = target.into();
        let base = Selection::Node(target.base.clone());
        let (tree, ctx) = self.split();
        let found = find_selection(
            tree,
            &ctx,
            &base,
            &target.path,
            target.query.as_ref(),
            target.filter.as_ref(),
        );
        match found {
            Ok(_) => Ok(true),
            Err(err) if err.is_absence() => Ok(false),
            Err(err) => Err(err),
        }
    }

    // --------------------------------------------------------------- writes

    /// Applies `mutation` at `target`, relative to the pending query result
    /// when in query mode.
    pub fn apply(
        &mut self,
        target: impl Into<Target>,
        mutation: Mutation,
    ) -> Result<Option<Cursor>, StoreError> {
        let target = self.rebase(target.into())?;
        let (tree, ctx) = self.split();
        mutation::apply(tree, &ctx, &target, mutation)
    }

    /// Sets `value`, creating missing branches.
    pub fn set(&mut self, target: impl Into<Target>, value: Value) -> Result<Option<Cursor>, StoreError> {
        self.apply(target, Mutation::new(Mode::ExtendBranches, value))
    }

    /// Sets `value` at `position` of the sequence at `target`, overwriting the
    /// element there.
    pub fn set_at(
        &mut self,
        target: impl Into<Target>,
        value: Value,
        position: Position,
    ) -> Result<Option<Cursor>, StoreError> {
        self.apply(
            target,
            Mutation::new(Mode::ExtendBranches, value).with_position(position),
        )
    }

    /// Writes `value` only if nothing exists at `target`.
    pub fn add(&mut self, target: impl Into<Target>, value: Value) -> Result<Option<Cursor>, StoreError> {
        self.apply(target, Mutation::new(Mode::AddOnly, value))
    }

    /// Overwrites an existing value. With `typesafe`, the new value must have
    /// the same runtime type.
    pub fn replace(
        &mut self,
        target: impl Into<Target>,
        value: Value,
        typesafe: bool,
    ) -> Result<Option<Cursor>, StoreError> {
        self.apply(
            target,
            Mutation::new(Mode::Overwrite, value).with_typesafe(typesafe),
        )
    }

    pub fn append(&mut self, target: impl Into<Target>, value: Value) -> Result<Option<Cursor>, StoreError> {
        self.apply(
            target,
            Mutation::new(Mode::AppendOrPrepend, value).with_position(Position::Last),
        )
    }

    pub fn prepend(&mut self, target: impl Into<Target>, value: Value) -> Result<Option<Cursor>, StoreError> {
        self.apply(
            target,
            Mutation::new(Mode::AppendOrPrepend, value).with_position(Position::First),
        )
    }

    /// Splices `value` into the sequence at `target`; appends without a
    /// position.
    pub fn inject(
        &mut self,
        target: impl Into<Target>,
        value: Value,
        position: Option<Position>,
    ) -> Result<Option<Cursor>, StoreError> {
        let mut mutation = Mutation::new(Mode::InjectAtIndex, value);
        mutation.position = position;
        self.apply(target, mutation)
    }

    pub fn remove(&mut self, target: impl Into<Target>) -> Result<Option<Cursor>, StoreError> {
        self.apply(target, Mutation::new(Mode::Remove, Value::Null))
    }

    pub fn reset(&mut self, target: impl Into<Target>) -> Result<Option<Cursor>, StoreError> {
        self.apply(target, Mutation::new(Mode::Reset, Value::Null))
    }

    /// Copies the value at `from` to `to`, replacing what is there and
    /// creating missing branches.
    pub fn copy(
        &mut self,
        from: impl Into<Target>,
        to: impl Into<Target>,
    ) -> Result<Option<Cursor>, StoreError> {
        let Some(value) = self.lookup(from.into())? else {
            return Ok(None);
        };
        self.apply(to, Mutation::new(Mode::AppendOrPrepend, value))
    }

    /// Merges the container at `from` into the one at `to`, then removes
    /// `from`. Sequences concatenate; mappings overlay key by key.
    pub fn merge(
        &mut self,
        from: impl Into<Target>,
        to: impl Into<Target>,
    ) -> Result<Option<Cursor>, StoreError> {
        let (from, to) = (from.into(), to.into());
        let (Some(source), Some(dest)) = (self.lookup(from.clone())?, self.lookup(to.clone())?) else {
            return Ok(None);
        };
        let merged = match (source, dest) {
            (Value::Array(items), Value::Array(mut into)) => {
                into.extend(items);
                Value::Array(into)
            }
            (Value::Object(map), Value::Object(mut into)) => {
                into.extend(map);
                Value::Object(into)
            }
            (source, dest) => {
                return Err(MutationError::MergeTypes {
                    from: type_name(&source),
                    into: type_name(&dest),
                }
                .into())
            }
        };
        debug!(from = %from.path, to = %to.path, "merging containers");
        let at = self.apply(to, Mutation::new(Mode::Overwrite, merged))?;
        self.apply(from, Mutation::new(Mode::Remove, Value::Null))?;
        Ok(at)
    }

    fn lookup(&mut self, target: Target) -> Result<Option<Value>, StoreError> {
        let target = self.rebase(target)?;
        let (tree, ctx) = self.split();
        Ok(match find_target(tree, &ctx, &target)? {
            Outcome::Found(selection) => Some(selection.to_value(tree)),
            Outcome::Default(_) => None,
        })
    }

    fn rebase(&self, mut target: Target) -> Result<Target, StoreError> {
        match &self.pending {
            None => Ok(target),
            Some(Selection::Node(cursor)) => {
                target.base = cursor.join(&target.base);
                Ok(target)
            }
            Some(_) => Err(MutationError::InvalidTarget(
                "pending query result is not a single tree node".into(),
            )
            .into()),
        }
    }

    /// Walks the whole tree, children before their parent.
    pub fn iterate<F>(&mut self, mut callback: F) -> ControlFlow<()>
    where
        F: FnMut(Option<&PathComponent>, &mut Value, &Cursor) -> ControlFlow<()>,
    {
        walk(&mut self.tree, &mut callback)
    }

    // --------------------------------------------------------- query chains

    /// Narrows the pending result (the root when not in query mode).
    pub fn query(
        &mut self,
        path: &str,
        query: Option<&str>,
        filter: Option<&str>,
    ) -> Result<&mut Self, StoreError> {
        let target = self.target(path, query, filter)?;
        let base = self.pending.clone().unwrap_or_default();
        let (tree, ctx) = self.split();
        let found = find_selection(
            tree,
            &ctx,
            &base,
            &target.path,
            target.query.as_ref(),
            target.filter.as_ref(),
        );
        let narrowed = match settle(ctx.config, found)? {
            Outcome::Found(selection) => selection,
            Outcome::Default(value) => Selection::Detached(value),
        };
        self.pending = Some(narrowed);
        Ok(self)
    }

    pub fn first(&mut self) -> Result<&mut Self, StoreError> {
        self.narrow(&Filter::first())
    }

    pub fn last(&mut self) -> Result<&mut Self, StoreError> {
        self.narrow(&Filter::last())
    }

    /// Applies a filter string to the pending result.
    pub fn at(&mut self, filter: &str) -> Result<&mut Self, StoreError> {
        let filter = Filter::parse(filter, self.config.parameter_quote_char)?;
        self.narrow(&filter)
    }

    fn narrow(&mut self, filter: &Filter) -> Result<&mut Self, StoreError> {
        let subject = self.pending.clone().unwrap_or_default();
        let (tree, ctx) = self.split();
        let narrowed = match settle(ctx.config, filter::apply(tree, &ctx, subject, filter))? {
            Outcome::Found(selection) => selection,
            Outcome::Default(value) => Selection::Detached(value),
        };
        self.pending = Some(narrowed);
        Ok(self)
    }

    pub fn pending(&self) -> Option<&Selection> {
        self.pending.as_ref()
    }

    /// Ends query mode and returns the pending result (the whole tree when
    /// no query is pending).
    pub fn result(&mut self) -> Value {
        match self.pending.take() {
            Some(selection) => selection.to_value(&self.tree),
            None => self.tree.clone(),
        }
    }
}
