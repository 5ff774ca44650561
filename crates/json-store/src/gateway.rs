//! Callback gateway: named callables registered up front and invoked from
//! the filter language behind an allow-list.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::engine::Context;
use crate::error::{FilterError, GatewayError, StoreError};
use crate::literal::{split_quoted, strip_slashes, typify};

/// A registered callable.
pub type Callback =
    Arc<dyn Fn(&mut CallContext<'_>) -> Result<Value, GatewayError> + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// What the gateway knows about a registered callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Owning type for methods, `None` for plain functions.
    pub type_name: Option<String>,
    pub name: String,
    pub type_abstract: bool,
    pub method_abstract: bool,
    pub visibility: Visibility,
}

impl Descriptor {
    pub fn function(name: impl Into<String>) -> Self {
        Self {
            type_name: None,
            name: name.into(),
            type_abstract: false,
            method_abstract: false,
            visibility: Visibility::Public,
        }
    }

    pub fn method(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::function(name)
        }
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn with_abstract_type(mut self) -> Self {
        self.type_abstract = true;
        self
    }

    #[must_use]
    pub fn with_abstract_method(mut self) -> Self {
        self.method_abstract = true;
        self
    }

    /// `name` or `Type::name`.
    pub fn qualified_name(&self) -> String {
        match &self.type_name {
            Some(type_name) => format!("{type_name}::{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Names the allow-list may use for this callable.
    fn allow_names(&self) -> Vec<String> {
        match &self.type_name {
            Some(type_name) => vec![type_name.clone(), self.qualified_name()],
            None => vec![self.name.clone()],
        }
    }
}

/// A parsed callback filter: the target plus typed extra arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSpec {
    target: String,
    args: Vec<Value>,
}

impl CallSpec {
    /// Builds a spec from an already-typed argument list.
    pub fn new(target: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            target: target.into(),
            args,
        }
    }

    /// Whether `text` has the shape `name`, `Type::method`, optionally
    /// followed by `|args`.
    pub fn looks_like(text: &str) -> bool {
        let head = text.split_once('|').map_or(text, |(head, _)| head);
        let mut parts = head.splitn(2, "::");
        let ident = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
        match (parts.next(), parts.next()) {
            (Some(name), None) => ident(name),
            (Some(owner), Some(method)) => ident(owner) && ident(method),
            _ => false,
        }
    }

    /// Parses `name|arg1,'arg 2'`; arguments are unescaped and typified.
    pub fn parse(text: &str, quote: char) -> Result<Self, FilterError> {
        let text = text.trim();
        if !Self::looks_like(text) {
            return Err(FilterError::Unrecognized(text.to_string()));
        }
        let (target, args) = match text.split_once('|') {
            Some((target, args)) => (
                target,
                split_quoted(args, ',', quote)
                    .iter()
                    .map(|arg| typify(&strip_slashes(arg)))
                    .collect(),
            ),
            None => (text, Vec::new()),
        };
        Ok(Self::new(target, args))
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }
}

/// What a callable sees while it runs.
pub struct CallContext<'a> {
    subject: Value,
    args: &'a [Value],
    tree: &'a mut Value,
    config: &'a Config,
    callbacks: &'a CallbackRegistry,
}

impl<'a> CallContext<'a> {
    /// The result set being filtered.
    pub fn subject(&self) -> &Value {
        &self.subject
    }

    pub fn take_subject(&mut self) -> Value {
        std::mem::take(&mut self.subject)
    }

    pub fn args(&self) -> &[Value] {
        self.args
    }

    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// The subject followed by the extra arguments.
    pub fn arguments(&self) -> Vec<Value> {
        std::iter::once(self.subject.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    pub fn tree(&self) -> &Value {
        self.tree
    }

    /// Live tree, for callables that read or mutate it re-entrantly.
    pub fn tree_mut(&mut self) -> &mut Value {
        self.tree
    }

    /// Engine context for nested reads and writes against [`Self::tree_mut`].
    pub fn context(&self) -> Context<'a> {
        Context::new(self.config, self.callbacks)
    }
}

struct Entry {
    descriptor: Descriptor,
    callback: Callback,
}

/// Callables addressable from filters, keyed by qualified name.
#[derive(Default)]
pub struct CallbackRegistry {
    entries: HashMap<String, Entry>,
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("CallbackRegistry").field("entries", &names).finish()
    }
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, descriptor: Descriptor, callback: F) -> &mut Self
    where
        F: Fn(&mut CallContext<'_>) -> Result<Value, GatewayError> + Send + Sync + 'static,
    {
        self.entries.insert(
            descriptor.qualified_name(),
            Entry {
                descriptor,
                callback: Arc::new(callback),
            },
        );
        self
    }

    pub fn register_function<F>(&mut self, name: &str, callback: F) -> &mut Self
    where
        F: Fn(&mut CallContext<'_>) -> Result<Value, GatewayError> + Send + Sync + 'static,
    {
        self.register(Descriptor::function(name), callback)
    }

    pub fn register_method<F>(&mut self, type_name: &str, method: &str, callback: F) -> &mut Self
    where
        F: Fn(&mut CallContext<'_>) -> Result<Value, GatewayError> + Send + Sync + 'static,
    {
        self.register(Descriptor::method(type_name, method), callback)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&Descriptor> {
        self.entries.get(name).map(|entry| &entry.descriptor)
    }

    /// Looks `spec` up and checks it against the allow-list and its
    /// descriptor.
    pub fn resolve(&self, spec: &CallSpec, config: &Config) -> Result<Callback, StoreError> {
        let entry = self
            .entries
            .get(spec.target())
            .ok_or_else(|| FilterError::Unrecognized(spec.target().to_string()))?;
        let descriptor = &entry.descriptor;

        let names = descriptor.allow_names();
        if !config
            .allowed_callbacks
            .permits(names.iter().map(String::as_str))
        {
            warn!(callback = %spec.target(), "callback rejected by allow-list");
            return Err(GatewayError::NotAllowed(spec.target().to_string()).into());
        }
        if let Some(type_name) = &descriptor.type_name {
            if descriptor.type_abstract {
                return Err(GatewayError::Invalid(format!("type {type_name} is abstract")).into());
            }
            if descriptor.method_abstract {
                return Err(GatewayError::Invalid(format!(
                    "method {} is abstract",
                    descriptor.qualified_name()
                ))
                .into());
            }
        }
        if descriptor.visibility != Visibility::Public {
            return Err(GatewayError::Invalid(format!(
                "{} is not public",
                descriptor.qualified_name()
            ))
            .into());
        }
        Ok(Arc::clone(&entry.callback))
    }

    /// Resolves and runs `spec` with `subject` bound as the first argument.
    pub fn invoke(
        &self,
        spec: &CallSpec,
        subject: Value,
        tree: &mut Value,
        config: &Config,
    ) -> Result<Value, StoreError> {
        let callback = self.resolve(spec, config)?;
        debug!(callback = %spec.target(), args = spec.args().len(), "invoking callback");
        let mut call = CallContext {
            subject,
            args: spec.args(),
            tree,
            config,
            callbacks: self,
        };
        Ok(callback(&mut call)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllowedCallbacks;
    use serde_json::json;

    fn registry() -> CallbackRegistry {
        let mut registry = CallbackRegistry::new();
        registry
            .register_function("count", |call| {
                Ok(json!(call.subject().as_array().map_or(0, Vec::len)))
            })
            .register_method("Report", "scale", |call| {
                let factor = call.arg(0).and_then(Value::as_i64).unwrap_or(1);
                Ok(json!(call.subject().as_i64().unwrap_or(0) * factor))
            })
            .register(
                Descriptor::method("Report", "secret").with_visibility(Visibility::Private),
                |_| Ok(Value::Null),
            )
            .register(
                Descriptor::method("Shape", "area").with_abstract_type(),
                |_| Ok(Value::Null),
            );
        registry
    }

    fn run(config: &Config, spec: &str) -> Result<Value, StoreError> {
        let spec = CallSpec::parse(spec, config.parameter_quote_char)?;
        let mut tree = json!({});
        registry().invoke(&spec, json!(3), &mut tree, config)
    }

    #[test]
    fn parse_specs() {
        let spec = CallSpec::parse("Report::scale|2,'a,b',true", '\'').unwrap();
        assert_eq!(spec.target(), "Report::scale");
        assert_eq!(spec.args(), &[json!(2), json!("a,b"), json!(true)]);
        assert!(CallSpec::parse("1..2", '\'').is_err());
        assert!(CallSpec::looks_like("count"));
        assert!(!CallSpec::looks_like("a::b::c"));
    }

    #[test]
    fn disabled_by_default() {
        assert_eq!(
            run(&Config::default(), "Report::scale|2"),
            Err(GatewayError::NotAllowed("Report::scale".into()).into())
        );
    }

    #[test]
    fn unknown_callbacks_are_unrecognized() {
        let config = Config::default().with_allowed_callbacks(AllowedCallbacks::Any);
        assert_eq!(
            run(&config, "nope"),
            Err(FilterError::Unrecognized("nope".into()).into())
        );
    }

    #[test]
    fn allow_list_by_type_or_method() {
        let by_type = Config::default()
            .with_allowed_callbacks(AllowedCallbacks::Only(vec!["Report".into()]));
        assert_eq!(run(&by_type, "Report::scale|2"), Ok(json!(6)));
        let by_method = Config::default()
            .with_allowed_callbacks(AllowedCallbacks::Only(vec!["Report::scale".into()]));
        assert_eq!(run(&by_method, "Report::scale|5"), Ok(json!(15)));
        assert!(matches!(
            run(&by_method, "count"),
            Err(StoreError::Gateway(GatewayError::NotAllowed(_)))
        ));
    }

    #[test]
    fn descriptor_checks() {
        let config = Config::default().with_allowed_callbacks(AllowedCallbacks::Any);
        assert!(matches!(
            run(&config, "Report::secret"),
            Err(StoreError::Gateway(GatewayError::Invalid(_)))
        ));
        assert!(matches!(
            run(&config, "Shape::area"),
            Err(StoreError::Gateway(GatewayError::Invalid(_)))
        ));
    }

    #[test]
    fn callables_see_the_tree() {
        let mut registry = CallbackRegistry::new();
        registry.register_function("stamp", |call| {
            let subject = call.take_subject();
            call.tree_mut()["stamped"] = subject.clone();
            Ok(subject)
        });
        let config = Config::default().with_allowed_callbacks(AllowedCallbacks::Any);
        let mut tree = json!({});
        let out = registry
            .invoke(&CallSpec::new("stamp", vec![]), json!([1]), &mut tree, &config)
            .unwrap();
        assert_eq!(out, json!([1]));
        assert_eq!(tree, json!({"stamped": [1]}));
    }
}
