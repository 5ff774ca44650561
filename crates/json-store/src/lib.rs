//! Read and mutate `serde_json::Value` trees in place through a small path,
//! query and filter language.
//!
//! A read runs three stages against a base node:
//!
//! 1. the path resolver walks a slash path (`/books/0/title`, `//price`,
//!    `/shop/*`) and yields a [`Selection`];
//! 2. an optional query (`price<10&&category=shop`) keeps the containers whose
//!    members satisfy the predicates;
//! 3. an optional filter (`first`, `1..3`, `!0`, `%2`, `sum|2`) projects the
//!    result set or hands it to a registered callback.
//!
//! Selections alias tree locations through [`Cursor`]s, so a write through a
//! selection is visible to every later read. Empty results are either errors
//! or the configured default value, see [`Config::throw_on_empty`].
//!
//! ```
//! use json_store::Store;
//! use serde_json::json;
//!
//! let mut store = Store::new(json!({"books": [
//!     {"title": "Dune", "price": 9},
//!     {"title": "Emma", "price": 14}
//! ]}));
//! let cheap = store.find("/books", Some("price<10"), Some("first")).unwrap();
//! assert_eq!(cheap["title"], json!("Dune"));
//!
//! store.set("/books/1/price", json!(12)).unwrap();
//! assert_eq!(store.get("/books/1/price").unwrap(), json!(12));
//! ```

mod config;
mod engine;
mod error;
mod filter;
mod gateway;
mod literal;
mod mutation;
mod predicate;
mod query;
mod resolve;
mod selection;
mod store;
mod walk;

pub use config::{AllowedCallbacks, Config};
pub use engine::{find, find_selection, find_target, Context, Target};
pub use error::{
    FilterError, GatewayError, MutationError, Outcome, PathError, QueryError, StoreError,
};
pub use filter::Filter;
pub use gateway::{CallContext, CallSpec, Callback, CallbackRegistry, Descriptor, Visibility};
pub use literal::{split_quoted, strip_slashes, typify};
pub use mutation::{Mode, Mutation, Position};
pub use predicate::{is_like, like_regex, Clause, Comparison, Operator};
pub use query::{scan_clause, select, Connector, Query, Term};
pub use resolve::resolve;
pub use selection::{Kind, Selection};
pub use store::Store;
pub use walk::walk;

pub use json_store_path::{Cursor, PathComponent};

/// Applies a filter to a selection. See [`Filter`].
pub use filter::apply as apply_filter;
/// Applies one write. See [`Mutation`].
pub use mutation::apply as apply_mutation;
