//! Single-tree state container with curried actions, derived selectors and
//! an ordered middleware pipeline.
//!
//! # Architecture
//!
//! ```text
//! Definitions ──→ Store::new ──→ ActionTree / SelectorTree
//!
//! action.call(args) ──→ middleware chain ──→ reconciler ──→ commit ──→ on_change
//!                              ↑                  │
//!                              └── thunk calls ───┘
//! ```
//!
//! - **Snapshot**: the root state, one shared value per slice
//! - **Action**: `(state, args) -> Outcome`, bound to the root or a slice
//! - **Selector**: `(state, args) -> Value`, read-only
//! - **Middleware**: wraps every action call, first entry outermost
//!
//! # Example
//!
//! ```
//! use anystate::{Definitions, Outcome, Slice, Snapshot, Store};
//! use serde_json::json;
//!
//! let defs = Definitions::new().slice(
//!     "users",
//!     Slice::new(|_| json!([]))
//!         .action("add_user", |users, args| {
//!             let mut users = users.as_array().cloned().unwrap_or_default();
//!             users.extend(args.iter().cloned());
//!             Outcome::Value(json!(users))
//!         })
//!         .selector("count", |users, _| json!(users.as_array().map_or(0, Vec::len))),
//! );
//!
//! let store = Store::new(Snapshot::new(), defs)?;
//! store.dispatch("users.add_user", vec![json!({"name": "Joe"})])?;
//! assert_eq!(store.select("users.count", &[])?, json!(1));
//! # Ok::<(), anystate::StoreError>(())
//! ```

pub mod config;
pub mod definitions;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod reconciler;
pub mod store;
pub mod tree;

pub use config::{Config, ConfigError, LogLevel, LoggerConfig};
pub use definitions::{Definitions, Slice, SliceId, Transform};
pub use error::StoreError;
pub use middleware::{from_fn, Invocation, Logger, Middleware, Next};
pub use reconciler::{Deferred, Dispatched, Outcome, Resolved};
pub use store::{Snapshot, Store};
pub use tree::{ActionTree, BoundAction, BoundSelector, SelectorTree};
