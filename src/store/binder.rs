//! Resolves the state an action or selector operates on.
//!
//! Always reads the container at call time; nothing is cached between
//! calls, so each call observes every commit made before it.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::definitions::SliceId;
use crate::store::{Snapshot, Store};

/// State bound to one call.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Root(Arc<Snapshot>),
    Slice(Arc<Value>),
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Root(snapshot) => write!(f, "{snapshot}"),
            Bound::Slice(value) => write!(f, "{value}"),
        }
    }
}

/// Current root snapshot, or the named slice of it.
pub fn resolve(store: &Store, slice: SliceId<'_>) -> Bound {
    match slice {
        SliceId::Root => Bound::Root(root(store)),
        SliceId::Named(name) => Bound::Slice(self::slice(store, name)),
    }
}

pub(crate) fn root(store: &Store) -> Arc<Snapshot> {
    store.get_state()
}

/// A slice missing from the snapshot binds as `Value::Null`.
pub(crate) fn slice(store: &Store, name: &str) -> Arc<Value> {
    store
        .get_state()
        .get_shared(name)
        .cloned()
        .unwrap_or_else(|| Arc::new(Value::Null))
}
