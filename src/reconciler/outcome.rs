//! Transform results.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::error::StoreError;
use crate::reconciler::Deferred;
use crate::store::{Snapshot, Store};

/// Boxed future resolving to a transform's eventual value.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'static>>;

/// Body of a higher-order transform.
pub type Thunk = Box<dyn FnOnce(&Store) -> Result<(), StoreError> + Send + 'static>;

/// What a transform hands back to the store.
///
/// `T` is `Snapshot` for root actions and `Value` for slice actions.
pub enum Outcome<T> {
    /// Commit this value immediately.
    Value(T),
    /// Run with the store; only the actions it calls change state.
    Thunk(Thunk),
    /// Commit the resolved value once the future completes.
    Deferred(BoxFuture<T>),
    /// No value. Always rejected with `StoreError::UndefinedResult`.
    Absent,
}

impl<T> Outcome<T> {
    pub fn thunk<F>(thunk: F) -> Self
    where
        F: FnOnce(&Store) -> Result<(), StoreError> + Send + 'static,
    {
        Outcome::Thunk(Box::new(thunk))
    }

    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Outcome::Deferred(Box::pin(future))
    }

    /// `None` maps to [`Outcome::Absent`].
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(value) => Outcome::Value(value),
            None => Outcome::Absent,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Value(_) => "value",
            Outcome::Thunk(_) => "thunk",
            Outcome::Deferred(_) => "deferred",
            Outcome::Absent => "absent",
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value(value) => f.debug_tuple("Value").field(value).finish(),
            other => write!(f, "{}", other.kind()),
        }
    }
}

/// State written by a commit: the new root, or the new value of one slice.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Root(Arc<Snapshot>),
    Slice(Arc<Value>),
}

impl Resolved {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Resolved::Slice(value) => Some(value.as_ref()),
            Resolved::Root(_) => None,
        }
    }

    pub fn as_snapshot(&self) -> Option<&Snapshot> {
        match self {
            Resolved::Root(snapshot) => Some(snapshot.as_ref()),
            Resolved::Slice(_) => None,
        }
    }
}

/// Result of pushing one action through the middleware chain.
#[derive(Debug)]
pub enum Dispatched {
    /// The value was committed synchronously.
    Committed(Resolved),
    /// The commit happens when the deferred value settles.
    Pending(Deferred),
    /// A higher-order transform ran; it committed nothing itself.
    Delegated,
}

impl Dispatched {
    pub fn kind(&self) -> &'static str {
        match self {
            Dispatched::Committed(_) => "committed",
            Dispatched::Pending(_) => "pending",
            Dispatched::Delegated => "delegated",
        }
    }

    pub fn committed(self) -> Option<Resolved> {
        match self {
            Dispatched::Committed(resolved) => Some(resolved),
            _ => None,
        }
    }

    pub fn into_deferred(self) -> Option<Deferred> {
        match self {
            Dispatched::Pending(deferred) => Some(deferred),
            _ => None,
        }
    }

    /// Wait for any pending commit. `None` for delegated calls.
    pub async fn settled(self) -> Result<Option<Resolved>, StoreError> {
        match self {
            Dispatched::Committed(resolved) => Ok(Some(resolved)),
            Dispatched::Pending(deferred) => deferred.await.map(Some),
            Dispatched::Delegated => Ok(None),
        }
    }
}
