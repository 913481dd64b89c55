//! Per-call invocation context.

use std::fmt;

use serde_json::Value;

use crate::definitions::{SliceId, Transform};
use crate::store::Store;

/// Everything a middleware knows about one action call.
///
/// Lives for a single trip through the chain. The slice and the user
/// transform are fixed; the arguments may be rewritten before calling
/// `next`.
pub struct Invocation {
    store: Store,
    action: String,
    args: Vec<Value>,
    transform: Transform,
}

impl Invocation {
    pub(crate) fn new(store: Store, action: String, args: Vec<Value>, transform: Transform) -> Self {
        Self {
            store,
            action,
            args,
            transform,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn slice(&self) -> SliceId<'_> {
        self.transform.slice()
    }

    /// Name of the action within its slice.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Dotted path, e.g. `"users.add_user"`.
    pub fn path(&self) -> String {
        self.slice().path(&self.action)
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn args_mut(&mut self) -> &mut Vec<Value> {
        &mut self.args
    }

    /// The raw user function this call will run.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub(crate) fn into_parts(self) -> (Store, Vec<Value>, Transform) {
        (self.store, self.args, self.transform)
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("slice", &self.slice())
            .field("action", &self.action)
            .field("args", &self.args)
            .finish()
    }
}
