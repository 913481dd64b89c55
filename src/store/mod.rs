//! The state container and the public store handle.
//!
//! ```text
//! caller ──→ BoundAction ──→ m0 ──→ m1 ──→ … ──→ reconciler
//!                                                   │
//!          on_change ←── set_state / commit_slice ←─┘
//! ```

pub mod binder;
mod snapshot;

pub use snapshot::Snapshot;

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde_json::Value;

use crate::definitions::Definitions;
use crate::error::StoreError;
use crate::middleware::{chain, Handler, Invocation, Middleware};
use crate::reconciler::Dispatched;
use crate::tree::{self, ActionTree, SelectorTree};

/// Hook fired with the new snapshot after every commit.
pub type ChangeHook = Arc<dyn Fn(&Arc<Snapshot>) + Send + Sync>;

pub(crate) struct Shared {
    state: RwLock<Arc<Snapshot>>,
    on_change: RwLock<Option<ChangeHook>>,
    chain: Handler,
    actions: ActionTree,
    selectors: SelectorTree,
}

/// Handle to a store. Clones share the same state.
///
/// All reads and writes happen on the calling thread. A deferred result is
/// committed by whichever task awaits its [`Deferred`](crate::Deferred)
/// handle.
#[derive(Clone)]
pub struct Store {
    shared: Arc<Shared>,
}

impl Store {
    /// Build a store without middleware.
    ///
    /// # Errors
    /// Returns `NamingViolation` or `DuplicateName` when the definitions
    /// contain a name that is not allowed.
    pub fn new(defaults: Snapshot, definitions: Definitions) -> Result<Self, StoreError> {
        Self::with_middleware(defaults, definitions, Vec::new())
    }

    /// Build a store whose actions run through `middleware`, first entry
    /// outermost.
    pub fn with_middleware(
        defaults: Snapshot,
        definitions: Definitions,
        middleware: Vec<Box<dyn Middleware>>,
    ) -> Result<Self, StoreError> {
        let (initial, blueprint) = tree::plan(defaults, definitions)?;
        let layers = middleware.len();
        let chain = chain::compose(middleware);

        let shared = Arc::new_cyclic(|weak: &Weak<Shared>| {
            let (actions, selectors) = blueprint.bind(weak);
            Shared {
                state: RwLock::new(Arc::new(initial)),
                on_change: RwLock::new(None),
                chain,
                actions,
                selectors,
            }
        });

        tracing::debug!(
            slices = shared.actions.slice_names().count(),
            actions = shared.actions.len(),
            selectors = shared.selectors.len(),
            middleware = layers,
            "Store created"
        );

        Ok(Self { shared })
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Current root snapshot. Never copies.
    pub fn get_state(&self) -> Arc<Snapshot> {
        self.shared.state.read().clone()
    }

    /// Replace the root snapshot and fire the change hook.
    ///
    /// Bypasses actions and middleware; meant for collaborators such as
    /// persistence loaders.
    pub fn set_state(&self, next: Snapshot) -> Arc<Snapshot> {
        let next = Arc::new(next);
        *self.shared.state.write() = Arc::clone(&next);
        self.notify(&next);
        next
    }

    /// Replace one slice in a shallow copy of the current snapshot.
    pub(crate) fn commit_slice(&self, name: &str, value: Value) -> Arc<Value> {
        let value = Arc::new(value);
        let next = {
            let mut state = self.shared.state.write();
            let next = Arc::new(state.with_slice(name, Arc::clone(&value)));
            *state = Arc::clone(&next);
            next
        };
        tracing::trace!(slice = %name, "Slice committed");
        self.notify(&next);
        value
    }

    fn notify(&self, snapshot: &Arc<Snapshot>) {
        // Cloned out so the hook may read or dispatch without deadlocking.
        let hook = self.shared.on_change.read().clone();
        if let Some(hook) = hook {
            hook(snapshot);
        }
    }

    /// Install the change hook, replacing any previous one.
    pub fn set_on_change<F>(&self, hook: F)
    where
        F: Fn(&Arc<Snapshot>) + Send + Sync + 'static,
    {
        *self.shared.on_change.write() = Some(Arc::new(hook));
    }

    /// Remove the change hook. Returns whether one was installed.
    pub fn clear_on_change(&self) -> bool {
        self.shared.on_change.write().take().is_some()
    }

    pub fn actions(&self) -> &ActionTree {
        &self.shared.actions
    }

    pub fn selectors(&self) -> &SelectorTree {
        &self.shared.selectors
    }

    /// Call an action by dotted path, e.g. `"users.add_user"`.
    pub fn dispatch(&self, path: &str, args: Vec<Value>) -> Result<Dispatched, StoreError> {
        self.shared
            .actions
            .lookup(path)
            .ok_or_else(|| StoreError::UnknownAction {
                path: path.to_string(),
            })?
            .call(args)
    }

    /// Call a selector by dotted path.
    pub fn select(&self, path: &str, args: &[Value]) -> Result<Value, StoreError> {
        self.shared
            .selectors
            .lookup(path)
            .ok_or_else(|| StoreError::UnknownSelector {
                path: path.to_string(),
            })?
            .call(args)
    }

    pub(crate) fn invoke(&self, ctx: Invocation) -> Result<Dispatched, StoreError> {
        (self.shared.chain)(ctx)
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.get_state())
            .field("actions", &self.shared.actions.len())
            .field("selectors", &self.shared.selectors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::definitions::Slice;

    #[test]
    fn set_state_fires_hook_once_with_new_snapshot() {
        let store = Store::new(Snapshot::new(), Definitions::new()).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(RwLock::new(None));

        let (c, s) = (calls.clone(), seen.clone());
        store.set_on_change(move |snapshot| {
            c.fetch_add(1, Ordering::SeqCst);
            *s.write() = Some(Arc::clone(snapshot));
        });

        let next = store.set_state(Snapshot::new().with("loaded", json!(true)));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(seen.read().as_ref().unwrap(), &next));
        assert!(Arc::ptr_eq(&store.get_state(), &next));
    }

    #[test]
    fn clear_on_change_stops_notifications() {
        let store = Store::new(Snapshot::new(), Definitions::new()).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        store.set_on_change(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert!(store.clear_on_change());
        assert!(!store.clear_on_change());
        store.set_state(Snapshot::new());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn hook_may_read_the_store() {
        let defs = Definitions::new().slice("n", Slice::new(|_| json!(1)));
        let store = Store::new(Snapshot::new(), defs).unwrap();
        let reader = store.clone();
        let seen = Arc::new(RwLock::new(Value::Null));
        let s = seen.clone();
        store.set_on_change(move |_| {
            *s.write() = reader.get_state()["n"].clone();
        });

        store.commit_slice("n", json!(2));
        assert_eq!(*seen.read(), json!(2));
    }

    #[test]
    fn unknown_paths_are_reported() {
        let store = Store::new(Snapshot::new(), Definitions::new()).unwrap();
        assert!(matches!(
            store.dispatch("nope", vec![]),
            Err(StoreError::UnknownAction { .. })
        ));
        assert!(matches!(
            store.select("users.nope", &[]),
            Err(StoreError::UnknownSelector { .. })
        ));
    }
}
