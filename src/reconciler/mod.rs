//! Innermost link of the middleware chain.
//!
//! Binds fresh state, runs the user transform and turns its [`Outcome`]
//! into a commit:
//!
//! ```text
//! Value(v)     ──→ commit v                       ──→ Committed
//! Deferred(f)  ──→ handle { commit(f.await?) }    ──→ Pending
//! Thunk(t)     ──→ t(store), nested calls commit  ──→ Delegated
//! Absent       ──→ UndefinedResult
//! ```
//!
//! A deferred transform reads its input when it is dispatched. The commit
//! runs when the returned [`Deferred`] is awaited and resolves, and its
//! slice commit copies whatever root snapshot is current at that point.

mod deferred;
mod outcome;

pub use deferred::Deferred;
pub use outcome::{BoxFuture, Dispatched, Outcome, Resolved, Thunk};

use crate::definitions::Transform;
use crate::error::StoreError;
use crate::middleware::Invocation;
use crate::store::{binder, Store};

/// Terminus of every composed chain.
pub(crate) fn reconcile(ctx: Invocation) -> Result<Dispatched, StoreError> {
    let path = ctx.path();
    let (store, args, transform) = ctx.into_parts();

    match transform {
        Transform::Root(action) => {
            let root = binder::root(&store);
            let outcome = action(&*root, args.as_slice());
            settle(store, path, outcome, |store, snapshot| {
                Resolved::Root(store.set_state(snapshot))
            })
        }
        Transform::Slice { name, action } => {
            let current = binder::slice(&store, &name);
            let outcome = action(&*current, args.as_slice());
            settle(store, path, outcome, move |store, value| {
                Resolved::Slice(store.commit_slice(&name, value))
            })
        }
    }
}

fn settle<T, C>(
    store: Store,
    path: String,
    outcome: Outcome<T>,
    commit: C,
) -> Result<Dispatched, StoreError>
where
    T: Send + 'static,
    C: FnOnce(&Store, T) -> Resolved + Send + 'static,
{
    tracing::trace!(action = %path, outcome = outcome.kind(), "Transform returned");

    match outcome {
        Outcome::Value(value) => Ok(Dispatched::Committed(commit(&store, value))),
        Outcome::Thunk(thunk) => {
            thunk(&store)?;
            Ok(Dispatched::Delegated)
        }
        Outcome::Absent => {
            tracing::debug!(action = %path, "Transform returned no value, nothing committed");
            Err(StoreError::UndefinedResult { action: path })
        }
        Outcome::Deferred(future) => {
            let action = path.clone();
            let task = async move {
                match future.await {
                    Ok(value) => Ok(commit(&store, value)),
                    Err(source) => {
                        tracing::debug!(action = %action, error = %source, "Deferred result rejected");
                        Err(StoreError::Rejected { action, source })
                    }
                }
            };
            Ok(Dispatched::Pending(Deferred::new(path, Box::pin(task))))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::definitions::{Definitions, Slice};
    use crate::error::StoreError;
    use crate::reconciler::{Dispatched, Outcome};
    use crate::store::{Snapshot, Store};

    fn counter_store() -> Store {
        let defs = Definitions::new().slice(
            "count",
            Slice::new(|_| json!(0))
                .action("inc", |n, _| Outcome::Value(json!(n.as_i64().unwrap_or(0) + 1)))
                .action("forget", |_, _| Outcome::Absent)
                .action("later", |n, _| {
                    let next = json!(n.as_i64().unwrap_or(0) + 10);
                    Outcome::deferred(async move { Ok(next) })
                }),
        );
        Store::new(Snapshot::new(), defs).unwrap()
    }

    #[test]
    fn value_commits_synchronously() {
        let store = counter_store();
        let dispatched = store.dispatch("count.inc", vec![]).unwrap();
        assert_eq!(dispatched.kind(), "committed");
        assert_eq!(store.get_state()["count"], json!(1));
    }

    #[test]
    fn absent_is_rejected_without_commit() {
        let store = counter_store();
        let before = store.get_state();
        let err = store.dispatch("count.forget", vec![]).unwrap_err();
        assert!(matches!(err, StoreError::UndefinedResult { ref action } if action == "count.forget"));
        assert_eq!(store.get_state(), before);
    }

    #[test]
    fn deferred_is_lazy_and_needs_no_ambient_runtime() {
        let store = counter_store();
        let deferred = store
            .dispatch("count.later", vec![])
            .unwrap()
            .into_deferred()
            .unwrap();
        assert!(!deferred.is_settled());
        assert_eq!(store.get_state()["count"], Value::from(0));

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let resolved = runtime.block_on(deferred).unwrap();

        assert_eq!(resolved.as_value(), Some(&json!(10)));
        assert_eq!(store.get_state()["count"], json!(10));
    }

    #[tokio::test]
    async fn deferred_commits_when_settled() {
        let store = counter_store();
        let dispatched = store.dispatch("count.later", vec![]).unwrap();
        assert_eq!(store.get_state()["count"], json!(0));

        let Dispatched::Pending(deferred) = dispatched else {
            panic!("expected pending");
        };
        let resolved = deferred.await.unwrap();
        assert_eq!(resolved.as_value(), Some(&json!(10)));
        assert_eq!(store.get_state()["count"], json!(10));
    }
}
