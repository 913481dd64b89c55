//! Builds the bound action and selector trees from [`Definitions`].
//!
//! Trees are exactly two levels deep: root entries, then one level of
//! named slices. Every slice gets a branch in both trees, even when it
//! declares no actions or selectors.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Weak;

use serde_json::Value;

use crate::definitions::{Definitions, Entry, Selector, SliceEntry, SliceId, Transform};
use crate::error::StoreError;
use crate::middleware::Invocation;
use crate::reconciler::Dispatched;
use crate::store::{binder, Shared, Snapshot, Store};

const RESERVED_PREFIX: char = '_';
const PATH_SEPARATOR: char = '.';

/// Root leaves plus one level of named slices.
#[derive(Clone)]
pub struct Tree<T> {
    root: BTreeMap<String, T>,
    slices: BTreeMap<String, BTreeMap<String, T>>,
}

pub type ActionTree = Tree<BoundAction>;
pub type SelectorTree = Tree<BoundSelector>;

impl<T> Tree<T> {
    fn new() -> Self {
        Self {
            root: BTreeMap::new(),
            slices: BTreeMap::new(),
        }
    }

    /// Root-level entry.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.root.get(name)
    }

    /// Entries of one slice.
    pub fn slice(&self, name: &str) -> Option<&BTreeMap<String, T>> {
        self.slices.get(name)
    }

    /// Entry by dotted path: `"reset"` or `"users.add_user"`.
    pub fn lookup(&self, path: &str) -> Option<&T> {
        match path.split_once(PATH_SEPARATOR) {
            Some((slice, leaf)) => self.slices.get(slice)?.get(leaf),
            None => self.root.get(path),
        }
    }

    /// Names of root-level entries.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    pub fn slice_names(&self) -> impl Iterator<Item = &str> {
        self.slices.keys().map(String::as_str)
    }

    /// Number of leaves across all levels.
    pub fn len(&self) -> usize {
        self.root.len() + self.slices.values().map(BTreeMap::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn map<U>(self, mut f: impl FnMut(String, T) -> U) -> Tree<U> {
        Tree {
            root: self
                .root
                .into_iter()
                .map(|(name, leaf)| (name.clone(), f(name, leaf)))
                .collect(),
            slices: self
                .slices
                .into_iter()
                .map(|(slice, leaves)| {
                    let leaves = leaves
                        .into_iter()
                        .map(|(name, leaf)| (name.clone(), f(name, leaf)))
                        .collect();
                    (slice, leaves)
                })
                .collect(),
        }
    }
}

impl<T> fmt::Debug for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for name in self.root.keys() {
            map.entry(name, &"leaf");
        }
        for (slice, leaves) in &self.slices {
            map.entry(slice, &leaves.keys().collect::<Vec<_>>());
        }
        map.finish()
    }
}

/// Callable action handle. Holds the slice identity, never a state value.
#[derive(Clone)]
pub struct BoundAction {
    store: Weak<Shared>,
    name: String,
    transform: Transform,
}

impl BoundAction {
    /// Run the action through the store's middleware chain.
    pub fn call(&self, args: Vec<Value>) -> Result<Dispatched, StoreError> {
        let store = self
            .store
            .upgrade()
            .map(Store::from_shared)
            .ok_or(StoreError::StoreDropped)?;
        let ctx = Invocation::new(store.clone(), self.name.clone(), args, self.transform.clone());
        store.invoke(ctx)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slice(&self) -> SliceId<'_> {
        self.transform.slice()
    }

    pub fn path(&self) -> String {
        self.slice().path(&self.name)
    }
}

impl fmt::Debug for BoundAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundAction").field(&self.path()).finish()
    }
}

/// Callable selector handle. Never commits.
#[derive(Clone)]
pub struct BoundSelector {
    store: Weak<Shared>,
    name: String,
    selector: Selector,
}

impl BoundSelector {
    pub fn call(&self, args: &[Value]) -> Result<Value, StoreError> {
        let store = self
            .store
            .upgrade()
            .map(Store::from_shared)
            .ok_or(StoreError::StoreDropped)?;
        Ok(match &self.selector {
            Selector::Root(select) => select(&*binder::root(&store), args),
            Selector::Slice { name, select } => select(&*binder::slice(&store, name), args),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slice(&self) -> SliceId<'_> {
        self.selector.slice()
    }

    pub fn path(&self) -> String {
        self.slice().path(&self.name)
    }
}

impl fmt::Debug for BoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundSelector").field(&self.path()).finish()
    }
}

/// Validated, unbound trees awaiting the store they will call into.
pub(crate) struct Blueprint {
    actions: Tree<Transform>,
    selectors: Tree<Selector>,
}

impl Blueprint {
    pub(crate) fn bind(self, store: &Weak<Shared>) -> (ActionTree, SelectorTree) {
        let actions = self.actions.map(|name, transform| BoundAction {
            store: store.clone(),
            name,
            transform,
        });
        let selectors = self.selectors.map(|name, selector| BoundSelector {
            store: store.clone(),
            name,
            selector,
        });
        (actions, selectors)
    }
}

/// Validate every name, run each slice initializer once, and split the
/// definitions into action and selector trees.
///
/// Names are checked before any initializer runs, so a rejected
/// definitions tree has no side effects.
pub(crate) fn plan(
    defaults: Snapshot,
    definitions: Definitions,
) -> Result<(Snapshot, Blueprint), StoreError> {
    validate(&definitions)?;

    let mut initial = defaults;
    let mut actions = Tree::new();
    let mut selectors = Tree::new();

    for (name, entry) in definitions.entries {
        match entry {
            Entry::Action(action) => {
                actions.root.insert(name, Transform::Root(action));
            }
            Entry::Selector(select) => {
                selectors.root.insert(name, Selector::Root(select));
            }
            Entry::Slice(slice) => {
                let value = (slice.initial_state)(initial.get(&name));
                initial.insert(name.clone(), value);

                let mut slice_actions = BTreeMap::new();
                let mut slice_selectors = BTreeMap::new();
                for (leaf, entry) in slice.entries {
                    match entry {
                        SliceEntry::Action(action) => {
                            slice_actions.insert(
                                leaf,
                                Transform::Slice {
                                    name: name.clone(),
                                    action,
                                },
                            );
                        }
                        SliceEntry::Selector(select) => {
                            slice_selectors.insert(
                                leaf,
                                Selector::Slice {
                                    name: name.clone(),
                                    select,
                                },
                            );
                        }
                    }
                }
                tracing::trace!(
                    slice = %name,
                    actions = slice_actions.len(),
                    selectors = slice_selectors.len(),
                    "Slice initialized"
                );
                actions.slices.insert(name.clone(), slice_actions);
                selectors.slices.insert(name, slice_selectors);
            }
        }
    }

    Ok((initial, Blueprint { actions, selectors }))
}

fn validate(definitions: &Definitions) -> Result<(), StoreError> {
    let mut seen = BTreeSet::new();
    for (name, entry) in &definitions.entries {
        check_name(name, &mut seen)?;
        if let Entry::Slice(slice) = entry {
            let mut leaves = BTreeSet::new();
            for (leaf, _) in &slice.entries {
                check_name(leaf, &mut leaves)?;
            }
        }
    }
    Ok(())
}

fn check_name<'a>(name: &'a str, seen: &mut BTreeSet<&'a str>) -> Result<(), StoreError> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.starts_with(RESERVED_PREFIX) {
        Some("names starting with '_' are reserved")
    } else if name.contains(PATH_SEPARATOR) {
        Some("'.' separates slice and entry names")
    } else {
        None
    };
    if let Some(reason) = reason {
        return Err(StoreError::NamingViolation {
            name: name.to_string(),
            reason,
        });
    }
    if !seen.insert(name) {
        return Err(StoreError::DuplicateName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::definitions::Slice;
    use crate::reconciler::Outcome;

    fn noop(_: &Value, _: &[Value]) -> Outcome<Value> {
        Outcome::Value(Value::Null)
    }

    #[test]
    fn reserved_prefix_is_rejected_everywhere() {
        let slice_name = Definitions::new().slice("_private", Slice::from_defaults());
        let root_action = Definitions::new().action("_reset", |s, _| Outcome::Value(s.clone()));
        let leaf = Definitions::new().slice("users", Slice::from_defaults().action("_add", noop));

        for defs in [slice_name, root_action, leaf] {
            assert!(matches!(
                plan(Snapshot::new(), defs),
                Err(StoreError::NamingViolation { .. })
            ));
        }
    }

    #[test]
    fn separator_and_empty_names_are_rejected() {
        let dotted = Definitions::new().slice("a.b", Slice::from_defaults());
        let empty = Definitions::new().selector("", |_, _| Value::Null);
        for defs in [dotted, empty] {
            assert!(matches!(
                plan(Snapshot::new(), defs),
                Err(StoreError::NamingViolation { .. })
            ));
        }
    }

    #[test]
    fn duplicates_on_one_level_are_rejected() {
        let defs = Definitions::new()
            .slice("users", Slice::from_defaults())
            .selector("users", |_, _| Value::Null);
        assert!(matches!(
            plan(Snapshot::new(), defs),
            Err(StoreError::DuplicateName { ref name }) if name == "users"
        ));

        // Same leaf name in two different slices is fine.
        let defs = Definitions::new()
            .slice("a", Slice::from_defaults().action("set", noop))
            .slice("b", Slice::from_defaults().action("set", noop));
        assert!(plan(Snapshot::new(), defs).is_ok());
    }

    #[test]
    fn no_initializer_runs_when_names_are_invalid() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let defs = Definitions::new()
            .slice(
                "ok",
                Slice::new(move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                    Value::Null
                }),
            )
            .slice("_bad", Slice::from_defaults());

        assert!(plan(Snapshot::new(), defs).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn initializer_sees_default_fragment_or_none() {
        let defs = Definitions::new()
            .slice(
                "hi",
                Slice::new(|prior| json!(format!("Hi {}", prior.and_then(Value::as_str).unwrap_or("?")))),
            )
            .slice("missing", Slice::new(|prior| json!(prior.is_none())));
        let defaults = Snapshot::new()
            .with("hi", json!("there"))
            .with("untouched", json!(7));

        let (initial, _) = plan(defaults, defs).unwrap();

        assert_eq!(initial["hi"], json!("Hi there"));
        assert_eq!(initial["missing"], json!(true));
        assert_eq!(initial["untouched"], json!(7));
    }

    #[test]
    fn trees_mirror_definition_shape() {
        let defs = Definitions::new()
            .action("reset", |_, _| Outcome::Value(Snapshot::new()))
            .selector("size", |root, _| json!(root.len()))
            .slice(
                "users",
                Slice::new(|_| json!([]))
                    .action("add_user", noop)
                    .selector("count", |users, _| json!(users.as_array().map_or(0, Vec::len))),
            )
            .slice("empty", Slice::from_defaults());

        let (_, blueprint) = plan(Snapshot::new(), defs).unwrap();
        let (actions, selectors) = blueprint.bind(&Weak::new());

        assert!(actions.get("reset").is_some());
        assert!(actions.lookup("users.add_user").is_some());
        assert!(actions.lookup("users.count").is_none());
        assert!(selectors.lookup("users.count").is_some());
        assert!(selectors.get("size").is_some());
        assert_eq!(actions.slice_names().collect::<Vec<_>>(), ["empty", "users"]);
        assert_eq!(selectors.slice_names().collect::<Vec<_>>(), ["empty", "users"]);
        assert_eq!(actions.len(), 2);
        assert_eq!(actions.lookup("users.add_user").unwrap().path(), "users.add_user");
    }

    #[test]
    fn handles_outliving_the_store_fail() {
        let defs = Definitions::new().slice("n", Slice::new(|_| json!(0)).action("set", noop));
        let (_, blueprint) = plan(Snapshot::new(), defs).unwrap();
        let (actions, _) = blueprint.bind(&Weak::new());

        let action = actions.lookup("n.set").unwrap();
        assert!(matches!(action.call(vec![]), Err(StoreError::StoreDropped)));
    }
}
