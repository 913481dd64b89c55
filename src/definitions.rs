//! Declarative description of a store's shape.
//!
//! Every entry is tagged when it is declared: an action, a selector, or a
//! slice with its initializer. Nothing is inferred from key spelling.
//!
//! ```text
//! Definitions
//! ├── action   "reset"        (&Snapshot, &[Value]) -> Outcome<Snapshot>
//! ├── selector "slice_count"  (&Snapshot, &[Value]) -> Value
//! └── slice    "users"
//!     ├── initial_state       (Option<&Value>) -> Value
//!     ├── action   "add_user" (&Value, &[Value]) -> Outcome<Value>
//!     └── selector "count"    (&Value, &[Value]) -> Value
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::reconciler::Outcome;
use crate::store::Snapshot;

pub type RootActionFn = Arc<dyn Fn(&Snapshot, &[Value]) -> Outcome<Snapshot> + Send + Sync>;
pub type SliceActionFn = Arc<dyn Fn(&Value, &[Value]) -> Outcome<Value> + Send + Sync>;
pub type RootSelectorFn = Arc<dyn Fn(&Snapshot, &[Value]) -> Value + Send + Sync>;
pub type SliceSelectorFn = Arc<dyn Fn(&Value, &[Value]) -> Value + Send + Sync>;
pub type InitialStateFn = Box<dyn FnOnce(Option<&Value>) -> Value + Send>;

/// Which part of the state tree an action or selector is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceId<'a> {
    Root,
    Named(&'a str),
}

impl SliceId<'_> {
    pub fn is_root(&self) -> bool {
        matches!(self, SliceId::Root)
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            SliceId::Root => None,
            SliceId::Named(name) => Some(*name),
        }
    }

    /// Dotted path of an entry living in this slice.
    pub fn path(&self, leaf: &str) -> String {
        match self {
            SliceId::Root => leaf.to_string(),
            SliceId::Named(name) => format!("{name}.{leaf}"),
        }
    }
}

impl fmt::Display for SliceId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SliceId::Root => f.write_str("<root>"),
            SliceId::Named(name) => f.write_str(name),
        }
    }
}

/// A user transform, tagged with the part of the tree it rewrites.
#[derive(Clone)]
pub enum Transform {
    Root(RootActionFn),
    Slice { name: String, action: SliceActionFn },
}

impl Transform {
    pub fn slice(&self) -> SliceId<'_> {
        match self {
            Transform::Root(_) => SliceId::Root,
            Transform::Slice { name, .. } => SliceId::Named(name),
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transform({})", self.slice())
    }
}

/// A user selector, tagged the same way as [`Transform`].
#[derive(Clone)]
pub(crate) enum Selector {
    Root(RootSelectorFn),
    Slice { name: String, select: SliceSelectorFn },
}

impl Selector {
    pub(crate) fn slice(&self) -> SliceId<'_> {
        match self {
            Selector::Root(_) => SliceId::Root,
            Selector::Slice { name, .. } => SliceId::Named(name),
        }
    }
}

pub(crate) enum Entry {
    Action(RootActionFn),
    Selector(RootSelectorFn),
    Slice(Slice),
}

pub(crate) enum SliceEntry {
    Action(SliceActionFn),
    Selector(SliceSelectorFn),
}

/// Root level of the definitions tree.
///
/// Entries keep their declaration order so duplicates can be reported
/// instead of silently overwritten.
#[derive(Default)]
pub struct Definitions {
    pub(crate) entries: Vec<(String, Entry)>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an action that rewrites the whole root snapshot.
    pub fn action<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&Snapshot, &[Value]) -> Outcome<Snapshot> + Send + Sync + 'static,
    {
        self.entries
            .push((name.into(), Entry::Action(Arc::new(action))));
        self
    }

    /// Declare a read-only selector over the root snapshot.
    pub fn selector<F>(mut self, name: impl Into<String>, selector: F) -> Self
    where
        F: Fn(&Snapshot, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.entries
            .push((name.into(), Entry::Selector(Arc::new(selector))));
        self
    }

    /// Declare a named slice of the root snapshot.
    pub fn slice(mut self, name: impl Into<String>, slice: Slice) -> Self {
        self.entries.push((name.into(), Entry::Slice(slice)));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Definition of one named slice.
///
/// A slice always has exactly one initializer, which receives the matching
/// fragment of the default state (`None` when the defaults lack it) and
/// returns the slice's live initial value.
pub struct Slice {
    pub(crate) initial_state: InitialStateFn,
    pub(crate) entries: Vec<(String, SliceEntry)>,
}

impl Slice {
    pub fn new<F>(initial_state: F) -> Self
    where
        F: FnOnce(Option<&Value>) -> Value + Send + 'static,
    {
        Self {
            initial_state: Box::new(initial_state),
            entries: Vec::new(),
        }
    }

    /// Slice whose initial value is taken from the defaults as-is.
    pub fn from_defaults() -> Self {
        Self::new(|prior| prior.cloned().unwrap_or(Value::Null))
    }

    pub fn action<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Outcome<Value> + Send + Sync + 'static,
    {
        self.entries
            .push((name.into(), SliceEntry::Action(Arc::new(action))));
        self
    }

    pub fn selector<F>(mut self, name: impl Into<String>, selector: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.entries
            .push((name.into(), SliceEntry::Selector(Arc::new(selector))));
        self
    }
}
