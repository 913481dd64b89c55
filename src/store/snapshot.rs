//! Root state snapshot.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static NULL: Value = Value::Null;

/// Immutable-by-convention root state: slice name to slice value.
///
/// Slice values are reference counted, so cloning a snapshot is a shallow
/// copy. Replacing one slice with [`Snapshot::with_slice`] leaves every other
/// slice pointer-equal to the previous snapshot's.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    slices: BTreeMap<String, Arc<Value>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for default states.
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    /// Value of a slice, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.slices.get(name).map(Arc::as_ref)
    }

    /// Shared handle to a slice value, for pointer comparisons.
    pub fn get_shared(&self, name: &str) -> Option<&Arc<Value>> {
        self.slices.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Arc<Value>> {
        self.slices.insert(name.into(), Arc::new(value))
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<Value>> {
        self.slices.remove(name)
    }

    /// Shallow copy of this snapshot with one slice replaced.
    pub fn with_slice(&self, name: &str, value: Arc<Value>) -> Snapshot {
        let mut slices = self.slices.clone();
        slices.insert(name.to_string(), value);
        Snapshot { slices }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slices.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slices.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slices.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Deep copy into a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.slices
                .iter()
                .map(|(k, v)| (k.clone(), Value::clone(v)))
                .collect(),
        )
    }

    /// Build a snapshot from a JSON object. Returns `None` for any other
    /// kind of value.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::from(map)),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for Snapshot {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Snapshot {
            slices: iter
                .into_iter()
                .map(|(k, v)| (k.into(), Arc::new(v)))
                .collect(),
        }
    }
}

/// Missing slices index as `Value::Null`, like `serde_json::Value`.
impl<'a> Index<&'a str> for Snapshot {
    type Output = Value;

    fn index(&self, name: &'a str) -> &Value {
        self.get(name).unwrap_or(&NULL)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
