//! @name Block
//! @description Parsed annotation values for one comment block

use std::collections::BTreeMap;
use std::ops::Index;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Annotation name → value, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block(BTreeMap<String, Value>);

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Replaces whatever is stored under `name`
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    /// Stores `value` under `name`, combining with an earlier value.
    ///
    /// An existing array is extended (or pushed onto when `value` isn't an
    /// array). An existing non-array value becomes the first element of a new
    /// array.
    pub fn merge(&mut self, name: &str, value: Value) {
        let Some(existing) = self.0.get_mut(name) else {
            self.0.insert(name.to_string(), value);
            return;
        };

        if !existing.is_array() {
            let first = existing.take();
            *existing = Value::Array(vec![first]);
        }
        if let Value::Array(items) = existing {
            match value {
                Value::Array(more) => items.extend(more),
                other => items.push(other),
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

/// Missing names index to `Null`, like `serde_json::Value` does
impl Index<&str> for Block {
    type Output = Value;

    fn index(&self, name: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.0.get(name).unwrap_or(&NULL)
    }
}

impl From<BTreeMap<String, Value>> for Block {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}
