//! Owned configuration trees
//!
//! A [`ConfigTree`] is the in-memory document a datastore caches. It is a
//! named top-level node over a JSON value. Trees are never shared: copying a
//! tree between datastores always produces an independent document.

use serde_json::{Map, Value};

use crate::error::Result;

/// Default name of the top-level node
pub const TOP_NAME: &str = "config";

/// In-memory configuration document
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTree {
    /// Top-level node name
    name: String,
    /// Children of the top-level node
    data: Value,
}

impl ConfigTree {
    /// Create an empty tree with the given top-level name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Value::Object(Map::new()),
        }
    }

    /// Create a tree with initial data
    pub fn with_data(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Parse a serialized document: `{"<top>": {...}}`
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Ok(match value {
            Value::Object(map) if map.len() == 1 => {
                let (name, data) = map.into_iter().next().unwrap_or_default();
                Self { name, data }
            }
            data => Self::with_data(TOP_NAME, data),
        })
    }

    /// Serialize as `{"<top>": {...}}`
    pub fn to_json(&self) -> Result<String> {
        let mut top = Map::new();
        top.insert(self.name.clone(), self.data.clone());
        Ok(serde_json::to_string_pretty(&Value::Object(top))?)
    }

    /// Top-level node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The whole data tree
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// True if the top-level node has no children
    pub fn is_empty(&self) -> bool {
        match &self.data {
            Value::Object(map) => map.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }

    /// Fresh tree with the same top-level name and a copy of every child
    pub fn deep_copy(&self) -> Self {
        let mut copy = Self::new(self.name.clone());
        copy.data = self.data.clone();
        copy
    }

    /// Get a value by path (e.g., "/interfaces/interface")
    pub fn get_by_path(&self, path: &str) -> Option<&Value> {
        let mut current = &self.data;
        for part in path.split('/').filter(|s| !s.is_empty()) {
            current = match current.get(part) {
                Some(v) => v,
                None => {
                    // Try without module prefix for nested nodes
                    let local = part.split(':').next_back().unwrap_or(part);
                    current.get(local)?
                }
            };
        }
        Some(current)
    }

    /// Set a value by path, creating intermediate containers
    pub fn set_by_path(&mut self, path: &str, value: Value) {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((leaf, parents)) = parts.split_last() else {
            self.data = value;
            return;
        };

        let mut current = &mut self.data;
        for part in parents {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            if let Value::Object(map) = current {
                current = map
                    .entry(part.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
            }
        }
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        if let Value::Object(map) = current {
            map.insert(leaf.to_string(), value);
        }
    }

    /// Delete a value by path. Returns true if something was removed.
    pub fn delete_by_path(&mut self, path: &str) -> bool {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((leaf, parents)) = parts.split_last() else {
            let had_data = !self.is_empty();
            self.data = Value::Object(Map::new());
            return had_data;
        };

        let mut current = &mut self.data;
        for part in parents {
            match current.get_mut(*part) {
                Some(v) => current = v,
                None => return false,
            }
        }
        match current {
            Value::Object(map) => map.remove(*leaf).is_some(),
            _ => false,
        }
    }
}
