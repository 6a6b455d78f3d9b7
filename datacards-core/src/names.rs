//! Index → name table for named collections
//!
//! Elements of `datasheets`, `stratagems`, `enhancements`, `detachments` and
//! `rules.army` are addressed by their `name` in synthesized keys, so keys
//! survive reordering. The table is built once right after a document is
//! loaded, before normalization moves things around; the normalizer then
//! registers the new position of every element it relocates.

use std::collections::HashMap;

use serde_json::Value;

use crate::path::{Path, Segment};

/// Collections whose elements are addressed by name.
pub const NAMED_COLLECTIONS: &[&str] = &["datasheets", "stratagems", "enhancements", "detachments"];

/// Returns true if `container` is the path of a collection whose elements
/// are addressed by name.
pub fn is_named_collection(container: &Path) -> bool {
    let segments = container.segments();
    match segments.last() {
        Some(Segment::Field(name)) if NAMED_COLLECTIONS.contains(&name.as_str()) => true,
        Some(Segment::Field(name)) if name == "army" => {
            segments.len() >= 2 && segments[segments.len() - 2].as_field() == Some("rules")
        }
        _ => false,
    }
}

/// Display name of a collection element: its `name` field, or the element
/// itself when it is a bare string (legacy detachment entries).
pub fn element_name(element: &Value) -> Option<&str> {
    match element {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("name").and_then(Value::as_str),
        _ => None,
    }
    .map(str::trim)
    .filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    names: HashMap<Path, HashMap<usize, String>>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the names of every named collection in `doc`, at any depth.
    pub fn build(doc: &Value) -> Self {
        let mut index = Self::new();
        index.scan(doc, &Path::root());
        index
    }

    fn scan(&mut self, node: &Value, path: &Path) {
        match node {
            Value::Object(map) => {
                for (field, value) in map {
                    let child = path.child_field(field);
                    if let Value::Array(items) = value {
                        if is_named_collection(&child) {
                            for (idx, item) in items.iter().enumerate() {
                                if let Some(name) = element_name(item) {
                                    self.register(&child, idx, name);
                                }
                            }
                        }
                    }
                    self.scan(value, &child);
                }
            }
            Value::Array(items) => {
                for (idx, item) in items.iter().enumerate() {
                    self.scan(item, &path.child_index(idx));
                }
            }
            _ => {}
        }
    }

    pub fn register(&mut self, container: &Path, idx: usize, name: &str) {
        self.names
            .entry(container.clone())
            .or_default()
            .insert(idx, name.to_string());
    }

    pub fn resolve(&self, container: &Path, idx: usize) -> Option<&str> {
        self.names
            .get(container)
            .and_then(|by_idx| by_idx.get(&idx))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
