//! Flat translation table (key → text)

use serde_json::{Map, Value};

/// Ordered, single-level key → text mapping. Insertion order is kept so
/// tables read in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationTable {
    entries: Map<String, Value>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the key already exists. Returns true if inserted.
    pub fn insert(&mut self, key: &str, text: &str) -> bool {
        if self.entries.contains_key(key) {
            return false;
        }
        self.entries.insert(key.to_string(), Value::String(text.to_string()));
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|text| (k.as_str(), text)))
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.entries.clone())
    }

    /// Read a table back from JSON. Non-string entries are skipped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let entries = map
            .iter()
            .filter(|(_, v)| v.is_string())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Some(Self { entries })
    }
}
