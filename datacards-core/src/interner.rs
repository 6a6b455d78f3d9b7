//! Value interning
//!
//! Repeated text is translated once: the first occurrence mints a key, every
//! later occurrence of the same text reuses it. The memo lives for a single
//! document traversal.

use std::collections::HashMap;

use crate::table::TranslationTable;

#[derive(Debug, Default)]
pub struct Interner {
    table: TranslationTable,
    value_to_key: HashMap<String, String>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for `text`, minting `candidate` on first sight.
    ///
    /// When `candidate` already names different text, a numeric suffix
    /// (`_2`, `_3`, ...) is appended until the key is free, so no text is
    /// ever lost to a key clash.
    pub fn intern(&mut self, text: &str, candidate: &str) -> String {
        if let Some(key) = self.value_to_key.get(text) {
            return key.clone();
        }
        let key = self.free_key(text, candidate);
        self.table.insert(&key, text);
        self.value_to_key.insert(text.to_string(), key.clone());
        key
    }

    /// Record `text` under itself (keywords and priority literals).
    pub fn intern_literal(&mut self, text: &str) -> String {
        self.table.insert(text, text);
        text.to_string()
    }

    fn free_key(&self, text: &str, candidate: &str) -> String {
        match self.table.get(candidate) {
            None => return candidate.to_string(),
            Some(existing) if existing == text => return candidate.to_string(),
            Some(_) => {}
        }
        let mut n = 2usize;
        loop {
            let key = format!("{}_{}", candidate, n);
            match self.table.get(&key) {
                None => return key,
                Some(existing) if existing == text => return key,
                Some(_) => n += 1,
            }
        }
    }

    pub fn table(&self) -> &TranslationTable {
        &self.table
    }

    pub fn into_table(self) -> TranslationTable {
        self.table
    }
}
