//! Tree rewriter
//!
//! Walks a normalized document once, replacing translatable text with keys
//! and collecting the key → text table:
//!
//! ```text
//! {"name": "Captain", "stats": [{"m": "6\"", "name": "Captain"}]}
//!   →  {"name": "datasheets.Captain.name", "stats": [{"m": "6\"", "name": "datasheets.Captain.name"}]}
//!      + {"datasheets.Captain.name": "Captain"}
//! ```
//!
//! The tree is rewritten in place. Subtrees without translatable text are
//! left exactly as they were; only `link` fields are removed.

use serde_json::{Map, Value};

use crate::interner::Interner;
use crate::key::{stratagem_key, synthesize_key};
use crate::names::NameIndex;
use crate::path::{Path, Segment};
use crate::policy::{
    field_rule, is_priority_literal, is_translatable_text, zone_policy, FieldRule, Keying,
};
use crate::table::TranslationTable;
use crate::zone::classify;

/// Rewritten document and the text it no longer carries.
#[derive(Debug)]
pub struct Rewrite {
    pub document: Value,
    pub table: TranslationTable,
}

/// Shape of an array value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListShape {
    Empty,
    /// Every element is a non-empty string
    Text,
    Mixed,
}

fn list_shape(items: &[Value]) -> ListShape {
    if items.is_empty() {
        ListShape::Empty
    } else if items
        .iter()
        .all(|item| item.as_str().is_some_and(|s| !s.trim().is_empty()))
    {
        ListShape::Text
    } else {
        ListShape::Mixed
    }
}

/// Where a field value sits: the owning object's path, the field name, and
/// how keys are built there.
struct Site<'s> {
    path: &'s Path,
    field: &'s str,
    keying: Keying,
    own_name: Option<&'s str>,
}

/// State threaded through one document traversal.
pub struct RewriteContext<'a> {
    names: &'a NameIndex,
    interner: Interner,
}

impl<'a> RewriteContext<'a> {
    pub fn new(names: &'a NameIndex) -> Self {
        Self {
            names,
            interner: Interner::new(),
        }
    }

    pub fn into_table(self) -> TranslationTable {
        self.interner.into_table()
    }

    /// Rewrite `node` (found at `path`) in place.
    pub fn rewrite_node(&mut self, node: &mut Value, path: &Path) {
        match node {
            Value::Object(map) => self.rewrite_object(map, path),
            Value::Array(items) => self.rewrite_array(items, path),
            _ => {}
        }
    }

    fn rewrite_object(&mut self, map: &mut Map<String, Value>, path: &Path) {
        let policy = zone_policy(classify(path));
        let own_name = map.get("name").and_then(Value::as_str).map(str::to_string);

        map.retain(|field, _| field_rule(field) != FieldRule::Drop);

        for (field, value) in map.iter_mut() {
            match field_rule(field) {
                FieldRule::Drop => continue,
                FieldRule::Verbatim if policy.generic_verbatim => {
                    drop_links(value);
                    continue;
                }
                FieldRule::SelfKeyed => {
                    drop_links(value);
                    self.key_by_self(value);
                    continue;
                }
                FieldRule::Verbatim | FieldRule::Zoned => {}
            }

            if let Value::String(text) = value {
                if is_priority_literal(text) {
                    self.interner.intern_literal(text);
                    continue;
                }
            }

            if !policy.allows(field) {
                drop_links(value);
                continue;
            }

            let site = Site {
                path,
                field,
                keying: policy.keying,
                own_name: own_name.as_deref(),
            };
            self.rewrite_field(value, &site);
        }
    }

    fn rewrite_field(&mut self, value: &mut Value, site: &Site<'_>) {
        match value {
            Value::String(text) => {
                if is_translatable_text(text) {
                    let terminal = [Segment::Field(site.field.to_string())];
                    *text = self.extract(text, site, &terminal);
                }
            }
            Value::Array(items) => match list_shape(items) {
                ListShape::Empty => {}
                ListShape::Text => {
                    for (idx, item) in items.iter_mut().enumerate() {
                        if let Value::String(text) = item {
                            self.rewrite_list_text(text, site, idx);
                        }
                    }
                }
                ListShape::Mixed => {
                    let list_path = site.path.child_field(site.field);
                    for (idx, item) in items.iter_mut().enumerate() {
                        match item {
                            Value::String(text) => self.rewrite_list_text(text, site, idx),
                            Value::Object(_) | Value::Array(_) => {
                                self.rewrite_node(item, &list_path.child_index(idx));
                            }
                            _ => {}
                        }
                    }
                }
            },
            Value::Object(_) => {
                self.rewrite_node(value, &site.path.child_field(site.field));
            }
            _ => {}
        }
    }

    fn rewrite_list_text(&mut self, text: &mut String, site: &Site<'_>, idx: usize) {
        if is_priority_literal(text) {
            self.interner.intern_literal(text);
        } else if is_translatable_text(text) {
            let terminal = [Segment::Field(site.field.to_string()), Segment::Index(idx)];
            *text = self.extract(text, site, &terminal);
        }
    }

    /// Arrays reached directly as nodes (the root, or arrays nested in arrays).
    fn rewrite_array(&mut self, items: &mut [Value], path: &Path) {
        for (idx, item) in items.iter_mut().enumerate() {
            match item {
                Value::String(text) => {
                    if is_priority_literal(text) {
                        self.interner.intern_literal(text);
                    } else if is_translatable_text(text) {
                        let candidate = synthesize_key(path, &[Segment::Index(idx)], self.names);
                        *text = self.interner.intern(text, &candidate);
                    }
                }
                Value::Object(_) | Value::Array(_) => {
                    self.rewrite_node(item, &path.child_index(idx));
                }
                _ => {}
            }
        }
    }

    fn extract(&mut self, text: &str, site: &Site<'_>, terminal: &[Segment]) -> String {
        let candidate = match site.keying {
            Keying::Path => synthesize_key(site.path, terminal, self.names),
            Keying::Stratagem => stratagem_key(site.path, terminal, self.names, site.own_name),
        };
        self.interner.intern(text, &candidate)
    }

    /// Keyword values are their own keys; the tree keeps the literal text.
    fn key_by_self(&mut self, value: &Value) {
        match value {
            Value::String(text) if !text.trim().is_empty() => {
                self.interner.intern_literal(text);
            }
            Value::Array(items) => {
                for text in items.iter().filter_map(Value::as_str) {
                    if !text.trim().is_empty() {
                        self.interner.intern_literal(text);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Remove `link` fields from a subtree that is otherwise kept as is.
fn drop_links(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|field, _| field_rule(field) != FieldRule::Drop);
            map.values_mut().for_each(drop_links);
        }
        Value::Array(items) => items.iter_mut().for_each(drop_links),
        _ => {}
    }
}

/// Rewrite a whole document, consuming it.
pub fn rewrite_document(mut document: Value, names: &NameIndex) -> Rewrite {
    let mut ctx = RewriteContext::new(names);
    ctx.rewrite_node(&mut document, &Path::root());
    Rewrite {
        document,
        table: ctx.into_table(),
    }
}
