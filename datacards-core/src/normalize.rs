//! Relationship normalization
//!
//! Source documents list enhancements, detachment rules and stratagems flat,
//! each carrying the name of its detachment. This pass moves every item
//! under its detachment instead:
//!
//! ```text
//! {"detachments": ["Gladius Task Force"],
//!  "enhancements": [{"name": "Artificer Armour", "detachment": "Gladius Task Force"}]}
//!   →
//! {"detachments": [{"name": "Gladius Task Force",
//!                   "enhancements": [{"name": "Artificer Armour"}]}]}
//! ```
//!
//! It also hoists each datasheet's invulnerable save into its stat lines.
//! Every pass is a no-op when its source field is absent.

use serde_json::{Map, Value};
use strum_macros::{AsRefStr, Display};

use crate::names::{element_name, NameIndex};
use crate::path::Path;

/// Item kinds regrouped under detachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Relation {
    Enhancements,
    DetachmentRules,
    Stratagems,
}

impl Relation {
    /// Child list the items land in on their detachment.
    pub fn child_field(self) -> &'static str {
        match self {
            Relation::Enhancements => "enhancements",
            Relation::DetachmentRules => "rules",
            Relation::Stratagems => "stratagems",
        }
    }
}

/// An item left out of the regrouping because its detachment is unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedItem {
    pub relation: Relation,
    /// Item name, or `#<index>` in the source list when it has none
    pub identifier: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub enhancements_moved: usize,
    pub rules_moved: usize,
    pub stratagems_moved: usize,
    /// Detachments created because no entry carried their name
    pub detachments_created: usize,
    /// Bare-name detachment entries turned into objects
    pub detachments_upgraded: usize,
    pub dropped: Vec<DroppedItem>,
    /// Datasheets whose invulnerable save moved into their stat lines
    pub invul_hoisted: usize,
}

impl NormalizeReport {
    pub fn moved(&self) -> usize {
        self.enhancements_moved + self.rules_moved + self.stratagems_moved
    }

    fn count_move(&mut self, relation: Relation) {
        match relation {
            Relation::Enhancements => self.enhancements_moved += 1,
            Relation::DetachmentRules => self.rules_moved += 1,
            Relation::Stratagems => self.stratagems_moved += 1,
        }
    }
}

/// Run all passes in order. `names` learns the new position of every item
/// that moves so keys keep addressing it by name.
pub fn normalize(doc: &mut Value, names: &mut NameIndex) -> NormalizeReport {
    let mut report = NormalizeReport::default();
    let Some(root) = doc.as_object_mut() else {
        return report;
    };

    if let Some(items) = take_array(root, "enhancements") {
        attach_to_detachments(root, Relation::Enhancements, items, names, &mut report);
    }

    let rule_items = root
        .get_mut("rules")
        .and_then(Value::as_object_mut)
        .and_then(|rules| take_array(rules, "detachment"));
    if let Some(items) = rule_items {
        attach_to_detachments(root, Relation::DetachmentRules, items, names, &mut report);
    }

    if let Some(items) = take_array(root, "stratagems") {
        attach_to_detachments(root, Relation::Stratagems, items, names, &mut report);
    }

    report.invul_hoisted = hoist_invulnerable_saves(root);

    if !report.dropped.is_empty() {
        let identifiers: Vec<String> = report
            .dropped
            .iter()
            .map(|d| format!("{}:{}", d.relation, d.identifier))
            .collect();
        tracing::warn!(
            count = report.dropped.len(),
            items = %identifiers.join(", "),
            "items without a detachment were left out"
        );
    }

    report
}

/// Remove `field` from `map` if it holds an array.
fn take_array(map: &mut Map<String, Value>, field: &str) -> Option<Vec<Value>> {
    if !map.get(field).is_some_and(Value::is_array) {
        return None;
    }
    match map.shift_remove(field) {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    }
}

fn identifier(item: &Value, idx: usize) -> String {
    element_name(item)
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{}", idx))
}

fn attach_to_detachments(
    root: &mut Map<String, Value>,
    relation: Relation,
    items: Vec<Value>,
    names: &mut NameIndex,
    report: &mut NormalizeReport,
) {
    let detachments_path = Path::root().child_field("detachments");

    for (idx, item) in items.into_iter().enumerate() {
        let mut obj = match item {
            Value::Object(obj) => obj,
            other => {
                report.dropped.push(DroppedItem {
                    relation,
                    identifier: identifier(&other, idx),
                });
                continue;
            }
        };

        let detachment = obj
            .shift_remove("detachment")
            .and_then(|v| v.as_str().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty());
        let Some(detachment) = detachment else {
            report.dropped.push(DroppedItem {
                relation,
                identifier: identifier(&Value::Object(obj), idx),
            });
            continue;
        };

        let Some(detachments) = detachment_list(root) else {
            tracing::warn!(relation = %relation, "`detachments` is not a list, cannot regroup");
            report.dropped.push(DroppedItem {
                relation,
                identifier: identifier(&Value::Object(obj), idx),
            });
            continue;
        };

        let (pos, outcome) = locate_or_create(detachments, &detachment);
        match outcome {
            Located::Created => report.detachments_created += 1,
            Located::Upgraded => report.detachments_upgraded += 1,
            Located::Existing => {}
        }
        names.register(&detachments_path, pos, &detachment);

        let item_name = obj
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let Some(container) = detachments[pos].as_object_mut() else {
            continue;
        };
        let child = relation.child_field();
        let list = container
            .entry(child)
            .or_insert_with(|| Value::Array(Vec::new()));
        if !list.is_array() {
            // a scalar here would be lost otherwise; wrap it
            let previous = std::mem::take(list);
            *list = Value::Array(vec![previous]);
        }
        if let Value::Array(list) = list {
            list.push(Value::Object(obj));
            if let Some(item_name) = item_name {
                let child_path = detachments_path.child_index(pos).child_field(child);
                names.register(&child_path, list.len() - 1, &item_name);
            }
        }

        tracing::debug!(relation = %relation, detachment = %detachment, "regrouped item");
        report.count_move(relation);
    }
}

/// The top-level `detachments` list, created when missing.
fn detachment_list(root: &mut Map<String, Value>) -> Option<&mut Vec<Value>> {
    root.entry("detachments")
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Located {
    Existing,
    /// A bare name entry was turned into an object
    Upgraded,
    Created,
}

/// Find the detachment called `name`, upgrading a bare-name entry to an
/// object, or append a new one.
fn locate_or_create(detachments: &mut Vec<Value>, name: &str) -> (usize, Located) {
    let found = detachments.iter().position(|entry| match entry {
        Value::String(s) => s.trim() == name,
        Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::trim) == Some(name),
        _ => false,
    });

    match found {
        Some(pos) if detachments[pos].is_string() => {
            let mut obj = Map::new();
            obj.insert("name".to_string(), Value::String(name.to_string()));
            detachments[pos] = Value::Object(obj);
            (pos, Located::Upgraded)
        }
        Some(pos) => (pos, Located::Existing),
        None => {
            let mut obj = Map::new();
            obj.insert("name".to_string(), Value::String(name.to_string()));
            detachments.push(Value::Object(obj));
            (detachments.len() - 1, Located::Created)
        }
    }
}

/// Copy `abilities.invul.value` into every stat line of each datasheet and
/// drop `abilities.invul`. Returns the number of datasheets changed.
fn hoist_invulnerable_saves(root: &mut Map<String, Value>) -> usize {
    let Some(datasheets) = root.get_mut("datasheets").and_then(Value::as_array_mut) else {
        return 0;
    };

    let mut hoisted = 0;
    for sheet in datasheets.iter_mut().filter_map(Value::as_object_mut) {
        let save = sheet
            .get("abilities")
            .and_then(|a| a.get("invul"))
            .and_then(|i| i.get("value"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let Some(save) = save else {
            continue;
        };

        let Some(stats) = sheet.get_mut("stats").and_then(Value::as_array_mut) else {
            continue;
        };
        if stats.is_empty() {
            continue;
        }
        for line in stats.iter_mut().filter_map(Value::as_object_mut) {
            line.insert("invul".to_string(), Value::String(save.clone()));
        }

        if let Some(abilities) = sheet.get_mut("abilities").and_then(Value::as_object_mut) {
            abilities.shift_remove("invul");
        }
        hoisted += 1;
    }
    hoisted
}
