//! Weapon key renaming
//!
//! Weapon profiles repeat across units, so their synthesized keys
//! (`datasheets.Captain.rangedWeapons.0.profiles.0.name`) are swapped for the
//! snake_case form of the weapon's text (`bolt_pistol`). The translated
//! document and both flat tables are rewritten together.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::pipeline::{read_json, write_json, ArtifactLayout, PipelineError, TRANSLATED_SUFFIX};
use crate::table::TranslationTable;

static WEAPON_PROFILE_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^datasheets\.([A-Za-z0-9_]+)\.(meleeWeapons|rangedWeapons)\.(\d+)\.profiles\.(\d+)\.name(_\d+)?$")
        .expect("valid weapon key regex")
});

#[derive(Error, Debug)]
pub enum RekeyError {
    #[error(transparent)]
    Io(#[from] PipelineError),
    #[error("{path} is not a flat table (expected a JSON object of strings)")]
    NotATable { path: PathBuf },
    #[error("no artifacts for '{base}' (missing {path})")]
    NoArtifacts { base: String, path: PathBuf },
}

pub fn is_weapon_profile_key(key: &str) -> bool {
    WEAPON_PROFILE_KEY.is_match(key)
}

/// Lowercase; runs of characters outside `[a-z0-9]` become `_`; leading
/// and trailing `_` trimmed.
pub fn snake_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_sep = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Old key → new key for every weapon key in `source` whose text yields a
/// usable name. A new key that already names a non-weapon entry is not used.
pub fn plan_rekey(source: &TranslationTable) -> HashMap<String, String> {
    let reserved: HashSet<&str> = source
        .iter()
        .map(|(k, _)| k)
        .filter(|k| !is_weapon_profile_key(k))
        .collect();

    let mut plan = HashMap::new();
    for (key, text) in source.iter().filter(|(k, _)| is_weapon_profile_key(k)) {
        let new_key = snake_case(text);
        if new_key.is_empty() || reserved.contains(new_key.as_str()) {
            tracing::debug!(key, "keeping weapon key");
            continue;
        }
        plan.insert(key.to_string(), new_key);
    }
    plan
}

/// Rebuild `table` with planned keys renamed. Where two keys collapse onto
/// one, the first entry wins.
pub fn rekey_table(table: &TranslationTable, plan: &HashMap<String, String>) -> TranslationTable {
    let mut out = TranslationTable::new();
    for (key, text) in table.iter() {
        let key = plan.get(key).map(String::as_str).unwrap_or(key);
        out.insert(key, text);
    }
    out
}

/// Rename planned keys in the document's string leaves. Returns the number of
/// leaves changed.
pub fn rekey_document(doc: &mut Value, plan: &HashMap<String, String>) -> usize {
    match doc {
        Value::String(s) => match plan.get(s.as_str()) {
            Some(new_key) => {
                *s = new_key.clone();
                1
            }
            None => 0,
        },
        Value::Array(items) => items.iter_mut().map(|item| rekey_document(item, plan)).sum(),
        Value::Object(map) => map.iter_mut().map(|(_, v)| rekey_document(v, plan)).sum(),
        _ => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RekeySummary {
    pub base: String,
    pub renamed: usize,
    pub leaves: usize,
    /// Entries folded into an earlier one with the same snake_case key
    pub merged: usize,
}

impl fmt::Display for RekeySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} weapon keys renamed ({} merged), {} references updated",
            self.base, self.renamed, self.merged, self.leaves
        )
    }
}

fn load_table(path: &Path) -> Result<TranslationTable, RekeyError> {
    let value = read_json(path)?;
    TranslationTable::from_value(&value).ok_or_else(|| RekeyError::NotATable {
        path: path.to_path_buf(),
    })
}

/// Rename weapon keys in one base's artifacts, in place.
pub fn rekey_base(config: &Config, base: &str) -> Result<RekeySummary, RekeyError> {
    let layout = ArtifactLayout::for_base(config, base);
    for path in [&layout.translated, &layout.source_table, &layout.target_table] {
        if !path.is_file() {
            return Err(RekeyError::NoArtifacts {
                base: base.to_string(),
                path: path.clone(),
            });
        }
    }

    let mut doc = read_json(&layout.translated)?;
    let source = load_table(&layout.source_table)?;
    let target = load_table(&layout.target_table)?;

    let plan = plan_rekey(&source);
    let leaves = rekey_document(&mut doc, &plan);
    let new_source = rekey_table(&source, &plan);
    let new_target = rekey_table(&target, &plan);

    write_json(&layout.translated, &doc)?;
    write_json(&layout.source_table, &new_source.to_value())?;
    write_json(&layout.target_table, &new_target.to_value())?;

    Ok(RekeySummary {
        base: base.to_string(),
        renamed: plan.len(),
        leaves,
        merged: source.len() - new_source.len(),
    })
}

/// Bases with a translated document in the output directory, sorted.
pub fn discover_bases(config: &Config) -> Result<Vec<String>, RekeyError> {
    let entries = fs::read_dir(&config.output_dir).map_err(|source| PipelineError::Read {
        path: config.output_dir.clone(),
        source,
    })?;
    let mut bases: Vec<String> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            name.strip_suffix(TRANSLATED_SUFFIX).map(str::to_string)
        })
        .collect();
    bases.sort();
    Ok(bases)
}
