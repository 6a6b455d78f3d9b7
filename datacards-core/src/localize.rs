//! Localization: put the text of a flat table back into a translated document.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::table::TranslationTable;

#[derive(Error, Debug)]
pub enum LocalizeError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid JSON in {path}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
    #[error("{path} is not a flat table (expected a JSON object of strings)")]
    NotATable { path: PathBuf },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LocalizeReport {
    pub substituted: usize,
    /// Key-shaped strings with no entry in the table
    pub missing: BTreeSet<String>,
}

fn looks_like_key(text: &str) -> bool {
    text.contains('.') && !text.chars().any(char::is_whitespace)
}

/// Replace every string leaf that is a table key by the table's text.
pub fn localize(doc: &mut Value, table: &TranslationTable) -> LocalizeReport {
    let mut report = LocalizeReport::default();
    localize_node(doc, table, &mut report);
    report
}

fn localize_node(node: &mut Value, table: &TranslationTable, report: &mut LocalizeReport) {
    match node {
        Value::String(s) => match table.get(s) {
            Some(text) => {
                *s = text.to_string();
                report.substituted += 1;
            }
            None if looks_like_key(s) => {
                report.missing.insert(s.clone());
            }
            None => {}
        },
        Value::Array(items) => {
            for item in items {
                localize_node(item, table, report);
            }
        }
        Value::Object(map) => {
            for (_, value) in map.iter_mut() {
                localize_node(value, table, report);
            }
        }
        _ => {}
    }
}

fn read_value(path: &Path) -> Result<Value, LocalizeError> {
    let text = fs::read_to_string(path).map_err(|source| LocalizeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LocalizeError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a flat table from disk.
pub fn load_table(path: &Path) -> Result<TranslationTable, LocalizeError> {
    let value = read_value(path)?;
    TranslationTable::from_value(&value).ok_or_else(|| LocalizeError::NotATable {
        path: path.to_path_buf(),
    })
}

/// Localize the translated document at `translated` with the table at `table`.
pub fn localize_file(translated: &Path, table: &Path) -> Result<(Value, LocalizeReport), LocalizeError> {
    let mut doc = read_value(translated)?;
    let table = load_table(table)?;
    let report = localize(&mut doc, &table);
    tracing::debug!(
        substituted = report.substituted,
        missing = report.missing.len(),
        "localized {}",
        translated.display()
    );
    Ok((doc, report))
}
