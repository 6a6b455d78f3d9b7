//! Translation key synthesis
//!
//! Keys are dotted, identifier-safe renderings of a node's path:
//!
//! ```text
//! datasheets.3.abilities.other.0.name   (raw path)
//! datasheets.Intercessor_Squad.abilities.other.0.name   (key)
//! ```
//!
//! Elements of named collections are addressed by their sanitized name when
//! the [`NameIndex`] knows it. Root-level fields get a `root.` prefix.
//! Building a key never fails.

use crate::names::{is_named_collection, NameIndex};
use crate::path::{Path, Segment};

/// Prefix for keys of fields that live directly on the document root.
pub const ROOT_PREFIX: &str = "root";

/// Make a path segment identifier-safe.
///
/// Spaces, hyphens, slashes and en/em dashes become `_`; every other
/// character outside `[A-Za-z0-9_]` (apostrophes, quotes, periods, commas,
/// parentheses, question marks, colons, non-ASCII letters) is dropped.
pub fn sanitize_segment(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| match c {
            ' ' | '-' | '/' | '\u{2013}' | '\u{2014}' => Some('_'),
            c if c.is_ascii_alphanumeric() || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

/// Render one segment of `path` at position `pos`, substituting the element
/// name for indices into named collections.
fn render_segment(path: &Path, pos: usize, names: &NameIndex) -> String {
    match &path.segments()[pos] {
        Segment::Field(name) => sanitize_segment(name),
        Segment::Index(idx) => {
            let container = path.prefix(pos);
            if is_named_collection(&container) {
                if let Some(name) = names.resolve(&container, *idx) {
                    let sanitized = sanitize_segment(name);
                    if !sanitized.is_empty() {
                        return sanitized;
                    }
                }
            }
            idx.to_string()
        }
    }
}

fn render_terminal(terminal: &[Segment]) -> Vec<String> {
    terminal
        .iter()
        .map(|segment| match segment {
            Segment::Field(name) => sanitize_segment(name),
            Segment::Index(idx) => idx.to_string(),
        })
        .collect()
}

/// Build the key for a value reached from the node at `node_path` through
/// `terminal` (a field name, or a field name followed by a list index).
pub fn synthesize_key(node_path: &Path, terminal: &[Segment], names: &NameIndex) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(node_path.len() + terminal.len() + 1);
    if node_path.is_root() {
        parts.push(ROOT_PREFIX.to_string());
    }
    for pos in 0..node_path.len() {
        parts.push(render_segment(node_path, pos, names));
    }
    parts.extend(render_terminal(terminal));
    parts.join(".")
}

/// Build the depth-independent key used inside stratagems:
/// `stratagems.<stratagem name>.<field>`.
///
/// The stratagem is the innermost `stratagems.<i>` element on `node_path`.
/// Its name comes from the [`NameIndex`], then from `own_name` (the `name`
/// field of the node being walked), then falls back to the index.
pub fn stratagem_key(
    node_path: &Path,
    terminal: &[Segment],
    names: &NameIndex,
    own_name: Option<&str>,
) -> String {
    let label = match node_path.last_indexed("stratagems") {
        Some((pos, idx)) => {
            let container = node_path.prefix(pos + 1);
            names
                .resolve(&container, idx)
                .or(own_name)
                .map(sanitize_segment)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| idx.to_string())
        }
        None => own_name.map(sanitize_segment).unwrap_or_default(),
    };
    let mut parts = vec!["stratagems".to_string(), label];
    parts.extend(render_terminal(terminal));
    parts.join(".")
}
