//! Per-document processing
//!
//! ```text
//! input.json ─┬─ archive/input.json        (untouched copy, written once)
//!             ├─ <out>/<base>.translated.json
//!             ├─ <out>/<source>/<base>.flat.json
//!             └─ <out>/<target>/<base>.flat.json
//! ```
//!
//! Each input is processed at most once: after its artifacts are written the
//! input is removed (or, with `remove_processed = false`, a `.done` marker is
//! written beside its archived copy). A later run finding the archive but no
//! input, or finding the marker, reports the document as already processed.
//! An input whose bytes differ from the archived copy of the same name is
//! refused and kept.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::names::NameIndex;
use crate::normalize::{normalize, NormalizeReport};
use crate::walker::rewrite_document;

/// Base name used for the core ruleset's artifacts, whatever its `id`.
pub const CORE_BASE_NAME: &str = "core";

pub const TRANSLATED_SUFFIX: &str = ".translated.json";
pub const FLAT_SUFFIX: &str = ".flat.json";
const DONE_SUFFIX: &str = ".done";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to archive {path}: {source}")]
    Archive { path: PathBuf, source: io::Error },
    #[error("failed to remove processed input {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },
    #[error("invalid JSON in {path}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
    #[error("{path}: top level must be an object or an array")]
    NotADocument { path: PathBuf },
    #[error("{path} is a pipeline output, not an input")]
    OutputAsInput { path: PathBuf },
    #[error("{path} does not exist and was never archived")]
    Missing { path: PathBuf },
    #[error("{path} differs from its archived copy {archive}; refusing to process it")]
    ArchiveConflict { path: PathBuf, archive: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Faction,
    /// Shared core ruleset: no detachments, no normalization
    Core,
}

impl DocumentKind {
    pub fn of(input: &Path, config: &Config) -> Self {
        let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        if stem.eq_ignore_ascii_case(&config.core_name) {
            DocumentKind::Core
        } else {
            DocumentKind::Faction
        }
    }
}

/// Artifact base name: `core` for the core document, else the document's
/// `id`, else the input's file stem.
pub fn base_name(doc: &Value, input: &Path, kind: DocumentKind) -> String {
    if kind == DocumentKind::Core {
        return CORE_BASE_NAME.to_string();
    }
    let id = doc
        .get("id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty());
    match id {
        Some(id) => id.replace(['/', '\\'], "_"),
        None => input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

/// Where one document's artifacts go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    pub translated: PathBuf,
    pub source_table: PathBuf,
    pub target_table: PathBuf,
}

impl ArtifactLayout {
    pub fn for_base(config: &Config, base: &str) -> Self {
        let flat = format!("{}{}", base, FLAT_SUFFIX);
        Self {
            translated: config.output_dir.join(format!("{}{}", base, TRANSLATED_SUFFIX)),
            source_table: config.source_locale_dir().join(&flat),
            target_table: config.target_locale_dir().join(&flat),
        }
    }
}

/// True for files this pipeline writes.
pub fn is_artifact(path: &Path) -> bool {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    name.ends_with(TRANSLATED_SUFFIX) || name.ends_with(FLAT_SUFFIX)
}

fn archive_path(config: &Config, input: &Path) -> PathBuf {
    let name = input.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    config.archive_dir.join(name)
}

fn done_marker(archive: &Path) -> PathBuf {
    let mut name = archive.as_os_str().to_os_string();
    name.push(DONE_SUFFIX);
    PathBuf::from(name)
}

#[derive(Debug, Clone)]
pub struct DocumentSummary {
    pub input: PathBuf,
    pub kind: DocumentKind,
    pub base_name: String,
    pub layout: ArtifactLayout,
    pub translations: usize,
    pub normalize: NormalizeReport,
}

impl fmt::Display for DocumentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}, {}, {} ({} strings)",
            self.input.display(),
            self.layout.translated.display(),
            self.layout.source_table.display(),
            self.layout.target_table.display(),
            self.translations
        )
    }
}

#[derive(Debug, Clone)]
pub enum DocumentOutcome {
    Processed(DocumentSummary),
    AlreadyProcessed { input: PathBuf, archive: PathBuf },
}

/// Read a JSON document from disk.
pub fn read_json(path: &Path) -> Result<Value, PipelineError> {
    let bytes = fs::read(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `value` as 2-space indented UTF-8 JSON, creating parent directories.
pub fn write_json(path: &Path, value: &Value) -> Result<(), PipelineError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PipelineError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, text).map_err(|source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Copy the original bytes into the archive unless a copy already exists.
/// An existing copy must hold the same bytes: anything else is a different
/// document under a consumed name, and it is left alone.
fn archive_original(input: &Path, archive: &Path, bytes: &[u8]) -> Result<bool, PipelineError> {
    if archive.exists() {
        let archived = fs::read(archive).map_err(|source| PipelineError::Archive {
            path: archive.to_path_buf(),
            source,
        })?;
        if archived != bytes {
            return Err(PipelineError::ArchiveConflict {
                path: input.to_path_buf(),
                archive: archive.to_path_buf(),
            });
        }
        return Ok(false);
    }
    if let Some(parent) = archive.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PipelineError::Archive {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(archive, bytes).map_err(|source| PipelineError::Archive {
        path: archive.to_path_buf(),
        source,
    })?;
    Ok(true)
}

/// Process one input document end to end.
pub fn process_document(input: &Path, config: &Config) -> Result<DocumentOutcome, PipelineError> {
    if is_artifact(input) {
        return Err(PipelineError::OutputAsInput {
            path: input.to_path_buf(),
        });
    }

    let archive = archive_path(config, input);
    let marker = done_marker(&archive);
    if !input.exists() {
        if archive.exists() {
            return Ok(DocumentOutcome::AlreadyProcessed {
                input: input.to_path_buf(),
                archive,
            });
        }
        return Err(PipelineError::Missing {
            path: input.to_path_buf(),
        });
    }
    if marker.exists() {
        return Ok(DocumentOutcome::AlreadyProcessed {
            input: input.to_path_buf(),
            archive,
        });
    }

    let bytes = fs::read(input).map_err(|source| PipelineError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let mut doc: Value = serde_json::from_slice(&bytes).map_err(|source| PipelineError::Json {
        path: input.to_path_buf(),
        source,
    })?;
    if !doc.is_object() && !doc.is_array() {
        return Err(PipelineError::NotADocument {
            path: input.to_path_buf(),
        });
    }

    if archive_original(input, &archive, &bytes)? {
        tracing::debug!(archive = %archive.display(), "archived original");
    } else {
        tracing::debug!(archive = %archive.display(), "original already archived");
    }

    let kind = DocumentKind::of(input, config);
    let base = base_name(&doc, input, kind);

    let mut names = NameIndex::build(&doc);
    let report = match kind {
        DocumentKind::Faction => normalize(&mut doc, &mut names),
        DocumentKind::Core => NormalizeReport::default(),
    };

    let rewrite = rewrite_document(doc, &names);
    let layout = ArtifactLayout::for_base(config, &base);
    let table = rewrite.table.to_value();
    write_json(&layout.translated, &rewrite.document)?;
    write_json(&layout.source_table, &table)?;
    write_json(&layout.target_table, &table)?;

    if config.remove_processed {
        fs::remove_file(input).map_err(|source| PipelineError::Remove {
            path: input.to_path_buf(),
            source,
        })?;
    } else {
        fs::write(&marker, b"").map_err(|source| PipelineError::Write {
            path: marker.clone(),
            source,
        })?;
    }

    Ok(DocumentOutcome::Processed(DocumentSummary {
        input: input.to_path_buf(),
        kind,
        base_name: base,
        layout,
        translations: rewrite.table.len(),
        normalize: report,
    }))
}

fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?') || pattern.contains('[')
}

/// Expand command-line inputs: directories to their `*.json` files (sorted),
/// glob patterns to their matches, anything else as-is. Pipeline artifacts
/// are skipped.
pub fn collect_inputs(inputs: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for input in inputs {
        let path = Path::new(input);
        if path.is_dir() {
            match fs::read_dir(path) {
                Ok(entries) => {
                    let mut found: Vec<PathBuf> = entries
                        .flatten()
                        .map(|entry| entry.path())
                        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
                        .collect();
                    found.sort();
                    files.extend(found);
                }
                Err(e) => tracing::warn!(dir = %path.display(), "cannot list directory: {}", e),
            }
        } else if has_glob_chars(input) {
            match glob::glob(input) {
                Ok(paths) => files.extend(paths.flatten().filter(|p| p.is_file())),
                Err(e) => tracing::warn!(pattern = %input, "invalid glob pattern: {}", e),
            }
        } else {
            files.push(path.to_path_buf());
        }
    }

    files.retain(|f| {
        let keep = !is_artifact(f);
        if !keep {
            tracing::debug!(file = %f.display(), "skipping pipeline output");
        }
        keep
    });
    files
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<DocumentSummary>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, PipelineError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Process every file in turn. A failing document is logged and recorded;
/// the remaining documents are still processed.
pub fn process_batch(files: &[PathBuf], config: &Config) -> BatchReport {
    let mut report = BatchReport::default();

    for file in files {
        match process_document(file, config) {
            Ok(DocumentOutcome::Processed(summary)) => {
                tracing::info!("{}", summary);
                report.processed.push(summary);
            }
            Ok(DocumentOutcome::AlreadyProcessed { input, archive }) => {
                tracing::info!(
                    archive = %archive.display(),
                    "{}: already processed, skipping",
                    input.display()
                );
                report.skipped.push(input);
            }
            Err(e) => {
                tracing::error!(file = %file.display(), "{}", e);
                report.failed.push((file.clone(), e));
            }
        }
    }

    report
}
