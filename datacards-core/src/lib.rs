//! datacards-core: translation-key extraction for game datacard documents
//!
//! This library provides:
//! - Structural path classification and per-zone field policies
//! - Name-aware key synthesis with value interning
//! - Relationship normalization (enhancements, rules, stratagems under detachments)
//! - The per-document pipeline writing translated documents and flat tables
//! - Localization and weapon key renaming over pipeline artifacts

pub mod path;
pub mod names;
pub mod key;
pub mod zone;
pub mod policy;
pub mod table;
pub mod interner;
pub mod walker;
pub mod normalize;
pub mod config;
pub mod pipeline;
pub mod localize;
pub mod rekey;

pub use config::{Config, ConfigError, DEFAULT_CONFIG_FILE};
pub use names::NameIndex;
pub use normalize::{normalize, NormalizeReport};
pub use path::{Path, Segment};
pub use pipeline::{
    collect_inputs, process_batch, process_document, ArtifactLayout, BatchReport, DocumentKind,
    DocumentOutcome, DocumentSummary, PipelineError,
};
pub use localize::{localize, localize_file, LocalizeError, LocalizeReport};
pub use rekey::{discover_bases, rekey_base, RekeyError, RekeySummary};
pub use table::TranslationTable;
pub use walker::{rewrite_document, Rewrite};
pub use zone::Zone;
