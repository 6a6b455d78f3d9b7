//! Pipeline configuration
//!
//! Read from an optional TOML file; every field has a default so an empty
//! file (or none at all) is valid:
//!
//! ```toml
//! output_dir = "."
//! archive_dir = "archive"
//! source_locale = "en"
//! target_locale = "fr"
//! core_name = "core"
//! remove_processed = true
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "datacards.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory receiving `<base>.translated.json` and the locale directories
    pub output_dir: PathBuf,
    /// Directory receiving untouched copies of the inputs
    pub archive_dir: PathBuf,
    pub source_locale: String,
    pub target_locale: String,
    /// File stem of the shared core ruleset document
    pub core_name: String,
    /// Delete inputs once processed; when false a `.done` marker is written
    /// next to the archived copy instead
    pub remove_processed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            archive_dir: PathBuf::from("archive"),
            source_locale: "en".to_string(),
            target_locale: "fr".to_string(),
            core_name: "core".to_string(),
            remove_processed: true,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load `explicit` if given, else `datacards.toml` in `cwd` when it
    /// exists, else defaults.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = cwd.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "using config file");
            return Self::load(&candidate);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("source_locale", &self.source_locale),
            ("target_locale", &self.target_locale),
            ("core_name", &self.core_name),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", field)));
            }
        }
        if self.source_locale == self.target_locale {
            return Err(ConfigError::Invalid(format!(
                "source_locale and target_locale are both '{}'",
                self.source_locale
            )));
        }
        Ok(())
    }

    pub fn source_locale_dir(&self) -> PathBuf {
        self.output_dir.join(&self.source_locale)
    }

    pub fn target_locale_dir(&self) -> PathBuf {
        self.output_dir.join(&self.target_locale)
    }
}
