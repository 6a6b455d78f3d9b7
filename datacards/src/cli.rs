//! CLI argument parsing using clap

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Turn datacard JSON into key-referenced documents plus flat translation tables
#[derive(Parser, Debug)]
#[command(name = "datacards")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Extract every faction file in a directory
    datacards extract data/

    # Extract into a separate output tree, keeping the inputs
    datacards extract "data/*.json" --out-dir out --keep-source

    # Put translated text back into a document
    datacards localize out/SM.translated.json out/fr/SM.flat.json -o SM.fr.json

    # Rename weapon profile keys after extraction
    datacards rekey-weapons SM CSM

CONFIGURATION:
    Settings are read from datacards.toml in the working directory (or --config).
    Command-line flags override the file.
"#)]
pub struct Args {
    /// Config file (default: ./datacards.toml when present)
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Show debug output
    #[arg(short = 'v', long = "verbose", global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show warnings and errors
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract translatable text from input documents
    Extract(ExtractArgs),

    /// Replace keys in a translated document by the text of a flat table
    Localize(LocalizeArgs),

    /// Rename weapon profile keys to snake_case weapon names
    RekeyWeapons(RekeyArgs),
}

#[derive(ClapArgs, Debug)]
pub struct ExtractArgs {
    /// Files, directories or glob patterns (e.g. "data/*.json")
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Directory for translated documents and locale tables
    #[arg(long = "out-dir")]
    pub out_dir: Option<PathBuf>,

    /// Directory for untouched copies of the inputs
    #[arg(long = "archive-dir")]
    pub archive_dir: Option<PathBuf>,

    /// Locale directory for the source-language table
    #[arg(long = "source-locale")]
    pub source_locale: Option<String>,

    /// Locale directory for the table handed to translators
    #[arg(long = "target-locale")]
    pub target_locale: Option<String>,

    /// File stem of the core ruleset document
    #[arg(long = "core-name")]
    pub core_name: Option<String>,

    /// Keep inputs after processing (a .done marker is archived instead)
    #[arg(long = "keep-source")]
    pub keep_source: bool,
}

#[derive(ClapArgs, Debug)]
pub struct LocalizeArgs {
    /// Translated document (<base>.translated.json)
    pub translated: PathBuf,

    /// Flat table (<locale>/<base>.flat.json)
    pub table: PathBuf,

    /// Output file (default: stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct RekeyArgs {
    /// Base names to process (default: every translated document in the output directory)
    pub bases: Vec<String>,
}
