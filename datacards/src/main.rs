//! datacards - translation-key extraction for datacard JSON
//!
//! Entry point: sets up logging, resolves configuration and dispatches the
//! subcommand.

mod cli;

use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use datacards_core::{
    collect_inputs, discover_bases, localize_file, process_batch, rekey_base, Config,
};

use cli::{Args, Command, ExtractArgs, LocalizeArgs, RekeyArgs};

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    if let Err(e) = run(args) {
        eprintln!("error: {:#}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Log to stderr. RUST_LOG wins over -v / -q.
fn init_logging(args: &Args) {
    let default = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(args: Args) -> Result<()> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let mut config = Config::discover(args.config.as_deref(), &cwd)?;

    match args.command {
        Command::Extract(extract) => {
            apply_overrides(&mut config, &extract);
            config.validate()?;
            run_extract(&extract, &config)
        }
        Command::Localize(localize) => run_localize(&localize),
        Command::RekeyWeapons(rekey) => run_rekey(&rekey, &config),
    }
}

fn apply_overrides(config: &mut Config, extract: &ExtractArgs) {
    if let Some(dir) = &extract.out_dir {
        config.output_dir = dir.clone();
    }
    if let Some(dir) = &extract.archive_dir {
        config.archive_dir = dir.clone();
    }
    if let Some(locale) = &extract.source_locale {
        config.source_locale = locale.clone();
    }
    if let Some(locale) = &extract.target_locale {
        config.target_locale = locale.clone();
    }
    if let Some(name) = &extract.core_name {
        config.core_name = name.clone();
    }
    if extract.keep_source {
        config.remove_processed = false;
    }
}

fn run_extract(extract: &ExtractArgs, config: &Config) -> Result<()> {
    let files = collect_inputs(&extract.inputs);
    if files.is_empty() {
        tracing::warn!("no input documents found");
        return Ok(());
    }

    let report = process_batch(&files, config);
    tracing::info!(
        processed = report.processed.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "done"
    );

    if !report.is_success() {
        bail!("{} of {} documents failed", report.failed.len(), files.len());
    }
    Ok(())
}

fn run_localize(localize: &LocalizeArgs) -> Result<()> {
    let (doc, report) = localize_file(&localize.translated, &localize.table)?;
    for key in &report.missing {
        tracing::warn!("no entry for {}", key);
    }

    let text = serde_json::to_string_pretty(&doc).context("cannot serialize localized document")?;
    match &localize.output {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", text).context("failed to write to stdout")?;
        }
    }
    tracing::info!(substituted = report.substituted, "localized {}", localize.translated.display());
    Ok(())
}

fn run_rekey(rekey: &RekeyArgs, config: &Config) -> Result<()> {
    let bases = if rekey.bases.is_empty() {
        discover_bases(config)?
    } else {
        rekey.bases.clone()
    };

    let mut failed = 0usize;
    for base in &bases {
        match rekey_base(config, base) {
            Ok(summary) => tracing::info!("{}", summary),
            Err(e) => {
                tracing::error!(base = %base, "{}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} bases failed", failed, bases.len());
    }
    Ok(())
}
