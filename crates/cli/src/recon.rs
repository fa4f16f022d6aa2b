//! `gamesync` subcommands: run, validate, cache show/clear.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Subcommand;

use gamesync_recon::model::{ReconReport, Unmatched};
use gamesync_recon::{
    run, CsvFileSource, EquivalenceCache, LocationResolver, PromptOracle, ReconConfig, ReconError,
};

use crate::CliError;

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile two sources defined in a config, asking about unfamiliar venue spellings
    #[command(after_help = "\
Examples:
  gamesync run spring.recon.toml assignor league
  gamesync run spring.recon.toml assignor league --json
  gamesync run spring.recon.toml assignor league --clean --output report.json")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Source treated as authoritative
        reference: String,

        /// Source checked against the reference
        candidate: String,

        /// Forget every learned venue decision before running
        #[arg(long)]
        clean: bool,

        /// Location cache file (default: from config, next to the config file)
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Output JSON to stdout instead of the human report
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  gamesync validate spring.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },

    /// Inspect or reset the learned venue equivalences
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// List groups of venue spellings known to be the same place
    Show {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Location cache file (default: from config)
        #[arg(long)]
        cache: Option<PathBuf>,
    },

    /// Delete the cache file
    Clear {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Location cache file (default: from config)
        #[arg(long)]
        cache: Option<PathBuf>,
    },
}

pub fn dispatch(cmd: Commands) -> Result<(), CliError> {
    match cmd {
        Commands::Run { config, reference, candidate, clean, cache, json, output } => {
            cmd_run(config, &reference, &candidate, clean, cache, json, output)
        }
        Commands::Validate { config } => cmd_validate(config),
        Commands::Cache { command: CacheCommands::Show { config, cache } } => cmd_cache_show(config, cache),
        Commands::Cache { command: CacheCommands::Clear { config, cache } } => cmd_cache_clear(config, cache),
    }
}

/// Directory that relative paths in the config are anchored to.
fn config_dir(config_path: &Path) -> &Path {
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

fn resolve_cache_path(config: &ReconConfig, config_path: &Path, cache: Option<PathBuf>) -> PathBuf {
    cache.unwrap_or_else(|| config.cache_path(config_dir(config_path)))
}

// ============================================================================
// run
// ============================================================================

fn cmd_run(
    config_path: PathBuf,
    reference: &str,
    candidate: &str,
    clean: bool,
    cache: Option<PathBuf>,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = ReconConfig::from_path(&config_path)?;
    if reference == candidate {
        return Err(CliError::args(format!("reference and candidate are both '{reference}'"))
            .with_hint("name two different [sources.<name>] tables"));
    }

    let base_dir = config_dir(&config_path);
    let reference_source = CsvFileSource::new(reference, base_dir, config.source(reference)?);
    let candidate_source = CsvFileSource::new(candidate, base_dir, config.source(candidate)?);

    let cache_path = resolve_cache_path(&config, &config_path, cache);
    if clean {
        EquivalenceCache::clear(&cache_path)?;
    }
    let mut cache = EquivalenceCache::open(&cache_path);

    let stdin = io::stdin();
    let mut oracle = PromptOracle::new(stdin.lock(), io::stderr());
    let mut resolver = LocationResolver::new(&mut cache, &mut oracle, config.prefilter());

    let report = match run(&config, &reference_source, &candidate_source, &mut resolver) {
        Ok(report) => report,
        Err(ReconError::Cancelled) => {
            eprintln!("Exiting...");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let json_str = serde_json::to_string_pretty(&report)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write_report(&mut handle, &report).map_err(|e| CliError::io(e.to_string()))?;
    }

    // Human summary to stderr
    let s = &report.summary;
    eprintln!(
        "{} vs {}: {} missing from {}, {} missing from {}, {} need AM/PM verification, {} rows skipped",
        report.meta.reference,
        report.meta.candidate,
        s.missing_from_candidate,
        report.meta.candidate,
        s.missing_from_reference,
        report.meta.reference,
        s.needs_verification,
        s.skipped_rows,
    );
    eprintln!(
        "venues: {} prompts, {} from cache, {} rejected as unrelated",
        s.resolver.prompts, s.resolver.cache_hits, s.resolver.prefilter_rejections,
    );

    Ok(())
}

/// Plain-text report: unmatched events per side with their near misses,
/// then matches whose AM/PM could not be confirmed.
pub fn write_report(out: &mut impl Write, report: &ReconReport) -> io::Result<()> {
    write_missing(out, &report.meta.candidate, &report.missing_from_candidate)?;
    write_missing(out, &report.meta.reference, &report.missing_from_reference)?;

    if !report.needs_verification.is_empty() {
        writeln!(out, "verify AM/PM:")?;
        for m in &report.needs_verification {
            writeln!(out, "    {} ~ {}", m.matched_with, m.event)?;
        }
    }
    Ok(())
}

fn write_missing(out: &mut impl Write, missing_from: &str, unmatched: &[Unmatched]) -> io::Result<()> {
    for u in unmatched {
        writeln!(out, "Missing from {missing_from}: {}", u.event)?;
        for s in &u.suggestions {
            writeln!(out, "    maybe: {}", s.event)?;
        }
    }
    Ok(())
}

// ============================================================================
// validate
// ============================================================================

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = ReconConfig::from_path(&config_path)?;
    let names: Vec<&str> = config.sources.keys().map(String::as_str).collect();
    eprintln!(
        "valid: '{}' with {} source(s): {}",
        config.name,
        names.len(),
        names.join(", "),
    );
    Ok(())
}

// ============================================================================
// cache
// ============================================================================

fn cmd_cache_show(config_path: PathBuf, cache: Option<PathBuf>) -> Result<(), CliError> {
    let config = ReconConfig::from_path(&config_path)?;
    let cache_path = resolve_cache_path(&config, &config_path, cache);
    let cache = EquivalenceCache::open(&cache_path);

    let groups = cache.synonym_groups();
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let write = |handle: &mut io::StdoutLock<'_>, line: String| {
        writeln!(handle, "{line}").map_err(|e| CliError::io(e.to_string()))
    };

    write(
        &mut handle,
        format!(
            "{}: {} decision(s), {} synonym group(s)",
            cache_path.display(),
            cache.decision_count(),
            groups.len()
        ),
    )?;
    for group in groups {
        write(&mut handle, format!("    {}", group.join(" | ")))?;
    }
    Ok(())
}

fn cmd_cache_clear(config_path: PathBuf, cache: Option<PathBuf>) -> Result<(), CliError> {
    let config = ReconConfig::from_path(&config_path)?;
    let cache_path = resolve_cache_path(&config, &config_path, cache);
    EquivalenceCache::clear(&cache_path)?;
    eprintln!("cleared {}", cache_path.display());
    Ok(())
}
