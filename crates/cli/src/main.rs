mod exit_codes;
mod recon;

use std::process::ExitCode;

use clap::{ArgAction, Parser};

use exit_codes::*;
use gamesync_recon::ReconError;

#[derive(Parser)]
#[command(name = "gamesync")]
#[command(about = "Reconcile two game schedules, learning which venue spellings mean the same place")]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: recon::Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = recon::dispatch(cli.command);

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let code = match &err {
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_CONFIG_INVALID,
            ReconError::UnknownSource(_) => EXIT_USAGE,
            ReconError::MissingColumn { .. } | ReconError::Source { .. } | ReconError::Io(_) => EXIT_IO,
            ReconError::CachePersist { .. } => EXIT_CACHE_PERSIST,
            ReconError::Cancelled => EXIT_SUCCESS,
        };
        let hint = match &err {
            ReconError::UnknownSource(_) => {
                Some("source names are the [sources.<name>] tables in the config".to_string())
            }
            ReconError::MissingColumn { .. } => {
                Some("header names are matched exactly; use a 0-based index if the header varies".to_string())
            }
            ReconError::CachePersist { .. } => {
                Some("answers given before this one were saved; rerun once the path is writable".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}
