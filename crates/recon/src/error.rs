use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (too few sources, bad threshold, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// A source named on the command line is not defined in the config.
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// A header-name column reference that the CSV header does not contain.
    #[error("source '{source_name}': missing column '{column}'")]
    MissingColumn { source_name: String, column: String },

    /// Reading a source file or its header row failed.
    #[error("source '{source_name}': {message}")]
    Source { source_name: String, message: String },

    /// The location cache could not be written. Fatal: memory and disk would diverge.
    #[error("cannot persist location cache to {}: {message}", path.display())]
    CachePersist { path: PathBuf, message: String },

    /// IO error outside of cache persistence (deleting the cache, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// The operator asked to stop at a prompt. Not a failure.
    #[error("cancelled at prompt")]
    Cancelled,
}

impl ReconError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
