//! `gamesync-recon`: schedule reconciliation engine.
//!
//! Matches two independently-sourced game lists. Venue names are compared
//! through a persisted equivalence cache that learns from yes/no answers,
//! so each spelling pair is only ever asked about once.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod matcher;
pub mod model;
pub mod oracle;
pub mod prefilter;
pub mod resolver;
pub mod summary;

pub use cache::{Equivalence, EquivalenceCache};
pub use config::ReconConfig;
pub use engine::run;
pub use error::ReconError;
pub use loader::{CsvFileSource, EventSource};
pub use model::{Event, GameTime, Meridiem, ReconReport};
pub use oracle::{Oracle, PromptOracle, ScriptedOracle};
pub use resolver::LocationResolver;
