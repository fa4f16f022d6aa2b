//! CLI Exit Code Registry
//!
//! Single source of truth for `gamesync` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success, including runs cancelled at a prompt        |
//! | 2    | Usage error (bad args, unknown source name)          |
//! | 3    | Config could not be parsed or failed validation      |
//! | 4    | A config, source or output file could not be read/written |
//! | 5    | The location cache could not be persisted            |
//!
//! Unmatched events are a normal outcome and still exit 0.

/// Command completed, or the operator quit at a prompt.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, a source name the config does not define.
pub const EXIT_USAGE: u8 = 2;

/// Config TOML is malformed or fails validation.
pub const EXIT_CONFIG_INVALID: u8 = 3;

/// Reading a config or source file, or writing the JSON output, failed.
/// Also covers sources whose header lacks a configured column.
pub const EXIT_IO: u8 = 4;

/// A location decision could not be written to the cache file.
/// The run stops rather than keep answers that would be lost.
pub const EXIT_CACHE_PERSIST: u8 = 5;
