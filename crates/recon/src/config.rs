use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cache::DEFAULT_CACHE_FILE;
use crate::error::ReconError;
use crate::matcher::SuggestionPolicy;
use crate::prefilter::{Prefilter, DEFAULT_MAX_EDIT_RATIO};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    pub name: String,
    /// Location cache file, relative to the config file's directory.
    #[serde(default)]
    pub cache: Option<String>,
    #[serde(default)]
    pub matching: MatchingConfig,
    pub sources: BTreeMap<String, SourceConfig>,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchingConfig {
    /// Prefilter edit budget as a fraction of the longer venue name.
    #[serde(default = "default_max_edit_ratio")]
    pub max_edit_ratio: f64,
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
    #[serde(default = "default_suggestion_min_score")]
    pub suggestion_min_score: u8,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_edit_ratio: default_max_edit_ratio(),
            suggestion_limit: default_suggestion_limit(),
            suggestion_min_score: default_suggestion_min_score(),
        }
    }
}

fn default_max_edit_ratio() -> f64 {
    DEFAULT_MAX_EDIT_RATIO
}

fn default_suggestion_limit() -> usize {
    SuggestionPolicy::default().limit
}

fn default_suggestion_min_score() -> u8 {
    SuggestionPolicy::default().min_score
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub file: String,
    /// Rows to discard before the header (or the data, without a header).
    #[serde(default)]
    pub skip_rows: usize,
    #[serde(default = "default_has_headers")]
    pub has_headers: bool,
    pub columns: ColumnMapping,
}

fn default_has_headers() -> bool {
    true
}

/// A column by header name or by 0-based position.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Name(name) => write!(f, "'{name}'"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnMapping {
    pub date: ColumnRef,
    /// Without a time column the time is read from the date cell.
    #[serde(default)]
    pub time: Option<ColumnRef>,
    pub venue: ColumnRef,
    pub umpire: ColumnRef,
}

impl ColumnMapping {
    fn refs(&self) -> impl Iterator<Item = &ColumnRef> {
        [Some(&self.date), self.time.as_ref(), Some(&self.venue), Some(&self.umpire)]
            .into_iter()
            .flatten()
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ReconError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| ReconError::Io(format!("cannot read config {}: {e}", path.display())))?;
        Self::from_toml(&input)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.sources.len() < 2 {
            return Err(ReconError::ConfigValidation(
                "at least 2 sources are required".into(),
            ));
        }

        let m = &self.matching;
        if !(0.0..=1.0).contains(&m.max_edit_ratio) {
            return Err(ReconError::ConfigValidation(format!(
                "matching.max_edit_ratio must be between 0 and 1, got {}",
                m.max_edit_ratio
            )));
        }
        if m.suggestion_limit == 0 {
            return Err(ReconError::ConfigValidation(
                "matching.suggestion_limit must be at least 1".into(),
            ));
        }
        if !(1..=4).contains(&m.suggestion_min_score) {
            return Err(ReconError::ConfigValidation(format!(
                "matching.suggestion_min_score must be between 1 and 4, got {}",
                m.suggestion_min_score
            )));
        }

        for (name, source) in &self.sources {
            if source.file.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "source '{name}': file is empty"
                )));
            }
            if !source.has_headers {
                if let Some(named) = source
                    .columns
                    .refs()
                    .find(|c| matches!(c, ColumnRef::Name(_)))
                {
                    return Err(ReconError::ConfigValidation(format!(
                        "source '{name}': column {named} is a header name but has_headers = false"
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn source(&self, name: &str) -> Result<&SourceConfig, ReconError> {
        self.sources.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.sources.keys().map(String::as_str).collect();
            ReconError::UnknownSource(format!("'{name}' (defined: {})", known.join(", ")))
        })
    }

    pub fn prefilter(&self) -> Prefilter {
        Prefilter::new(self.matching.max_edit_ratio)
    }

    pub fn suggestion_policy(&self) -> SuggestionPolicy {
        SuggestionPolicy {
            limit: self.matching.suggestion_limit,
            min_score: self.matching.suggestion_min_score,
        }
    }

    /// Cache file location for a config that lives in `base_dir`.
    pub fn cache_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(self.cache.as_deref().unwrap_or(DEFAULT_CACHE_FILE))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "Spring umpire schedule"
cache = "venues.json"

[matching]
max_edit_ratio = 0.25

[sources.assignor]
file = "assignor.csv"
[sources.assignor.columns]
date   = "Date"
time   = "Start"
venue  = "Location"
umpire = "Umpire"

[sources.league]
file = "league.csv"
skip_rows = 2
has_headers = false
[sources.league.columns]
date   = 0
venue  = 1
umpire = 3
"#;

    #[test]
    fn parse_valid() {
        let config = ReconConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "Spring umpire schedule");
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.matching.max_edit_ratio, 0.25);
        assert_eq!(config.matching.suggestion_limit, 3);
        assert_eq!(config.matching.suggestion_min_score, 3);

        let assignor = config.source("assignor").unwrap();
        assert!(assignor.has_headers);
        assert_eq!(assignor.skip_rows, 0);
        assert_eq!(assignor.columns.time, Some(ColumnRef::Name("Start".into())));

        let league = config.source("league").unwrap();
        assert_eq!(league.skip_rows, 2);
        assert_eq!(league.columns.date, ColumnRef::Index(0));
        assert_eq!(league.columns.time, None);
    }

    #[test]
    fn cache_path_defaults_next_to_config() {
        let config = ReconConfig::from_toml(VALID).unwrap();
        assert_eq!(config.cache_path(Path::new("/tmp/run")), PathBuf::from("/tmp/run/venues.json"));

        let no_cache = VALID.replace("cache = \"venues.json\"\n", "");
        let config = ReconConfig::from_toml(&no_cache).unwrap();
        assert_eq!(
            config.cache_path(Path::new("/tmp/run")),
            PathBuf::from("/tmp/run/location-cache.json")
        );
    }

    #[test]
    fn policy_and_prefilter_from_matching() {
        let config = ReconConfig::from_toml(VALID).unwrap();
        assert_eq!(config.prefilter().max_edit_ratio(), 0.25);
        assert_eq!(config.suggestion_policy(), SuggestionPolicy { limit: 3, min_score: 3 });
    }

    #[test]
    fn unknown_source() {
        let config = ReconConfig::from_toml(VALID).unwrap();
        let err = config.source("ozzies").unwrap_err();
        assert!(err.to_string().contains("'ozzies'"));
        assert!(err.to_string().contains("assignor, league"));
    }

    #[test]
    fn reject_single_source() {
        let input = r#"
name = "Lonely"
[sources.a]
file = "a.csv"
[sources.a.columns]
date = 0
venue = 1
umpire = 2
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("at least 2 sources"));
    }

    #[test]
    fn reject_bad_ratio() {
        let input = VALID.replace("max_edit_ratio = 0.25", "max_edit_ratio = 1.5");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("max_edit_ratio"));
    }

    #[test]
    fn reject_bad_min_score() {
        let input = VALID.replace("max_edit_ratio = 0.25", "suggestion_min_score = 5");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("suggestion_min_score"));
    }

    #[test]
    fn reject_header_name_without_headers() {
        let input = VALID.replace("date   = 0", "date   = \"Date\"");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("source 'league'"));
        assert!(err.to_string().contains("'Date'"));
    }

    #[test]
    fn reject_typo_in_key() {
        let input = VALID.replace("skip_rows = 2", "skip_row = 2");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }
}
