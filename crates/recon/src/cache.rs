//! Persisted location-equivalence cache.
//!
//! Two structures share one file: the decision store (every pair a human or
//! the prefilter has ruled on) and the synonym graph (edges for "same" rulings
//! only). Equivalence is read off the graph by reachability, so confirming
//! `a~b` and `b~c` answers `a~c` without ever asking about it.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ReconError;

/// Joins the two halves of a canonical pair key.
pub const PAIR_DELIMITER: &str = "||";

/// Default cache file name, placed next to the run config.
pub const DEFAULT_CACHE_FILE: &str = "location-cache.json";

/// On-disk shape. Maps are ordered so successive saves diff cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheState {
    #[serde(default)]
    pub store: BTreeMap<String, bool>,
    #[serde(default)]
    pub synonyms: BTreeMap<String, Vec<String>>,
}

/// Answer to a cache query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Equivalence {
    Same,
    Different,
    Unknown,
}

impl Equivalence {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Same => Some(true),
            Self::Different => Some(false),
            Self::Unknown => None,
        }
    }
}

/// Order-independent key for an unordered pair of location strings.
pub fn pair_key(a: &str, b: &str) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{lo}{PAIR_DELIMITER}{hi}")
}

#[derive(Debug)]
pub struct EquivalenceCache {
    state: CacheState,
    /// `None` keeps the cache in memory only.
    path: Option<PathBuf>,
}

impl EquivalenceCache {
    pub fn in_memory() -> Self {
        Self {
            state: CacheState::default(),
            path: None,
        }
    }

    /// Load from `path`. Missing or unreadable files start an empty cache.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<CacheState>(&contents) {
                Ok(state) => {
                    log::debug!(
                        "loaded location cache {} ({} decisions)",
                        path.display(),
                        state.store.len()
                    );
                    dedup_synonyms(state)
                }
                Err(e) => {
                    log::warn!(
                        "location cache {} is malformed ({e}); starting empty",
                        path.display()
                    );
                    CacheState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CacheState::default(),
            Err(e) => {
                log::warn!("cannot read location cache {} ({e}); starting empty", path.display());
                CacheState::default()
            }
        };
        Self {
            state,
            path: Some(path),
        }
    }

    /// Delete the persisted file at `path`, if any.
    pub fn clear(path: &Path) -> Result<(), ReconError> {
        match fs::remove_file(path) {
            Ok(()) => {
                log::info!("removed location cache {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ReconError::Io(format!("cannot remove {}: {e}", path.display()))),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn state(&self) -> &CacheState {
        &self.state
    }

    pub fn decision_count(&self) -> usize {
        self.state.store.len()
    }

    pub fn query(&self, a: &str, b: &str) -> Equivalence {
        if a != b && self.reachable(a, b) {
            return Equivalence::Same;
        }
        match self.state.store.get(&pair_key(a, b)) {
            Some(true) => Equivalence::Same,
            Some(false) => Equivalence::Different,
            None => Equivalence::Unknown,
        }
    }

    /// Store a ruling and persist. Recording the same ruling twice is a no-op
    /// apart from the write.
    pub fn record(&mut self, a: &str, b: &str, same: bool) -> Result<(), ReconError> {
        self.state.store.insert(pair_key(a, b), same);

        if same && a != b {
            add_edge(&mut self.state.synonyms, a, b);
            add_edge(&mut self.state.synonyms, b, a);
        }

        log::debug!("recorded {:?} ~ {:?} = {same}", a, b);
        self.save()
    }

    /// Number of distinct neighbours recorded for `location`.
    pub fn degree(&self, location: &str) -> usize {
        self.state.synonyms.get(location).map_or(0, Vec::len)
    }

    /// Connected components of the synonym graph, each sorted, largest first.
    pub fn synonym_groups(&self) -> Vec<Vec<String>> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut groups = Vec::new();

        for start in self.state.synonyms.keys() {
            if seen.contains(start.as_str()) {
                continue;
            }
            let mut group = self.component(start);
            for member in &group {
                if let Some((k, _)) = self.state.synonyms.get_key_value(member.as_str()) {
                    seen.insert(k.as_str());
                }
            }
            if group.len() > 1 {
                group.sort();
                groups.push(group);
            }
        }

        groups.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        groups
    }

    fn reachable(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        if !self.state.synonyms.contains_key(from) || !self.state.synonyms.contains_key(to) {
            return false;
        }

        let mut visited: HashSet<&str> = HashSet::from([from]);
        let mut queue: VecDeque<&str> = VecDeque::from([from]);

        while let Some(node) = queue.pop_front() {
            let Some(neighbours) = self.state.synonyms.get(node) else {
                continue;
            };
            for next in neighbours {
                if next == to {
                    return true;
                }
                if visited.insert(next.as_str()) {
                    queue.push_back(next.as_str());
                }
            }
        }
        false
    }

    fn component(&self, start: &str) -> Vec<String> {
        let mut visited: HashSet<&str> = HashSet::from([start]);
        let mut queue: VecDeque<&str> = VecDeque::from([start]);
        let mut members = vec![start.to_string()];

        while let Some(node) = queue.pop_front() {
            for next in self.state.synonyms.get(node).into_iter().flatten() {
                if visited.insert(next.as_str()) {
                    members.push(next.clone());
                    queue.push_back(next.as_str());
                }
            }
        }
        members
    }

    /// Write to temp, then rename, so a crash never leaves a torn file.
    fn save(&self) -> Result<(), ReconError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let persist_err = |message: String| ReconError::CachePersist {
            path: path.clone(),
            message,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| persist_err(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(&self.state).map_err(|e| persist_err(e.to_string()))?;
        let temp_path = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&temp_path).map_err(|e| persist_err(e.to_string()))?;
            file.write_all(json.as_bytes())
                .map_err(|e| persist_err(e.to_string()))?;
            file.sync_all().map_err(|e| persist_err(e.to_string()))?;
        }
        fs::rename(&temp_path, path).map_err(|e| persist_err(e.to_string()))?;
        Ok(())
    }
}

fn add_edge(synonyms: &mut BTreeMap<String, Vec<String>>, from: &str, to: &str) {
    let neighbours = synonyms.entry(from.to_string()).or_default();
    if !neighbours.iter().any(|n| n == to) {
        neighbours.push(to.to_string());
    }
}

/// Hand-edited files may repeat neighbours or carry self-edges.
fn dedup_synonyms(mut state: CacheState) -> CacheState {
    for (location, neighbours) in state.synonyms.iter_mut() {
        let mut seen = HashSet::new();
        neighbours.retain(|n| n != location && seen.insert(n.clone()));
    }
    state
}
