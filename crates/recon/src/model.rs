use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// AM/PM designator. `Unknown` when the source wrote a bare clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Meridiem {
    Am,
    Pm,
    Unknown,
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Am => write!(f, "AM"),
            Self::Pm => write!(f, "PM"),
            Self::Unknown => write!(f, "??"),
        }
    }
}

/// 12-hour clock time. `hour` is always 1–12, `minute` 0–59.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GameTime {
    pub hour: u8,
    pub minute: u8,
    pub meridiem: Meridiem,
}

/// How two times compare once the AM/PM wildcard is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeAgreement {
    Exact,
    /// Same clock reading; one side did not say AM or PM.
    AmbiguousMeridiem,
    Different,
}

impl GameTime {
    pub fn new(hour: u8, minute: u8, meridiem: Meridiem) -> Option<Self> {
        if !(1..=12).contains(&hour) || minute > 59 {
            return None;
        }
        Some(Self { hour, minute, meridiem })
    }

    /// Build from a 24-hour reading. The meridiem is always known.
    pub fn from_24h(hour: u8, minute: u8) -> Option<Self> {
        if hour > 23 {
            return None;
        }
        let meridiem = if hour >= 12 { Meridiem::Pm } else { Meridiem::Am };
        let hour = match hour % 12 {
            0 => 12,
            h => h,
        };
        Self::new(hour, minute, meridiem)
    }

    pub fn agreement(&self, other: &GameTime) -> TimeAgreement {
        if self.hour != other.hour || self.minute != other.minute {
            return TimeAgreement::Different;
        }
        match (self.meridiem, other.meridiem) {
            (a, b) if a == b => TimeAgreement::Exact,
            (Meridiem::Unknown, _) | (_, Meridiem::Unknown) => TimeAgreement::AmbiguousMeridiem,
            _ => TimeAgreement::Different,
        }
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.meridiem {
            Meridiem::Unknown => write!(f, "{}:{:02}", self.hour, self.minute),
            m => write!(f, "{}:{:02} {m}", self.hour, self.minute),
        }
    }
}

/// A single scheduled game as normalized by a source loader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Event {
    pub date: NaiveDate,
    pub time: GameTime,
    pub venue: String,
    pub umpire: String,
}

impl Event {
    pub fn new(date: NaiveDate, time: GameTime, venue: impl Into<String>, umpire: impl Into<String>) -> Self {
        Self {
            date,
            time,
            venue: venue.into(),
            umpire: umpire.into(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} {} at {} ({})",
            self.date.month(),
            self.date.day(),
            self.date.year(),
            self.time,
            self.venue,
            self.umpire
        )
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// A source row that could not be turned into an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowDiagnostic {
    pub source: String,
    /// 1-based line in the source file.
    pub line: u64,
    pub reason: String,
}

impl fmt::Display for RowDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} line {}: {}", self.source, self.line, self.reason)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadedSource {
    pub events: Vec<Event>,
    pub skipped: Vec<RowDiagnostic>,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Which side an unmatched event is missing from. Only affects wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Reference events with no counterpart among the candidate events.
    MissingFromCandidate,
    /// Candidate events with no counterpart among the reference events.
    MissingFromReference,
}

#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub event: Event,
    /// Agreement count over date, time, exact venue and umpire (0–4).
    pub score: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct Unmatched {
    pub event: Event,
    pub suggestions: Vec<Suggestion>,
}

/// A match accepted only because one side left AM/PM unspecified.
#[derive(Debug, Clone, Serialize)]
pub struct AmbiguousMatch {
    pub event: Event,
    pub matched_with: Event,
}

/// Result of scanning one event list against another.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub direction: Direction,
    pub matched: usize,
    pub unmatched: Vec<Unmatched>,
    pub needs_verification: Vec<AmbiguousMatch>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

/// How the resolver settled each location pair it was handed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    pub cache_hits: usize,
    pub verbatim: usize,
    pub prefilter_rejections: usize,
    pub prompts: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    pub reference_events: usize,
    pub candidate_events: usize,
    /// Reference events that found a counterpart in the candidate.
    pub reference_matched: usize,
    /// Candidate events that found a counterpart in the reference.
    pub candidate_matched: usize,
    pub missing_from_candidate: usize,
    pub missing_from_reference: usize,
    pub needs_verification: usize,
    pub skipped_rows: usize,
    pub resolver: ResolverStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub reference: String,
    pub candidate: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub missing_from_candidate: Vec<Unmatched>,
    pub missing_from_reference: Vec<Unmatched>,
    pub needs_verification: Vec<AmbiguousMatch>,
    pub skipped_rows: Vec<RowDiagnostic>,
}
