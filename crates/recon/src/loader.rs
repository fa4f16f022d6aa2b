//! CSV event sources.
//!
//! Every source lays its columns out differently and writes dates and times
//! its own way. The column layout comes from config; cell formats are
//! recognised here. A row that cannot be read is skipped with a diagnostic.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};

use crate::config::{ColumnRef, SourceConfig};
use crate::error::ReconError;
use crate::model::{Event, GameTime, LoadedSource, Meridiem, RowDiagnostic};

/// Something that produces a fully-parsed event list.
pub trait EventSource {
    fn name(&self) -> &str;
    fn load(&self) -> Result<LoadedSource, ReconError>;
}

/// A CSV file described by a `[sources.<name>]` config table.
pub struct CsvFileSource<'a> {
    name: String,
    path: PathBuf,
    config: &'a SourceConfig,
}

impl<'a> CsvFileSource<'a> {
    /// `base_dir` anchors relative `file` paths (normally the config's directory).
    pub fn new(name: impl Into<String>, base_dir: &Path, config: &'a SourceConfig) -> Self {
        Self {
            name: name.into(),
            path: base_dir.join(&config.file),
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSource for CsvFileSource<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<LoadedSource, ReconError> {
        let csv_data = std::fs::read(&self.path).map_err(|e| ReconError::Source {
            source_name: self.name.clone(),
            message: format!("cannot read {}: {e}", self.path.display()),
        })?;
        let loaded = load_events(&self.name, &csv_data, self.config)?;
        log::info!(
            "source '{}': {} events, {} rows skipped",
            self.name,
            loaded.events.len(),
            loaded.skipped.len()
        );
        Ok(loaded)
    }
}

/// Column positions after header names are looked up.
struct ColumnIndexes {
    date: usize,
    time: Option<usize>,
    venue: usize,
    umpire: usize,
}

/// Parse CSV data into events using the source's column layout.
///
/// Rows are read as raw bytes so that one row in a legacy encoding is
/// skipped with a diagnostic instead of failing the whole source.
pub fn load_events(
    source_name: &str,
    csv_data: impl AsRef<[u8]>,
    config: &SourceConfig,
) -> Result<LoadedSource, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(csv_data.as_ref());

    let source_err = |e: csv::Error| ReconError::Source {
        source_name: source_name.into(),
        message: e.to_string(),
    };

    let mut records = reader.byte_records();
    for _ in 0..config.skip_rows {
        match records.next() {
            Some(record) => {
                record.map_err(source_err)?;
            }
            None => break,
        }
    }

    let headers: Vec<String> = if config.has_headers {
        match records.next() {
            Some(record) => {
                let record = csv::StringRecord::from_byte_record(record.map_err(source_err)?).map_err(|e| {
                    ReconError::Source {
                        source_name: source_name.into(),
                        message: format!("header row is not valid UTF-8 ({})", e.utf8_error()),
                    }
                })?;
                record.iter().map(str::to_string).collect()
            }
            None => Vec::new(),
        }
    } else {
        Vec::new()
    };

    let idx = |column: &ColumnRef| -> Result<usize, ReconError> {
        match column {
            ColumnRef::Index(i) => Ok(*i),
            ColumnRef::Name(name) => headers.iter().position(|h| h == name).ok_or_else(|| {
                ReconError::MissingColumn {
                    source_name: source_name.into(),
                    column: name.clone(),
                }
            }),
        }
    };

    let columns = &config.columns;
    let indexes = ColumnIndexes {
        date: idx(&columns.date)?,
        time: columns.time.as_ref().map(&idx).transpose()?,
        venue: idx(&columns.venue)?,
        umpire: idx(&columns.umpire)?,
    };

    let mut loaded = LoadedSource::default();

    for record in records {
        let record = record.map_err(source_err)?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line());

        let parsed = csv::StringRecord::from_byte_record(record)
            .map_err(|e| format!("row is not valid UTF-8 ({})", e.utf8_error()))
            .and_then(|record| parse_row(&record, &indexes));

        match parsed {
            Ok(event) => loaded.events.push(event),
            Err(reason) => {
                log::warn!("source '{source_name}' line {line}: {reason}; row skipped");
                loaded.skipped.push(RowDiagnostic {
                    source: source_name.into(),
                    line,
                    reason,
                });
            }
        }
    }

    Ok(loaded)
}

fn parse_row(record: &csv::StringRecord, indexes: &ColumnIndexes) -> Result<Event, String> {
    let cell = |i: usize| record.get(i).ok_or_else(|| format!("row has no column {}", i + 1));

    let (date, rest) = parse_date_cell(cell(indexes.date)?)?;
    let time = match indexes.time {
        Some(i) => parse_time(cell(i)?)?,
        None => match rest {
            Some(rest) => parse_time(rest)?,
            None => return Err(format!("no time in date cell '{}'", cell(indexes.date)?)),
        },
    };

    let venue = cell(indexes.venue)?;
    if venue.is_empty() {
        return Err("empty venue".into());
    }
    let umpire = cell(indexes.umpire)?;
    if umpire.is_empty() {
        return Err("empty umpire".into());
    }

    Ok(Event::new(date, time, venue, umpire))
}

/// Split a date cell into the date and whatever follows it (a time, usually).
pub fn parse_date_cell(cell: &str) -> Result<(NaiveDate, Option<&str>), String> {
    let cell = cell.trim();
    let (date_part, rest) = match cell.find(&[' ', ',', 'T'][..]) {
        Some(pos) => (&cell[..pos], Some(cell[pos + 1..].trim()).filter(|r| !r.is_empty())),
        None => (cell, None),
    };
    Ok((parse_date(date_part)?, rest))
}

pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    // %Y happily reads "24" as year 24, so two-digit years go through %y.
    if let Ok(date) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
        if date.year() >= 1000 {
            return Ok(date);
        }
    }
    NaiveDate::parse_from_str(s, "%m/%d/%y").map_err(|_| format!("cannot parse date '{s}'"))
}

/// Recognised forms: `7:05 PM`, `7:05PM`, `7 PM`, `17:30:00`, `17:30`, `7:05`,
/// `530`, `8`. Clock readings without seconds or a designator keep the
/// meridiem unknown unless the hour only makes sense on a 24-hour clock.
pub fn parse_time(s: &str) -> Result<GameTime, String> {
    let err = || format!("cannot parse time '{s}'");
    let upper = s.trim().to_uppercase();

    let (body, meridiem) = if let Some(body) = upper.strip_suffix("PM") {
        (body.trim(), Some(Meridiem::Pm))
    } else if let Some(body) = upper.strip_suffix("AM") {
        (body.trim(), Some(Meridiem::Am))
    } else {
        (upper.as_str(), None)
    };

    let parts: Vec<&str> = body.split(':').collect();
    let (hour, minute, has_seconds) = match parts.as_slice() {
        [compact] => split_compact(compact).ok_or_else(err)?,
        [h, m] => (number(h).ok_or_else(err)?, number(m).ok_or_else(err)?, false),
        [h, m, sec] => {
            number(sec).ok_or_else(err)?;
            (number(h).ok_or_else(err)?, number(m).ok_or_else(err)?, true)
        }
        _ => return Err(err()),
    };

    let time = match meridiem {
        Some(m) => GameTime::new(hour, minute, m),
        None if has_seconds || hour == 0 || hour > 12 => GameTime::from_24h(hour, minute),
        None => GameTime::new(hour, minute, Meridiem::Unknown),
    };
    time.ok_or_else(err)
}

/// `8` → 8:00, `530` → 5:30, `1905` → 19:05.
fn split_compact(s: &str) -> Option<(u8, u8, bool)> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match s.len() {
        1 | 2 => Some((s.parse().ok()?, 0, false)),
        3 | 4 => {
            let (h, m) = s.split_at(s.len() - 2);
            Some((h.parse().ok()?, m.parse().ok()?, false))
        }
        _ => None,
    }
}

fn number(s: &str) -> Option<u8> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnMapping;

    fn source(has_headers: bool, skip_rows: usize, columns: ColumnMapping) -> SourceConfig {
        SourceConfig {
            file: "games.csv".into(),
            skip_rows,
            has_headers,
            columns,
        }
    }

    fn by_name(date: &str, time: Option<&str>, venue: &str, umpire: &str) -> ColumnMapping {
        ColumnMapping {
            date: ColumnRef::Name(date.into()),
            time: time.map(|t| ColumnRef::Name(t.into())),
            venue: ColumnRef::Name(venue.into()),
            umpire: ColumnRef::Name(umpire.into()),
        }
    }

    fn t(hour: u8, minute: u8, m: Meridiem) -> GameTime {
        GameTime::new(hour, minute, m).unwrap()
    }

    #[test]
    fn times() {
        assert_eq!(parse_time("7:05 PM").unwrap(), t(7, 5, Meridiem::Pm));
        assert_eq!(parse_time("7:05pm").unwrap(), t(7, 5, Meridiem::Pm));
        assert_eq!(parse_time("11 am").unwrap(), t(11, 0, Meridiem::Am));
        assert_eq!(parse_time("17:30:00").unwrap(), t(5, 30, Meridiem::Pm));
        assert_eq!(parse_time("05:30:00").unwrap(), t(5, 30, Meridiem::Am));
        assert_eq!(parse_time("17:30").unwrap(), t(5, 30, Meridiem::Pm));
        assert_eq!(parse_time("7:05").unwrap(), t(7, 5, Meridiem::Unknown));
        assert_eq!(parse_time("530").unwrap(), t(5, 30, Meridiem::Unknown));
        assert_eq!(parse_time("8").unwrap(), t(8, 0, Meridiem::Unknown));
        assert_eq!(parse_time("1905").unwrap(), t(7, 5, Meridiem::Pm));
        assert_eq!(parse_time("12:00 AM").unwrap(), t(12, 0, Meridiem::Am));
    }

    #[test]
    fn bad_times() {
        assert!(parse_time("").is_err());
        assert!(parse_time("TBD").is_err());
        assert!(parse_time("13:00 PM").is_err());
        assert!(parse_time("7:75").is_err());
        assert!(parse_time("25:00:00").is_err());
        assert!(parse_time("12345").is_err());
    }

    #[test]
    fn dates() {
        let d = NaiveDate::from_ymd_opt(2024, 4, 23).unwrap();
        assert_eq!(parse_date("2024-04-23").unwrap(), d);
        assert_eq!(parse_date("4/23/2024").unwrap(), d);
        assert_eq!(parse_date("04/23/24").unwrap(), d);
        assert!(parse_date("23.04.2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn date_cell_carries_time() {
        let (date, rest) = parse_date_cell("2024-04-23 00:00:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 4, 23).unwrap());
        assert_eq!(rest, Some("00:00:00"));

        let (_, rest) = parse_date_cell("4/23/2024,4:00 PM").unwrap();
        assert_eq!(rest, Some("4:00 PM"));

        let (_, rest) = parse_date_cell("4/23/2024").unwrap();
        assert_eq!(rest, None);
    }

    #[test]
    fn load_by_header_name() {
        let csv = "\
Date,Start,Opponent,Location,Umpire
2024-04-23,7:05 PM,Yankees,Fenway Park,Joe West
2024-04-24,19:10,Yankees,Fenway Park,Joe West
";
        let config = source(true, 0, by_name("Date", Some("Start"), "Location", "Umpire"));
        let loaded = load_events("assignor", csv, &config).unwrap();
        assert_eq!(loaded.events.len(), 2);
        assert!(loaded.skipped.is_empty());
        assert_eq!(loaded.events[0].venue, "Fenway Park");
        assert_eq!(loaded.events[1].time, t(7, 10, Meridiem::Pm));
    }

    #[test]
    fn load_by_index_with_preamble_and_combined_cell() {
        let csv = "\
Exported schedule
\"4/23/2024,4:00 PM\",Lawrence / LSD #4,aaca,\"Sundheimer, Lucien\"
,,,
\"4/24/2024,5:30 PM\",Welles Park,aaca,\"Locks, Josh\"
";
        let config = source(
            false,
            1,
            ColumnMapping {
                date: ColumnRef::Index(0),
                time: None,
                venue: ColumnRef::Index(1),
                umpire: ColumnRef::Index(3),
            },
        );
        let loaded = load_events("league", csv, &config).unwrap();
        assert_eq!(loaded.events.len(), 2);
        assert_eq!(loaded.events[0].time, t(4, 0, Meridiem::Pm));
        assert_eq!(loaded.events[0].venue, "Lawrence / LSD #4");
        assert_eq!(loaded.events[0].umpire, "Sundheimer, Lucien");
    }

    #[test]
    fn bad_rows_are_skipped_with_line_numbers() {
        let csv = "\
Date,Start,Location,Umpire
2024-04-23,7:05 PM,Fenway Park,Joe West
2024-04-23,TBD,Fenway Park,Joe West
not-a-date,7:05 PM,Fenway Park,Joe West
2024-04-25,7:05 PM,,Joe West
2024-04-26,7:05 PM
2024-04-27,7:05 PM,Fenway Park,Joe West
";
        let config = source(true, 0, by_name("Date", Some("Start"), "Location", "Umpire"));
        let loaded = load_events("assignor", csv, &config).unwrap();
        assert_eq!(loaded.events.len(), 2);
        let lines: Vec<u64> = loaded.skipped.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![3, 4, 5, 6]);
        assert!(loaded.skipped[0].reason.contains("TBD"));
        assert!(loaded.skipped[2].reason.contains("venue"));
        assert!(loaded.skipped[3].reason.contains("no column"));
    }

    #[test]
    fn non_utf8_row_is_skipped() {
        let mut csv = b"Date,Start,Location,Umpire\n2024-04-23,7:05 PM,Fenway Park,Joe West\n".to_vec();
        // cp1252 export: "Jos\xe9 N\xfa\xf1ez"
        csv.extend_from_slice(b"2024-04-24,7:05 PM,Fenway Park,Jos\xe9 N\xfa\xf1ez\n");
        csv.extend_from_slice(b"2024-04-25,7:05 PM,Fenway Park,Joe West\n");

        let config = source(true, 0, by_name("Date", Some("Start"), "Location", "Umpire"));
        let loaded = load_events("assignor", &csv, &config).unwrap();
        assert_eq!(loaded.events.len(), 2);
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].line, 3);
        assert!(loaded.skipped[0].reason.contains("not valid UTF-8"));

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("games.csv"), &csv).unwrap();
        let loaded = CsvFileSource::new("assignor", dir.path(), &config).load().unwrap();
        assert_eq!(loaded.events.len(), 2);
        assert_eq!(loaded.skipped.len(), 1);
    }

    #[test]
    fn missing_header_is_an_error() {
        let csv = "Date,Start,Location\n2024-04-23,7:05 PM,Fenway Park\n";
        let config = source(true, 0, by_name("Date", Some("Start"), "Location", "Umpire"));
        let err = load_events("assignor", csv, &config).unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn { ref column, .. } if column == "Umpire"));
    }

    #[test]
    fn file_source_reads_relative_to_base() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("games.csv"),
            "Date,Start,Location,Umpire\n2024-04-23,7:05 PM,Fenway Park,Joe West\n",
        )
        .unwrap();
        let config = source(true, 0, by_name("Date", Some("Start"), "Location", "Umpire"));
        let src = CsvFileSource::new("assignor", dir.path(), &config);
        assert_eq!(src.name(), "assignor");
        assert_eq!(src.load().unwrap().events.len(), 1);

        let missing = CsvFileSource::new("assignor", &dir.path().join("nope"), &config);
        assert!(matches!(missing.load(), Err(ReconError::Source { .. })));
    }
}
