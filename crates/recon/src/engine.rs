use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::loader::EventSource;
use crate::matcher::reconcile_both;
use crate::model::{ReconMeta, ReconReport};
use crate::resolver::LocationResolver;
use crate::summary::{ambiguous_pairs, compute_summary};

/// Load both sources and reconcile them in both directions.
///
/// Location rulings made along the way are persisted by the resolver's
/// cache as they happen, so a cancelled run keeps everything decided so far.
pub fn run(
    config: &ReconConfig,
    reference: &dyn EventSource,
    candidate: &dyn EventSource,
    resolver: &mut LocationResolver<'_>,
) -> Result<ReconReport, ReconError> {
    let reference_loaded = reference.load()?;
    let candidate_loaded = candidate.load()?;

    log::info!(
        "reconciling '{}' ({} events) against '{}' ({} events)",
        reference.name(),
        reference_loaded.events.len(),
        candidate.name(),
        candidate_loaded.events.len()
    );

    let outcome = reconcile_both(
        &reference_loaded.events,
        &candidate_loaded.events,
        resolver,
        config.suggestion_policy(),
    )?;

    let mut skipped_rows = reference_loaded.skipped;
    skipped_rows.extend(candidate_loaded.skipped);

    let summary = compute_summary(
        reference_loaded.events.len(),
        candidate_loaded.events.len(),
        &outcome,
        skipped_rows.len(),
        resolver.stats(),
    );

    let needs_verification = ambiguous_pairs(&outcome);

    Ok(ReconReport {
        meta: ReconMeta {
            config_name: config.name.clone(),
            reference: reference.name().to_string(),
            candidate: candidate.name().to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        missing_from_candidate: outcome.missing_from_candidate.unmatched,
        missing_from_reference: outcome.missing_from_reference.unmatched,
        needs_verification,
        skipped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EquivalenceCache;
    use crate::model::{Event, LoadedSource, RowDiagnostic};
    use crate::oracle::ScriptedOracle;

    struct Fixed {
        name: &'static str,
        csv: &'static str,
        config: crate::config::SourceConfig,
    }

    impl EventSource for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn load(&self) -> Result<LoadedSource, ReconError> {
            crate::loader::load_events(self.name, self.csv, &self.config)
        }
    }

    const CONFIG: &str = r#"
name = "Engine test"

[sources.assignor]
file = "assignor.csv"
[sources.assignor.columns]
date = "Date"
time = "Start"
venue = "Location"
umpire = "Umpire"

[sources.league]
file = "league.csv"
[sources.league.columns]
date = "Date"
time = "Start"
venue = "Location"
umpire = "Umpire"
"#;

    #[test]
    fn run_two_way() {
        let config = ReconConfig::from_toml(CONFIG).unwrap();
        let reference = Fixed {
            name: "assignor",
            csv: "\
Date,Start,Location,Umpire
2024-04-23,7:05 PM,Fenway Park,Joe West
2024-04-24,7:05,Fenway Park,Joe West
2024-04-25,1:35 PM,Wrigley Field,Joe West
",
            config: config.source("assignor").unwrap().clone(),
        };
        let candidate = Fixed {
            name: "league",
            csv: "\
Date,Start,Location,Umpire
2024-04-23,7:05 PM,Fenway,Joe West
2024-04-24,7:05 PM,Fenway,Joe West
2024-04-26,1:35 PM,Shea Stadium,Joe West
2024-04-27,soon,Shea Stadium,Joe West
",
            config: config.source("league").unwrap().clone(),
        };

        let mut cache = EquivalenceCache::in_memory();
        let mut oracle = ScriptedOracle::new([true]);
        let mut resolver = LocationResolver::new(&mut cache, &mut oracle, config.prefilter());
        let report = run(&config, &reference, &candidate, &mut resolver).unwrap();

        assert_eq!(report.meta.reference, "assignor");
        assert_eq!(report.meta.candidate, "league");
        assert_eq!(report.summary.reference_events, 3);
        assert_eq!(report.summary.candidate_events, 3);
        assert_eq!(report.summary.resolver.prompts, 1);

        let missing_ref: Vec<&Event> = report.missing_from_reference.iter().map(|u| &u.event).collect();
        assert_eq!(missing_ref.len(), 1);
        assert_eq!(missing_ref[0].venue, "Shea Stadium");

        assert_eq!(report.missing_from_candidate.len(), 1);
        assert_eq!(report.missing_from_candidate[0].event.venue, "Wrigley Field");

        // 4/24 matches in both directions with one side missing AM/PM;
        // the pair is reported once.
        assert_eq!(report.needs_verification.len(), 1);
        assert_eq!(report.summary.needs_verification, 1);
        assert_eq!(report.needs_verification[0].event.venue, "Fenway");

        assert_eq!(
            report.skipped_rows,
            vec![RowDiagnostic {
                source: "league".into(),
                line: 5,
                reason: "cannot parse time 'soon'".into(),
            }]
        );
    }
}
