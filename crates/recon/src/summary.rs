use crate::matcher::TwoWayReconciliation;
use crate::model::{AmbiguousMatch, ReconSummary, ResolverStats};

/// AM/PM-ambiguous matches from both directions. A pair found once each
/// way appears once, in the orientation of the first direction.
pub fn ambiguous_pairs(outcome: &TwoWayReconciliation) -> Vec<AmbiguousMatch> {
    let mut pairs: Vec<AmbiguousMatch> = Vec::new();
    let both = outcome
        .missing_from_reference
        .needs_verification
        .iter()
        .chain(&outcome.missing_from_candidate.needs_verification);
    for m in both {
        let seen = pairs.iter().any(|p| {
            (p.event == m.event && p.matched_with == m.matched_with)
                || (p.event == m.matched_with && p.matched_with == m.event)
        });
        if !seen {
            pairs.push(m.clone());
        }
    }
    pairs
}

/// Counts for the report header.
pub fn compute_summary(
    reference_events: usize,
    candidate_events: usize,
    outcome: &TwoWayReconciliation,
    skipped_rows: usize,
    resolver: ResolverStats,
) -> ReconSummary {
    ReconSummary {
        reference_events,
        candidate_events,
        reference_matched: outcome.missing_from_candidate.matched,
        candidate_matched: outcome.missing_from_reference.matched,
        missing_from_candidate: outcome.missing_from_candidate.unmatched.len(),
        missing_from_reference: outcome.missing_from_reference.unmatched.len(),
        needs_verification: ambiguous_pairs(outcome).len(),
        skipped_rows,
        resolver,
    }
}
