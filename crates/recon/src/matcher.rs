use crate::error::ReconError;
use crate::model::{AmbiguousMatch, Direction, Event, Reconciliation, Suggestion, TimeAgreement, Unmatched};
use crate::resolver::LocationResolver;

/// How many near-miss suggestions to keep per unmatched event, and the
/// minimum agreement score (out of 4) for one to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionPolicy {
    pub limit: usize,
    pub min_score: u8,
}

impl Default for SuggestionPolicy {
    fn default() -> Self {
        Self { limit: 3, min_score: 3 }
    }
}

/// Output of matching in both directions.
#[derive(Debug, Clone)]
pub struct TwoWayReconciliation {
    pub missing_from_candidate: Reconciliation,
    pub missing_from_reference: Reconciliation,
}

/// Scan `reference` for each candidate event; unmatched candidates are
/// the ones missing from the reference.
pub fn reconcile(
    reference: &[Event],
    candidate: &[Event],
    resolver: &mut LocationResolver<'_>,
    policy: SuggestionPolicy,
) -> Result<Reconciliation, ReconError> {
    scan(reference, candidate, Direction::MissingFromReference, resolver, policy)
}

/// Run [`reconcile`] both ways. The second pass reuses every location
/// decision made in the first.
pub fn reconcile_both(
    reference: &[Event],
    candidate: &[Event],
    resolver: &mut LocationResolver<'_>,
    policy: SuggestionPolicy,
) -> Result<TwoWayReconciliation, ReconError> {
    let missing_from_reference = scan(reference, candidate, Direction::MissingFromReference, resolver, policy)?;
    let missing_from_candidate = scan(candidate, reference, Direction::MissingFromCandidate, resolver, policy)?;
    Ok(TwoWayReconciliation {
        missing_from_candidate,
        missing_from_reference,
    })
}

/// Greedy first-match: each probe takes the first field-equal event in
/// `targets`, in order. Targets are not consumed.
fn scan(
    targets: &[Event],
    probes: &[Event],
    direction: Direction,
    resolver: &mut LocationResolver<'_>,
    policy: SuggestionPolicy,
) -> Result<Reconciliation, ReconError> {
    let mut matched = 0;
    let mut unmatched = Vec::new();
    let mut needs_verification = Vec::new();

    for probe in probes {
        let mut found = None;
        for target in targets {
            if let Some(agreement) = field_match(target, probe, resolver)? {
                found = Some((target, agreement));
                break;
            }
        }

        match found {
            Some((target, agreement)) => {
                matched += 1;
                if agreement == TimeAgreement::AmbiguousMeridiem {
                    needs_verification.push(AmbiguousMatch {
                        event: probe.clone(),
                        matched_with: target.clone(),
                    });
                }
            }
            None => unmatched.push(Unmatched {
                event: probe.clone(),
                suggestions: suggest(targets, probe, policy),
            }),
        }
    }

    log::info!(
        "{:?}: {} matched, {} unmatched, {} need AM/PM verification",
        direction,
        matched,
        unmatched.len(),
        needs_verification.len()
    );

    Ok(Reconciliation {
        direction,
        matched,
        unmatched,
        needs_verification,
    })
}

/// Field equality with the venue decided by the resolver. Cheap fields go
/// first so the resolver only sees pairs that could otherwise match.
fn field_match(
    target: &Event,
    probe: &Event,
    resolver: &mut LocationResolver<'_>,
) -> Result<Option<TimeAgreement>, ReconError> {
    if target.date != probe.date || target.umpire != probe.umpire {
        return Ok(None);
    }
    let agreement = target.time.agreement(&probe.time);
    if agreement == TimeAgreement::Different {
        return Ok(None);
    }
    if !resolver.resolve(&target.venue, &probe.venue)? {
        return Ok(None);
    }
    Ok(Some(agreement))
}

/// Agreement over date, time, venue and umpire, 0 to 4. Venues count only
/// when spelled identically; the resolver is not consulted.
pub fn agreement_score(a: &Event, b: &Event) -> u8 {
    u8::from(a.date == b.date)
        + u8::from(a.time.agreement(&b.time) != TimeAgreement::Different)
        + u8::from(a.venue == b.venue)
        + u8::from(a.umpire == b.umpire)
}

fn suggest(targets: &[Event], probe: &Event, policy: SuggestionPolicy) -> Vec<Suggestion> {
    let mut scored: Vec<(&Event, u8)> = targets
        .iter()
        .map(|t| (t, agreement_score(t, probe)))
        .filter(|(_, score)| *score >= policy.min_score)
        .collect();

    // Stable sort keeps target order among equal scores.
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(policy.limit);

    scored
        .into_iter()
        .map(|(event, score)| Suggestion {
            event: event.clone(),
            score,
        })
        .collect()
}
