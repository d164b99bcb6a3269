//! Key derivation and alignment between independently extracted categories.
//!
//! Visits, phases and observations are emitted as separate sequences. This
//! module derives the lookups that tie them together:
//!
//! - phases are keyed by visit label, first occurrence wins
//! - visits are keyed by (zero-padding insensitive) visit number
//! - orbit counts are paired with visits by position, since the APT format
//!   carries no key between `<Observation>` and `<Visit>`; any shortfall in
//!   that pairing is reported, never hidden

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::core::domain::{
    is_failed_status, normalize_visit_number, Observation, Phase, Visit, VisitStatusEntry,
};

/// Reduce phases to the first-seen entry per distinct label, keeping order.
pub fn reduce_phases(phases: &[Phase]) -> Vec<Phase> {
    let mut seen: HashSet<Option<&str>> = HashSet::new();
    phases
        .iter()
        .filter(|p| seen.insert(p.label.as_deref()))
        .cloned()
        .collect()
}

/// Apply visit-status report statuses on top of the APT visit statuses.
///
/// The report reflects the live schedule, so its status wins whenever it has
/// one for the visit.
pub fn resolve_visit_statuses(visits: &[Visit], report: Option<&[VisitStatusEntry]>) -> Vec<Visit> {
    let report_status: HashMap<String, &str> = report
        .unwrap_or_default()
        .iter()
        .filter_map(|entry| {
            let id = normalize_visit_number(entry.visit_id.as_deref()?);
            let status = entry.status.as_deref()?;
            Some((id, status))
        })
        .collect();

    visits
        .iter()
        .map(|visit| {
            let reported = visit
                .visit_number
                .as_deref()
                .and_then(|n| report_status.get(&normalize_visit_number(n)));
            match reported {
                Some(status) => Visit {
                    status: Some(status.to_string()),
                    ..visit.clone()
                },
                None => visit.clone(),
            }
        })
        .collect()
}

/// A visit with its phase window resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitEntry {
    pub visit_number: Option<String>,
    pub status: Option<String>,
    pub label: Option<String>,
    pub phase_start: Option<String>,
    pub phase_end: Option<String>,
}

/// Visit lookup keyed by visit number.
#[derive(Debug, Clone, Default)]
pub struct VisitIndex {
    entries: Vec<VisitEntry>,
    by_number: HashMap<String, usize>,
}

impl VisitIndex {
    /// Build the index from visits (statuses already resolved) and the raw
    /// phase sequence. Visits whose label has no phase keep null phase fields.
    pub fn build(visits: &[Visit], phases: &[Phase]) -> Self {
        let reduced = reduce_phases(phases);
        let mut entries = Vec::with_capacity(visits.len());
        let mut by_number = HashMap::new();

        for visit in visits {
            let phase = visit
                .label
                .as_deref()
                .and_then(|label| reduced.iter().find(|p| p.label.as_deref() == Some(label)));

            if let Some(number) = visit.visit_number.as_deref() {
                // first visit wins on duplicate numbers
                by_number
                    .entry(normalize_visit_number(number))
                    .or_insert(entries.len());
            }

            entries.push(VisitEntry {
                visit_number: visit.visit_number.clone(),
                status: visit.status.clone(),
                label: visit.label.clone(),
                phase_start: phase.and_then(|p| p.start.clone()),
                phase_end: phase.and_then(|p| p.end.clone()),
            });
        }

        Self { entries, by_number }
    }

    pub fn get(&self, visit_number: &str) -> Option<&VisitEntry> {
        self.by_number
            .get(&normalize_visit_number(visit_number))
            .map(|&idx| &self.entries[idx])
    }

    pub fn entries(&self) -> &[VisitEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One visit paired with an observation's orbit count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbitAssignment {
    pub visit_number: Option<String>,
    pub number_of_orbits: Option<String>,
}

impl OrbitAssignment {
    pub fn orbits(&self) -> Option<u32> {
        self.number_of_orbits
            .as_deref()
            .and_then(|s| s.trim().parse::<u32>().ok())
    }
}

/// Entries left over when visits and observations could not be paired
/// one-to-one, even after failed visits were removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentShortfall {
    /// Visits that received no orbit count.
    pub unmatched_visits: Vec<Option<String>>,
    /// Observations whose orbit count went unused.
    pub unmatched_observations: usize,
}

impl std::fmt::Display for AlignmentShortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} visit(s) without orbit counts, {} unused observation(s)",
            self.unmatched_visits.len(),
            self.unmatched_observations
        )
    }
}

/// Result of pairing observations' orbit counts with visits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbitAlignment {
    pub assignments: Vec<OrbitAssignment>,
    pub failed_visits_removed: usize,
    pub shortfall: Option<AlignmentShortfall>,
}

impl OrbitAlignment {
    /// Orbit count for a visit. The first assignment wins if a visit number
    /// repeats.
    pub fn orbits_for(&self, visit_number: &str) -> Option<u32> {
        let key = normalize_visit_number(visit_number);
        self.assignments
            .iter()
            .find(|a| {
                a.visit_number
                    .as_deref()
                    .map(normalize_visit_number)
                    .as_deref()
                    == Some(key.as_str())
            })
            .and_then(OrbitAssignment::orbits)
    }

    /// `true` when every visit and every observation was paired.
    pub fn is_lossless(&self) -> bool {
        self.shortfall.is_none()
    }
}

/// Pair orbit counts with visits by position.
///
/// Equal lengths pair directly. Otherwise failed visits are removed first and
/// the remaining visits are paired; whatever is still left over on either
/// side is reported as an [`AlignmentShortfall`].
pub fn align_orbits(visits: &[Visit], observations: &[Observation]) -> OrbitAlignment {
    let (candidates, failed_visits_removed): (Vec<&Visit>, usize) =
        if visits.len() == observations.len() {
            (visits.iter().collect(), 0)
        } else {
            let kept: Vec<&Visit> = visits
                .iter()
                .filter(|v| !is_failed_status(v.status.as_deref()))
                .collect();
            let removed = visits.len() - kept.len();
            debug!(
                "{} visits vs {} observations, removed {} failed visits",
                visits.len(),
                observations.len(),
                removed
            );
            (kept, removed)
        };

    let assignments: Vec<OrbitAssignment> = candidates
        .iter()
        .zip(observations.iter())
        .map(|(visit, obs)| OrbitAssignment {
            visit_number: visit.visit_number.clone(),
            number_of_orbits: obs.number_of_orbits.clone(),
        })
        .collect();

    let shortfall = if candidates.len() == observations.len() {
        None
    } else {
        Some(AlignmentShortfall {
            unmatched_visits: candidates
                .iter()
                .skip(observations.len())
                .map(|v| v.visit_number.clone())
                .collect(),
            unmatched_observations: observations.len().saturating_sub(candidates.len()),
        })
    };

    OrbitAlignment {
        assignments,
        failed_visits_removed,
        shortfall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit(number: &str, status: &str, label: &str) -> Visit {
        Visit {
            visit_number: Some(number.to_string()),
            status: Some(status.to_string()),
            label: Some(label.to_string()),
        }
    }

    fn obs(target: &str, orbits: &str) -> Observation {
        Observation {
            target_name: Some(target.to_string()),
            number_of_orbits: Some(orbits.to_string()),
        }
    }

    fn phase(start: &str, end: &str, label: &str) -> Phase {
        Phase {
            start: Some(start.to_string()),
            end: Some(end.to_string()),
            label: Some(label.to_string()),
        }
    }

    #[test]
    fn test_reduce_phases_first_wins() {
        let phases = vec![
            phase("0.1", "0.2", "A"),
            phase("0.5", "0.6", "B"),
            phase("0.9", "0.95", "A"),
        ];
        let reduced = reduce_phases(&phases);
        assert_eq!(reduced.len(), 2);
        assert_eq!(reduced[0].start.as_deref(), Some("0.1"));
        assert_eq!(reduced[1].label.as_deref(), Some("B"));
    }

    #[test]
    fn test_reduce_phases_idempotent() {
        let phases = vec![
            phase("0.1", "0.2", "A"),
            phase("0.3", "0.4", "A"),
            phase("0.5", "0.6", "B"),
        ];
        let once = reduce_phases(&phases);
        let twice = reduce_phases(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_visit_index_phase_lookup() {
        let visits = vec![
            visit("1", "Executed", "A"),
            visit("2", "Executed", "A"),
            visit("3", "Scheduled", "C"),
        ];
        let phases = vec![phase("0.1", "0.2", "A"), phase("0.7", "0.8", "A")];

        let index = VisitIndex::build(&visits, &phases);
        assert_eq!(index.len(), 3);
        assert_eq!(index.get("1").unwrap().phase_start.as_deref(), Some("0.1"));
        assert_eq!(index.get("2").unwrap().phase_end.as_deref(), Some("0.2"));
        // no phase for label C: null, not zero
        assert_eq!(index.get("3").unwrap().phase_start, None);
        assert_eq!(index.get("03").unwrap().label.as_deref(), Some("C"));
        assert!(index.get("4").is_none());
    }

    #[test]
    fn test_resolve_statuses_from_report() {
        let visits = vec![visit("01", "Scheduled", "A"), visit("02", "Scheduled", "B")];
        let report = vec![VisitStatusEntry {
            visit_id: Some("1".to_string()),
            status: Some("Failed".to_string()),
            target: None,
            start_time: None,
            end_time: None,
        }];

        let resolved = resolve_visit_statuses(&visits, Some(&report));
        assert_eq!(resolved[0].status.as_deref(), Some("Failed"));
        assert_eq!(resolved[1].status.as_deref(), Some("Scheduled"));

        let untouched = resolve_visit_statuses(&visits, None);
        assert_eq!(untouched, visits);
    }

    #[test]
    fn test_align_equal_lengths_positional() {
        let visits = vec![visit("1", "Failed", "A"), visit("2", "Executed", "B")];
        let observations = vec![obs("A", "3"), obs("B", "6")];

        let alignment = align_orbits(&visits, &observations);
        assert_eq!(alignment.failed_visits_removed, 0);
        assert!(alignment.is_lossless());
        assert_eq!(alignment.orbits_for("1"), Some(3));
        assert_eq!(alignment.orbits_for("2"), Some(6));
    }

    #[test]
    fn test_align_removes_failed_visits() {
        let visits = vec![
            visit("1", "Executed", "A"),
            visit("2", "Failed", "B"),
            visit("3", "Executed", "C"),
        ];
        let observations = vec![obs("targetA", "5"), obs("targetC", "3")];

        let alignment = align_orbits(&visits, &observations);
        assert_eq!(alignment.failed_visits_removed, 1);
        assert!(alignment.is_lossless());
        assert_eq!(alignment.orbits_for("1"), Some(5));
        assert_eq!(alignment.orbits_for("3"), Some(3));
        assert_eq!(alignment.orbits_for("2"), None);
    }

    #[test]
    fn test_align_reports_shortfall_of_visits() {
        let visits = vec![
            visit("1", "Executed", "A"),
            visit("2", "Executed", "B"),
            visit("3", "Scheduled", "C"),
        ];
        let observations = vec![obs("A", "2")];

        let alignment = align_orbits(&visits, &observations);
        assert_eq!(alignment.assignments.len(), 1);
        let shortfall = alignment.shortfall.expect("shortfall must be reported");
        assert_eq!(
            shortfall.unmatched_visits,
            vec![Some("2".to_string()), Some("3".to_string())]
        );
        assert_eq!(shortfall.unmatched_observations, 0);
    }

    #[test]
    fn test_align_reports_shortfall_of_observations() {
        let visits = vec![visit("1", "Executed", "A"), visit("2", "Failed", "B")];
        let observations = vec![obs("A", "2"), obs("B", "2"), obs("C", "4")];

        let alignment = align_orbits(&visits, &observations);
        assert_eq!(alignment.failed_visits_removed, 1);
        assert_eq!(alignment.assignments.len(), 1);
        let shortfall = alignment.shortfall.unwrap();
        assert!(shortfall.unmatched_visits.is_empty());
        assert_eq!(shortfall.unmatched_observations, 2);
    }

    #[test]
    fn test_unparsable_orbit_count_is_null() {
        let visits = vec![visit("1", "Executed", "A")];
        let observations = vec![obs("A", "TBD")];
        let alignment = align_orbits(&visits, &observations);
        assert!(alignment.is_lossless());
        assert_eq!(alignment.orbits_for("1"), None);
    }
}
