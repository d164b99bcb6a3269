//! Observation record reconciliation.
//!
//! Merges the per-category sequences of one proposal into one
//! [`ReconciledRecord`] per exposure that uses an accepted spectral element.
//! Joins go through keys carried from extraction wherever the document
//! provides one:
//!
//! | join                  | key                                   |
//! |-----------------------|---------------------------------------|
//! | exposure -> target    | target name (exact, case-sensitive)   |
//! | exposure -> scan      | exposure extraction index             |
//! | exposure -> visit     | visit number                          |
//! | visit -> phase        | visit label, first phase per label    |
//! | visit -> orbit count  | position (see [`align_orbits`])       |

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::domain::{Exposure, ProposalExtract, SpatialScan, Target, VisitStatusEntry};
use crate::models::ReconciledRecord;
use crate::preprocessing::alignment::{
    align_orbits, resolve_visit_statuses, AlignmentShortfall, OrbitAlignment, VisitIndex,
};

/// Default accepted spectral elements (WFC3/IR grisms).
pub const DEFAULT_SPECTRAL_ELEMENTS: &[&str] = &["G141", "G102"];

/// Set of accepted spectral elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectralElementFilter {
    accepted: Vec<String>,
}

impl Default for SpectralElementFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SPECTRAL_ELEMENTS.iter().map(|s| s.to_string()))
    }
}

impl SpectralElementFilter {
    pub fn new(accepted: impl IntoIterator<Item = String>) -> Self {
        Self {
            accepted: accepted
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// The accepted element matching `element`, if any.
    pub fn matching(&self, element: Option<&str>) -> Option<&str> {
        let element = element?.trim();
        self.accepted
            .iter()
            .find(|a| a.as_str() == element)
            .map(String::as_str)
    }

    pub fn accepts(&self, element: Option<&str>) -> bool {
        self.matching(element).is_some()
    }

    pub fn accepted(&self) -> &[String] {
        &self.accepted
    }
}

/// Optional category absent from a proposal document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Targets,
    Observations,
    Visits,
    SpatialScans,
    Phases,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::Targets => "target",
            Category::Observations => "observation",
            Category::Visits => "visit",
            Category::SpatialScans => "spatial scan",
            Category::Phases => "phase",
        };
        write!(f, "{}", name)
    }
}

/// Reconciled table of one proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub records: Vec<ReconciledRecord>,
    pub orbit_alignment: OrbitAlignment,
    pub absent_categories: Vec<Category>,
    /// Rows whose display name came from a label instead of a target name.
    pub fallback_names: usize,
}

impl Reconciliation {
    pub fn shortfall(&self) -> Option<&AlignmentShortfall> {
        self.orbit_alignment.shortfall.as_ref()
    }
}

/// Outcome of reconciling one proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No exposure uses an accepted spectral element. Valid, not an error.
    NoQualifyingExposures,
    Reconciled(Reconciliation),
}

impl ReconcileOutcome {
    pub fn records(&self) -> &[ReconciledRecord] {
        match self {
            ReconcileOutcome::NoQualifyingExposures => &[],
            ReconcileOutcome::Reconciled(r) => &r.records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

/// Display name for an exposure row: the declared target name, else the
/// owning visit's label, else the exposure's own label.
pub fn resolve_display_name(exposure: &Exposure, visits: &VisitIndex) -> Option<String> {
    if let Some(name) = &exposure.target_name {
        return Some(name.clone());
    }

    exposure
        .visit_number
        .as_deref()
        .and_then(|n| visits.get(n))
        .and_then(|v| v.label.clone())
        .or_else(|| exposure.label.clone())
}

/// Reconciles extracted proposal content into output records.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    filter: SpectralElementFilter,
}

impl Reconciler {
    pub fn new(filter: SpectralElementFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &SpectralElementFilter {
        &self.filter
    }

    /// Reconcile one proposal.
    ///
    /// # Arguments
    /// * `extract` - Sequences extracted from the APT document
    /// * `visit_status` - Entries of the visit-status report, when available
    pub fn reconcile(
        &self,
        extract: &ProposalExtract,
        visit_status: Option<&[VisitStatusEntry]>,
    ) -> ReconcileOutcome {
        let proposal = &extract.proposal_id;

        // Step 1: keep exposures using an accepted element, with their index
        let retained: Vec<(usize, &Exposure, &str)> = extract
            .exposures
            .iter()
            .enumerate()
            .filter_map(|(idx, e)| {
                self.filter
                    .matching(e.spectral_element.as_deref())
                    .map(|elem| (idx, e, elem))
            })
            .collect();

        if retained.is_empty() {
            info!(
                "Proposal {}: no exposures with spectral element in {:?}",
                proposal,
                self.filter.accepted()
            );
            return ReconcileOutcome::NoQualifyingExposures;
        }

        let absent_categories = absent_categories(extract);
        for category in &absent_categories {
            info!("Proposal {} has no {} info.", proposal, category);
        }

        // Step 2: visit index with resolved statuses and phase windows
        let visits = resolve_visit_statuses(&extract.visits, visit_status);
        let visit_index = VisitIndex::build(&visits, &extract.phases);

        // Step 3: orbit counts
        let orbit_alignment = align_orbits(&visits, &extract.observations);
        if let Some(shortfall) = &orbit_alignment.shortfall {
            warn!(
                "Proposal {}: orbit alignment shortfall after removing {} failed visits: {}",
                proposal, orbit_alignment.failed_visits_removed, shortfall
            );
        }

        // Steps 4 and 6: keyed lookups, first entry wins
        let targets = index_targets(&extract.targets);
        let scans = index_scans(&extract.spatial_scans);

        let mut fallback_names = 0;
        let records: Vec<ReconciledRecord> = retained
            .into_iter()
            .map(|(idx, exposure, element)| {
                let target = exposure
                    .target_name
                    .as_deref()
                    .and_then(|name| targets.get(name));
                let scan = scans.get(&idx);
                let visit = exposure
                    .visit_number
                    .as_deref()
                    .and_then(|n| visit_index.get(n));

                // Step 5
                let display_name = resolve_display_name(exposure, &visit_index);
                if exposure.target_name.is_none() && display_name.is_some() {
                    fallback_names += 1;
                }

                ReconciledRecord {
                    target_name: display_name,
                    ra: target.and_then(|t| t.right_ascension.clone()),
                    dec: target.and_then(|t| t.declination.clone()),
                    spectral_element: element.to_string(),
                    rate: scan.and_then(|s| s.rate.clone()),
                    direction: scan.and_then(|s| s.direction.clone()),
                    visit_number: exposure.visit_number.clone(),
                    status: visit.and_then(|v| v.status.clone()),
                    phase_start: visit.and_then(|v| v.phase_start.clone()),
                    phase_end: visit.and_then(|v| v.phase_end.clone()),
                    number_orbits: exposure
                        .visit_number
                        .as_deref()
                        .and_then(|n| orbit_alignment.orbits_for(n)),
                    // Step 7
                    proposal_number: proposal.to_string(),
                }
            })
            .collect();

        debug!(
            "Proposal {}: {} of {} exposures reconciled, {} fallback names",
            proposal,
            records.len(),
            extract.exposures.len(),
            fallback_names
        );

        ReconcileOutcome::Reconciled(Reconciliation {
            records,
            orbit_alignment,
            absent_categories,
            fallback_names,
        })
    }
}

fn index_targets(targets: &[Target]) -> HashMap<&str, &Target> {
    let mut index = HashMap::new();
    for target in targets {
        if let Some(name) = target.name.as_deref() {
            index.entry(name).or_insert(target);
        }
    }
    index
}

fn index_scans(scans: &[SpatialScan]) -> HashMap<usize, &SpatialScan> {
    let mut index = HashMap::new();
    for scan in scans {
        index.entry(scan.exposure_index).or_insert(scan);
    }
    index
}

fn absent_categories(extract: &ProposalExtract) -> Vec<Category> {
    let mut absent = Vec::new();
    if extract.targets.is_empty() {
        absent.push(Category::Targets);
    }
    if extract.observations.is_empty() {
        absent.push(Category::Observations);
    }
    if extract.visits.is_empty() {
        absent.push(Category::Visits);
    }
    if extract.spatial_scans.is_empty() {
        absent.push(Category::SpatialScans);
    }
    if extract.phases.is_empty() {
        absent.push(Category::Phases);
    }
    absent
}
