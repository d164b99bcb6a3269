//! Domain models for Phase II proposal content.
//!
//! These are the flat per-category sequences the field extractor pulls out of
//! an APT document, plus the reconciled output row. Every value is kept as
//! the raw attribute string from the document; nothing is normalized here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// HST proposal identifier, e.g. `"15469"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(String);

impl ProposalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProposalId {
    fn from(s: &str) -> Self {
        ProposalId::new(s)
    }
}

impl From<String> for ProposalId {
    fn from(s: String) -> Self {
        ProposalId::new(s)
    }
}

/// A fixed target declared in the proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: Option<String>,
    /// `"<hrs> <mins> <secs>"`
    pub right_ascension: Option<String>,
    /// `"<deg> <arcmin> <arcsec>"`
    pub declination: Option<String>,
}

/// An observation block. Several observations may reference one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub target_name: Option<String>,
    pub number_of_orbits: Option<String>,
}

impl Observation {
    /// Orbit count as an integer, `None` when absent or unparsable.
    pub fn orbits(&self) -> Option<u32> {
        self.number_of_orbits
            .as_deref()
            .and_then(|s| s.trim().parse::<u32>().ok())
    }
}

/// A scheduled execution unit grouping exposures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub visit_number: Option<String>,
    pub status: Option<String>,
    pub label: Option<String>,
}

/// One exposure inside a visit's exposure group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exposure {
    pub exposure_number: Option<String>,
    pub target_name: Option<String>,
    pub spectral_element: Option<String>,
    pub label: Option<String>,
    /// Number of the visit this exposure was found under.
    pub visit_number: Option<String>,
}

/// Spatial scan parameters of a scanning-mode exposure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialScan {
    pub rate: Option<String>,
    pub direction: Option<String>,
    /// Position of the owning exposure in the exposure sequence.
    pub exposure_index: usize,
}

/// Phase window constraint, attached to visits through the visit label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub start: Option<String>,
    pub end: Option<String>,
    pub label: Option<String>,
}

/// One `<visit>` entry of a visit-status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitStatusEntry {
    pub visit_id: Option<String>,
    pub status: Option<String>,
    pub target: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Everything extracted from one APT document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalExtract {
    pub proposal_id: ProposalId,
    pub targets: Vec<Target>,
    pub observations: Vec<Observation>,
    pub visits: Vec<Visit>,
    pub exposures: Vec<Exposure>,
    pub spatial_scans: Vec<SpatialScan>,
    pub phases: Vec<Phase>,
}

impl ProposalExtract {
    pub fn new(proposal_id: ProposalId) -> Self {
        Self {
            proposal_id,
            ..Default::default()
        }
    }
}

/// `true` when a visit status string marks a failed visit.
pub fn is_failed_status(status: Option<&str>) -> bool {
    status
        .map(|s| s.to_ascii_lowercase().contains("fail"))
        .unwrap_or(false)
}

/// Visit numbers compare equal regardless of zero padding (`"01"` == `"1"`).
pub fn normalize_visit_number(number: &str) -> String {
    let trimmed = number.trim();
    let stripped = trimmed.trim_start_matches('0');
    if stripped.is_empty() && !trimmed.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}
