//! Reconciled table validation with error and warning reporting.
//!
//! Checks a proposal's reconciled records for invariant breaks (errors) and
//! for data gaps worth reviewing before catalog assembly (warnings).

use serde::{Deserialize, Serialize};

use crate::models::ReconciledRecord;
use crate::preprocessing::reconciler::{Reconciliation, SpectralElementFilter};

/// Number of per-row messages emitted for one issue kind before summarizing.
const MAX_REPORTED: usize = 5;

/// Validation result with categorized issues and statistics.
///
/// Errors make `is_valid` false, warnings are informational.
///
/// # Examples
///
/// ```
/// use exocat_apt::preprocessing::validator::ValidationResult;
///
/// let mut result = ValidationResult::new();
/// assert!(result.is_valid);
///
/// result.add_warning("Record 0 has no phase window".to_string());
/// assert!(result.is_valid);
///
/// result.add_error("Record 1 has no proposal number".to_string());
/// assert!(!result.is_valid);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: ValidationStats,
}

/// Summary statistics computed during validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total_records: usize,
    pub complete_records: usize,
    pub invalid_spectral_elements: usize,
    pub missing_proposal_numbers: usize,
    pub missing_coordinates: usize,
    pub missing_phases: usize,
    pub missing_scans: usize,
    pub missing_orbits: usize,
    pub unparsable_orbits: usize,
    pub unmatched_visits: usize,
    pub unmatched_observations: usize,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            stats: ValidationStats::default(),
        }
    }

    /// Adds a critical error and marks the result as invalid.
    pub fn add_error(&mut self, error: String) {
        self.is_valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator for reconciled observation records.
///
/// # Examples
///
/// ```
/// use exocat_apt::preprocessing::reconciler::SpectralElementFilter;
/// use exocat_apt::preprocessing::validator::RecordValidator;
///
/// let validator = RecordValidator::new(SpectralElementFilter::default());
/// let result = validator.validate(&[], None);
/// assert!(result.is_valid);
/// assert_eq!(result.stats.total_records, 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordValidator {
    filter: SpectralElementFilter,
}

impl RecordValidator {
    pub fn new(filter: SpectralElementFilter) -> Self {
        Self { filter }
    }

    /// Validates one proposal's records.
    ///
    /// # Arguments
    ///
    /// * `records` - Rows produced by the reconciler
    /// * `reconciliation` - The reconciliation the rows came from, used for
    ///   orbit alignment diagnostics
    pub fn validate(
        &self,
        records: &[ReconciledRecord],
        reconciliation: Option<&Reconciliation>,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.stats.total_records = records.len();

        for (row, record) in records.iter().enumerate() {
            self.validate_record(row, record, &mut result);
        }

        let stats = result.stats.clone();
        summarize(
            &mut result,
            "missing coordinates",
            stats.missing_coordinates,
        );
        summarize(&mut result, "missing phase windows", stats.missing_phases);
        summarize(&mut result, "missing orbit counts", stats.missing_orbits);

        if let Some(reconciliation) = reconciliation {
            Self::validate_alignment(reconciliation, &mut result);
        }

        result
    }

    fn validate_record(
        &self,
        row: usize,
        record: &ReconciledRecord,
        result: &mut ValidationResult,
    ) {
        if record.is_complete() {
            result.stats.complete_records += 1;
        }

        if !self.filter.accepts(Some(&record.spectral_element)) {
            result.stats.invalid_spectral_elements += 1;
            result.add_error(format!(
                "Record {} has spectral element '{}' outside {:?}",
                row,
                record.spectral_element,
                self.filter.accepted()
            ));
        }

        if record.proposal_number.trim().is_empty() {
            result.stats.missing_proposal_numbers += 1;
            result.add_error(format!("Record {} has no proposal number", row));
        }

        if record.ra.is_none() || record.dec.is_none() {
            result.stats.missing_coordinates += 1;
            if result.stats.missing_coordinates <= MAX_REPORTED {
                result.add_warning(format!(
                    "Record {} ({}) has no coordinates",
                    row,
                    record.target_name.as_deref().unwrap_or("unnamed")
                ));
            }
        }

        if record.phase_start.is_none() && record.phase_end.is_none() {
            result.stats.missing_phases += 1;
            if result.stats.missing_phases <= MAX_REPORTED {
                result.add_warning(format!("Record {} has no phase window", row));
            }
        }

        if record.rate.is_none() && record.direction.is_none() {
            result.stats.missing_scans += 1;
        }

        if record.number_orbits.is_none() {
            result.stats.missing_orbits += 1;
            if result.stats.missing_orbits <= MAX_REPORTED {
                result.add_warning(format!(
                    "Record {} (visit {}) has no orbit count",
                    row,
                    record.visit_number.as_deref().unwrap_or("?")
                ));
            }
        }
    }

    fn validate_alignment(reconciliation: &Reconciliation, result: &mut ValidationResult) {
        for assignment in &reconciliation.orbit_alignment.assignments {
            if let Some(raw) = assignment.number_of_orbits.as_deref() {
                if assignment.orbits().is_none() {
                    result.stats.unparsable_orbits += 1;
                    result.add_warning(format!(
                        "Visit {} has unparsable orbit count '{}'",
                        assignment.visit_number.as_deref().unwrap_or("?"),
                        raw
                    ));
                }
            }
        }

        if let Some(shortfall) = reconciliation.shortfall() {
            result.stats.unmatched_visits = shortfall.unmatched_visits.len();
            result.stats.unmatched_observations = shortfall.unmatched_observations;
            result.add_warning(format!("Orbit alignment shortfall: {}", shortfall));
        }
    }
}

fn summarize(result: &mut ValidationResult, issue: &str, count: usize) {
    if count > MAX_REPORTED {
        result.add_warning(format!(
            "Total records with {}: {} (showing first {})",
            issue, count, MAX_REPORTED
        ));
    }
}
