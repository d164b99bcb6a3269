//! Python bindings for the ExoCat pipeline.
//!
//! Available as the `exocat_apt` Python module when built with the `python`
//! feature.

use chrono::Local;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::path::{Path, PathBuf};

use crate::core::domain::ProposalId;
use crate::io::writer::write_table;
use crate::preprocessing::pipeline::{ExocatPipeline, PipelineResult};
use crate::preprocessing::reconciler::ReconcileOutcome;

fn run_pipeline(
    proposal_number: &str,
    apt_path: &str,
    visit_status_path: Option<&str>,
) -> PyResult<PipelineResult> {
    ExocatPipeline::new()
        .process_files(
            &ProposalId::new(proposal_number),
            Path::new(apt_path),
            visit_status_path.map(Path::new),
        )
        .map_err(|e| PyValueError::new_err(format!("{:#}", e)))
}

/// Reconcile an APT file and write the ExoCat table
///
/// Args:
///     proposal_number: HST proposal identifier
///     apt_path: Path to the downloaded `.apt` file
///     output_dir: Directory for the CSV table (default: current directory)
///     visit_status_path: Optional visit-status report
///
/// Returns:
///     str | None: Path of the written table, or None when no exposure uses
///     an accepted spectral element
#[pyfunction]
#[pyo3(signature = (proposal_number, apt_path, output_dir=".", visit_status_path=None))]
pub fn read_apt(
    proposal_number: &str,
    apt_path: &str,
    output_dir: &str,
    visit_status_path: Option<&str>,
) -> PyResult<Option<String>> {
    let result = run_pipeline(proposal_number, apt_path, visit_status_path)?;

    match &result.outcome {
        ReconcileOutcome::NoQualifyingExposures => Ok(None),
        ReconcileOutcome::Reconciled(reconciliation) => {
            let path = write_table(
                &reconciliation.records,
                &PathBuf::from(output_dir),
                &result.proposal_id,
                &Local::now().naive_local(),
            )
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
            Ok(Some(path.to_string_lossy().into_owned()))
        }
    }
}

/// Reconcile an APT file and return its rows as dicts
///
/// Example:
///     >>> rows = exocat_apt.reconcile_apt("15469", "15469.apt")
///     >>> rows[0]["spectral_element"]
///     'G141'
#[pyfunction]
#[pyo3(signature = (proposal_number, apt_path, visit_status_path=None))]
pub fn reconcile_apt<'py>(
    py: Python<'py>,
    proposal_number: &str,
    apt_path: &str,
    visit_status_path: Option<&str>,
) -> PyResult<Vec<Bound<'py, PyDict>>> {
    let result = run_pipeline(proposal_number, apt_path, visit_status_path)?;

    result
        .records()
        .iter()
        .map(|record| {
            let dict = PyDict::new(py);
            for (column, value) in record.to_string_map() {
                dict.set_item(column, value)?;
            }
            Ok(dict)
        })
        .collect()
}
