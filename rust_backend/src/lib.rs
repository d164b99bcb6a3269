//! ExoCat APT reconciler.
//!
//! Fetches HST Phase II proposal documents, extracts their observation
//! planning fields and reconciles them into one row per grism exposure.

#[cfg(feature = "python")]
use pyo3::prelude::*;

pub mod config;
pub mod core;
pub mod error;
pub mod fetch;
pub mod io;
pub mod models;
pub mod parsing;
pub mod preprocessing;
pub mod services;

#[cfg(feature = "python")]
pub mod python;

pub use error::{ExocatError, ExocatResult, FetchError, FetchResult};

/// ExoCat APT reconciler Python module
#[cfg(feature = "python")]
#[pymodule]
fn exocat_apt(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(python::read_apt, m)?)?;
    m.add_function(wrap_pyfunction!(python::reconcile_apt, m)?)?;
    Ok(())
}
