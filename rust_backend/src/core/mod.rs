//! Core domain models for Phase II proposals.
//!
//! This module defines the per-category entities extracted from APT documents
//! (targets, observations, visits, exposures, spatial scans, phases) and the
//! visit-status report entries.

pub mod domain;

pub use domain::*;
