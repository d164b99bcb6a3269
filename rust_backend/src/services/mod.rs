//! Batch orchestration.
//!
//! [`batch`] drives proposals from a [`crate::fetch::ProposalSource`] through
//! the pipeline and into output tables, recording every step in a
//! [`run_log::RunLog`].

pub mod batch;
pub mod run_log;

pub use batch::{format_elapsed, BatchReport, BatchRunner, ProposalOutcome, ProposalReport};
pub use run_log::{FileRunLog, MemoryRunLog, RunLog};
