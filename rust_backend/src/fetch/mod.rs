//! Proposal document sources.
//!
//! A [`ProposalSource`] discovers proposal identifiers and supplies the raw
//! bytes of their APT documents and visit-status reports. Parsing happens
//! downstream, so a source never needs to understand the documents.
//!
//! # Implementations
//!
//! - [`StsciSource`]: STScI Phase II archive over HTTP, MAST for discovery
//! - [`LocalSource`]: in-memory documents, optionally loaded from a directory
//!   of earlier downloads

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::core::domain::ProposalId;
use crate::error::FetchResult;

pub mod local;
pub mod stsci;

pub use local::LocalSource;
pub use stsci::StsciSource;

/// Supplier of raw proposal documents.
#[async_trait]
pub trait ProposalSource: Send + Sync {
    /// Distinct proposal identifiers available from this source.
    async fn discover_proposals(&self) -> FetchResult<BTreeSet<ProposalId>>;

    /// Raw bytes of the proposal's APT document.
    async fn fetch_apt(&self, proposal: &ProposalId) -> FetchResult<Vec<u8>>;

    /// Raw bytes of the proposal's visit-status report.
    async fn fetch_visit_status(&self, proposal: &ProposalId) -> FetchResult<Vec<u8>>;
}
