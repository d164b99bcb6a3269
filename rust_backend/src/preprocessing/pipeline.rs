use anyhow::{Context, Result};
use log::warn;
use polars::prelude::*;
use std::path::Path;

use crate::core::domain::{ProposalId, VisitStatusEntry};
use crate::error::ExocatResult;
use crate::io::loaders::ProposalLoader;
use crate::io::writer::records_to_dataframe;
use crate::models::ReconciledRecord;
use crate::parsing::{apt_parser, visit_status_parser};
use crate::preprocessing::reconciler::{ReconcileOutcome, Reconciler, SpectralElementFilter};
use crate::preprocessing::screening::ExoplanetScreen;
use crate::preprocessing::validator::{RecordValidator, ValidationResult};

/// Result of processing one proposal
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub proposal_id: ProposalId,
    pub outcome: ReconcileOutcome,
    pub validation: ValidationResult,
    pub total_exposures: usize,
    /// Whether a visit-status report contributed statuses.
    pub used_visit_status: bool,
}

impl PipelineResult {
    pub fn records(&self) -> &[ReconciledRecord] {
        self.outcome.records()
    }

    pub fn to_dataframe(&self) -> ExocatResult<DataFrame> {
        records_to_dataframe(self.records())
    }
}

/// Configuration for the proposal pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub filter: SpectralElementFilter,
    pub screen: ExoplanetScreen,
    pub validate: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            filter: SpectralElementFilter::default(),
            screen: ExoplanetScreen::default(),
            validate: true,
        }
    }
}

/// Parse, reconcile and validate one proposal's documents
pub struct ExocatPipeline {
    config: PipelineConfig,
    reconciler: Reconciler,
    validator: RecordValidator,
}

impl ExocatPipeline {
    /// Create a new pipeline with default configuration
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    /// Create a pipeline with custom configuration
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            reconciler: Reconciler::new(config.filter.clone()),
            validator: RecordValidator::new(config.filter.clone()),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Abstract keyword screen on the raw APT document
    pub fn is_exoplanet_program(&self, apt_bytes: &[u8]) -> bool {
        self.config.screen.is_exoplanet_program(apt_bytes)
    }

    /// Process raw document bytes
    ///
    /// # Arguments
    /// * `proposal` - Proposal the documents belong to
    /// * `apt_bytes` - APT document
    /// * `visit_status_bytes` - Visit-status report, if one was fetched
    ///
    /// A malformed APT document is an error. A malformed visit-status report
    /// is logged and ignored, leaving the APT statuses in place.
    pub fn process_bytes(
        &self,
        proposal: &ProposalId,
        apt_bytes: &[u8],
        visit_status_bytes: Option<&[u8]>,
    ) -> ExocatResult<PipelineResult> {
        // Step 1: Extract
        let extract = apt_parser::parse_apt_bytes(proposal, apt_bytes)?;

        // Step 2: Visit status (best effort)
        let visit_status = visit_status_bytes.and_then(|bytes| {
            match visit_status_parser::parse_visit_status_bytes(proposal, bytes) {
                Ok(entries) => Some(entries),
                Err(e) => {
                    warn!("Ignoring visit status report: {}", e);
                    None
                }
            }
        });

        Ok(self.finish(extract, visit_status))
    }

    /// Process from strings (useful for testing)
    pub fn process_str(
        &self,
        proposal: &ProposalId,
        apt_xml: &str,
        visit_status_xml: Option<&str>,
    ) -> ExocatResult<PipelineResult> {
        self.process_bytes(
            proposal,
            apt_xml.as_bytes(),
            visit_status_xml.map(str::as_bytes),
        )
    }

    /// Process documents stored on disk
    ///
    /// Same tolerance as `process_bytes`: only the APT file has to load.
    pub fn process_files(
        &self,
        proposal: &ProposalId,
        apt_path: &Path,
        visit_status_path: Option<&Path>,
    ) -> Result<PipelineResult> {
        let loaded = ProposalLoader::load_from_files(proposal, apt_path, visit_status_path)
            .context("Failed to load proposal documents")?;

        Ok(self.finish(loaded.extract, loaded.visit_status))
    }

    fn finish(
        &self,
        extract: crate::core::domain::ProposalExtract,
        visit_status: Option<Vec<VisitStatusEntry>>,
    ) -> PipelineResult {
        // Step 3: Reconcile
        let outcome = self.reconciler.reconcile(&extract, visit_status.as_deref());

        // Step 4: Validate (if requested)
        let validation = match (&outcome, self.config.validate) {
            (ReconcileOutcome::Reconciled(r), true) => {
                self.validator.validate(&r.records, Some(r))
            }
            _ => ValidationResult::new(),
        };

        PipelineResult {
            proposal_id: extract.proposal_id,
            outcome,
            validation,
            total_exposures: extract.exposures.len(),
            used_visit_status: visit_status.is_some(),
        }
    }
}

impl Default for ExocatPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to reconcile one APT file with default settings
pub fn reconcile_apt_file(proposal: &ProposalId, apt_path: &Path) -> Result<PipelineResult> {
    ExocatPipeline::new().process_files(proposal, apt_path, None)
}
