//! Batch processing of proposals.
//!
//! For each proposal: fetch the APT document, screen its abstract, fetch the
//! visit-status report, reconcile, write the table. A failure on one proposal
//! is recorded and the batch moves on, and so does a failed run log write.

use chrono::{Local, NaiveDateTime};
use log::{info, warn};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::core::domain::ProposalId;
use crate::error::{ExocatError, ExocatResult};
use crate::fetch::ProposalSource;
use crate::io::writer::write_table;
use crate::preprocessing::alignment::AlignmentShortfall;
use crate::preprocessing::pipeline::ExocatPipeline;
use crate::preprocessing::reconciler::ReconcileOutcome;
use crate::services::run_log::RunLog;

/// What happened to one proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProposalOutcome {
    Written {
        path: PathBuf,
        rows: usize,
        shortfall: Option<AlignmentShortfall>,
    },
    NoQualifyingExposures,
    NotExoplanetProgram,
    FetchFailed(String),
    Malformed(String),
    WriteFailed(String),
}

impl ProposalOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, ProposalOutcome::Written { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ProposalOutcome::FetchFailed(_)
                | ProposalOutcome::Malformed(_)
                | ProposalOutcome::WriteFailed(_)
        )
    }
}

impl fmt::Display for ProposalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalOutcome::Written {
                path,
                rows,
                shortfall,
            } => {
                write!(f, "wrote {} rows to {}", rows, path.display())?;
                if let Some(s) = shortfall {
                    write!(f, " (orbit alignment shortfall: {})", s)?;
                }
                Ok(())
            }
            ProposalOutcome::NoQualifyingExposures => write!(f, "no qualifying exposures"),
            ProposalOutcome::NotExoplanetProgram => write!(f, "not an exoplanet program"),
            ProposalOutcome::FetchFailed(e) => write!(f, "fetch failed: {}", e),
            ProposalOutcome::Malformed(e) => write!(f, "malformed document: {}", e),
            ProposalOutcome::WriteFailed(e) => write!(f, "write failed: {}", e),
        }
    }
}

/// Per-proposal entry of a batch report.
#[derive(Debug, Clone, Serialize)]
pub struct ProposalReport {
    pub proposal: ProposalId,
    pub outcome: ProposalOutcome,
    pub download: Duration,
    pub parse: Duration,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub proposals: Vec<ProposalReport>,
    /// Run log writes that failed during the batch.
    pub run_log_failures: usize,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.count(ProposalOutcome::is_written)
    }

    pub fn failed(&self) -> usize {
        self.count(ProposalOutcome::is_failure)
    }

    pub fn skipped(&self) -> usize {
        self.proposals.len() - self.written() - self.failed()
    }

    pub fn outcome_of(&self, proposal: &ProposalId) -> Option<&ProposalOutcome> {
        self.proposals
            .iter()
            .find(|r| &r.proposal == proposal)
            .map(|r| &r.outcome)
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} proposals: {} written, {} skipped, {} failed",
            self.proposals.len(),
            self.written(),
            self.skipped(),
            self.failed()
        );
        if self.run_log_failures > 0 {
            summary.push_str(&format!(", {} run log writes failed", self.run_log_failures));
        }
        summary
    }

    fn count(&self, pred: impl Fn(&ProposalOutcome) -> bool) -> usize {
        self.proposals.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Run log writer that counts failed writes instead of stopping the batch.
struct RunLogSink<'a> {
    log: &'a mut dyn RunLog,
    failures: usize,
}

impl<'a> RunLogSink<'a> {
    fn new(log: &'a mut dyn RunLog) -> Self {
        Self { log, failures: 0 }
    }

    fn record(&mut self, message: &str) {
        if let Err(e) = self.log.record(message) {
            if self.failures == 0 {
                warn!("Run log write failed: {}", e);
            }
            self.failures += 1;
        }
    }
}

/// Elapsed time as `H:MM:SS.ffffff`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{}:{:02}:{:02}.{:06}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        elapsed.subsec_micros()
    )
}

/// Drives proposals from a source through the pipeline into output tables.
pub struct BatchRunner<S: ProposalSource> {
    source: S,
    pipeline: ExocatPipeline,
    output_dir: PathBuf,
    fetch_visit_status: bool,
}

impl<S: ProposalSource> BatchRunner<S> {
    pub fn new(source: S, pipeline: ExocatPipeline, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            pipeline,
            output_dir: output_dir.into(),
            fetch_visit_status: true,
        }
    }

    pub fn with_visit_status(mut self, enabled: bool) -> Self {
        self.fetch_visit_status = enabled;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Discover proposals from the source, then process them all.
    pub async fn run_discovered(&self, log: &mut dyn RunLog) -> ExocatResult<BatchReport> {
        let proposals = self
            .source
            .discover_proposals()
            .await
            .map_err(ExocatError::Discovery)?;

        info!("Batch: {} proposals to process", proposals.len());
        Ok(self.run(proposals, log).await)
    }

    /// Process proposals one after another.
    pub async fn run(
        &self,
        proposals: impl IntoIterator<Item = ProposalId>,
        log: &mut dyn RunLog,
    ) -> BatchReport {
        let mut sink = RunLogSink::new(log);
        let mut report = BatchReport::default();

        for proposal in proposals {
            let entry = self.process_with(&proposal, &mut sink).await;
            info!("Proposal {}: {}", proposal, entry.outcome);
            report.proposals.push(entry);
        }

        sink.record(&report.summary());
        report.run_log_failures = sink.failures;
        info!("Batch: {}", report.summary());
        report
    }

    /// Process one proposal. Failures end up in the returned outcome.
    pub async fn process(&self, proposal: &ProposalId, log: &mut dyn RunLog) -> ProposalReport {
        self.process_with(proposal, &mut RunLogSink::new(log)).await
    }

    async fn process_with(
        &self,
        proposal: &ProposalId,
        log: &mut RunLogSink<'_>,
    ) -> ProposalReport {
        log.record(proposal.as_str());
        let mut entry = ProposalReport {
            proposal: proposal.clone(),
            outcome: ProposalOutcome::NoQualifyingExposures,
            download: Duration::ZERO,
            parse: Duration::ZERO,
        };

        // Fetch and screen
        let started = Instant::now();
        let apt = match self.source.fetch_apt(proposal).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let err = ExocatError::fetch(proposal, e);
                warn!("{}", err);
                log.record(&format!("Could not retrieve APT file: {}", err));
                entry.outcome = ProposalOutcome::FetchFailed(err.to_string());
                return entry;
            }
        };

        if !self.pipeline.is_exoplanet_program(&apt) {
            log.record("Not an exoplanet program, skipped");
            entry.outcome = ProposalOutcome::NotExoplanetProgram;
            return entry;
        }

        let visit_status = if self.fetch_visit_status {
            match self.source.fetch_visit_status(proposal).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("Proposal {}: no visit status report: {}", proposal, e);
                    log.record(&format!("Could not retrieve visit status: {}", e));
                    None
                }
            }
        } else {
            None
        };

        entry.download = started.elapsed();
        log.record(&format!(
            "Time elapsed for download {}",
            format_elapsed(entry.download)
        ));

        // Parse, reconcile, write
        let started = Instant::now();
        let result = match self
            .pipeline
            .process_bytes(proposal, &apt, visit_status.as_deref())
        {
            Ok(result) => result,
            Err(e) => {
                warn!("{}", e);
                log.record(&format!("Skipped: {}", e));
                entry.outcome = ProposalOutcome::Malformed(e.to_string());
                return entry;
            }
        };

        for warning in &result.validation.warnings {
            log.record(&format!("Validation warning: {}", warning));
        }
        for error in &result.validation.errors {
            log.record(&format!("Validation error: {}", error));
        }

        entry.outcome = match &result.outcome {
            ReconcileOutcome::NoQualifyingExposures => {
                log.record("No exposures with an accepted spectral element");
                ProposalOutcome::NoQualifyingExposures
            }
            ReconcileOutcome::Reconciled(reconciliation) => {
                for category in &reconciliation.absent_categories {
                    log.record(&format!("Proposal {} has no {} info.", proposal, category));
                }
                if let Some(shortfall) = reconciliation.shortfall() {
                    log.record(&format!("Orbit alignment shortfall: {}", shortfall));
                }

                let timestamp: NaiveDateTime = Local::now().naive_local();
                match write_table(
                    &reconciliation.records,
                    &self.output_dir,
                    proposal,
                    &timestamp,
                ) {
                    Ok(path) => ProposalOutcome::Written {
                        path,
                        rows: reconciliation.records.len(),
                        shortfall: reconciliation.shortfall().cloned(),
                    },
                    Err(e) => {
                        warn!("Proposal {}: {}", proposal, e);
                        log.record(&format!("Could not write table: {}", e));
                        ProposalOutcome::WriteFailed(e.to_string())
                    }
                }
            }
        };

        entry.parse = started.elapsed();
        log.record(&format!(
            "Time elapsed for parsing {}",
            format_elapsed(entry.parse)
        ));

        entry
    }
}
