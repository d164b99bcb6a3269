use anyhow::{Context, Result};
use log::warn;
use std::fs;
use std::path::Path;

use crate::core::domain::{ProposalExtract, ProposalId, VisitStatusEntry};
use crate::parsing::{apt_parser, visit_status_parser};

/// File name of an archived APT document.
pub fn apt_file_name(proposal: &ProposalId) -> String {
    format!("{}.apt", proposal)
}

/// File name of an archived visit-status report.
pub fn visit_status_file_name(proposal: &ProposalId) -> String {
    format!("{}_visit_status.xml", proposal)
}

/// Documents of one proposal loaded from disk.
#[derive(Debug)]
pub struct ProposalLoadResult {
    pub extract: ProposalExtract,
    pub visit_status: Option<Vec<VisitStatusEntry>>,
}

/// Loads previously downloaded proposal documents.
pub struct ProposalLoader;

impl ProposalLoader {
    /// Load `<dir>/<id>.apt` and, when present, `<dir>/<id>_visit_status.xml`.
    pub fn load_from_dir(dir: &Path, proposal: &ProposalId) -> Result<ProposalLoadResult> {
        let apt_path = dir.join(apt_file_name(proposal));
        let status_path = dir.join(visit_status_file_name(proposal));
        let status_path = status_path.exists().then_some(status_path);

        Self::load_from_files(proposal, &apt_path, status_path.as_deref())
    }

    /// Load an APT file and an optional visit-status report.
    ///
    /// The APT file must load. An unreadable or malformed visit-status report
    /// is logged and left out.
    pub fn load_from_files(
        proposal: &ProposalId,
        apt_path: &Path,
        visit_status_path: Option<&Path>,
    ) -> Result<ProposalLoadResult> {
        let apt_bytes = fs::read(apt_path)
            .with_context(|| format!("Failed to read APT file: {}", apt_path.display()))?;

        let extract = apt_parser::parse_apt_bytes(proposal, &apt_bytes)
            .with_context(|| format!("Failed to parse APT file: {}", apt_path.display()))?;

        let visit_status = match visit_status_path {
            Some(path) => match VisitStatusLoader::load_from_file(path) {
                Ok(entries) => Some(entries),
                Err(e) => {
                    warn!("Ignoring visit status report: {:#}", e);
                    None
                }
            },
            None => None,
        };

        Ok(ProposalLoadResult {
            extract,
            visit_status,
        })
    }

    /// Proposal identifiers of every `*.apt` file in `dir`, sorted.
    pub fn list_proposals(dir: &Path) -> Result<Vec<ProposalId>> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to list directory: {}", dir.display()))?;

        let mut ids: Vec<ProposalId> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("apt"))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(ProposalId::new)
            })
            .collect();
        ids.sort();
        Ok(ids)
    }
}

/// Loader for visit-status reports.
pub struct VisitStatusLoader;

impl VisitStatusLoader {
    pub fn load_from_file(path: &Path) -> Result<Vec<VisitStatusEntry>> {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read visit status file: {}", path.display()))?;

        let proposal = Self::proposal_from_path(path);
        visit_status_parser::parse_visit_status_bytes(&proposal, &bytes)
            .with_context(|| format!("Failed to parse visit status file: {}", path.display()))
    }

    fn proposal_from_path(path: &Path) -> ProposalId {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        ProposalId::new(stem.trim_end_matches("_visit_status"))
    }
}
