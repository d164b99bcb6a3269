//! In-memory proposal source.
//!
//! Backs tests and offline runs over a directory of earlier downloads laid
//! out as `<id>.apt` and `<id>_visit_status.xml`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::core::domain::ProposalId;
use crate::error::{FetchError, FetchResult};
use crate::fetch::ProposalSource;
use crate::io::loaders::{apt_file_name, visit_status_file_name, ProposalLoader};

/// In-memory proposal source.
///
/// # Example
/// ```
/// use exocat_apt::core::domain::ProposalId;
/// use exocat_apt::fetch::LocalSource;
///
/// let source = LocalSource::new();
/// source.insert_apt(ProposalId::new("15469"), b"<HSTProposal/>".to_vec());
/// assert_eq!(source.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct LocalSource {
    data: Arc<RwLock<LocalData>>,
}

#[derive(Default)]
struct LocalData {
    apt: HashMap<ProposalId, Vec<u8>>,
    visit_status: HashMap<ProposalId, Vec<u8>>,
}

impl LocalSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `<id>.apt` in `dir`, with its visit-status report if present.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let source = Self::new();

        for proposal in ProposalLoader::list_proposals(dir)? {
            let apt_path = dir.join(apt_file_name(&proposal));
            let bytes = fs::read(&apt_path)
                .with_context(|| format!("Failed to read APT file: {}", apt_path.display()))?;
            source.insert_apt(proposal.clone(), bytes);

            let status_path = dir.join(visit_status_file_name(&proposal));
            if status_path.exists() {
                let bytes = fs::read(&status_path).with_context(|| {
                    format!(
                        "Failed to read visit status file: {}",
                        status_path.display()
                    )
                })?;
                source.insert_visit_status(proposal, bytes);
            }
        }

        Ok(source)
    }

    pub fn insert_apt(&self, proposal: ProposalId, bytes: Vec<u8>) {
        if let Ok(mut data) = self.data.write() {
            data.apt.insert(proposal, bytes);
        }
    }

    pub fn insert_visit_status(&self, proposal: ProposalId, bytes: Vec<u8>) {
        if let Ok(mut data) = self.data.write() {
            data.visit_status.insert(proposal, bytes);
        }
    }

    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.apt.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(
        &self,
        proposal: &ProposalId,
        select: impl Fn(&LocalData) -> &HashMap<ProposalId, Vec<u8>>,
        what: &str,
    ) -> FetchResult<Vec<u8>> {
        let data = self
            .data
            .read()
            .map_err(|e| FetchError::Transport(format!("Failed to acquire read lock: {}", e)))?;

        select(&data)
            .get(proposal)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("{} for proposal {}", what, proposal)))
    }
}

#[async_trait]
impl ProposalSource for LocalSource {
    async fn discover_proposals(&self) -> FetchResult<BTreeSet<ProposalId>> {
        let data = self
            .data
            .read()
            .map_err(|e| FetchError::Transport(format!("Failed to acquire read lock: {}", e)))?;
        Ok(data.apt.keys().cloned().collect())
    }

    async fn fetch_apt(&self, proposal: &ProposalId) -> FetchResult<Vec<u8>> {
        self.lookup(proposal, |d| &d.apt, "APT document")
    }

    async fn fetch_visit_status(&self, proposal: &ProposalId) -> FetchResult<Vec<u8>> {
        self.lookup(proposal, |d| &d.visit_status, "visit status report")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let source = LocalSource::new();
        let id = ProposalId::new("15469");
        source.insert_apt(id.clone(), b"<HSTProposal/>".to_vec());

        assert_eq!(source.fetch_apt(&id).await.unwrap(), b"<HSTProposal/>");
        assert!(matches!(
            source.fetch_visit_status(&id).await,
            Err(FetchError::NotFound(_))
        ));
        assert!(matches!(
            source.fetch_apt(&ProposalId::new("1")).await,
            Err(FetchError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_discover_is_sorted_and_distinct() {
        let source = LocalSource::new();
        source.insert_apt(ProposalId::new("15469"), Vec::new());
        source.insert_apt(ProposalId::new("13021"), Vec::new());
        source.insert_apt(ProposalId::new("15469"), Vec::new());

        let ids: Vec<ProposalId> = source
            .discover_proposals()
            .await
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(
            ids,
            vec![ProposalId::new("13021"), ProposalId::new("15469")]
        );
    }

    #[tokio::test]
    async fn test_from_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("15469.apt"), "<HSTProposal/>").unwrap();
        fs::write(
            dir.path().join("15469_visit_status.xml"),
            "<visitStatusReport/>",
        )
        .unwrap();
        fs::write(dir.path().join("13021.apt"), "<HSTProposal/>").unwrap();

        let source = LocalSource::from_dir(dir.path()).unwrap();
        assert_eq!(source.len(), 2);
        assert!(source
            .fetch_visit_status(&ProposalId::new("15469"))
            .await
            .is_ok());
        assert!(source
            .fetch_visit_status(&ProposalId::new("13021"))
            .await
            .is_err());
    }
}
