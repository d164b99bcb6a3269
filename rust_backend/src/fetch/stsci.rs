//! STScI Phase II archive and MAST discovery over HTTP.

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{DiscoverySettings, SourceSettings};
use crate::core::domain::ProposalId;
use crate::error::{FetchError, FetchResult};
use crate::fetch::ProposalSource;
use crate::io::loaders::{apt_file_name, visit_status_file_name};

/// MAST service queried for observations.
const MAST_SERVICE: &str = "Mast.Caom.Filtered";

/// HTTP proposal source backed by the STScI Phase II archive.
pub struct StsciSource {
    client: Client,
    source: SourceSettings,
    discovery: DiscoverySettings,
}

impl StsciSource {
    pub fn new(source: SourceSettings, discovery: DiscoverySettings) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(source.timeout_secs))
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            source,
            discovery,
        })
    }

    async fn get_bytes(&self, url: &str) -> FetchResult<Vec<u8>> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn archive(&self, file_name: String, bytes: &[u8]) {
        let Some(dir) = &self.source.archive_dir else {
            return;
        };
        let path: PathBuf = dir.join(file_name);
        let written = match tokio::fs::create_dir_all(dir).await {
            Ok(()) => tokio::fs::write(&path, bytes).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            warn!("Failed to archive {}: {}", path.display(), e);
        }
    }

    async fn query_page(&self, page: u32) -> FetchResult<MastPage> {
        let request = mast_request(&self.discovery, page);
        let body = serde_json::to_string(&request)
            .map_err(|e| FetchError::Response(format!("Failed to encode MAST request: {}", e)))?;

        let response = self
            .client
            .post(&self.discovery.mast_url)
            .form(&[("request", body)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: self.discovery.mast_url.clone(),
            });
        }

        let text = response.text().await?;
        parse_mast_page(&text)
    }
}

#[async_trait]
impl ProposalSource for StsciSource {
    async fn discover_proposals(&self) -> FetchResult<BTreeSet<ProposalId>> {
        let fixed = self.discovery.fixed_proposals();
        if !fixed.is_empty() {
            info!("Using {} configured proposals", fixed.len());
            return Ok(fixed.into_iter().collect());
        }

        let mut proposals = BTreeSet::new();
        let mut page = 1;
        loop {
            let result = self.query_page(page).await?;
            proposals.extend(result.proposal_ids());

            let pages = result.pages();
            debug!("MAST page {} of {}", page, pages);
            if page >= pages {
                break;
            }
            page += 1;
        }

        info!(
            "MAST returned {} distinct {} proposals",
            proposals.len(),
            self.discovery.instrument
        );
        Ok(proposals)
    }

    async fn fetch_apt(&self, proposal: &ProposalId) -> FetchResult<Vec<u8>> {
        let bytes = self.get_bytes(&self.source.apt_url_for(proposal)).await?;
        self.archive(apt_file_name(proposal), &bytes).await;
        Ok(bytes)
    }

    async fn fetch_visit_status(&self, proposal: &ProposalId) -> FetchResult<Vec<u8>> {
        let bytes = self
            .get_bytes(&self.source.visit_status_url_for(proposal))
            .await?;
        self.archive(visit_status_file_name(proposal), &bytes).await;
        Ok(bytes)
    }
}

/// Body of a MAST `invoke` request.
#[derive(Debug, Serialize)]
pub struct MastRequest {
    pub service: &'static str,
    pub format: &'static str,
    pub params: MastParams,
    pub pagesize: u32,
    pub page: u32,
}

#[derive(Debug, Serialize)]
pub struct MastParams {
    pub columns: &'static str,
    pub filters: Vec<MastFilter>,
}

#[derive(Debug, Serialize)]
pub struct MastFilter {
    #[serde(rename = "paramName")]
    pub param_name: String,
    pub values: Vec<String>,
}

/// Build the request for one page of the proposal query.
pub fn mast_request(discovery: &DiscoverySettings, page: u32) -> MastRequest {
    MastRequest {
        service: MAST_SERVICE,
        format: "json",
        params: MastParams {
            columns: "proposal_id",
            filters: vec![
                MastFilter {
                    param_name: "project".to_string(),
                    values: vec![discovery.project.clone()],
                },
                MastFilter {
                    param_name: "instrument_name".to_string(),
                    values: vec![discovery.instrument.clone()],
                },
            ],
        },
        pagesize: discovery.page_size,
        page,
    }
}

/// Proposal id as MAST returns it, string or integer.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringOrInt {
    String(String),
    Int(i64),
}

#[derive(Debug, Deserialize)]
struct MastRow {
    #[serde(default)]
    proposal_id: Option<StringOrInt>,
}

#[derive(Debug, Default, Deserialize)]
struct MastPaging {
    #[serde(rename = "pagesFiltered", default)]
    pages_filtered: u32,
}

/// One page of a MAST response.
#[derive(Debug, Deserialize)]
pub struct MastPage {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Vec<MastRow>,
    #[serde(default)]
    paging: MastPaging,
}

impl MastPage {
    pub fn proposal_ids(&self) -> impl Iterator<Item = ProposalId> + '_ {
        self.data.iter().filter_map(|row| match &row.proposal_id {
            Some(StringOrInt::String(s)) if !s.trim().is_empty() => {
                Some(ProposalId::new(s.as_str()))
            }
            Some(StringOrInt::Int(i)) => Some(ProposalId::new(i.to_string())),
            _ => None,
        })
    }

    /// Total page count, at least one.
    pub fn pages(&self) -> u32 {
        self.paging.pages_filtered.max(1)
    }
}

/// Parse one page of a MAST JSON response.
pub fn parse_mast_page(text: &str) -> FetchResult<MastPage> {
    let page: MastPage = serde_json::from_str(text)
        .map_err(|e| FetchError::Response(format!("Invalid MAST response: {}", e)))?;

    match page.status.as_deref() {
        Some("ERROR") => Err(FetchError::Response(
            "MAST reported an error status".to_string(),
        )),
        _ => Ok(page),
    }
}
