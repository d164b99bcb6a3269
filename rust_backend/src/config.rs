//! Pipeline configuration file support.
//!
//! Reads `exocat.toml`. Every section and key is optional; missing values fall
//! back to the STScI endpoints and the WFC3/IR grism defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::domain::ProposalId;
use crate::error::{ExocatError, ExocatResult};
use crate::preprocessing::reconciler::{SpectralElementFilter, DEFAULT_SPECTRAL_ELEMENTS};
use crate::preprocessing::screening::{ExoplanetScreen, DEFAULT_KEYWORDS};

/// Placeholder replaced by the proposal identifier in URL templates.
pub const PROPOSAL_PLACEHOLDER: &str = "{proposal}";

/// Full pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExocatConfig {
    #[serde(default)]
    pub source: SourceSettings,
    #[serde(default)]
    pub discovery: DiscoverySettings,
    #[serde(default)]
    pub screening: ScreeningSettings,
    #[serde(default)]
    pub reconcile: ReconcileSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

/// Where proposal documents come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSettings {
    #[serde(default = "default_apt_url")]
    pub apt_url: String,
    #[serde(default = "default_visit_status_url")]
    pub visit_status_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Fetch visit-status reports alongside APT files.
    #[serde(default = "default_true")]
    pub visit_status: bool,
    /// Raw downloads are copied here when set.
    #[serde(default)]
    pub archive_dir: Option<PathBuf>,
}

/// How the proposal list is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverySettings {
    #[serde(default = "default_mast_url")]
    pub mast_url: String,
    #[serde(default = "default_project")]
    pub project: String,
    #[serde(default = "default_instrument")]
    pub instrument: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// A non-empty list skips discovery.
    #[serde(default)]
    pub proposals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningSettings {
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileSettings {
    #[serde(default = "default_spectral_elements")]
    pub spectral_elements: Vec<String>,
    #[serde(default = "default_true")]
    pub validate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_table_dir")]
    pub table_dir: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_apt_url() -> String {
    "http://www.stsci.edu/hst/phase2-public/{proposal}.apt".to_string()
}

fn default_visit_status_url() -> String {
    "https://www.stsci.edu/cgi-bin/get-visit-status?id={proposal}&markupFormat=xml&observatory=HST"
        .to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_mast_url() -> String {
    "https://mast.stsci.edu/api/v0/invoke".to_string()
}

fn default_project() -> String {
    "HST".to_string()
}

fn default_instrument() -> String {
    "WFC3/IR".to_string()
}

fn default_page_size() -> u32 {
    50_000
}

fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

fn default_spectral_elements() -> Vec<String> {
    DEFAULT_SPECTRAL_ELEMENTS
        .iter()
        .map(|e| e.to_string())
        .collect()
}

fn default_table_dir() -> PathBuf {
    PathBuf::from("exocat_tables")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("apt_parsing_logs")
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            apt_url: default_apt_url(),
            visit_status_url: default_visit_status_url(),
            timeout_secs: default_timeout_secs(),
            visit_status: true,
            archive_dir: None,
        }
    }
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            mast_url: default_mast_url(),
            project: default_project(),
            instrument: default_instrument(),
            page_size: default_page_size(),
            proposals: Vec::new(),
        }
    }
}

impl Default for ScreeningSettings {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
        }
    }
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            spectral_elements: default_spectral_elements(),
            validate: true,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            table_dir: default_table_dir(),
            log_dir: default_log_dir(),
        }
    }
}

impl SourceSettings {
    pub fn apt_url_for(&self, proposal: &ProposalId) -> String {
        self.apt_url
            .replace(PROPOSAL_PLACEHOLDER, proposal.as_str())
    }

    pub fn visit_status_url_for(&self, proposal: &ProposalId) -> String {
        self.visit_status_url
            .replace(PROPOSAL_PLACEHOLDER, proposal.as_str())
    }
}

impl DiscoverySettings {
    /// Configured proposal list, blanks dropped.
    pub fn fixed_proposals(&self) -> Vec<ProposalId> {
        self.proposals
            .iter()
            .map(ProposalId::new)
            .filter(|id| !id.as_str().is_empty())
            .collect()
    }
}

impl ExocatConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ExocatResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ExocatError::Configuration(format!("Failed to read config file: {}", e))
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ExocatResult<Self> {
        let config: ExocatConfig = toml::from_str(content).map_err(|e| {
            ExocatError::Configuration(format!("Failed to parse config file: {}", e))
        })?;

        config.check()?;
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `exocat.toml` in the current directory, `rust_backend/`
    /// and the parent directory.
    pub fn from_default_location() -> ExocatResult<Self> {
        let search_paths = vec![
            PathBuf::from("exocat.toml"),
            PathBuf::from("rust_backend/exocat.toml"),
            PathBuf::from("../exocat.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(ExocatError::Configuration(
            "No exocat.toml found in standard locations".to_string(),
        ))
    }

    fn check(&self) -> ExocatResult<()> {
        if !self.source.apt_url.contains(PROPOSAL_PLACEHOLDER) {
            return Err(ExocatError::Configuration(format!(
                "source.apt_url must contain {}",
                PROPOSAL_PLACEHOLDER
            )));
        }
        let elements = &self.reconcile.spectral_elements;
        if elements.iter().all(|e| e.trim().is_empty()) {
            return Err(ExocatError::Configuration(
                "reconcile.spectral_elements must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn spectral_filter(&self) -> SpectralElementFilter {
        SpectralElementFilter::new(self.reconcile.spectral_elements.iter().cloned())
    }

    pub fn exoplanet_screen(&self) -> ExoplanetScreen {
        ExoplanetScreen::new(self.screening.keywords.iter().cloned())
    }
}
