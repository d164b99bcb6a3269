//! Error types for the ExoCat pipeline.

use crate::core::domain::ProposalId;

/// Result type for pipeline operations
pub type ExocatResult<T> = Result<T, ExocatError>;

/// Error type for pipeline operations.
///
/// Only fetch and parse failures are errors; empty proposals, non-exoplanet
/// programs and alignment shortfalls are ordinary outcomes.
#[derive(Debug, thiserror::Error)]
pub enum ExocatError {
    #[error("Fetch failure for proposal {proposal}: {source}")]
    Fetch {
        proposal: ProposalId,
        #[source]
        source: FetchError,
    },

    #[error("Proposal discovery failed: {0}")]
    Discovery(#[source] FetchError),

    #[error("Malformed document for proposal {proposal}: {reason}")]
    MalformedDocument {
        proposal: ProposalId,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table error: {0}")]
    Table(#[from] polars::prelude::PolarsError),
}

impl ExocatError {
    pub fn malformed(proposal: &ProposalId, reason: impl Into<String>) -> Self {
        ExocatError::MalformedDocument {
            proposal: proposal.clone(),
            reason: reason.into(),
        }
    }

    pub fn fetch(proposal: &ProposalId, source: FetchError) -> Self {
        ExocatError::Fetch {
            proposal: proposal.clone(),
            source,
        }
    }
}

/// Result type for proposal source operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Error type for proposal source operations
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Response(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => FetchError::Http {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            },
            None => FetchError::Transport(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_proposal() {
        let id = ProposalId::new("15469");
        let err = ExocatError::malformed(&id, "unexpected end of file");
        assert_eq!(
            err.to_string(),
            "Malformed document for proposal 15469: unexpected end of file"
        );

        let err = ExocatError::fetch(
            &id,
            FetchError::Http {
                status: 404,
                url: "http://www.stsci.edu/hst/phase2-public/15469.apt".to_string(),
            },
        );
        assert!(err.to_string().contains("15469"));
        assert!(err.to_string().contains("HTTP 404"));
    }
}
