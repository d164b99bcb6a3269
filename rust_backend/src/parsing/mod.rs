//! Parsers for Phase II proposal documents.
//!
//! # Parsers
//!
//! - [`apt_parser`]: Extract targets, observations, visits, exposures, spatial
//!   scans and phases from an APT (`.apt`) XML document
//! - [`visit_status_parser`]: Extract visit status and timing from a
//!   visit-status report
//!
//! # Example
//!
//! ```no_run
//! use exocat_apt::core::domain::ProposalId;
//! use exocat_apt::parsing::apt_parser::parse_apt_file;
//! use std::path::Path;
//!
//! let extract = parse_apt_file(&ProposalId::new("15469"), Path::new("15469.apt"))
//!     .expect("Failed to parse APT file");
//! println!("{} exposures", extract.exposures.len());
//! ```

use std::borrow::Cow;

pub mod apt_parser;
pub mod visit_status_parser;


pub use apt_parser::{parse_apt_bytes, parse_apt_file, parse_apt_str};
pub use visit_status_parser::{parse_visit_status_bytes, parse_visit_status_str};

/// Decode document bytes as UTF-8, falling back to Latin-1.
pub fn decode_document(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}

/// Text between `<Abstract>` and `</Abstract>`, if both tags are present.
pub fn extract_abstract(document: &str) -> Option<&str> {
    const OPEN: &str = "<Abstract>";
    const CLOSE: &str = "</Abstract>";

    let start = document.find(OPEN)? + OPEN.len();
    let end = document[start..].find(CLOSE)? + start;
    Some(&document[start..end])
}
