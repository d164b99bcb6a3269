use serde::Deserialize;

use crate::core::domain::{ProposalId, VisitStatusEntry};
use crate::error::{ExocatError, ExocatResult};
use crate::parsing::decode_document;

/// Raw XML structure for one `<visit id="..">` of the visit-status report
#[derive(Debug, Deserialize)]
struct RawVisitStatus {
    #[serde(rename = "@id")]
    id: Option<String>,
    status: Option<String>,
    target: Option<String>,
    #[serde(rename = "startTime")]
    start_time: Option<String>,
    #[serde(rename = "endTime")]
    end_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawVisitStatusReport {
    #[serde(rename = "visit", default)]
    visits: Vec<RawVisitStatus>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse raw visit-status report bytes
pub fn parse_visit_status_bytes(
    proposal: &ProposalId,
    bytes: &[u8],
) -> ExocatResult<Vec<VisitStatusEntry>> {
    let text = decode_document(bytes);
    parse_visit_status_str(proposal, &text)
}

/// Parse a visit-status report from a string.
///
/// Each entry keeps its own fields together, so a visit that lacks a
/// `<status>` or `<startTime>` does not shift the values of later visits.
pub fn parse_visit_status_str(
    proposal: &ProposalId,
    xml: &str,
) -> ExocatResult<Vec<VisitStatusEntry>> {
    if xml.trim().is_empty() {
        return Err(ExocatError::malformed(proposal, "empty visit-status document"));
    }

    let raw: RawVisitStatusReport = quick_xml::de::from_str(xml).map_err(|e| {
        ExocatError::malformed(proposal, format!("visit-status XML error: {}", e))
    })?;

    Ok(raw
        .visits
        .into_iter()
        .map(|v| VisitStatusEntry {
            visit_id: non_empty(v.id),
            status: non_empty(v.status),
            target: non_empty(v.target),
            start_time: non_empty(v.start_time),
            end_time: non_empty(v.end_time),
        })
        .collect())
}
