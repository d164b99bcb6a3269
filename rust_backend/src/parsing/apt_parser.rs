use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::core::domain::{
    Exposure, Observation, Phase, ProposalExtract, ProposalId, SpatialScan, Target, Visit,
};
use crate::error::{ExocatError, ExocatResult};
use crate::parsing::decode_document;

/// Raw XML structure for `<RA Hrs=".." Mins=".." Secs=".."/>`
#[derive(Debug, Deserialize)]
struct RawRa {
    #[serde(rename = "@Hrs")]
    hrs: Option<String>,
    #[serde(rename = "@Mins")]
    mins: Option<String>,
    #[serde(rename = "@Secs")]
    secs: Option<String>,
}

/// Raw XML structure for `<DEC Degrees=".." Arcmin=".." Arcsec=".."/>`
#[derive(Debug, Deserialize)]
struct RawDec {
    #[serde(rename = "@Degrees")]
    degrees: Option<String>,
    #[serde(rename = "@Arcmin")]
    arcmin: Option<String>,
    #[serde(rename = "@Arcsec")]
    arcsec: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEquatorialPosition {
    #[serde(rename = "RA")]
    ra: Option<RawRa>,
    #[serde(rename = "DEC")]
    dec: Option<RawDec>,
}

#[derive(Debug, Deserialize)]
struct RawFixedTarget {
    #[serde(rename = "@Name")]
    name: Option<String>,
    #[serde(rename = "EquatorialPosition")]
    position: Option<RawEquatorialPosition>,
}

/// `<Targets>` also holds solar-system and generic targets, which are skipped
#[derive(Debug, Default, Deserialize)]
struct RawTargets {
    #[serde(rename = "FixedTarget", default)]
    fixed_targets: Vec<RawFixedTarget>,
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    #[serde(rename = "@TargetName")]
    target_name: Option<String>,
    #[serde(rename = "@NumberOfOrbits")]
    number_of_orbits: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawObservations {
    #[serde(rename = "Observation", default)]
    observations: Vec<RawObservation>,
}

#[derive(Debug, Deserialize)]
struct RawSpatialScan {
    #[serde(rename = "@Rate")]
    rate: Option<String>,
    #[serde(rename = "@Direction")]
    direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPhase {
    #[serde(rename = "@Start")]
    start: Option<String>,
    #[serde(rename = "@End")]
    end: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawExposure {
    #[serde(rename = "@Number")]
    number: Option<String>,
    #[serde(rename = "@TargetName")]
    target_name: Option<String>,
    #[serde(rename = "@SpElement")]
    spectral_element: Option<String>,
    #[serde(rename = "@Label")]
    label: Option<String>,
    #[serde(rename = "SpatialScan", default)]
    spatial_scans: Vec<RawSpatialScan>,
    #[serde(rename = "Phase", default)]
    phases: Vec<RawPhase>,
}

#[derive(Debug, Deserialize)]
struct RawExposureGroup {
    #[serde(rename = "Exposure", default)]
    exposures: Vec<RawExposure>,
}

#[derive(Debug, Deserialize)]
struct RawVisit {
    #[serde(rename = "@Number")]
    number: Option<String>,
    #[serde(rename = "@Status")]
    status: Option<String>,
    #[serde(rename = "@Label")]
    label: Option<String>,
    #[serde(rename = "ExposureGroup", default)]
    exposure_groups: Vec<RawExposureGroup>,
}

#[derive(Debug, Default, Deserialize)]
struct RawVisits {
    #[serde(rename = "Visit", default)]
    visits: Vec<RawVisit>,
}

/// Raw XML structure of an APT document (`<HSTProposal>` root)
#[derive(Debug, Deserialize)]
struct RawProposal {
    #[serde(rename = "Targets", default)]
    targets: Option<RawTargets>,
    #[serde(rename = "Observations", default)]
    observations: Option<RawObservations>,
    #[serde(rename = "Visits", default)]
    visits: Option<RawVisits>,
}

/// Parse a saved `<proposal>.apt` file
pub fn parse_apt_file(proposal: &ProposalId, apt_path: &Path) -> Result<ProposalExtract> {
    let bytes = std::fs::read(apt_path)
        .with_context(|| format!("Failed to read APT file: {}", apt_path.display()))?;

    parse_apt_bytes(proposal, &bytes).map_err(anyhow::Error::from)
}

/// Parse raw APT document bytes
pub fn parse_apt_bytes(proposal: &ProposalId, bytes: &[u8]) -> ExocatResult<ProposalExtract> {
    let text = decode_document(bytes);
    parse_apt_str(proposal, &text)
}

/// Parse an APT document from a string
pub fn parse_apt_str(proposal: &ProposalId, xml: &str) -> ExocatResult<ProposalExtract> {
    if xml.trim().is_empty() {
        return Err(ExocatError::malformed(proposal, "empty document"));
    }

    let raw: RawProposal = quick_xml::de::from_str(xml)
        .map_err(|e| ExocatError::malformed(proposal, format!("APT XML error: {}", e)))?;

    Ok(convert_raw_to_domain(proposal, raw))
}

fn join_components(parts: [&Option<String>; 3]) -> Option<String> {
    let mut out = Vec::with_capacity(3);
    for part in parts {
        out.push(part.as_deref()?.trim());
    }
    Some(out.join(" "))
}

/// Walk the raw tree in document order, carrying ownership keys down to the
/// exposures, scans and phases.
fn convert_raw_to_domain(proposal: &ProposalId, raw: RawProposal) -> ProposalExtract {
    let mut extract = ProposalExtract::new(proposal.clone());

    for target in raw.targets.unwrap_or_default().fixed_targets {
        let (ra, dec) = match &target.position {
            Some(pos) => (
                pos.ra
                    .as_ref()
                    .and_then(|ra| join_components([&ra.hrs, &ra.mins, &ra.secs])),
                pos.dec
                    .as_ref()
                    .and_then(|dec| join_components([&dec.degrees, &dec.arcmin, &dec.arcsec])),
            ),
            None => (None, None),
        };
        extract.targets.push(Target {
            name: target.name,
            right_ascension: ra,
            declination: dec,
        });
    }

    for obs in raw.observations.unwrap_or_default().observations {
        extract.observations.push(Observation {
            target_name: obs.target_name,
            number_of_orbits: obs.number_of_orbits,
        });
    }

    for visit in raw.visits.unwrap_or_default().visits {
        for group in visit.exposure_groups {
            for exposure in group.exposures {
                let exposure_index = extract.exposures.len();

                if let Some(scan) = exposure.spatial_scans.into_iter().next() {
                    extract.spatial_scans.push(SpatialScan {
                        rate: scan.rate,
                        direction: scan.direction,
                        exposure_index,
                    });
                }

                for phase in exposure.phases {
                    extract.phases.push(Phase {
                        start: phase.start,
                        end: phase.end,
                        label: visit.label.clone(),
                    });
                }

                extract.exposures.push(Exposure {
                    exposure_number: exposure.number,
                    target_name: exposure.target_name,
                    spectral_element: exposure.spectral_element,
                    label: exposure.label,
                    visit_number: visit.number.clone(),
                });
            }
        }

        extract.visits.push(Visit {
            visit_number: visit.number,
            status: visit.status,
            label: visit.label,
        });
    }

    extract
}
