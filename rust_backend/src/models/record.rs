use serde::{Deserialize, Serialize};

/// Output column names, in the order they are written.
pub const RECORD_COLUMNS: [&str; 12] = [
    "target_name",
    "RA",
    "Dec",
    "spectral_element",
    "rate",
    "direction",
    "visit_number",
    "status",
    "phase_start",
    "phase_end",
    "number_orbits",
    "proposal_number",
];

/// One reconciled ExoCat row: a retained exposure annotated with its target
/// coordinates, scan parameters, visit status, phase window and orbit count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledRecord {
    pub target_name: Option<String>,
    #[serde(rename = "RA")]
    pub ra: Option<String>,
    #[serde(rename = "Dec")]
    pub dec: Option<String>,
    pub spectral_element: String,
    pub rate: Option<String>,
    pub direction: Option<String>,
    pub visit_number: Option<String>,
    pub status: Option<String>,
    pub phase_start: Option<String>,
    pub phase_end: Option<String>,
    pub number_orbits: Option<u32>,
    pub proposal_number: String,
}

impl ReconciledRecord {
    /// Number of populated columns out of [`RECORD_COLUMNS`].
    pub fn populated_columns(&self) -> usize {
        let optional = [
            self.target_name.is_some(),
            self.ra.is_some(),
            self.dec.is_some(),
            self.rate.is_some(),
            self.direction.is_some(),
            self.visit_number.is_some(),
            self.status.is_some(),
            self.phase_start.is_some(),
            self.phase_end.is_some(),
            self.number_orbits.is_some(),
        ];
        let required = [
            !self.spectral_element.is_empty(),
            !self.proposal_number.is_empty(),
        ];
        optional
            .iter()
            .chain(required.iter())
            .filter(|p| **p)
            .count()
    }

    /// `true` when every column carries a value.
    pub fn is_complete(&self) -> bool {
        self.populated_columns() == RECORD_COLUMNS.len()
    }

    /// Row values as strings keyed by column name, nulls as `None`.
    pub fn to_string_map(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            (RECORD_COLUMNS[0], self.target_name.clone()),
            (RECORD_COLUMNS[1], self.ra.clone()),
            (RECORD_COLUMNS[2], self.dec.clone()),
            (RECORD_COLUMNS[3], Some(self.spectral_element.clone())),
            (RECORD_COLUMNS[4], self.rate.clone()),
            (RECORD_COLUMNS[5], self.direction.clone()),
            (RECORD_COLUMNS[6], self.visit_number.clone()),
            (RECORD_COLUMNS[7], self.status.clone()),
            (RECORD_COLUMNS[8], self.phase_start.clone()),
            (RECORD_COLUMNS[9], self.phase_end.clone()),
            (
                RECORD_COLUMNS[10],
                self.number_orbits.map(|n| n.to_string()),
            ),
            (RECORD_COLUMNS[11], Some(self.proposal_number.clone())),
        ]
    }
}
