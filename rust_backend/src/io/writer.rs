use chrono::NaiveDateTime;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::core::domain::ProposalId;
use crate::error::ExocatResult;
use crate::models::{ReconciledRecord, RECORD_COLUMNS};

/// Timestamp layout shared by output tables and run logs.
pub const TIMESTAMP_FORMAT: &str = "%d_%m_%Y_%H_%M_%S";

/// Build the output table: an unnamed positional index column followed by
/// the record columns in fixed order.
pub fn records_to_dataframe(records: &[ReconciledRecord]) -> ExocatResult<DataFrame> {
    let n = records.len();

    let mut target_names = Vec::with_capacity(n);
    let mut ras = Vec::with_capacity(n);
    let mut decs = Vec::with_capacity(n);
    let mut elements = Vec::with_capacity(n);
    let mut rates = Vec::with_capacity(n);
    let mut directions = Vec::with_capacity(n);
    let mut visit_numbers = Vec::with_capacity(n);
    let mut statuses = Vec::with_capacity(n);
    let mut phase_starts = Vec::with_capacity(n);
    let mut phase_ends = Vec::with_capacity(n);
    let mut orbits = Vec::with_capacity(n);
    let mut proposals = Vec::with_capacity(n);

    for record in records {
        target_names.push(record.target_name.clone());
        ras.push(record.ra.clone());
        decs.push(record.dec.clone());
        elements.push(record.spectral_element.clone());
        rates.push(record.rate.clone());
        directions.push(record.direction.clone());
        visit_numbers.push(record.visit_number.clone());
        statuses.push(record.status.clone());
        phase_starts.push(record.phase_start.clone());
        phase_ends.push(record.phase_end.clone());
        orbits.push(record.number_orbits);
        proposals.push(record.proposal_number.clone());
    }

    let index: Vec<u32> = (0..n as u32).collect();

    let df = df!(
        "" => index,
        RECORD_COLUMNS[0] => target_names,
        RECORD_COLUMNS[1] => ras,
        RECORD_COLUMNS[2] => decs,
        RECORD_COLUMNS[3] => elements,
        RECORD_COLUMNS[4] => rates,
        RECORD_COLUMNS[5] => directions,
        RECORD_COLUMNS[6] => visit_numbers,
        RECORD_COLUMNS[7] => statuses,
        RECORD_COLUMNS[8] => phase_starts,
        RECORD_COLUMNS[9] => phase_ends,
        RECORD_COLUMNS[10] => orbits,
        RECORD_COLUMNS[11] => proposals,
    )?;

    Ok(df)
}

/// `<proposal_id>_exocat_<dd_mm_YYYY_HH_MM_SS>.csv`
pub fn output_file_name(proposal: &ProposalId, timestamp: &NaiveDateTime) -> String {
    format!(
        "{}_exocat_{}.csv",
        proposal,
        timestamp.format(TIMESTAMP_FORMAT)
    )
}

/// Write a DataFrame as CSV with a header row. Nulls become empty fields.
pub fn write_dataframe(df: &mut DataFrame, path: &Path) -> ExocatResult<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)?;
    Ok(())
}

/// Write one proposal's records into `output_dir`, creating it if needed.
///
/// Returns the path of the written table.
pub fn write_table(
    records: &[ReconciledRecord],
    output_dir: &Path,
    proposal: &ProposalId,
    timestamp: &NaiveDateTime,
) -> ExocatResult<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(output_file_name(proposal, timestamp));

    let mut df = records_to_dataframe(records)?;
    write_dataframe(&mut df, &path)?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 42)
            .unwrap()
    }

    fn record(target: Option<&str>, orbits: Option<u32>) -> ReconciledRecord {
        ReconciledRecord {
            target_name: target.map(str::to_string),
            ra: Some("07 10 24.0600".to_string()),
            dec: Some("-39 05 50.57".to_string()),
            spectral_element: "G141".to_string(),
            rate: None,
            direction: None,
            visit_number: Some("01".to_string()),
            status: Some("Executed".to_string()),
            phase_start: None,
            phase_end: None,
            number_orbits: orbits,
            proposal_number: "15469".to_string(),
        }
    }

    #[test]
    fn test_output_file_name() {
        let name = output_file_name(&ProposalId::new("15469"), &timestamp());
        assert_eq!(name, "15469_exocat_07_03_2024_09_05_42.csv");
    }

    #[test]
    fn test_dataframe_shape_and_order() {
        let df = records_to_dataframe(&[record(Some("WASP-121"), Some(5)), record(None, None)])
            .unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), RECORD_COLUMNS.len() + 1);

        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .skip(1)
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, RECORD_COLUMNS.to_vec());
        assert_eq!(df.column("number_orbits").unwrap().null_count(), 1);
    }

    #[test]
    fn test_empty_records() {
        let df = records_to_dataframe(&[]).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), RECORD_COLUMNS.len() + 1);
    }

    #[test]
    fn test_write_table() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("tables");
        let records = vec![record(Some("WASP-121"), Some(5)), record(None, None)];

        let path = write_table(&records, &out, &ProposalId::new("15469"), &timestamp()).unwrap();
        assert!(path.exists());
        assert!(path.ends_with("15469_exocat_07_03_2024_09_05_42.csv"));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains(
            "target_name,RA,Dec,spectral_element,rate,direction,visit_number,status,phase_start,phase_end,number_orbits,proposal_number"
        ));
        assert!(lines[1].starts_with("0,WASP-121,"));
        assert!(lines[1].ends_with(",5,15469"));
        // null target name and orbit count are empty fields
        assert!(lines[2].starts_with("1,,"));
        assert!(lines[2].ends_with(",,15469"));
    }
}
