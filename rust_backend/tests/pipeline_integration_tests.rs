//! End-to-end tests from archived documents to written tables.

use chrono::NaiveDate;
use exocat_apt::core::domain::ProposalId;
use exocat_apt::io::writer::write_table;
use exocat_apt::preprocessing::pipeline::{reconcile_apt_file, ExocatPipeline};
use exocat_apt::preprocessing::reconciler::ReconcileOutcome;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

#[test]
fn test_reconcile_fixture_file() {
    let result = reconcile_apt_file(&ProposalId::new("15469"), &data("15469.apt")).unwrap();

    assert_eq!(result.total_exposures, 4);
    assert_eq!(result.records().len(), 2);
    match &result.outcome {
        ReconcileOutcome::Reconciled(r) => {
            assert!(r.absent_categories.is_empty());
            assert!(r.orbit_alignment.is_lossless());
            assert_eq!(r.fallback_names, 0);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_fixture_to_csv() {
    let result = ExocatPipeline::new()
        .process_files(
            &ProposalId::new("15469"),
            &data("15469.apt"),
            Some(&data("15469_visit_status.xml")),
        )
        .unwrap();

    let out = TempDir::new().unwrap();
    let timestamp = NaiveDate::from_ymd_opt(2019, 1, 23)
        .unwrap()
        .and_hms_opt(11, 2, 44)
        .unwrap();
    let path = write_table(
        result.records(),
        out.path(),
        &result.proposal_id,
        &timestamp,
    )
    .unwrap();

    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "15469_exocat_23_01_2019_11_02_44.csv"
    );

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with(
        "0,WASP-121,07 10 24.0600,-39 05 50.57,G141,0.120,Round Trip,01,Archived,0.35,0.40,5,15469"
    ));
    assert!(lines[2].starts_with(
        "1,KELT-9,20 31 26.3500,+39 56 19.77,G102,0.450,Forward,02,Scheduled,0.45,0.48,4,15469"
    ));
}

#[test]
fn test_missing_fixture_reports_path() {
    let err = reconcile_apt_file(&ProposalId::new("1"), &data("1.apt")).unwrap_err();
    assert!(format!("{:#}", err).contains("1.apt"));
}

#[test]
fn test_broken_visit_status_still_writes_table() {
    let dir = TempDir::new().unwrap();
    let status_path = dir.path().join("15469_visit_status.xml");
    fs::write(&status_path, "<visitStatusReport><visit>").unwrap();

    let result = ExocatPipeline::new()
        .process_files(
            &ProposalId::new("15469"),
            &data("15469.apt"),
            Some(&status_path),
        )
        .unwrap();
    assert!(!result.used_visit_status);

    let timestamp = NaiveDate::from_ymd_opt(2019, 1, 23)
        .unwrap()
        .and_hms_opt(11, 2, 44)
        .unwrap();
    let path = write_table(
        result.records(),
        dir.path(),
        &result.proposal_id,
        &timestamp,
    )
    .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    // APT statuses stay in place
    assert!(lines[1].contains(",01,Executed,"));
}
