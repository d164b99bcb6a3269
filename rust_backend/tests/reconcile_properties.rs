//! Property tests for record reconciliation.

use exocat_apt::core::domain::{Exposure, Observation, Phase, ProposalExtract, ProposalId, Visit};
use exocat_apt::preprocessing::alignment::{align_orbits, reduce_phases};
use exocat_apt::preprocessing::pipeline::ExocatPipeline;
use exocat_apt::preprocessing::reconciler::{ReconcileOutcome, Reconciler};
use proptest::prelude::*;

const ELEMENT_POOL: &[&str] = &["G141", "G102", "F140W", "F139M", " G141 ", "g141", "G102W"];
const ACCEPTED: &[&str] = &["G141", "G102"];

/// APT document with `n` targets, observations and visits, each visit holding
/// one scanned grism exposure with a phase window.
fn synthetic_document(n: usize) -> String {
    let mut targets = String::new();
    let mut observations = String::new();
    let mut visits = String::new();

    for i in 1..=n {
        targets.push_str(&format!(
            r#"<FixedTarget Name="T{i}"><EquatorialPosition><RA Hrs="{h:02}" Mins="10" Secs="24.06"/><DEC Degrees="-{d:02}" Arcmin="05" Arcsec="50.5"/></EquatorialPosition></FixedTarget>"#,
            i = i,
            h = i % 24,
            d = i % 90
        ));
        observations.push_str(&format!(
            r#"<Observation TargetName="T{}" NumberOfOrbits="{}"/>"#,
            i,
            i % 5 + 1
        ));
        visits.push_str(&format!(
            r#"<Visit Number="{i}" Status="Executed" Label="V{i}"><ExposureGroup><Exposure Number="1" TargetName="T{i}" SpElement="G141" Label="E{i}"><SpatialScan Rate="0.{i}" Direction="Forward"/><Phase Start="0.1" End="0.2"/></Exposure></ExposureGroup></Visit>"#,
            i = i
        ));
    }

    format!(
        "<HSTProposal><ProposalInformation><Abstract>exoplanet</Abstract></ProposalInformation><Targets>{}</Targets><Observations>{}</Observations><Visits>{}</Visits></HSTProposal>",
        targets, observations, visits
    )
}

fn visit(number: usize, failed: bool) -> Visit {
    Visit {
        visit_number: Some(number.to_string()),
        status: Some(if failed { "Failed" } else { "Executed" }.to_string()),
        label: Some(format!("V{}", number)),
    }
}

fn observation(orbits: u32) -> Observation {
    Observation {
        target_name: None,
        number_of_orbits: Some(orbits.to_string()),
    }
}

proptest! {
    #[test]
    fn retained_rows_use_accepted_elements(picks in prop::collection::vec(0..ELEMENT_POOL.len(), 0..40)) {
        let mut extract = ProposalExtract::new(ProposalId::new("15469"));
        extract.exposures = picks
            .iter()
            .enumerate()
            .map(|(i, &p)| Exposure {
                exposure_number: Some(i.to_string()),
                target_name: Some(format!("T{}", i)),
                spectral_element: Some(ELEMENT_POOL[p].to_string()),
                label: None,
                visit_number: None,
            })
            .collect();

        let expected = picks
            .iter()
            .filter(|&&p| ACCEPTED.contains(&ELEMENT_POOL[p].trim()))
            .count();

        let outcome = Reconciler::default().reconcile(&extract, None);
        prop_assert_eq!(outcome.records().len(), expected);
        for record in outcome.records() {
            prop_assert!(ACCEPTED.contains(&record.spectral_element.as_str()));
        }
        if expected == 0 {
            prop_assert_eq!(outcome, ReconcileOutcome::NoQualifyingExposures);
        }
    }

    #[test]
    fn phase_reduction_is_idempotent(labels in prop::collection::vec(0u8..6, 0..30)) {
        let phases: Vec<Phase> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| Phase {
                start: Some(format!("0.{}", i)),
                end: None,
                label: Some(format!("L{}", l)),
            })
            .collect();

        let once = reduce_phases(&phases);
        let twice = reduce_phases(&once);
        prop_assert_eq!(&once, &twice);

        let mut distinct = labels.clone();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(once.len(), distinct.len());
    }

    #[test]
    fn equal_lengths_pair_positionally(statuses in prop::collection::vec(any::<bool>(), 0..20)) {
        let visits: Vec<Visit> = statuses
            .iter()
            .enumerate()
            .map(|(i, &failed)| visit(i + 1, failed))
            .collect();
        let observations: Vec<Observation> = (0..visits.len())
            .map(|i| observation(i as u32 + 1))
            .collect();

        let alignment = align_orbits(&visits, &observations);
        prop_assert_eq!(alignment.failed_visits_removed, 0);
        prop_assert!(alignment.is_lossless());
        for (i, v) in visits.iter().enumerate() {
            let number = v.visit_number.as_deref().unwrap();
            prop_assert_eq!(alignment.orbits_for(number), Some(i as u32 + 1));
        }
    }

    #[test]
    fn failed_surplus_pairs_fully(
        executed in 1usize..15,
        failed_positions in prop::collection::vec(0usize..16, 1..6),
    ) {
        // interleave failed visits among the executed ones
        let mut flags = vec![false; executed];
        for pos in &failed_positions {
            let at = (*pos).min(flags.len());
            flags.insert(at, true);
        }
        let visits: Vec<Visit> = flags
            .iter()
            .enumerate()
            .map(|(i, &failed)| visit(i + 1, failed))
            .collect();
        let observations: Vec<Observation> =
            (0..executed).map(|i| observation(i as u32 + 1)).collect();

        let alignment = align_orbits(&visits, &observations);
        prop_assert_eq!(alignment.failed_visits_removed, failed_positions.len());
        prop_assert!(alignment.is_lossless());

        let executed_numbers: Vec<&str> = visits
            .iter()
            .filter(|v| v.status.as_deref() == Some("Executed"))
            .map(|v| v.visit_number.as_deref().unwrap())
            .collect();
        for (i, number) in executed_numbers.iter().enumerate() {
            prop_assert_eq!(alignment.orbits_for(number), Some(i as u32 + 1));
        }
    }

    #[test]
    fn one_to_one_document_yields_complete_rows(n in 1usize..25) {
        let document = synthetic_document(n);
        let result = ExocatPipeline::new()
            .process_str(&ProposalId::new("15469"), &document, None)
            .unwrap();

        let records = result.records();
        prop_assert_eq!(records.len(), n);
        for (i, record) in records.iter().enumerate() {
            prop_assert!(record.is_complete(), "row {} incomplete: {:?}", i, record);
            prop_assert_eq!(record.target_name.clone(), Some(format!("T{}", i + 1)));
            prop_assert_eq!(record.number_orbits, Some(((i + 1) % 5 + 1) as u32));
        }
        prop_assert!(result.validation.is_valid);
        prop_assert!(result.validation.warnings.is_empty());
    }
}
