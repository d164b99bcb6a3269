use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use exocat_apt::core::domain::{
    Exposure, Observation, Phase, ProposalExtract, ProposalId, SpatialScan, Target, Visit,
};
use exocat_apt::parsing::apt_parser::parse_apt_str;
use exocat_apt::preprocessing::reconciler::Reconciler;
use std::hint::black_box;

const SAMPLE_APT: &str = include_str!("../tests/data/15469.apt");

/// Proposal with `visits` visits of four exposures each, one grism exposure
/// per visit scanned.
fn synthetic_extract(visits: usize) -> ProposalExtract {
    let mut extract = ProposalExtract::new(ProposalId::new("15469"));

    for v in 0..visits {
        let label = format!("V{}", v);
        let target = format!("T{}", v);
        extract.targets.push(Target {
            name: Some(target.clone()),
            right_ascension: Some("07 10 24.06".to_string()),
            declination: Some("-39 05 50.6".to_string()),
        });
        extract.observations.push(Observation {
            target_name: Some(target.clone()),
            number_of_orbits: Some("4".to_string()),
        });
        extract.visits.push(Visit {
            visit_number: Some(format!("{:02}", v + 1)),
            status: Some(if v % 7 == 0 { "Failed" } else { "Executed" }.to_string()),
            label: Some(label.clone()),
        });

        for (e, element) in ["F139M", "G141", "G141", "G102"].iter().enumerate() {
            if e == 1 {
                extract.spatial_scans.push(SpatialScan {
                    rate: Some("0.12".to_string()),
                    direction: Some("Forward".to_string()),
                    exposure_index: extract.exposures.len(),
                });
                extract.phases.push(Phase {
                    start: Some("0.1".to_string()),
                    end: Some("0.2".to_string()),
                    label: Some(label.clone()),
                });
            }
            extract.exposures.push(Exposure {
                exposure_number: Some((e + 1).to_string()),
                target_name: if e == 3 { None } else { Some(target.clone()) },
                spectral_element: Some(element.to_string()),
                label: Some(format!("E{}", e)),
                visit_number: Some(format!("{:02}", v + 1)),
            });
        }
    }

    extract
}

fn bench_parse(c: &mut Criterion) {
    let id = ProposalId::new("15469");
    c.bench_function("parse_apt_sample", |b| {
        b.iter(|| parse_apt_str(black_box(&id), black_box(SAMPLE_APT)))
    });
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    let reconciler = Reconciler::default();

    for visits in [10usize, 100, 1000] {
        let extract = synthetic_extract(visits);
        group.bench_with_input(BenchmarkId::new("visits", visits), &extract, |b, extract| {
            b.iter(|| reconciler.reconcile(black_box(extract), None));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_reconcile);
criterion_main!(benches);
