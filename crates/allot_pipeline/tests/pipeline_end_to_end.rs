// End-to-end pipeline runs over real files in a temp dir.

use std::fs;
use std::path::PathBuf;

use allot_core::entities::AcceptBps;
use allot_core::policy::{EngineParams, SpillPolicy};
use allot_pipeline::{run_from_paths, PipelineError, PipelineOptions};

fn write_inputs(dir: &std::path::Path) -> (PathBuf, PathBuf) {
    let pairs = dir.join("pairs.csv");
    fs::write(
        &pairs,
        "position_id,candidate_id,score,category,rural,gender\n\
         p1,s1,0.90,SC,0,M\n\
         p1,s2,0.80,OBC,0,F\n\
         p1,s3,0.50,OBC,0,M\n\
         p1,s4,0.95,GEN,0,F\n\
         p1,s5,0.90,GEN,0,M\n\
         p1,s6,0.85,GEN,1,F\n",
    )
    .unwrap();

    let capacities = dir.join("capacities.csv");
    fs::write(
        &capacities,
        "position_id,capacity,cap_sc,cap_st,cap_obc,cap_ur,cap_rural\n\
         p1,5,1,1,1,2,2\n",
    )
    .unwrap();

    (pairs, capacities)
}

fn all_accept_options() -> PipelineOptions {
    PipelineOptions {
        params: EngineParams {
            max_rounds: 8,
            default_accept_bps: AcceptBps::ALWAYS,
            accept_seed: 0,
            spill: SpillPolicy::None,
        },
        ..PipelineOptions::default()
    }
}

#[test]
fn file_inputs_produce_the_expected_allocation() {
    let dir = tempfile::tempdir().unwrap();
    let (pairs, capacities) = write_inputs(dir.path());

    let artifact = run_from_paths(&pairs, &capacities, &all_accept_options()).unwrap();

    let winners: Vec<String> =
        artifact.records.iter().map(|r| r.candidate.to_string()).collect();
    assert_eq!(winners, vec!["s1", "s2", "s4", "s6"]);
    assert!(artifact.converged);
    assert_eq!(artifact.unplaced.len(), 2);
    assert_eq!(artifact.digest.len(), 64);
}

#[test]
fn identical_runs_share_a_digest_and_artifacts_land_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let (pairs, capacities) = write_inputs(dir.path());

    let mut options = all_accept_options();
    options.out_json = Some(dir.path().join("out").join("run_record.json"));
    options.out_csv = Some(dir.path().join("out").join("allocation.csv"));

    let a = run_from_paths(&pairs, &capacities, &options).unwrap();
    let b = run_from_paths(&pairs, &capacities, &options).unwrap();
    assert_eq!(a.digest, b.digest);

    let json = fs::read_to_string(options.out_json.as_ref().unwrap()).unwrap();
    assert!(json.contains(&a.digest));
    let csv = fs::read_to_string(options.out_csv.as_ref().unwrap()).unwrap();
    assert_eq!(csv.lines().count(), 1 + a.records.len());
}

#[test]
fn a_different_seed_changes_the_digest_under_partial_acceptance() {
    let dir = tempfile::tempdir().unwrap();
    let (pairs, capacities) = write_inputs(dir.path());

    let mut opt_a = all_accept_options();
    opt_a.params.default_accept_bps = AcceptBps::new(5000).unwrap();
    opt_a.params.accept_seed = 1;
    let mut opt_b = opt_a.clone();
    opt_b.params.accept_seed = 2;

    let a = run_from_paths(&pairs, &capacities, &opt_a).unwrap();
    let b = run_from_paths(&pairs, &capacities, &opt_b).unwrap();
    // The digest binds the seed, so it differs even if the tables happen to
    // coincide for these two seeds.
    assert_ne!(a.digest, b.digest);
}

#[test]
fn missing_capacity_row_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let (pairs, _) = write_inputs(dir.path());
    let capacities = dir.path().join("other.csv");
    fs::write(&capacities, "position_id,capacity\np9,3\n").unwrap();

    let err = run_from_paths(&pairs, &capacities, &all_accept_options()).unwrap_err();
    assert!(matches!(err, PipelineError::Validate(_)));
}

#[test]
fn unsupported_extension_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let (pairs, _) = write_inputs(dir.path());
    let bogus = dir.path().join("capacities.yaml");
    fs::write(&bogus, "x").unwrap();

    let err = run_from_paths(&pairs, &bogus, &all_accept_options()).unwrap_err();
    assert!(matches!(err, PipelineError::Io(_)));
}
