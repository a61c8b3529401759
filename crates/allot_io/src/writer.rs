//! Artifact writers: the run record (canonical JSON) and the flat allocation
//! table (CSV). Record order inside artifacts is whatever the engine emitted;
//! canonicalization here only sorts object keys.

use std::path::Path;

use serde::{Deserialize, Serialize};

use allot_algo::{AllocationRecord, RoundLog};
use allot_core::ids::CandidateId;

use crate::canonical_json::write_canonical_file;
use crate::hasher::run_digest;
use crate::{IoError, IoResult};

/// Everything one run writes to disk: inputs echo, outputs, and the digest
/// binding them together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunArtifact {
    pub seed: u64,
    pub max_rounds: u32,
    pub converged: bool,
    pub rounds_run: u32,
    pub records: Vec<AllocationRecord>,
    pub round_log: RoundLog,
    pub unplaced: Vec<CandidateId>,
    /// SHA-256 over the canonical (seed, records, rounds) payload.
    pub digest: String,
}

impl RunArtifact {
    /// Assemble the artifact, computing its digest from the canonical output.
    pub fn new(
        seed: u64,
        max_rounds: u32,
        converged: bool,
        rounds_run: u32,
        records: Vec<AllocationRecord>,
        round_log: RoundLog,
        unplaced: Vec<CandidateId>,
    ) -> IoResult<Self> {
        let digest = run_digest(seed, &records, &round_log)?;
        Ok(Self { seed, max_rounds, converged, rounds_run, records, round_log, unplaced, digest })
    }
}

/// Write the run record as canonical JSON (sorted keys, atomic replace).
pub fn write_run_artifact(path: &Path, artifact: &RunArtifact) -> IoResult<()> {
    let v = serde_json::to_value(artifact)?;
    write_canonical_file(path, &v)
}

/// Write the allocation table as headed CSV, one confirmed seat per row, in
/// the engine's emitted order.
pub fn write_allocation_csv(path: &Path, records: &[AllocationRecord]) -> IoResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut w = csv::Writer::from_path(path).map_err(IoError::from)?;
    w.write_record([
        "position_id",
        "candidate_id",
        "category",
        "score",
        "rural",
        "gender",
        "round_confirmed",
    ])
    .map_err(IoError::from)?;
    for r in records {
        w.write_record([
            r.position.to_string(),
            r.candidate.to_string(),
            r.category.to_string(),
            format!("{}", r.score.as_f64()),
            if r.rural { "1".to_string() } else { "0".to_string() },
            r.gender.clone(),
            r.round_confirmed.to_string(),
        ])
        .map_err(IoError::from)?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use allot_core::entities::{Category, Score};

    fn record(cand: &str, score: f64) -> AllocationRecord {
        AllocationRecord {
            position: "p1".parse().unwrap(),
            candidate: cand.parse().unwrap(),
            category: Category::General,
            score: Score::new(score).unwrap(),
            rural: false,
            gender: "F".to_string(),
            round_confirmed: 1,
        }
    }

    #[test]
    fn run_artifact_round_trips_through_canonical_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_record.json");

        let artifact = RunArtifact::new(
            42,
            8,
            true,
            2,
            vec![record("c1", 0.9)],
            RoundLog::default(),
            vec!["c2".parse().unwrap()],
        )
        .unwrap();
        write_run_artifact(&path, &artifact).unwrap();

        let read: RunArtifact =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(read.digest, artifact.digest);
        assert_eq!(read.records, artifact.records);
        assert_eq!(read.unplaced, artifact.unplaced);
    }

    #[test]
    fn allocation_csv_has_one_row_per_seat() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("allocation.csv");
        write_allocation_csv(&path, &[record("c1", 0.9), record("c2", 0.85)]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("position_id,candidate_id"));
        assert!(lines[1].contains("c1"));
    }
}
