// crates/allot_pipeline/src/lib.rs
//! allot_pipeline — deterministic orchestration surface
//! (load → plan → rank → allocate → artifacts).
//!
//! This crate delegates parsing/writing to `allot_io` and math to
//! `allot_algo`; it owns cross-input validation and stage sequencing only.
//! Observability happens here and above: the inner crates never log, so their
//! output is a pure function of inputs and seed.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::info;

use allot_algo::{build_ranklists, plan_quotas, run_allocation, AllocationOutcome};
use allot_core::{
    entities::{QuotaSet, ScoredPair},
    ids::PositionId,
    policy::{EngineParams, ReservationPolicy},
};
use allot_io::loader::{self, CapacityTable};
use allot_io::writer::{self, RunArtifact};

/// Everything one invocation needs beyond the two input files.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub params: EngineParams,
    /// Split policy for positions whose capacity row carries no explicit
    /// quota split.
    pub policy: ReservationPolicy,
    /// Run-record JSON destination, if artifacts are wanted.
    pub out_json: Option<PathBuf>,
    /// Flat allocation-table CSV destination.
    pub out_csv: Option<PathBuf>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            params: EngineParams::default(),
            policy: ReservationPolicy::default(),
            out_json: None,
            out_csv: None,
        }
    }
}

/// Single error surface for pipeline orchestration.
#[derive(Debug)]
pub enum PipelineError {
    Io(String),
    Validate(String),
    Plan(String),
    Rank(String),
    Allocate(String),
    Build(String),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Io(m) => write!(f, "io: {m}"),
            PipelineError::Validate(m) => write!(f, "validate: {m}"),
            PipelineError::Plan(m) => write!(f, "plan: {m}"),
            PipelineError::Rank(m) => write!(f, "rank: {m}"),
            PipelineError::Allocate(m) => write!(f, "allocate: {m}"),
            PipelineError::Build(m) => write!(f, "build: {m}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<allot_io::IoError> for PipelineError {
    fn from(e: allot_io::IoError) -> Self {
        use allot_io::IoError;
        match e {
            IoError::Hash(m) => PipelineError::Build(format!("hash: {m}")),
            IoError::Invalid(m) => PipelineError::Validate(m),
            other => PipelineError::Io(other.to_string()),
        }
    }
}

/// Load both inputs, run the pipeline, and write any requested artifacts.
/// Input format is picked per file by extension: `.csv` or `.json`.
pub fn run_from_paths(
    pairs_path: &Path,
    capacities_path: &Path,
    options: &PipelineOptions,
) -> Result<RunArtifact, PipelineError> {
    let pairs = load_pairs(pairs_path)?;
    let capacities = load_capacities(capacities_path)?;
    info!(
        pairs = pairs.len(),
        positions = capacities.len(),
        "inputs loaded"
    );
    run(&pairs, &capacities, options)
}

/// Run the full pipeline over already-loaded inputs.
pub fn run(
    pairs: &[ScoredPair],
    capacities: &CapacityTable,
    options: &PipelineOptions,
) -> Result<RunArtifact, PipelineError> {
    validate_inputs(pairs, capacities)?;

    let quotas = resolve_quotas(capacities, &options.policy)?;
    info!(positions = quotas.len(), "quota plan resolved");

    let caps: BTreeMap<PositionId, u32> = capacities
        .iter()
        .map(|(p, c)| (p.clone(), c.capacity))
        .collect();
    let ranklists =
        build_ranklists(pairs, &caps).map_err(|e| PipelineError::Rank(e.to_string()))?;

    let outcome = run_allocation(&ranklists, &quotas, &options.params)
        .map_err(|e| PipelineError::Allocate(e.to_string()))?;
    info!(
        rounds = outcome.state.rounds_run,
        converged = outcome.state.converged,
        placed = outcome.records.len(),
        unplaced = outcome.unplaced.len(),
        "allocation finished"
    );

    let artifact = build_artifact(outcome, &options.params)?;

    if let Some(path) = &options.out_json {
        writer::write_run_artifact(path, &artifact)?;
        info!(path = %path.display(), "run record written");
    }
    if let Some(path) = &options.out_csv {
        writer::write_allocation_csv(path, &artifact.records)?;
        info!(path = %path.display(), "allocation table written");
    }

    Ok(artifact)
}

/// Load and validate both inputs without running the engine: loader-level
/// parsing, cross-input reference checks, and quota resolution.
pub fn validate_from_paths(
    pairs_path: &Path,
    capacities_path: &Path,
    policy: &ReservationPolicy,
) -> Result<(), PipelineError> {
    let pairs = load_pairs(pairs_path)?;
    let capacities = load_capacities(capacities_path)?;
    validate_inputs(&pairs, &capacities)?;
    resolve_quotas(&capacities, policy)?;
    Ok(())
}

/// Cross-input checks the per-file loaders cannot do alone.
fn validate_inputs(pairs: &[ScoredPair], capacities: &CapacityTable) -> Result<(), PipelineError> {
    if pairs.is_empty() {
        return Err(PipelineError::Validate("no scored pairs supplied".into()));
    }
    if capacities.is_empty() {
        return Err(PipelineError::Validate("no positions supplied".into()));
    }
    for pair in pairs {
        if !capacities.contains_key(&pair.position) {
            return Err(PipelineError::Validate(format!(
                "pair ({}, {}) names unknown position",
                pair.position, pair.candidate
            )));
        }
    }
    Ok(())
}

/// Per-position quota structures: explicit splits pass through (already
/// validated at load), everything else is derived from the policy.
pub fn resolve_quotas(
    capacities: &CapacityTable,
    policy: &ReservationPolicy,
) -> Result<BTreeMap<PositionId, QuotaSet>, PipelineError> {
    let mut out = BTreeMap::new();
    for (position, entry) in capacities {
        let quota = match entry.quota {
            Some(q) => q,
            None => plan_quotas(entry.capacity, policy)
                .map_err(|e| PipelineError::Plan(format!("{position}: {e}")))?,
        };
        out.insert(position.clone(), quota);
    }
    Ok(out)
}

fn build_artifact(
    outcome: AllocationOutcome,
    params: &EngineParams,
) -> Result<RunArtifact, PipelineError> {
    let AllocationOutcome { state, records, round_log, unplaced } = outcome;
    RunArtifact::new(
        params.accept_seed,
        params.max_rounds,
        state.converged,
        state.rounds_run,
        records,
        round_log,
        unplaced,
    )
    .map_err(PipelineError::from)
}

fn load_pairs(path: &Path) -> Result<Vec<ScoredPair>, PipelineError> {
    match extension(path) {
        "csv" => Ok(loader::load_pairs_csv(path)?),
        "json" => Ok(loader::load_pairs_json(path)?),
        other => Err(PipelineError::Io(format!(
            "unsupported pairs format {other:?} (want .csv or .json)"
        ))),
    }
}

fn load_capacities(path: &Path) -> Result<CapacityTable, PipelineError> {
    match extension(path) {
        "csv" => Ok(loader::load_capacities_csv(path)?),
        "json" => Ok(loader::load_capacities_json(path)?),
        other => Err(PipelineError::Io(format!(
            "unsupported capacities format {other:?} (want .csv or .json)"
        ))),
    }
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use allot_io::loader::PositionCapacity;

    fn pairs() -> Vec<ScoredPair> {
        vec![ScoredPair {
            position: "p1".parse().unwrap(),
            candidate: "c1".parse().unwrap(),
            score: allot_core::entities::Score::new(0.5).unwrap(),
            category: allot_core::entities::Category::General,
            rural: false,
            gender: "NA".to_string(),
            accept_bps: None,
        }]
    }

    #[test]
    fn unknown_position_is_a_validation_error() {
        let capacities: CapacityTable =
            [("p2".parse().unwrap(), PositionCapacity { capacity: 3, quota: None })].into();
        let err = run(&pairs(), &capacities, &PipelineOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Validate(_)));
    }

    #[test]
    fn explicit_quota_splits_bypass_the_planner() {
        let q = QuotaSet { capacity: 5, sc: 1, st: 1, obc: 1, ur: 2, rural: 2 };
        let capacities: CapacityTable =
            [("p1".parse().unwrap(), PositionCapacity { capacity: 5, quota: Some(q) })].into();
        let resolved = resolve_quotas(&capacities, &ReservationPolicy::default()).unwrap();
        assert_eq!(resolved[&"p1".parse().unwrap()], q);
    }
}
