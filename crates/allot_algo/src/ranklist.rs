//! RankList Builder: turn scored pairs + a capacity table into, per position,
//! five ordered candidate pools.
//!
//! Contract:
//! - Every scored candidate appears in the general pool; additionally in their
//!   reserved category's pool if they carry one, and in the rural pool if
//!   rural-flagged. Pool membership is not mutually exclusive by design;
//!   deduplication of identity across pools belongs to the engine.
//! - A capacity entry with no scored pairs is a data-integrity fault, as is a
//!   pair referencing an unknown position or a duplicate (position, candidate)
//!   pair. All three fail fast here, before any round runs.
//!
//! Determinism:
//! - Every pool is sorted score descending with candidate-identity ascending
//!   tie-break; the engine's cursors rely on this being stable.

use std::collections::{BTreeMap, BTreeSet};

use allot_core::{
    determinism::cmp_ranked,
    entities::{AcceptBps, Category, PoolKind, Score, ScoredPair},
    ids::{CandidateId, PositionId},
};

/// One ranked pool row. Attributes ride along so the engine and writers never
/// need a side lookup.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PoolEntry {
    pub candidate: CandidateId,
    pub score: Score,
    pub category: Category,
    pub rural: bool,
    pub gender: String,
    pub accept_bps: Option<AcceptBps>,
}

/// The five ordered pools for one position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionPools {
    pub sc: Vec<PoolEntry>,
    pub st: Vec<PoolEntry>,
    pub obc: Vec<PoolEntry>,
    pub general: Vec<PoolEntry>,
    pub rural: Vec<PoolEntry>,
}

impl PositionPools {
    pub fn pool(&self, kind: PoolKind) -> &[PoolEntry] {
        match kind {
            PoolKind::Sc => &self.sc,
            PoolKind::St => &self.st,
            PoolKind::Obc => &self.obc,
            PoolKind::General => &self.general,
            PoolKind::Rural => &self.rural,
        }
    }

    fn pool_mut(&mut self, kind: PoolKind) -> &mut Vec<PoolEntry> {
        match kind {
            PoolKind::Sc => &mut self.sc,
            PoolKind::St => &mut self.st,
            PoolKind::Obc => &mut self.obc,
            PoolKind::General => &mut self.general,
            PoolKind::Rural => &mut self.rural,
        }
    }

    /// Distinct candidate identities across all pools.
    pub fn candidates(&self) -> BTreeSet<CandidateId> {
        self.general.iter().map(|e| e.candidate.clone()).collect()
    }
}

/// Ranklists keyed by position; BTreeMap iteration order is the engine's
/// position processing order.
pub type RankLists = BTreeMap<PositionId, PositionPools>;

#[derive(Debug, PartialEq)]
pub enum RanklistError {
    /// A capacity entry exists but no pair references the position.
    MissingPairs(PositionId),
    /// A pair references a position absent from the capacity table.
    UnknownPosition(PositionId),
    /// The same (position, candidate) pair was supplied twice.
    DuplicatePair(PositionId, CandidateId),
}

impl std::fmt::Display for RanklistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RanklistError::MissingPairs(p) => {
                write!(f, "capacity entry {p} has no scored pairs")
            }
            RanklistError::UnknownPosition(p) => {
                write!(f, "scored pair references unknown position {p}")
            }
            RanklistError::DuplicatePair(p, c) => {
                write!(f, "duplicate scored pair ({p}, {c})")
            }
        }
    }
}

impl std::error::Error for RanklistError {}

/// Build per-position pools from scored pairs, validated against the capacity
/// table. Out-of-range scores are unrepresentable at this point: `Score`
/// construction already rejected them at the parse boundary.
pub fn build_ranklists(
    pairs: &[ScoredPair],
    capacities: &BTreeMap<PositionId, u32>,
) -> Result<RankLists, RanklistError> {
    let mut out: RankLists = capacities
        .keys()
        .map(|p| (p.clone(), PositionPools::default()))
        .collect();

    let mut seen: BTreeSet<(PositionId, CandidateId)> = BTreeSet::new();

    for pair in pairs {
        let pools = out
            .get_mut(&pair.position)
            .ok_or_else(|| RanklistError::UnknownPosition(pair.position.clone()))?;

        if !seen.insert((pair.position.clone(), pair.candidate.clone())) {
            return Err(RanklistError::DuplicatePair(
                pair.position.clone(),
                pair.candidate.clone(),
            ));
        }

        let entry = PoolEntry {
            candidate: pair.candidate.clone(),
            score: pair.score,
            category: pair.category,
            rural: pair.rural,
            gender: pair.gender.clone(),
            accept_bps: pair.accept_bps,
        };

        if pair.category.is_reserved() {
            pools.pool_mut(pair.category.pool()).push(entry.clone());
        }
        if pair.rural {
            pools.rural.push(entry.clone());
        }
        pools.general.push(entry);
    }

    for (position, pools) in out.iter_mut() {
        if pools.general.is_empty() {
            return Err(RanklistError::MissingPairs(position.clone()));
        }
        for kind in PoolKind::ALL {
            pools.pool_mut(kind).sort_by(cmp_entries);
        }
    }

    Ok(out)
}

/// Score descending, candidate identity ascending.
fn cmp_entries(a: &PoolEntry, b: &PoolEntry) -> std::cmp::Ordering {
    cmp_ranked((&a.candidate, a.score), (&b.candidate, b.score))
}
