//! Allocation Engine round loop.
//!
//! Contract (per round, repeated until quiescence or the round cap):
//! 1. Positions are processed in ascending identity order; this order is part
//!    of the observable contract because reconciliation creates cross-position
//!    seat competition.
//! 2. Per position, categories fill in fixed precedence (SC, ST, OBC, then the
//!    general pool). Cursors only advance; a candidate skipped or declined at
//!    a (position, pool) is never reconsidered from that same pool there.
//! 3. Every offer is resolved immediately by one seeded acceptance draw.
//! 4. A category exhausting its pool short of its sub-quota records a vacancy;
//!    with `SpillPolicy::NextCategory` the shortfall extends the next
//!    category's target (strictly forward, never past total capacity).
//! 5. After the vertical pass across all positions, the horizontal
//!    reconciliation pass substitutes under-represented rural candidates in as
//!    strict swaps (see `reconcile`).
//! 6. A full pass with zero confirmations and zero swaps converges the run;
//!    hitting the round cap instead is a reported outcome, not an error.
//!
//! Determinism: BTreeMap iteration everywhere, one RNG stream threaded through
//! the whole run, and stable pool ordering from the ranklist builder.

use std::collections::{BTreeMap, BTreeSet};

use allot_core::{
    determinism::cmp_ranked,
    entities::{Category, QuotaSet, Score},
    ids::{CandidateId, PositionId},
    policy::{EngineParams, SpillPolicy},
    rng::AcceptRng,
    CoreError,
};

use crate::engine::reconcile::reconcile_rural;
use crate::engine::state::{AllocationState, PositionState};
use crate::ranklist::{PositionPools, RankLists};
use crate::roundlog::{CategoryCounts, PositionRoundEntry, RoundEntry, RoundLog};

/// Row of the final allocation table. Produced only for candidates who
/// accepted and survived reconciliation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocationRecord {
    pub position: PositionId,
    pub candidate: CandidateId,
    /// Category under which the seat was granted.
    pub category: Category,
    pub score: Score,
    pub rural: bool,
    pub gender: String,
    pub round_confirmed: u32,
}

/// Engine output: the frozen state, the flattened allocation table, the round
/// log, and every pooled candidate left without a seat.
#[derive(Clone, Debug)]
pub struct AllocationOutcome {
    pub state: AllocationState,
    pub records: Vec<AllocationRecord>,
    pub round_log: RoundLog,
    pub unplaced: Vec<CandidateId>,
}

#[derive(Debug, PartialEq)]
pub enum EngineError {
    /// A ranklist exists for a position missing from the quota table.
    MissingQuota(PositionId),
    /// A quota entry exists for a position with no ranklist (caller-data
    /// fault; detected before the round loop starts).
    MissingRanklist(PositionId),
    InvalidQuota(PositionId, CoreError),
    InvalidParams(CoreError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::MissingQuota(p) => write!(f, "no quota structure for position {p}"),
            EngineError::MissingRanklist(p) => write!(f, "no ranklist for position {p}"),
            EngineError::InvalidQuota(p, e) => write!(f, "invalid quota for position {p}: {e}"),
            EngineError::InvalidParams(e) => write!(f, "invalid engine params: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Run the multi-round offer/accept/reconcile loop to completion.
///
/// The returned state is frozen; records and log entries were appended in
/// round order and are never revised after the loop ends.
pub fn run_allocation(
    ranklists: &RankLists,
    quotas: &BTreeMap<PositionId, QuotaSet>,
    params: &EngineParams,
) -> Result<AllocationOutcome, EngineError> {
    params.validate().map_err(EngineError::InvalidParams)?;
    for position in ranklists.keys() {
        if !quotas.contains_key(position) {
            return Err(EngineError::MissingQuota(position.clone()));
        }
    }
    for (position, quota) in quotas.iter() {
        if !ranklists.contains_key(position) {
            return Err(EngineError::MissingRanklist(position.clone()));
        }
        quota
            .validate()
            .map_err(|e| EngineError::InvalidQuota(position.clone(), e))?;
    }

    let mut state = AllocationState::new(quotas);
    let mut rng = AcceptRng::from_seed_u64(params.accept_seed);
    let mut round_log = RoundLog::default();

    for round in 1..=params.max_rounds {
        state.rounds_run = round;
        let mut newly: BTreeMap<PositionId, u32> = BTreeMap::new();
        let mut swaps: BTreeMap<PositionId, u32> = BTreeMap::new();

        // Vertical pass: every position, categories in precedence order.
        for (position, pools) in ranklists.iter() {
            let st = state
                .positions
                .get_mut(position)
                .expect("positions initialized from quota table");
            let n = fill_vertical(position, st, pools, &mut state.held, params, &mut rng, round);
            newly.insert(position.clone(), n);
        }

        // Horizontal pass: strict rural substitutions, total count unchanged.
        for (position, pools) in ranklists.iter() {
            let st = state
                .positions
                .get_mut(position)
                .expect("positions initialized from quota table");
            let s = reconcile_rural(position, st, pools, &mut state.held, round);
            swaps.insert(position.clone(), s);
        }

        let entry = snapshot_round(round, &state, &newly, &swaps);
        let quiescent = entry.is_quiescent();
        round_log.rounds.push(entry);
        if quiescent {
            state.converged = true;
            break;
        }
    }
    round_log.converged = state.converged;

    let records = collect_records(&state);
    let unplaced = collect_unplaced(ranklists, &state);

    Ok(AllocationOutcome { state, records, round_log, unplaced })
}

/// Fill one position's vertical seats for one round. Returns the number of
/// offers accepted.
fn fill_vertical(
    position: &PositionId,
    st: &mut PositionState,
    pools: &PositionPools,
    held: &mut BTreeMap<CandidateId, PositionId>,
    params: &EngineParams,
    rng: &mut AcceptRng,
    round: u32,
) -> u32 {
    let mut confirmed_here = 0u32;
    let mut carry = 0u32;

    for cat in Category::PRECEDENCE {
        let mut target = st.quota.seat_target(cat);
        if params.spill == SpillPolicy::NextCategory {
            // Forward spill only; the sum of effective targets stays equal to
            // capacity because carry is unfilled target moved, never added.
            target = target.saturating_add(carry);
            carry = 0;
        }

        let pool = pools.pool(cat.pool());
        while st.fill.get(cat) < target {
            let cursor = st.cursors.get_mut(cat.pool());
            if *cursor >= pool.len() {
                break; // pool exhausted; shortfall becomes a vacancy or spills
            }
            let entry = &pool[*cursor];
            *cursor += 1;

            // Held anywhere (including here under another category) or a
            // prior decline at this position: silently skip, never re-offer.
            if held.contains_key(&entry.candidate) || st.rejected.contains(&entry.candidate) {
                continue;
            }

            let bps = entry.accept_bps.unwrap_or(params.default_accept_bps);
            if rng.draw_accept(bps) {
                st.confirm(entry, cat, round);
                held.insert(entry.candidate.clone(), position.clone());
                confirmed_here += 1;
            } else {
                st.rejected.insert(entry.candidate.clone());
            }
        }

        if params.spill == SpillPolicy::NextCategory {
            carry = target.saturating_sub(st.fill.get(cat));
        }
    }

    confirmed_here
}

fn snapshot_round(
    round: u32,
    state: &AllocationState,
    newly: &BTreeMap<PositionId, u32>,
    swaps: &BTreeMap<PositionId, u32>,
) -> RoundEntry {
    let mut positions = BTreeMap::new();
    let mut total_confirmed = 0u32;
    let mut total_swaps = 0u32;

    for (position, st) in state.positions.iter() {
        let n = newly.get(position).copied().unwrap_or(0);
        let s = swaps.get(position).copied().unwrap_or(0);
        total_confirmed += n;
        total_swaps += s;

        let fill = st.fill.as_counts();
        let vacancies = CategoryCounts {
            sc: st.quota.sc.saturating_sub(fill.sc),
            st: st.quota.st.saturating_sub(fill.st),
            obc: st.quota.obc.saturating_sub(fill.obc),
            ur: st.quota.ur.saturating_sub(fill.ur),
        };
        positions.insert(
            position.clone(),
            PositionRoundEntry {
                newly_confirmed: n,
                swaps: s,
                fill,
                vacancies,
                filled: st.confirmed_count(),
                capacity: st.quota.capacity,
                rural_filled: st.rural_filled,
                rural_quota: st.quota.rural,
                rural_shortfall: st.quota.rural.saturating_sub(st.rural_filled),
            },
        );
    }

    RoundEntry { round, total_confirmed, total_swaps, positions }
}

/// Flatten the frozen state into the final allocation table: position id
/// ascending, then seat category precedence, then score descending, then
/// candidate id ascending.
fn collect_records(state: &AllocationState) -> Vec<AllocationRecord> {
    let mut records: Vec<AllocationRecord> = Vec::new();
    for (position, st) in state.positions.iter() {
        let mut seats: Vec<_> = st.confirmed.values().collect();
        seats.sort_by(|a, b| {
            let ka = Category::PRECEDENCE.iter().position(|c| *c == a.seat_category);
            let kb = Category::PRECEDENCE.iter().position(|c| *c == b.seat_category);
            ka.cmp(&kb)
                .then_with(|| cmp_ranked((&a.candidate, a.score), (&b.candidate, b.score)))
        });
        for seat in seats {
            records.push(AllocationRecord {
                position: position.clone(),
                candidate: seat.candidate.clone(),
                category: seat.seat_category,
                score: seat.score,
                rural: seat.rural,
                gender: seat.gender.clone(),
                round_confirmed: seat.round,
            });
        }
    }
    records
}

/// Every candidate present in some pool but holding no seat at termination.
fn collect_unplaced(ranklists: &RankLists, state: &AllocationState) -> Vec<CandidateId> {
    let mut all: BTreeSet<CandidateId> = BTreeSet::new();
    for pools in ranklists.values() {
        all.extend(pools.candidates());
    }
    all.into_iter()
        .filter(|c| !state.held.contains_key(c))
        .collect()
}
