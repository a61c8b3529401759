//! Engine-internal allocation state: one owned instance per run.
//!
//! Invariants maintained here (checked by `recount` in tests and by
//! debug_asserts at mutation sites):
//! - a candidate identity is held by at most one position at any time;
//! - per-position pool cursors only ever advance;
//! - `fill` / `rural_filled` counters always equal a recount of the
//!   confirmed map (they exist so loop conditions never re-filter it).

use std::collections::{BTreeMap, BTreeSet};

use allot_core::{
    entities::{Category, PoolKind, QuotaSet, Score},
    ids::{CandidateId, PositionId},
};

use crate::ranklist::PoolEntry;
use crate::roundlog::CategoryCounts;

/// Monotonic read cursors, one per pool.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PoolCursors {
    pub sc: usize,
    pub st: usize,
    pub obc: usize,
    pub general: usize,
    pub rural: usize,
}

impl PoolCursors {
    pub fn get(&self, kind: PoolKind) -> usize {
        match kind {
            PoolKind::Sc => self.sc,
            PoolKind::St => self.st,
            PoolKind::Obc => self.obc,
            PoolKind::General => self.general,
            PoolKind::Rural => self.rural,
        }
    }

    pub fn get_mut(&mut self, kind: PoolKind) -> &mut usize {
        match kind {
            PoolKind::Sc => &mut self.sc,
            PoolKind::St => &mut self.st,
            PoolKind::Obc => &mut self.obc,
            PoolKind::General => &mut self.general,
            PoolKind::Rural => &mut self.rural,
        }
    }
}

/// Incrementally maintained per-category confirmed counts.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CategoryFill {
    pub sc: u32,
    pub st: u32,
    pub obc: u32,
    pub ur: u32,
}

impl CategoryFill {
    pub fn get(&self, cat: Category) -> u32 {
        match cat {
            Category::Sc => self.sc,
            Category::St => self.st,
            Category::Obc => self.obc,
            Category::General => self.ur,
        }
    }

    fn get_mut(&mut self, cat: Category) -> &mut u32 {
        match cat {
            Category::Sc => &mut self.sc,
            Category::St => &mut self.st,
            Category::Obc => &mut self.obc,
            Category::General => &mut self.ur,
        }
    }

    pub fn total(&self) -> u32 {
        self.sc + self.st + self.obc + self.ur
    }

    pub fn as_counts(&self) -> CategoryCounts {
        CategoryCounts { sc: self.sc, st: self.st, obc: self.obc, ur: self.ur }
    }
}

/// A confirmed seat at one position.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfirmedSeat {
    pub candidate: CandidateId,
    /// Category under which the seat was granted (a rural swap-in inherits the
    /// displaced candidate's category).
    pub seat_category: Category,
    pub score: Score,
    pub rural: bool,
    pub gender: String,
    /// Round in which the current holder was confirmed.
    pub round: u32,
}

/// Mutable per-position state.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionState {
    pub quota: QuotaSet,
    pub cursors: PoolCursors,
    pub fill: CategoryFill,
    pub rural_filled: u32,
    /// Confirmed seats keyed by candidate identity.
    pub confirmed: BTreeMap<CandidateId, ConfirmedSeat>,
    /// Candidates who declined an offer from this position; never re-offered
    /// here, from any pool.
    pub rejected: BTreeSet<CandidateId>,
}

impl PositionState {
    pub fn new(quota: QuotaSet) -> Self {
        Self {
            quota,
            cursors: PoolCursors::default(),
            fill: CategoryFill::default(),
            rural_filled: 0,
            confirmed: BTreeMap::new(),
            rejected: BTreeSet::new(),
        }
    }

    pub fn confirmed_count(&self) -> u32 {
        self.fill.total()
    }

    /// Re-derive the fill counters from the confirmed map. Loop conditions use
    /// the maintained counters; tests assert this recount agrees.
    pub fn recount(&self) -> (CategoryFill, u32) {
        let mut fill = CategoryFill::default();
        let mut rural = 0u32;
        for seat in self.confirmed.values() {
            *fill.get_mut(seat.seat_category) += 1;
            if seat.rural {
                rural += 1;
            }
        }
        (fill, rural)
    }

    /// Record an accepted offer (or reconciliation swap-in) under `seat_cat`.
    pub(crate) fn confirm(&mut self, entry: &PoolEntry, seat_cat: Category, round: u32) {
        debug_assert!(!self.confirmed.contains_key(&entry.candidate));
        debug_assert!(self.confirmed_count() < self.quota.capacity);
        self.confirmed.insert(
            entry.candidate.clone(),
            ConfirmedSeat {
                candidate: entry.candidate.clone(),
                seat_category: seat_cat,
                score: entry.score,
                rural: entry.rural,
                gender: entry.gender.clone(),
                round,
            },
        );
        *self.fill.get_mut(seat_cat) += 1;
        if entry.rural {
            self.rural_filled += 1;
        }
    }

    /// Rescind a confirmed seat (reconciliation displacement). Returns the
    /// vacated seat so the caller can reuse its category.
    pub(crate) fn bump(&mut self, candidate: &CandidateId) -> ConfirmedSeat {
        let seat = self
            .confirmed
            .remove(candidate)
            .expect("bump target must be confirmed");
        *self.fill.get_mut(seat.seat_category) -= 1;
        if seat.rural {
            self.rural_filled -= 1;
        }
        seat
    }
}

/// Whole-run allocation state. Created at run start, mutated only by the
/// engine during the round loop, frozen the instant the loop terminates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AllocationState {
    /// Per-position state in canonical (ascending id) order.
    pub positions: BTreeMap<PositionId, PositionState>,
    /// Candidate identity -> position currently holding them.
    pub held: BTreeMap<CandidateId, PositionId>,
    pub rounds_run: u32,
    pub converged: bool,
}

impl AllocationState {
    pub fn new(quotas: &BTreeMap<PositionId, QuotaSet>) -> Self {
        Self {
            positions: quotas
                .iter()
                .map(|(p, q)| (p.clone(), PositionState::new(*q)))
                .collect(),
            held: BTreeMap::new(),
            rounds_run: 0,
            converged: false,
        }
    }
}
