//! Round/Audit Logger types.
//!
//! One entry per round, one sub-entry per position; enough for an external
//! fairness audit to reconstruct representation without re-running the engine.
//! Entries are append-only during the run.

use std::collections::BTreeMap;

use allot_core::ids::PositionId;

/// Per-category fill / vacancy snapshot in fixed precedence order.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CategoryCounts {
    pub sc: u32,
    pub st: u32,
    pub obc: u32,
    pub ur: u32,
}

impl CategoryCounts {
    pub fn total(&self) -> u32 {
        self.sc + self.st + self.obc + self.ur
    }
}

/// Per-position state as of a round boundary.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionRoundEntry {
    /// Offers accepted at this position during the round (vertical pass).
    pub newly_confirmed: u32,
    /// Rural reconciliation substitutions applied during the round.
    pub swaps: u32,
    /// Confirmed seats per category at round end.
    pub fill: CategoryCounts,
    /// Unfilled sub-quota per category at round end.
    pub vacancies: CategoryCounts,
    /// Cumulative confirmed seats vs. capacity.
    pub filled: u32,
    pub capacity: u32,
    /// Rural-flagged confirmed seats vs. the horizontal sub-quota.
    pub rural_filled: u32,
    pub rural_quota: u32,
    /// Unmet horizontal quota; reported, never an error.
    pub rural_shortfall: u32,
}

/// One synchronous pass over every position.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundEntry {
    pub round: u32,
    pub total_confirmed: u32,
    pub total_swaps: u32,
    pub positions: BTreeMap<PositionId, PositionRoundEntry>,
}

impl RoundEntry {
    /// A round with no confirmations and no swaps terminates the loop.
    pub fn is_quiescent(&self) -> bool {
        self.total_confirmed == 0 && self.total_swaps == 0
    }
}

/// Ordered sequence of per-round summaries.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundLog {
    pub rounds: Vec<RoundEntry>,
    /// True when the loop ended because a full pass produced no activity,
    /// false when the round cap was reached first.
    pub converged: bool,
}

impl RoundLog {
    pub fn last_round(&self) -> Option<&RoundEntry> {
        self.rounds.last()
    }
}
