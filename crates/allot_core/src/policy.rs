//! Policy & engine parameters with safe defaults and domain validation.

use crate::entities::AcceptBps;
use crate::errors::CoreError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fractional reservation weights in basis points of capacity, plus the
/// horizontal rural fraction. `floor_one` guarantees each reserved category at
/// least one seat where capacity allows (the unreserved share absorbs rounding
/// remainders either way).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReservationPolicy {
    pub sc_bps: u32,
    pub st_bps: u32,
    pub obc_bps: u32,
    pub rural_bps: u32,
    pub floor_one: bool,
}

impl ReservationPolicy {
    /// Validate that every weight is a sane fraction and the reserved vertical
    /// shares leave room for an unreserved remainder.
    pub fn validate(&self) -> Result<(), CoreError> {
        for v in [self.sc_bps, self.st_bps, self.obc_bps, self.rural_bps] {
            if v > 10_000 {
                return Err(CoreError::BpsOutOfRange(v));
            }
        }
        if self.sc_bps + self.st_bps + self.obc_bps > 10_000 {
            return Err(CoreError::DomainOutOfRange(
                "reserved vertical shares exceed 100%",
            ));
        }
        Ok(())
    }
}

impl Default for ReservationPolicy {
    /// Source-data splits: SC 1/10, ST 1/20, OBC 1/6, rural 1/5 of capacity,
    /// each reserved category floored at one seat.
    fn default() -> Self {
        Self {
            sc_bps: 1_000,
            st_bps: 500,
            obc_bps: 1_667,
            rural_bps: 2_000,
            floor_one: true,
        }
    }
}

/// Policy-controlled, one-directional routing of an unfillable reserved seat
/// to the next category in precedence order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SpillPolicy {
    /// Shortfalls remain as recorded vacancies.
    None,
    /// Shortfalls extend the next category's target, never exceeding total
    /// capacity and never looping back to an earlier category.
    NextCategory,
}

/// Run parameters for the allocation engine.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineParams {
    /// Round cap; reaching it without convergence is a reported outcome,
    /// not a failure.
    pub max_rounds: u32,
    /// Acceptance probability used when a pair carries none of its own.
    pub default_accept_bps: AcceptBps,
    /// Seed for the acceptance draw stream. Same inputs + same seed yields a
    /// byte-identical allocation table and round log.
    pub accept_seed: u64,
    pub spill: SpillPolicy,
}

impl EngineParams {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_rounds == 0 {
            return Err(CoreError::DomainOutOfRange("max_rounds must be >= 1"));
        }
        Ok(())
    }

    /// The single-pass government-style fill is a strict special case:
    /// one round, every offer accepted.
    pub fn single_round(seed: u64) -> Self {
        Self {
            max_rounds: 1,
            default_accept_bps: AcceptBps::ALWAYS,
            accept_seed: seed,
            spill: SpillPolicy::None,
        }
    }
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            max_rounds: 8,
            default_accept_bps: AcceptBps::DEFAULT,
            accept_seed: 0,
            spill: SpillPolicy::None,
        }
    }
}
