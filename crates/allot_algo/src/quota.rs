//! Quota Planner: derive the integer seat breakdown for one position from
//! fractional policy weights.
//!
//! Contract:
//! - `sc + st + obc + ur == capacity` exactly; rounding remainders are
//!   absorbed into the unreserved share, never dropped.
//! - `rural <= capacity`; never a negative sub-quota anywhere.
//! - Minimum per-category quota is 0 unless the policy's `floor_one` guarantees
//!   a floor; floors that would overflow capacity are trimmed in reverse
//!   precedence order (OBC first, then ST, then SC) so the summing invariant
//!   always wins over the floor.
//!
//! Determinism: pure integer arithmetic, no RNG, no iteration over unordered
//! collections.

use allot_core::{entities::QuotaSet, errors::CoreError, policy::ReservationPolicy};

#[derive(Debug, PartialEq)]
pub enum QuotaError {
    ZeroCapacity,
    BadPolicy(CoreError),
}

impl std::fmt::Display for QuotaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuotaError::ZeroCapacity => write!(f, "capacity must be >= 1"),
            QuotaError::BadPolicy(e) => write!(f, "invalid reservation policy: {e}"),
        }
    }
}

impl std::error::Error for QuotaError {}

/// Floor share of `capacity` given a basis-point weight, with optional
/// one-seat floor.
#[inline]
fn share(capacity: u32, bps: u32, floor_one: bool) -> u32 {
    let raw = ((u64::from(capacity) * u64::from(bps)) / 10_000) as u32;
    if floor_one && raw == 0 {
        1
    } else {
        raw
    }
}

/// Derive the seat breakdown for one position.
pub fn plan_quotas(capacity: u32, policy: &ReservationPolicy) -> Result<QuotaSet, QuotaError> {
    if capacity == 0 {
        return Err(QuotaError::ZeroCapacity);
    }
    policy.validate().map_err(QuotaError::BadPolicy)?;

    let mut sc = share(capacity, policy.sc_bps, policy.floor_one);
    let mut st = share(capacity, policy.st_bps, policy.floor_one);
    let mut obc = share(capacity, policy.obc_bps, policy.floor_one);

    // Floors can overflow tiny capacities; trim in reverse precedence until
    // the reserved total fits, leaving ur >= 0.
    while sc + st + obc > capacity {
        if obc > 0 {
            obc -= 1;
        } else if st > 0 {
            st -= 1;
        } else {
            sc -= 1;
        }
    }

    let ur = capacity - (sc + st + obc);
    let rural = share(capacity, policy.rural_bps, policy.floor_one).min(capacity);

    let quota = QuotaSet { capacity, sc, st, obc, ur, rural };
    debug_assert!(quota.validate().is_ok());
    Ok(quota)
}
