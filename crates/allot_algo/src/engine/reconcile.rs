//! Horizontal (rural) reconciliation: a strict swap pass.
//!
//! Contract:
//! - Runs per position after the vertical pass, only while rural-flagged
//!   confirmed seats fall short of the horizontal sub-quota.
//! - Each step displaces a non-rural confirmed candidate and confirms the next
//!   eligible rural candidate under the vacated seat's category, so neither
//!   the total confirmed count nor any per-category fill ever changes.
//! - The displaced seat must be one the incoming candidate may occupy: a seat
//!   of their own vertical category, or an unreserved seat. Among those, the
//!   lowest score loses; equal scores displace the later-ranked (higher
//!   identity) entry.
//! - No displaceable seat, or an exhausted rural pool, ends the pass; the
//!   remaining shortfall is reported in the round log, never raised.
//! - Re-running on a reconciled position is a no-op.
//!
//! Cursor discipline: ineligible rural entries (held anywhere, or previously
//! declined here) are skipped permanently; an eligible entry is only consumed
//! once a victim for it exists, so a candidate is never burned against an
//! impossible swap.

use std::collections::BTreeMap;

use allot_core::{
    entities::Category,
    ids::{CandidateId, PositionId},
};

use crate::engine::state::PositionState;
use crate::ranklist::{PoolEntry, PositionPools};

/// Apply rural substitutions at one position. Returns the number of swaps.
pub(crate) fn reconcile_rural(
    position: &PositionId,
    st: &mut PositionState,
    pools: &PositionPools,
    held: &mut BTreeMap<CandidateId, PositionId>,
    round: u32,
) -> u32 {
    let mut swaps = 0u32;

    while st.rural_filled < st.quota.rural {
        let Some(incoming) = peek_rural(st, pools, held) else { break };
        let Some(victim) = pick_victim(st, incoming.category) else { break };

        // Consume the peeked entry only now that the swap is certain.
        st.cursors.rural += 1;

        let vacated = st.bump(&victim);
        held.remove(&victim);
        st.confirm(&incoming, vacated.seat_category, round);
        held.insert(incoming.candidate.clone(), position.clone());
        swaps += 1;
    }

    swaps
}

/// Next rural-pool candidate able to take a seat, without consuming them.
/// Entries already holding a seat anywhere or previously declined here are
/// skipped permanently.
fn peek_rural(
    st: &mut PositionState,
    pools: &PositionPools,
    held: &BTreeMap<CandidateId, PositionId>,
) -> Option<PoolEntry> {
    let pool = &pools.rural;
    loop {
        let cursor = st.cursors.rural;
        if cursor >= pool.len() {
            return None;
        }
        let entry = &pool[cursor];
        if held.contains_key(&entry.candidate) || st.rejected.contains(&entry.candidate) {
            st.cursors.rural += 1;
            continue;
        }
        return Some(entry.clone());
    }
}

/// Lowest-scored non-rural confirmed candidate holding a seat the incoming
/// category may occupy (own-category seat or an unreserved one).
fn pick_victim(st: &PositionState, incoming: Category) -> Option<CandidateId> {
    st.confirmed
        .values()
        .filter(|seat| {
            !seat.rural
                && (seat.seat_category == incoming || seat.seat_category == Category::General)
        })
        .min_by(|a, b| {
            a.score
                .cmp(&b.score)
                .then_with(|| b.candidate.cmp(&a.candidate))
        })
        .map(|seat| seat.candidate.clone())
}
