// crates/allot_algo/src/lib.rs
#![forbid(unsafe_code)]

//! allot_algo — ranklists, quota planning, the multi-round allocation engine,
//! and round logging. Pure and I/O-free; everything here is deterministic
//! given the same inputs and acceptance seed.

pub mod quota;
pub mod ranklist;
pub mod roundlog;

pub mod engine {
    // File modules (actual implementations)
    pub mod reconcile;
    pub mod rounds;
    pub mod state;

    pub use rounds::{run_allocation, AllocationOutcome, AllocationRecord, EngineError};
    pub use state::{AllocationState, CategoryFill, ConfirmedSeat, PoolCursors, PositionState};
}

// Tight, explicit re-exports (avoid wildcard export drift).
pub use engine::{
    run_allocation, AllocationOutcome, AllocationRecord, AllocationState, ConfirmedSeat,
    EngineError, PositionState,
};
pub use quota::{plan_quotas, QuotaError};
pub use ranklist::{build_ranklists, PoolEntry, PositionPools, RankLists, RanklistError};
pub use roundlog::{PositionRoundEntry, RoundEntry, RoundLog};
