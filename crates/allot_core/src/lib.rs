//! allot_core — Core types, domains, ordering helpers, and deterministic RNG.
//!
//! This crate is **I/O-free**. It defines the stable types shared across the
//! engine (`allot_io`, `allot_algo`, `allot_pipeline`, `allot_cli`):
//!
//! - Registry tokens: `CandidateId`, `PositionId`
//! - Domains: `Category`, `PoolKind`, validated `Score` / `AcceptBps`
//! - Policy & engine parameters with safe defaults
//! - Deterministic ordering helpers (score desc, identity asc)
//! - Seedable RNG (ChaCha20) for the **acceptance draw only**
//!
//! Serialization derives are gated behind the `serde` feature.

#![forbid(unsafe_code)]

pub mod determinism;
pub mod entities;
pub mod ids;
pub mod policy;
pub mod rng;

pub mod errors {
    use core::fmt;

    /// Minimal error set for core-domain validation & parsing.
    #[derive(Clone, Debug, PartialEq)]
    pub enum CoreError {
        InvalidId,
        InvalidCategory,
        /// Score must be finite and within [0, 1].
        ScoreOutOfRange(f64),
        /// Basis points must lie within 0..=10_000.
        BpsOutOfRange(u32),
        /// Vertical sub-quotas must sum exactly to capacity.
        QuotaSumMismatch { capacity: u32, sum: u32 },
        /// Horizontal sub-quota must not exceed capacity.
        RuralExceedsCapacity { capacity: u32, rural: u32 },
        ZeroCapacity,
        DomainOutOfRange(&'static str),
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::InvalidId => write!(f, "invalid id token"),
                CoreError::InvalidCategory => write!(f, "invalid category token"),
                CoreError::ScoreOutOfRange(v) => write!(f, "score out of range [0,1]: {v}"),
                CoreError::BpsOutOfRange(v) => write!(f, "basis points out of range 0..=10000: {v}"),
                CoreError::QuotaSumMismatch { capacity, sum } => {
                    write!(f, "vertical sub-quotas sum to {sum}, capacity is {capacity}")
                }
                CoreError::RuralExceedsCapacity { capacity, rural } => {
                    write!(f, "rural sub-quota {rural} exceeds capacity {capacity}")
                }
                CoreError::ZeroCapacity => write!(f, "capacity must be >= 1"),
                CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub use entities::{AcceptBps, Category, PoolKind, QuotaSet, Score, ScoredPair};
pub use errors::CoreError;
pub use ids::{CandidateId, PositionId};
pub use policy::{EngineParams, ReservationPolicy, SpillPolicy};
pub use rng::AcceptRng;
