//! Candidate/position domains: categories, pools, validated score and
//! acceptance-probability newtypes, scored pairs, and quota structures.
//!
//! Wire tokens follow the source data: vertical categories are `SC`, `ST`,
//! `OBC`, `GEN`; the unreserved *pool* is spelled `UR`.

use crate::errors::CoreError;
use crate::ids::{CandidateId, PositionId};
use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Vertical category of a candidate. `General` is the default/unreserved tag.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Category {
    #[cfg_attr(feature = "serde", serde(rename = "SC"))]
    Sc,
    #[cfg_attr(feature = "serde", serde(rename = "ST"))]
    St,
    #[cfg_attr(feature = "serde", serde(rename = "OBC"))]
    Obc,
    #[cfg_attr(feature = "serde", serde(rename = "GEN"))]
    General,
}

impl Category {
    /// Fixed fill precedence: reserved categories first, general pool last.
    /// This order is part of the observable contract; never reorder.
    pub const PRECEDENCE: [Category; 4] =
        [Category::Sc, Category::St, Category::Obc, Category::General];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Sc => "SC",
            Category::St => "ST",
            Category::Obc => "OBC",
            Category::General => "GEN",
        }
    }

    /// True for categories with a dedicated reserved pool.
    pub fn is_reserved(self) -> bool {
        !matches!(self, Category::General)
    }

    /// The selection pool a seat of this category draws from.
    pub fn pool(self) -> PoolKind {
        match self {
            Category::Sc => PoolKind::Sc,
            Category::St => PoolKind::St,
            Category::Obc => PoolKind::Obc,
            Category::General => PoolKind::General,
        }
    }

    /// Next category in precedence order, if any (spill-down is one-way).
    pub fn next_in_precedence(self) -> Option<Category> {
        match self {
            Category::Sc => Some(Category::St),
            Category::St => Some(Category::Obc),
            Category::Obc => Some(Category::General),
            Category::General => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SC" => Ok(Category::Sc),
            "ST" => Ok(Category::St),
            "OBC" => Ok(Category::Obc),
            "GEN" | "UR" => Ok(Category::General),
            _ => Err(CoreError::InvalidCategory),
        }
    }
}

/// Selection pools per position: one per reserved category, the general
/// (all-candidate) pool, and the horizontal rural overlay.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum PoolKind {
    Sc,
    St,
    Obc,
    General,
    Rural,
}

impl PoolKind {
    pub const ALL: [PoolKind; 5] = [
        PoolKind::Sc,
        PoolKind::St,
        PoolKind::Obc,
        PoolKind::General,
        PoolKind::Rural,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PoolKind::Sc => "SC",
            PoolKind::St => "ST",
            PoolKind::Obc => "OBC",
            PoolKind::General => "UR",
            PoolKind::Rural => "RURAL",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compatibility score in [0, 1], produced externally. Opaque ranking key:
/// the engine only ever compares it. Construction validates the range, so a
/// NaN or out-of-range value is unrepresentable and `total_cmp` gives a total
/// order over the remaining domain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Score(f64);

impl Score {
    pub fn new(v: f64) -> Result<Self, CoreError> {
        if v.is_finite() && (0.0..=1.0).contains(&v) {
            Ok(Self(v))
        } else {
            Err(CoreError::ScoreOutOfRange(v))
        }
    }

    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl Eq for Score {}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(feature = "serde")]
impl Serialize for Score {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        use serde::de::Error as _;
        let v = f64::deserialize(d)?;
        Score::new(v).map_err(|e| D::Error::custom(e.to_string()))
    }
}

/// Acceptance probability in basis points (0..=10_000). Keeping probabilities
/// as integers lets the engine resolve every accept draw with a single integer
/// comparison against a rejection-sampled uniform word.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AcceptBps(u32);

impl AcceptBps {
    pub const ALWAYS: AcceptBps = AcceptBps(10_000);
    pub const NEVER: AcceptBps = AcceptBps(0);
    /// Stock 70% acceptance rate used when a run supplies no probability.
    pub const DEFAULT: AcceptBps = AcceptBps(7_000);

    pub fn new(v: u32) -> Result<Self, CoreError> {
        if v <= 10_000 {
            Ok(Self(v))
        } else {
            Err(CoreError::BpsOutOfRange(v))
        }
    }

    /// Convert a probability in [0, 1] to basis points (nearest; 0.7 is
    /// exactly 7000 despite its inexact binary representation).
    pub fn from_prob(p: f64) -> Result<Self, CoreError> {
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(CoreError::ScoreOutOfRange(p));
        }
        Ok(Self((p * 10_000.0).round() as u32))
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for AcceptBps {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        use serde::de::Error as _;
        let v = u32::deserialize(d)?;
        AcceptBps::new(v).map_err(|e| D::Error::custom(e.to_string()))
    }
}

/// One externally scored (position, candidate) pair with candidate attributes.
/// `gender` is informational only and never consulted by matching logic.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScoredPair {
    pub position: PositionId,
    pub candidate: CandidateId,
    pub score: Score,
    pub category: Category,
    pub rural: bool,
    pub gender: String,
    /// Externally modelled per-pair acceptance probability, if supplied.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub accept_bps: Option<AcceptBps>,
}

/// Integer seat breakdown for one position. Vertical sub-quotas sum exactly to
/// `capacity`; the horizontal `rural` sub-quota is bounded by `capacity` and
/// satisfied *within* it, never in addition to it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuotaSet {
    pub capacity: u32,
    pub sc: u32,
    pub st: u32,
    pub obc: u32,
    pub ur: u32,
    pub rural: u32,
}

impl QuotaSet {
    /// Check the mandatory summing invariants.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.capacity == 0 {
            return Err(CoreError::ZeroCapacity);
        }
        let sum = self.sc + self.st + self.obc + self.ur;
        if sum != self.capacity {
            return Err(CoreError::QuotaSumMismatch {
                capacity: self.capacity,
                sum,
            });
        }
        if self.rural > self.capacity {
            return Err(CoreError::RuralExceedsCapacity {
                capacity: self.capacity,
                rural: self.rural,
            });
        }
        Ok(())
    }

    pub fn seat_target(&self, cat: Category) -> u32 {
        match cat {
            Category::Sc => self.sc,
            Category::St => self.st,
            Category::Obc => self.obc,
            Category::General => self.ur,
        }
    }
}
