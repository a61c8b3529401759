//! Stable ordering helpers.
//!
//! Every ranked pool the engine consumes is sorted with this comparator;
//! reproducibility of the whole run depends on it. Position processing order
//! needs no helper: positions live in `BTreeMap`s keyed by `PositionId`,
//! whose lexical `Ord` is the canonical order.

use core::cmp::Ordering;

use crate::entities::Score;
use crate::ids::CandidateId;

/// Ranklist order: score descending, then candidate identity ascending.
/// The identity tie-break makes equal-score orderings reproducible.
pub fn cmp_ranked(a: (&CandidateId, Score), b: (&CandidateId, Score)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}
