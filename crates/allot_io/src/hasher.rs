//! Deterministic hashing over canonical artifacts.
//!
//! Hex digests are lowercase SHA-256 over canonical JSON bytes (sorted object
//! keys, array order preserved), so two runs with the same seed and inputs
//! produce byte-identical digests on any platform.

use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use allot_algo::{AllocationRecord, RoundLog};

use crate::canonical_json::to_canonical_bytes;
use crate::IoResult;

/// SHA-256 over raw bytes, lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// SHA-256 over the canonical JSON bytes of any serializable value.
pub fn sha256_canonical<T: Serialize>(value: &T) -> IoResult<String> {
    let v = serde_json::to_value(value)?;
    Ok(sha256_hex(&to_canonical_bytes(&v)))
}

/// Digest binding one run's observable output to its seed: the allocation
/// table plus the per-round log, hashed canonically. Two runs agree on this
/// digest iff they agree on every confirmed seat and every round snapshot.
pub fn run_digest(seed: u64, records: &[AllocationRecord], log: &RoundLog) -> IoResult<String> {
    let payload: Value = json!({
        "seed": seed,
        "records": serde_json::to_value(records)?,
        "rounds": serde_json::to_value(log)?,
    });
    Ok(sha256_hex(&to_canonical_bytes(&payload)))
}
