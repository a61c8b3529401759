//! Loaders: read local CSV/JSON inputs into typed domain values.
//!
//! All boundary validation lives here. A `ScoredPair` that comes out of a
//! loader already carries a range-checked `Score`, a parsed `Category`, and a
//! basis-point acceptance probability; downstream crates never re-validate.
//! No network I/O.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use allot_core::{
    entities::{AcceptBps, Category, QuotaSet, Score, ScoredPair},
    ids::{CandidateId, PositionId},
};

use crate::{IoError, IoResult};

/// One position's seat budget: total capacity, plus an explicit quota split
/// when the input supplies one (otherwise the planner derives it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionCapacity {
    pub capacity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota: Option<QuotaSet>,
}

pub type CapacityTable = BTreeMap<PositionId, PositionCapacity>;

// ----------------------------- CSV wire rows -----------------------------

/// Raw scored-pair row as it appears on disk; converted and validated into a
/// `ScoredPair` per record.
#[derive(Debug, Deserialize)]
struct RawPairRow {
    position_id: String,
    candidate_id: String,
    score: f64,
    category: String,
    rural: String,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    accept_prob: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawCapacityRow {
    position_id: String,
    capacity: u32,
    #[serde(default)]
    cap_sc: Option<u32>,
    #[serde(default)]
    cap_st: Option<u32>,
    #[serde(default)]
    cap_obc: Option<u32>,
    #[serde(default)]
    cap_ur: Option<u32>,
    #[serde(default)]
    cap_rural: Option<u32>,
}

// ------------------------------- CSV loaders -------------------------------

/// Load scored pairs from a headed CSV file.
///
/// Required columns: `position_id,candidate_id,score,category,rural`.
/// Optional: `gender` (defaults to `NA`), `accept_prob` (a probability in
/// [0, 1], converted to basis points here, once).
pub fn load_pairs_csv(path: &Path) -> IoResult<Vec<ScoredPair>> {
    let mut rdr = csv::Reader::from_path(path).map_err(IoError::from)?;
    let mut pairs = Vec::new();

    for (i, row) in rdr.deserialize::<RawPairRow>().enumerate() {
        let line = (i + 2) as u64; // 1-based, after the header
        let raw = row?;
        pairs.push(pair_from_raw(raw, line)?);
    }
    Ok(pairs)
}

fn pair_from_raw(raw: RawPairRow, line: u64) -> IoResult<ScoredPair> {
    let at = |msg: String| IoError::Csv { line, msg };

    let position: PositionId = raw
        .position_id
        .parse()
        .map_err(|e| at(format!("position_id {:?}: {e}", raw.position_id)))?;
    let candidate: CandidateId = raw
        .candidate_id
        .parse()
        .map_err(|e| at(format!("candidate_id {:?}: {e}", raw.candidate_id)))?;
    let score = Score::new(raw.score).map_err(|e| at(e.to_string()))?;
    let category: Category = raw
        .category
        .parse()
        .map_err(|_| at(format!("unknown category {:?}", raw.category)))?;
    let rural = parse_flag(&raw.rural).ok_or_else(|| at(format!(
        "rural must be 0/1/true/false, got {:?}",
        raw.rural
    )))?;
    let accept_bps = match raw.accept_prob {
        Some(p) => Some(AcceptBps::from_prob(p).map_err(|e| at(e.to_string()))?),
        None => None,
    };

    Ok(ScoredPair {
        position,
        candidate,
        score,
        category,
        rural,
        gender: raw.gender.unwrap_or_else(|| "NA".to_string()),
        accept_bps,
    })
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim() {
        "1" => Some(true),
        "0" => Some(false),
        other => match other.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
    }
}

/// Load the capacity table from a headed CSV file.
///
/// Required columns: `position_id,capacity`. The five `cap_*` split columns
/// are all-or-nothing per row: when present they are validated as an explicit
/// quota split (vertical parts summing to capacity); when absent the planner
/// derives the split from policy.
pub fn load_capacities_csv(path: &Path) -> IoResult<CapacityTable> {
    let mut rdr = csv::Reader::from_path(path).map_err(IoError::from)?;
    let mut table = CapacityTable::new();

    for (i, row) in rdr.deserialize::<RawCapacityRow>().enumerate() {
        let line = (i + 2) as u64;
        let raw = row?;
        let at = |msg: String| IoError::Csv { line, msg };

        let position: PositionId = raw
            .position_id
            .parse()
            .map_err(|e| at(format!("position_id {:?}: {e}", raw.position_id)))?;

        let splits = [raw.cap_sc, raw.cap_st, raw.cap_obc, raw.cap_ur, raw.cap_rural];
        let quota = if splits.iter().all(Option::is_some) {
            let q = QuotaSet {
                capacity: raw.capacity,
                sc: raw.cap_sc.unwrap_or(0),
                st: raw.cap_st.unwrap_or(0),
                obc: raw.cap_obc.unwrap_or(0),
                ur: raw.cap_ur.unwrap_or(0),
                rural: raw.cap_rural.unwrap_or(0),
            };
            q.validate().map_err(|e| at(e.to_string()))?;
            Some(q)
        } else if splits.iter().all(Option::is_none) {
            None
        } else {
            return Err(at("cap_* split columns must be given all together or not at all".into()));
        };

        let prev = table.insert(position.clone(), PositionCapacity { capacity: raw.capacity, quota });
        if prev.is_some() {
            return Err(at(format!("duplicate position {position}")));
        }
    }
    Ok(table)
}

// ------------------------------- JSON loaders -------------------------------

/// Load scored pairs from a JSON array of pair objects.
pub fn load_pairs_json(path: &Path) -> IoResult<Vec<ScoredPair>> {
    let f = File::open(path)?;
    let pairs: Vec<ScoredPair> = serde_json::from_reader(BufReader::new(f))?;
    Ok(pairs)
}

/// Load the capacity table from a JSON object keyed by position id.
pub fn load_capacities_json(path: &Path) -> IoResult<CapacityTable> {
    let f = File::open(path)?;
    let table: CapacityTable = serde_json::from_reader(BufReader::new(f))?;
    for (position, entry) in &table {
        if let Some(q) = &entry.quota {
            if q.capacity != entry.capacity {
                return Err(IoError::Invalid(format!(
                    "{position}: quota capacity {} disagrees with declared capacity {}",
                    q.capacity, entry.capacity
                )));
            }
            q.validate()
                .map_err(|e| IoError::Invalid(format!("{position}: {e}")))?;
        }
    }
    Ok(table)
}
