// crates/allot_io/src/lib.rs
//! I/O crate: the only place in the workspace that touches the filesystem.
//!
//! - Shared error type (`IoError`) with `From` conversions used across modules.
//! - Loaders parse CSV/JSON inputs into the typed domain; all range and token
//!   validation happens here, at the boundary, so the inner crates never see
//!   an invalid score, category, or probability.
//! - Writers emit canonical JSON (sorted keys, atomic replace) and CSV.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for allot_io (used by loader/canonical_json/hasher/writer).
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (create_dir_all, rename, fsync, etc.)
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON serialization/deserialization errors with an optional JSON Pointer.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    /// CSV parse errors, with the 1-based record line where known.
    #[error("csv error at line {line}: {msg}")]
    Csv { line: u64, msg: String },

    /// Hashing-related errors.
    #[error("hash error: {0}")]
    Hash(String),

    /// Generic validation / invariants.
    #[error("invalid: {0}")]
    Invalid(String),
}

pub type IoResult<T> = Result<T, IoError>;

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json doesn't keep a pointer; callers may enrich this.
        IoError::Json { pointer: "/".to_string(), msg: e.to_string() }
    }
}

impl From<csv::Error> for IoError {
    fn from(e: csv::Error) -> Self {
        let line = match e.kind() {
            csv::ErrorKind::Deserialize { pos, .. } => {
                pos.as_ref().map(|p| p.line()).unwrap_or(0)
            }
            _ => 0,
        };
        IoError::Csv { line, msg: e.to_string() }
    }
}

pub mod canonical_json;
pub mod hasher;
pub mod loader;
pub mod writer;

pub mod prelude {
    pub use crate::{IoError, IoResult};

    pub use crate::canonical_json;
    pub use crate::hasher;
    pub use crate::loader;
    pub use crate::writer;

    pub use crate::canonical_json::{to_canonical_bytes, write_canonical_file};
    pub use crate::hasher::{run_digest, sha256_canonical, sha256_hex};
    pub use crate::loader::{load_capacities_csv, load_pairs_csv, load_pairs_json};
    pub use crate::writer::{write_allocation_csv, write_run_artifact, RunArtifact};
}
