// crates/allot_cli/src/args.rs
//
// Deterministic, offline CLI argument surface.
// Rules:
// - No networked paths (reject any scheme:// like http/https/file)
// - Inputs are two local files: --pairs and --capacities (.csv or .json each)
// - Seed accepts u64 decimal or 0x-hex up to 16 nybbles
// - --validate-only loads and cross-checks inputs without running the engine

use std::path::{Path, PathBuf};

use clap::Parser;

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "allot",
    disable_help_subcommand = true,
    about = "Offline, deterministic reservation allocation engine"
)]
pub struct Args {
    /// Scored (position, candidate) pairs, CSV or JSON.
    #[arg(long)]
    pub pairs: PathBuf,

    /// Position capacity table (optionally with explicit cap_* splits), CSV or JSON.
    #[arg(long)]
    pub capacities: PathBuf,

    /// Output directory for run_record.json and allocation.csv. Omit to skip artifacts.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Acceptance RNG seed. Accepts decimal u64 or 0x-hex (<=16 hex digits).
    #[arg(long, value_parser = parse_seed, default_value = "0")]
    pub seed: u64,

    /// Round cap; reaching it without convergence is reported, not an error.
    #[arg(long, default_value_t = 8)]
    pub max_rounds: u32,

    /// Default acceptance probability in [0,1] for pairs without their own.
    #[arg(long, default_value_t = 0.7)]
    pub accept_prob: f64,

    /// One round, every offer accepted (the classic single-pass fill).
    #[arg(long, conflicts_with_all = ["max_rounds", "accept_prob"])]
    pub single_round: bool,

    /// Route unfillable reserved seats to the next category in precedence.
    #[arg(long)]
    pub spill: bool,

    /// Load + cross-check inputs and resolve quotas, but do not allocate.
    #[arg(long)]
    pub validate_only: bool,

    /// Suppress non-essential stderr logs.
    #[arg(long)]
    pub quiet: bool,
}

/// Errors surfaced by argument validation.
/// Keep messages short/stable (handy for scripts/tests).
#[derive(Debug)]
pub enum CliError {
    NonLocalPath(String),
    NotFound(String),
    BadSeed(String),
    BadProb(f64),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            NonLocalPath(p) => write!(f, "path must be a local file (no scheme): {p}"),
            NotFound(p) => write!(f, "file not found: {p}"),
            BadSeed(s) => write!(f, "invalid seed: {s}"),
            BadProb(p) => write!(f, "accept-prob must be in [0,1], got {p}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Parse CLI args and apply the checks clap cannot express.
pub fn parse_and_validate() -> Result<Args, CliError> {
    let args = Args::parse();
    validate(&args)?;
    Ok(args)
}

fn validate(args: &Args) -> Result<(), CliError> {
    for path in [&args.pairs, &args.capacities] {
        check_local_existing(path)?;
    }
    if let Some(out) = &args.out {
        check_local(out)?;
    }
    if !args.accept_prob.is_finite() || !(0.0..=1.0).contains(&args.accept_prob) {
        return Err(CliError::BadProb(args.accept_prob));
    }
    Ok(())
}

fn check_local(path: &Path) -> Result<(), CliError> {
    let s = path.to_string_lossy();
    if s.contains("://") {
        return Err(CliError::NonLocalPath(s.into_owned()));
    }
    Ok(())
}

fn check_local_existing(path: &Path) -> Result<(), CliError> {
    check_local(path)?;
    if !path.is_file() {
        return Err(CliError::NotFound(path.display().to_string()));
    }
    Ok(())
}

/// Seed parser: decimal u64, or "0x" + up to 16 hex digits.
fn parse_seed(s: &str) -> Result<u64, String> {
    let t = s.trim();
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        if hex.is_empty() || hex.len() > 16 {
            return Err(format!("hex seed must be 1..=16 nybbles: {s}"));
        }
        u64::from_str_radix(hex, 16).map_err(|e| format!("{s}: {e}"))
    } else {
        t.parse::<u64>().map_err(|e| format!("{s}: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_accepts_decimal_and_hex() {
        assert_eq!(parse_seed("123").unwrap(), 123);
        assert_eq!(parse_seed("0xff").unwrap(), 255);
        assert_eq!(parse_seed("0xFFFFFFFFFFFFFFFF").unwrap(), u64::MAX);
        assert!(parse_seed("0x").is_err());
        assert!(parse_seed("0x1_0000_0000_0000_0000").is_err());
        assert!(parse_seed("-1").is_err());
    }

    #[test]
    fn url_like_paths_are_rejected() {
        assert!(check_local(Path::new("https://example.com/x.csv")).is_err());
        assert!(check_local(Path::new("pairs.csv")).is_ok());
    }
}
