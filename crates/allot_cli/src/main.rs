// crates/allot_cli/src/main.rs
//
// Wires exit codes, typed error mapping, CLI parsing, the validate-only
// short-circuit, and the full run path (params → pipeline → artifacts).

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    pub const VALIDATION: i32 = 2;
    pub const IO: i32 = 4;
    pub const ENGINE: i32 = 5;
}

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use allot_core::{
    entities::AcceptBps,
    policy::{EngineParams, ReservationPolicy, SpillPolicy},
};
use allot_pipeline::{run_from_paths, validate_from_paths, PipelineError, PipelineOptions};

use args::{parse_and_validate as parse_cli, Args};

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("allot: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };

    init_logging(args.quiet);

    let rc = if args.validate_only {
        match validate_from_paths(&args.pairs, &args.capacities, &ReservationPolicy::default()) {
            Ok(()) => {
                println!("inputs valid");
                exitcodes::OK
            }
            Err(e) => report(&e),
        }
    } else {
        match run_once(&args) {
            Ok(()) => exitcodes::OK,
            Err(e) => report(&e),
        }
    };

    ExitCode::from(rc as u8)
}

fn init_logging(quiet: bool) {
    let default = if quiet { "error" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_once(args: &Args) -> Result<(), PipelineError> {
    let options = options_from(args)?;
    let artifact = run_from_paths(&args.pairs, &args.capacities, &options)?;

    println!(
        "placed {} candidates in {} round(s) ({}); {} unplaced",
        artifact.records.len(),
        artifact.rounds_run,
        if artifact.converged { "converged" } else { "round cap reached" },
        artifact.unplaced.len(),
    );
    println!("digest {}", artifact.digest);
    Ok(())
}

fn options_from(args: &Args) -> Result<PipelineOptions, PipelineError> {
    let params = if args.single_round {
        EngineParams::single_round(args.seed)
    } else {
        EngineParams {
            max_rounds: args.max_rounds,
            default_accept_bps: AcceptBps::from_prob(args.accept_prob)
                .map_err(|e| PipelineError::Validate(e.to_string()))?,
            accept_seed: args.seed,
            spill: if args.spill { SpillPolicy::NextCategory } else { SpillPolicy::None },
        }
    };

    Ok(PipelineOptions {
        params,
        policy: ReservationPolicy::default(),
        out_json: args.out.as_ref().map(|d| d.join("run_record.json")),
        out_csv: args.out.as_ref().map(|d| d.join("allocation.csv")),
    })
}

/// Map pipeline errors to the stable exit-code table.
fn report(e: &PipelineError) -> i32 {
    eprintln!("allot: error: {e}");
    match e {
        PipelineError::Io(_) => exitcodes::IO,
        PipelineError::Validate(_) | PipelineError::Plan(_) | PipelineError::Rank(_) => {
            exitcodes::VALIDATION
        }
        PipelineError::Allocate(_) | PipelineError::Build(_) => exitcodes::ENGINE,
    }
}
