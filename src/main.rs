//! # Main — CLI Entry Point
//!
//! Parses arguments, initializes logging, and routes to the subcommand
//! runners in `cli.rs`.
//!
//! ## Subcommands
//!
//! - `generate`: search for a safe prime and print p and q.
//! - `check`: classify a single integer.
//! - `verify`: independently re-check a claimed safe prime.
//!
//! ## Global Options
//!
//! - `--config` / `SAFEPRIME_CONFIG`: TOML file with a `[search]` table;
//!   explicit flags override its values.
//! - `LOG_FORMAT=json` switches log output to JSON; `RUST_LOG` filters it.

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use safeprime::CandidateShape;

#[derive(Parser)]
#[command(name = "safeprime", about = "Generate safe primes p = 2q + 1 with q prime")]
struct Cli {
    /// TOML config file with a [search] table
    #[arg(long, env = "SAFEPRIME_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a safe prime of the given bit length
    Generate {
        /// Bit length of p (q gets one bit less)
        #[arg(short, long)]
        bits: Option<u32>,
        /// Bits of assurance for each primality verdict (rounds = ceil(confidence / 2))
        #[arg(short, long)]
        confidence: Option<u32>,
        /// Give up after this many candidates across all workers
        #[arg(long)]
        max_attempts: Option<u64>,
        /// Worker threads (0 = all logical cores, 1 = no pool)
        #[arg(long)]
        threads: Option<usize>,
        /// Fixed low bits of q: odd or three-mod-four
        #[arg(long)]
        shape: Option<CandidateShape>,
        /// Output format
        #[arg(long, value_enum, default_value_t = cli::OutputFormat::Decimal)]
        format: cli::OutputFormat,
        /// Seconds between progress log lines (0 disables)
        #[arg(long, default_value_t = 30)]
        progress_secs: u64,
    },
    /// Report whether an integer is prime
    Check {
        /// Integer to test (decimal, or hex with a 0x prefix)
        n: String,
        /// Bits of assurance
        #[arg(short, long, default_value_t = safeprime::DEFAULT_CONFIDENCE)]
        confidence: u32,
    },
    /// Re-check a claimed safe prime with an independent primality test
    Verify {
        /// The safe prime p (decimal, or hex with a 0x prefix)
        #[arg(long)]
        p: String,
        /// Its Sophie Germain prime q; derived as (p - 1) / 2 when omitted
        #[arg(long)]
        q: Option<String>,
        /// Expected bit length of p; defaults to the bit length of p
        #[arg(long)]
        bits: Option<u32>,
        /// GMP Miller-Rabin repetitions
        #[arg(long, default_value_t = safeprime::verify::DEFAULT_REPS)]
        reps: u32,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // LOG_FORMAT=json for machine consumption; stdout is reserved for results
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { .. } => cli::run_generate(&cli),
        Commands::Check { n, confidence } => cli::run_check(n, *confidence),
        Commands::Verify { p, q, bits, reps } => cli::run_verify(p, q.as_deref(), *bits, *reps),
    }
}
