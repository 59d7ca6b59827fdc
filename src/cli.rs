//! # CLI Execution Functions
//!
//! Subcommand runners extracted from `main.rs`: config merging, the search
//! itself with its progress reporter, and result formatting.

use anyhow::{anyhow, bail, Context, Result};
use rand::rngs::OsRng;
use rug::Integer;
use safeprime::progress::Progress;
use safeprime::verify::{self, VerifyResult};
use safeprime::{search, SafePrime, SafePrimeError, SearchConfig};
use std::time::Duration;
use tracing::{info, warn};

use super::{Cli, Commands};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// p and q in decimal, one per line
    Decimal,
    /// p and q in lowercase hex, one per line
    Hex,
    /// {"bits", "digits", "p", "q"} object
    Json,
}

// ── Generate ────────────────────────────────────────────────────

/// Build the effective search config: file (or defaults), then flags.
fn resolve_config(cli: &Cli) -> Result<SearchConfig> {
    let mut config = match &cli.config {
        Some(path) => SearchConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SearchConfig::default(),
    };
    if let Commands::Generate {
        bits,
        confidence,
        max_attempts,
        threads,
        shape,
        ..
    } = &cli.command
    {
        if let Some(b) = bits {
            config.bits = *b;
        }
        if let Some(c) = confidence {
            config.confidence = *c;
        }
        if let Some(m) = max_attempts {
            config.max_attempts = Some(*m);
        }
        if let Some(t) = threads {
            config.threads = *t;
        }
        if let Some(s) = shape {
            config.shape = *s;
        }
    }
    Ok(config)
}

pub fn run_generate(cli: &Cli) -> Result<()> {
    let Commands::Generate {
        format,
        progress_secs,
        ..
    } = &cli.command
    else {
        unreachable!("run_generate called for another subcommand")
    };
    let config = resolve_config(cli)?;

    let progress = Progress::new();
    let reporter = (*progress_secs > 0)
        .then(|| progress.start_reporter(Duration::from_secs(*progress_secs)));

    let result = search::search(&config, &mut OsRng, &progress);

    progress.stop();
    if let Some(handle) = reporter {
        let _ = handle.join();
    }

    let found = match result {
        Ok(found) => found,
        Err(e @ SafePrimeError::SearchExhausted { .. }) => {
            warn!("no safe prime within budget; retry with a larger --max-attempts");
            return Err(e.into());
        }
        Err(e) => return Err(e).context("safe prime search failed"),
    };

    if let VerifyResult::Failed { reason } = verify::verify(&found, verify::DEFAULT_REPS) {
        bail!("independent verification rejected the result: {}", reason);
    }
    print_safe_prime(&found, *format)
}

fn print_safe_prime(found: &SafePrime, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Decimal => {
            println!("{}", found.p());
            println!("{}", found.q());
        }
        OutputFormat::Hex => {
            println!("{}", found.p_hex());
            println!("{}", found.q_hex());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(found)?);
        }
    }
    Ok(())
}

// ── Check / Verify ──────────────────────────────────────────────

/// Parse a decimal integer, or hex with a `0x` prefix.
pub fn parse_integer(text: &str) -> Result<Integer> {
    let text = text.trim();
    let (digits, radix) = match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (text, 10),
    };
    Integer::parse_radix(digits, radix)
        .map(Integer::from)
        .map_err(|e| anyhow!("invalid integer '{}': {}", text, e))
}

pub fn run_check(n: &str, confidence: u32) -> Result<()> {
    let n = parse_integer(n)?;
    let verdict = safeprime::is_prime(&n, confidence, &mut OsRng)?;
    println!("{} {}", n, verdict);
    Ok(())
}

pub fn run_verify(p: &str, q: Option<&str>, bits: Option<u32>, reps: u32) -> Result<()> {
    let p = parse_integer(p)?;
    let q = match q {
        Some(q) => parse_integer(q)?,
        None => verify::sophie_germain_of(&p)
            .ok_or_else(|| anyhow!("p={} is not an odd integer >= 5", p))?,
    };
    let bits = bits.unwrap_or_else(|| p.significant_bits());

    match verify::verify_pair(&p, &q, bits, reps) {
        VerifyResult::Verified { method } => {
            info!(bits, method, "safe prime verified");
            println!("verified ({})", method);
            Ok(())
        }
        VerifyResult::Failed { reason } => bail!("not a safe prime: {}", reason),
    }
}
