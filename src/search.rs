//! # Search — Safe-Prime Search Loop
//!
//! Repeatedly draws a (bits − 1)-bit candidate q, and accepts the first pair
//! where both q and p = 2q + 1 pass the full-confidence primality test.
//!
//! ## Per-Candidate Pipeline
//!
//! 1. **Pair sieve**: one `mod_u` per table prime rejects q when q or 2q + 1
//!    has a small factor (see [`sieve::pair_has_small_factor`]).
//! 2. **Screen**: a single Miller–Rabin round on q, then on 2q + 1. Almost
//!    every surviving composite fails here.
//! 3. **Full tests**: q, then p, each at the requested confidence. Only this
//!    stage can accept.
//!
//! ## Parallel Search
//!
//! With more than one thread, a dedicated rayon pool runs independent
//! workers. Each owns a ChaCha20 stream seeded from the caller's source, so
//! no generator state is shared or duplicated. The first worker to succeed
//! (or fail hard) raises a stop flag that the others check between
//! candidates. The attempt budget is global across workers.

use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use rug::integer::Order;
use rug::Integer;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use crate::candidate::generate_candidate;
use crate::config::SearchConfig;
use crate::error::{Result, SafePrimeError};
use crate::primality::{is_prime, screen};
use crate::progress::Progress;
use crate::{exact_digits, sieve};

/// A safe prime p = 2q + 1 with its Sophie Germain prime q.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafePrime {
    p: Integer,
    q: Integer,
}

impl SafePrime {
    fn from_parts(p: Integer, q: Integer) -> Self {
        SafePrime { p, q }
    }

    pub fn p(&self) -> &Integer {
        &self.p
    }

    pub fn q(&self) -> &Integer {
        &self.q
    }

    /// Significant bits of p.
    pub fn bits(&self) -> u32 {
        self.p.significant_bits()
    }

    pub fn into_parts(self) -> (Integer, Integer) {
        (self.p, self.q)
    }

    /// p as base-256 big-endian bytes.
    pub fn p_bytes(&self) -> Vec<u8> {
        self.p.to_digits::<u8>(Order::Msf)
    }

    /// q as base-256 big-endian bytes.
    pub fn q_bytes(&self) -> Vec<u8> {
        self.q.to_digits::<u8>(Order::Msf)
    }

    pub fn p_hex(&self) -> String {
        self.p.to_string_radix(16)
    }

    pub fn q_hex(&self) -> String {
        self.q.to_string_radix(16)
    }
}

impl fmt::Display for SafePrime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p={} q={}", self.p, self.q)
    }
}

impl Serialize for SafePrime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("SafePrime", 4)?;
        s.serialize_field("bits", &self.bits())?;
        s.serialize_field("digits", &exact_digits(&self.p))?;
        s.serialize_field("p", &self.p.to_string())?;
        s.serialize_field("q", &self.q.to_string())?;
        s.end()
    }
}

/// Run a search with `config`, drawing entropy from `rng`.
///
/// `threads == 1` searches on the caller's thread with `rng` itself; any
/// other value seeds one stream per rayon worker from `rng`.
pub fn search<R>(config: &SearchConfig, rng: &mut R, progress: &Progress) -> Result<SafePrime>
where
    R: RngCore + CryptoRng + ?Sized,
{
    config.validate()?;
    info!(
        bits = config.bits,
        confidence = config.confidence,
        max_attempts = ?config.max_attempts,
        threads = config.threads,
        shape = %config.shape,
        "safe prime search starting"
    );

    let result = if config.threads == 1 {
        let never = AtomicBool::new(false);
        run_worker(config, rng, progress, &never)?.ok_or(SafePrimeError::SearchExhausted {
            attempts: progress.attempts(),
        })
    } else {
        search_parallel(config, rng, progress)
    };

    match &result {
        Ok(found) => info!(
            bits = found.bits(),
            attempts = progress.attempts(),
            elapsed_ms = progress.elapsed().as_millis() as u64,
            "safe prime found"
        ),
        Err(e) => debug!(error = %e, attempts = progress.attempts(), "safe prime search failed"),
    }
    result
}

fn search_parallel<R>(config: &SearchConfig, rng: &mut R, progress: &Progress) -> Result<SafePrime>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .thread_name(|i| format!("safeprime-{}", i))
        .build()?;
    let workers = pool.current_num_threads();

    let streams = (0..workers)
        .map(|_| ChaCha20Rng::from_rng(&mut *rng))
        .collect::<std::result::Result<Vec<_>, rand::Error>>()?;
    debug!(workers, "seeded independent worker streams");

    let stop = AtomicBool::new(false);
    let outcome = pool.install(|| {
        streams
            .into_par_iter()
            .enumerate()
            .find_map_any(|(worker, mut stream)| {
                match run_worker(config, &mut stream, progress, &stop) {
                    Ok(Some(found)) => {
                        stop.store(true, Ordering::Relaxed);
                        debug!(worker, "worker won the race");
                        Some(Ok(found))
                    }
                    Ok(None) => None,
                    Err(e) => {
                        stop.store(true, Ordering::Relaxed);
                        Some(Err(e))
                    }
                }
            })
    });

    outcome.unwrap_or(Err(SafePrimeError::SearchExhausted {
        attempts: progress.attempts(),
    }))
}

/// Draw and test candidates until one succeeds, the budget runs out, or
/// `stop` is raised. `Ok(None)` means the worker gave up without a result.
fn run_worker<R>(
    config: &SearchConfig,
    rng: &mut R,
    progress: &Progress,
    stop: &AtomicBool,
) -> Result<Option<SafePrime>>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let q_bits = config.bits - 1;
    while !stop.load(Ordering::Relaxed) {
        if !progress.claim_attempt(config.max_attempts) {
            return Ok(None);
        }
        let q = generate_candidate(q_bits, config.shape, rng)?;
        if let Some(found) = test_candidate(q, config.confidence, rng, progress)? {
            progress.found.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Run the per-candidate pipeline on q.
pub fn test_candidate<R>(
    q: Integer,
    confidence: u32,
    rng: &mut R,
    progress: &Progress,
) -> Result<Option<SafePrime>>
where
    R: RngCore + CryptoRng + ?Sized,
{
    if sieve::pair_has_small_factor(&q) {
        progress.sieved.fetch_add(1, Ordering::Relaxed);
        return Ok(None);
    }
    let p = Integer::from(&q << 1u32) + 1u32;
    if screen(&q, rng)?.is_composite() || screen(&p, rng)?.is_composite() {
        return Ok(None);
    }
    if is_prime(&q, confidence, rng)?.is_composite() {
        return Ok(None);
    }
    progress.q_passed.fetch_add(1, Ordering::Relaxed);
    debug!(q_bits = q.significant_bits(), "q passed, testing p = 2q + 1");
    if is_prime(&p, confidence, rng)?.is_composite() {
        return Ok(None);
    }
    Ok(Some(SafePrime::from_parts(p, q)))
}
