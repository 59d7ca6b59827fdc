//! # safeprime — Safe Prime Generation
//!
//! Finds primes p = 2q + 1 where q is also prime, at a requested bit length
//! and confidence. Big-integer arithmetic is GMP via `rug`; randomness is
//! always supplied by the caller (any `RngCore + CryptoRng`), so searches can
//! be reproduced in tests with a seeded ChaCha stream and parallelized with
//! independent per-worker streams.
//!
//! ```no_run
//! let found = safeprime::generate_safe_prime(512, safeprime::DEFAULT_CONFIDENCE)?;
//! assert_eq!(found.bits(), 512);
//! # Ok::<(), safeprime::SafePrimeError>(())
//! ```

pub mod candidate;
pub mod config;
pub mod error;
pub mod primality;
pub mod progress;
pub mod search;
pub mod sieve;
pub mod verify;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use rug::Integer;

pub use candidate::{generate_candidate, CandidateShape};
pub use config::SearchConfig;
pub use error::{Result, SafePrimeError};
pub use primality::{is_prime, Verdict, DEFAULT_CONFIDENCE};
pub use search::SafePrime;

/// Generate a `bits`-bit safe prime from the operating system's CSPRNG.
///
/// Searches on the caller's thread with no attempt budget.
pub fn generate_safe_prime(bits: u32, confidence: u32) -> Result<SafePrime> {
    let config = SearchConfig::new(bits).with_confidence(confidence);
    generate_safe_prime_with(&config, &mut OsRng)
}

/// Generate a safe prime as described by `config`, drawing from `rng`.
pub fn generate_safe_prime_with<R>(config: &SearchConfig, rng: &mut R) -> Result<SafePrime>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let progress = progress::Progress::new();
    search::search(config, rng, &progress)
}

/// Exact decimal digit count.
pub fn exact_digits(n: &Integer) -> u64 {
    n.to_string_radix(10).trim_start_matches('-').len() as u64
}
