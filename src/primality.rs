//! # Primality — Trial Division + Miller–Rabin with Injected Randomness
//!
//! Classifies an integer in two stages, each short-circuiting on a definite
//! answer:
//!
//! 1. **Trial division** against the wheel-30 table in [`crate::sieve`]
//!    (every prime below 2048). Integers below 2048² that survive are proven
//!    prime, so small inputs never reach the probabilistic stage.
//! 2. **Miller–Rabin** with bases drawn uniformly from [2, n − 2] using the
//!    caller's randomness source. Bases are fresh on every call; the test is
//!    Monte Carlo, not deterministic.
//!
//! ## Confidence
//!
//! A composite survives one round with probability at most 1/4, so
//! `confidence` bits of assurance need `ceil(confidence / 2)` rounds. The
//! default of 128 bits runs 64 rounds.
//!
//! ## Arithmetic
//!
//! Modular exponentiation goes through GMP's `mpz_powm_sec` (constant time
//! in the exponent). Its preconditions are checked up front and reported as
//! [`SafePrimeError::ArithmeticProvider`].

use rand::{CryptoRng, RngCore};
use rug::Integer;
use serde::Serialize;
use std::fmt;

use crate::candidate::random_below;
use crate::error::{Result, SafePrimeError};
use crate::sieve;

/// Bits of assurance used when the caller does not pick one.
pub const DEFAULT_CONFIDENCE: u32 = 128;

/// Upper limit on accepted confidence (512 rounds).
pub const MAX_CONFIDENCE: u32 = 1024;

/// Outcome of testing a single integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Composite,
    /// Survived every Miller–Rabin round.
    ProbablyPrime,
    /// Proven by exhaustive trial division.
    Prime,
}

impl Verdict {
    pub fn is_composite(self) -> bool {
        self == Verdict::Composite
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Composite => write!(f, "composite"),
            Verdict::ProbablyPrime => write!(f, "probably prime"),
            Verdict::Prime => write!(f, "prime"),
        }
    }
}

/// Miller–Rabin rounds needed for an error bound of 2^-confidence.
pub fn rounds_for_confidence(confidence: u32) -> Result<u32> {
    if confidence == 0 || confidence > MAX_CONFIDENCE {
        return Err(SafePrimeError::invalid(format!(
            "confidence must be in 1..={}, got {}",
            MAX_CONFIDENCE, confidence
        )));
    }
    Ok(confidence.div_ceil(2))
}

/// Decide `n` by trial division alone, if the table is enough.
///
/// Returns `None` when `n` has no small factor but is too large to be proven
/// by the table.
pub fn trial_division(n: &Integer) -> Option<Verdict> {
    if *n < 2u32 {
        return Some(Verdict::Composite);
    }
    for &p in sieve::small_primes() {
        if n.is_divisible_u(p) {
            return Some(if *n == p {
                Verdict::Prime
            } else {
                Verdict::Composite
            });
        }
    }
    if *n < sieve::PROVEN_BOUND {
        Some(Verdict::Prime)
    } else {
        None
    }
}

/// Test `n` at `confidence` bits of assurance.
pub fn is_prime<R>(n: &Integer, confidence: u32, rng: &mut R) -> Result<Verdict>
where
    R: RngCore + CryptoRng + ?Sized,
{
    if *n < 2u32 {
        return Err(SafePrimeError::invalid(format!(
            "primality test needs n >= 2, got {}",
            n
        )));
    }
    let rounds = rounds_for_confidence(confidence)?;
    if let Some(verdict) = trial_division(n) {
        return Ok(verdict);
    }
    miller_rabin(n, rounds, rng)
}

/// Cheap reject-only check: trial division plus a single Miller–Rabin round.
///
/// A non-composite answer here proves nothing; callers follow up with
/// [`is_prime`].
pub fn screen<R>(n: &Integer, rng: &mut R) -> Result<Verdict>
where
    R: RngCore + CryptoRng + ?Sized,
{
    if let Some(verdict) = trial_division(n) {
        return Ok(verdict);
    }
    miller_rabin(n, 1, rng)
}

/// Run `rounds` Miller–Rabin rounds with random bases.
///
/// `n` must be odd and at least 5; trial division handles everything below.
pub fn miller_rabin<R>(n: &Integer, rounds: u32, rng: &mut R) -> Result<Verdict>
where
    R: RngCore + CryptoRng + ?Sized,
{
    if *n < 5u32 || n.is_even() {
        return Err(SafePrimeError::invalid(format!(
            "miller-rabin needs an odd n >= 5, got {}",
            n
        )));
    }
    let n_minus_1 = Integer::from(n - 1u32);
    let s = n_minus_1.find_one(0).ok_or_else(|| {
        SafePrimeError::ArithmeticProvider(format!("no set bit in {} - 1", n))
    })?;
    let d = Integer::from(&n_minus_1 >> s);
    // bases are 2 + [0, n - 3)
    let span = Integer::from(n - 3u32);

    for _ in 0..rounds {
        let a = random_below(&span, rng)? + 2u32;
        if is_witness(&a, &d, s, n, &n_minus_1)? {
            return Ok(Verdict::Composite);
        }
    }
    Ok(Verdict::ProbablyPrime)
}

/// True when `a` proves `n` composite, where n − 1 = d · 2^s with d odd.
fn is_witness(a: &Integer, d: &Integer, s: u32, n: &Integer, n_minus_1: &Integer) -> Result<bool> {
    let mut x = secure_pow_mod(a, d, n)?;
    if x == 1u32 || x == *n_minus_1 {
        return Ok(false);
    }
    for _ in 1..s {
        x.square_mut();
        x %= n;
        if x == *n_minus_1 {
            return Ok(false);
        }
        if x == 1u32 {
            // nontrivial square root of 1
            return Ok(true);
        }
    }
    Ok(true)
}

fn secure_pow_mod(base: &Integer, exp: &Integer, modulus: &Integer) -> Result<Integer> {
    if modulus.is_even() || *modulus < 3u32 {
        return Err(SafePrimeError::ArithmeticProvider(format!(
            "secure modular exponentiation needs an odd modulus >= 3, got {}",
            modulus
        )));
    }
    if *exp <= 0u32 {
        return Err(SafePrimeError::ArithmeticProvider(format!(
            "secure modular exponentiation needs a positive exponent, got {}",
            exp
        )));
    }
    Ok(Integer::from(base.secure_pow_mod_ref(exp, modulus)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use rug::ops::Pow;

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(0x5afe)
    }

    fn exact_is_prime(n: u64) -> bool {
        n >= 2 && (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
    }

    // ── Confidence Mapping ──────────────────────────────────────────

    #[test]
    fn rounds_are_half_the_confidence_rounded_up() {
        assert_eq!(rounds_for_confidence(1).unwrap(), 1);
        assert_eq!(rounds_for_confidence(2).unwrap(), 1);
        assert_eq!(rounds_for_confidence(3).unwrap(), 2);
        assert_eq!(rounds_for_confidence(80).unwrap(), 40);
        assert_eq!(rounds_for_confidence(DEFAULT_CONFIDENCE).unwrap(), 64);
        assert_eq!(rounds_for_confidence(MAX_CONFIDENCE).unwrap(), 512);
    }

    #[test]
    fn out_of_range_confidence_is_invalid() {
        for c in [0u32, MAX_CONFIDENCE + 1, u32::MAX] {
            assert!(matches!(
                rounds_for_confidence(c),
                Err(SafePrimeError::InvalidInput(_))
            ));
        }
    }

    // ── Trial Division ──────────────────────────────────────────────

    #[test]
    fn trial_division_proves_small_values() {
        for n in 2u64..20_000 {
            let verdict = trial_division(&Integer::from(n)).unwrap();
            let expected = if exact_is_prime(n) {
                Verdict::Prime
            } else {
                Verdict::Composite
            };
            assert_eq!(verdict, expected, "n={}", n);
        }
    }

    #[test]
    fn trial_division_defers_large_survivors() {
        // 2^31 - 1 is prime and far above the proven bound
        assert_eq!(trial_division(&Integer::from(2_147_483_647u32)), None);
        // 2053 * 2063 has no table factor but is above 2048^2
        assert_eq!(trial_division(&Integer::from(2053u32 * 2063)), None);
    }

    // ── is_prime ────────────────────────────────────────────────────

    #[test]
    fn is_prime_rejects_below_two() {
        let mut rng = rng();
        for n in [-5i32, 0, 1] {
            let err = is_prime(&Integer::from(n), DEFAULT_CONFIDENCE, &mut rng).unwrap_err();
            assert!(matches!(err, SafePrimeError::InvalidInput(_)), "n={}", n);
        }
    }

    #[test]
    fn is_prime_rejects_bad_confidence() {
        let err = is_prime(&Integer::from(7u32), 0, &mut rng()).unwrap_err();
        assert!(matches!(err, SafePrimeError::InvalidInput(_)));
    }

    #[test]
    fn is_prime_known_primes() {
        let mut rng = rng();
        let primes: &[u64] = &[
            2,
            3,
            5,
            2039,
            4_194_319,
            2_147_483_647,
            4_294_967_291,
            18_446_744_073_709_551_557,
        ];
        for &p in primes {
            let v = is_prime(&Integer::from(p), DEFAULT_CONFIDENCE, &mut rng).unwrap();
            assert!(!v.is_composite(), "{} reported composite", p);
        }
        let m127 = Integer::from(2u32).pow(127u32) - 1u32;
        assert_eq!(
            is_prime(&m127, DEFAULT_CONFIDENCE, &mut rng).unwrap(),
            Verdict::ProbablyPrime
        );
    }

    #[test]
    fn is_prime_known_composites() {
        let mut rng = rng();
        let composites: &[u64] = &[
            4,
            561,
            1105,
            1729,
            2465,
            2821,
            6601,
            8911,
            // 151 * 751 * 28351, caught by the table
            3_215_031_751,
            // 149491 * 747451 * 34233211, strong pseudoprime to every prime
            // base up to 23 with no factor in the table
            3_825_123_056_546_413_051,
            // 2053 * 2063, no factor in the table
            4_235_339,
            // Carmichael 2221 * 4441 * 6661, no factor in the table
            65_700_513_721,
        ];
        for &c in composites {
            assert_eq!(
                is_prime(&Integer::from(c), DEFAULT_CONFIDENCE, &mut rng).unwrap(),
                Verdict::Composite,
                "{} accepted as prime",
                c
            );
        }
        let m67 = Integer::from(2u32).pow(67u32) - 1u32; // 193707721 * 761838257287
        assert_eq!(
            is_prime(&m67, DEFAULT_CONFIDENCE, &mut rng).unwrap(),
            Verdict::Composite
        );
    }

    // ── Miller–Rabin ────────────────────────────────────────────────

    #[test]
    fn miller_rabin_rejects_carmichael_numbers_directly() {
        // bypasses trial division, which would catch these first
        let mut rng = rng();
        for c in [561u32, 1105, 1729, 2465, 2821, 6601, 8911] {
            assert_eq!(
                miller_rabin(&Integer::from(c), 64, &mut rng).unwrap(),
                Verdict::Composite,
                "Carmichael {} survived",
                c
            );
        }
    }

    #[test]
    fn miller_rabin_accepts_small_primes() {
        let mut rng = rng();
        for p in [5u32, 7, 11, 13, 101, 1009, 10007] {
            assert_eq!(
                miller_rabin(&Integer::from(p), 20, &mut rng).unwrap(),
                Verdict::ProbablyPrime,
                "{}",
                p
            );
        }
    }

    #[test]
    fn miller_rabin_rejects_even_or_tiny_input() {
        let mut rng = rng();
        for n in [2u32, 3, 4, 100] {
            assert!(miller_rabin(&Integer::from(n), 1, &mut rng).is_err(), "n={}", n);
        }
    }

    #[test]
    fn witness_procedure_matches_base_two_strong_pseudoprime() {
        // 2047 = 23 * 89 is a strong pseudoprime to base 2 but not to base 3
        let n = Integer::from(2047u32);
        let n_minus_1 = Integer::from(2046u32);
        let s = n_minus_1.find_one(0).unwrap();
        let d = Integer::from(&n_minus_1 >> s);
        assert!(!is_witness(&Integer::from(2u32), &d, s, &n, &n_minus_1).unwrap());
        assert!(is_witness(&Integer::from(3u32), &d, s, &n, &n_minus_1).unwrap());
    }

    #[test]
    fn strong_pseudoprime_reaches_witness_test() {
        // 149491 * 747451 * 34233211 lies past the table, fools every prime
        // base up to 23, and still falls to random bases
        let n = Integer::from(3_825_123_056_546_413_051u64);
        assert_eq!(trial_division(&n), None);
        let n_minus_1 = Integer::from(&n - 1u32);
        let s = n_minus_1.find_one(0).unwrap();
        let d = Integer::from(&n_minus_1 >> s);
        for base in [2u32, 3, 5, 7, 11, 13, 17, 19, 23] {
            assert!(
                !is_witness(&Integer::from(base), &d, s, &n, &n_minus_1).unwrap(),
                "base {} exposed it",
                base
            );
        }
        assert_eq!(miller_rabin(&n, 64, &mut rng()).unwrap(), Verdict::Composite);
    }

    #[test]
    fn secure_pow_mod_rejects_even_modulus() {
        let err = secure_pow_mod(&Integer::from(3u32), &Integer::from(5u32), &Integer::from(10u32))
            .unwrap_err();
        assert!(matches!(err, SafePrimeError::ArithmeticProvider(_)));
    }

    #[test]
    fn secure_pow_mod_rejects_zero_exponent() {
        let err = secure_pow_mod(&Integer::from(3u32), &Integer::new(), &Integer::from(11u32))
            .unwrap_err();
        assert!(matches!(err, SafePrimeError::ArithmeticProvider(_)));
    }

    #[test]
    fn secure_pow_mod_matches_pow_mod() {
        let b = Integer::from(1234567u32);
        let e = Integer::from(89101u32);
        let m = Integer::from(1_000_000_007u32);
        let expected = b.clone().pow_mod(&e, &m).unwrap();
        assert_eq!(secure_pow_mod(&b, &e, &m).unwrap(), expected);
    }

    // ── Screen ──────────────────────────────────────────────────────

    #[test]
    fn screen_never_rejects_a_prime() {
        let mut rng = rng();
        for p in [3u64, 2039, 4_294_967_291, 2_305_843_009_213_693_951] {
            assert!(!screen(&Integer::from(p), &mut rng).unwrap().is_composite(), "{}", p);
        }
    }

    #[test]
    fn screen_rejects_obvious_composites() {
        let mut rng = rng();
        assert!(screen(&Integer::from(1_000_000u32), &mut rng).unwrap().is_composite());
        assert!(screen(&Integer::from(0u32), &mut rng).unwrap().is_composite());
    }

    #[test]
    fn verdict_display() {
        assert_eq!(Verdict::Composite.to_string(), "composite");
        assert_eq!(Verdict::ProbablyPrime.to_string(), "probably prime");
        assert_eq!(Verdict::Prime.to_string(), "prime");
    }
}
