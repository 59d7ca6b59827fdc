//! # Candidate — Random Sophie Germain Candidates
//!
//! Draws the q half of a prospective safe prime p = 2q + 1. A candidate has
//! exactly the requested number of significant bits (top bit forced), is odd,
//! and is otherwise uniform over what the randomness source supplies.
//!
//! Entropy is read through `RngCore::try_fill_bytes` so a failing source
//! surfaces as [`SafePrimeError::EntropyUnavailable`] instead of a panic.

use rand::{CryptoRng, RngCore};
use rug::integer::Order;
use rug::Integer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SafePrimeError};

/// Which low bits of a candidate are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateShape {
    /// Bottom bit set: q odd, so p = 2q + 1 ≡ 3 (mod 4).
    #[default]
    Odd,
    /// Bottom two bits set: q ≡ 3 (mod 4), so p ≡ 7 (mod 8) and 2 is a
    /// quadratic residue mod p.
    ThreeModFour,
}

impl CandidateShape {
    fn low_bits(self) -> u32 {
        match self {
            CandidateShape::Odd => 1,
            CandidateShape::ThreeModFour => 2,
        }
    }
}

impl fmt::Display for CandidateShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateShape::Odd => write!(f, "odd"),
            CandidateShape::ThreeModFour => write!(f, "three-mod-four"),
        }
    }
}

impl FromStr for CandidateShape {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "odd" => Ok(CandidateShape::Odd),
            "three-mod-four" | "3mod4" => Ok(CandidateShape::ThreeModFour),
            other => Err(format!(
                "unknown candidate shape '{}' (expected odd or three-mod-four)",
                other
            )),
        }
    }
}

/// Uniform integer in [0, 2^bits), read from `rng`.
pub(crate) fn random_bits<R>(bits: u32, rng: &mut R) -> Result<Integer>
where
    R: RngCore + ?Sized,
{
    let mut buf = vec![0u8; bits.div_ceil(8) as usize];
    rng.try_fill_bytes(&mut buf)?;
    let mut n = Integer::from_digits(&buf, Order::Msf);
    n.keep_bits_mut(bits);
    Ok(n)
}

/// Uniform integer in [0, bound) by rejection sampling; `bound` must be positive.
pub(crate) fn random_below<R>(bound: &Integer, rng: &mut R) -> Result<Integer>
where
    R: RngCore + ?Sized,
{
    if *bound <= 0u32 {
        return Err(SafePrimeError::ArithmeticProvider(format!(
            "cannot sample below non-positive bound {}",
            bound
        )));
    }
    let bits = bound.significant_bits();
    loop {
        let n = random_bits(bits, rng)?;
        if n < *bound {
            return Ok(n);
        }
    }
}

/// Generate a candidate with exactly `bits` significant bits and the low
/// bits fixed by `shape`.
pub fn generate_candidate<R>(bits: u32, shape: CandidateShape, rng: &mut R) -> Result<Integer>
where
    R: RngCore + CryptoRng + ?Sized,
{
    if bits < 2 {
        return Err(SafePrimeError::invalid(format!(
            "candidate needs at least 2 bits, got {}",
            bits
        )));
    }
    let mut q = random_bits(bits, rng)?;
    q.set_bit(bits - 1, true);
    for i in 0..shape.low_bits() {
        q.set_bit(i, true);
    }
    Ok(q)
}
