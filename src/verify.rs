//! # Verify — Independent Re-Check of a Safe Prime Pair
//!
//! Re-checks a pair without trusting the search pipeline: the structural
//! relation p = 2q + 1, the bit lengths, and primality of both members using
//! GMP's own `mpz_probab_prime_p` (Baillie–PSW plus Miller–Rabin rounds)
//! instead of the crate's tester.
//!
//! GMP answers `Yes` for inputs it proves outright (small values), in which
//! case the method is reported as deterministic.

use rug::integer::IsPrime;
use rug::Integer;

use crate::search::SafePrime;

/// GMP Miller–Rabin repetitions used when the caller has no preference.
pub const DEFAULT_REPS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Verified { method: &'static str },
    Failed { reason: String },
}

impl VerifyResult {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerifyResult::Verified { .. })
    }
}

/// Verify a search result against its own bit length.
pub fn verify(found: &SafePrime, reps: u32) -> VerifyResult {
    verify_pair(found.p(), found.q(), found.bits(), reps)
}

/// Verify that `p = 2q + 1`, p has exactly `bits` bits, q has `bits - 1`,
/// and both are prime according to GMP.
pub fn verify_pair(p: &Integer, q: &Integer, bits: u32, reps: u32) -> VerifyResult {
    if *p != Integer::from(q * 2u32) + 1u32 {
        return VerifyResult::Failed {
            reason: format!("p != 2q + 1 (p={}, q={})", p, q),
        };
    }
    if p.significant_bits() != bits {
        return VerifyResult::Failed {
            reason: format!("p has {} bits, expected {}", p.significant_bits(), bits),
        };
    }
    if bits == 0 || q.significant_bits() != bits - 1 {
        return VerifyResult::Failed {
            reason: format!(
                "q has {} bits, expected {}",
                q.significant_bits(),
                bits.saturating_sub(1)
            ),
        };
    }

    let r_q = q.is_probably_prime(reps);
    if r_q == IsPrime::No {
        return VerifyResult::Failed {
            reason: format!("q={} is composite", q),
        };
    }
    let r_p = p.is_probably_prime(reps);
    if r_p == IsPrime::No {
        return VerifyResult::Failed {
            reason: format!("p={} is composite", p),
        };
    }

    let method = match (r_q, r_p) {
        (IsPrime::Yes, IsPrime::Yes) => "deterministic",
        _ => "probabilistic",
    };
    VerifyResult::Verified { method }
}

/// q for a candidate safe prime p, if p is odd and at least 5.
pub fn sophie_germain_of(p: &Integer) -> Option<Integer> {
    if p.is_even() || *p < 5u32 {
        return None;
    }
    Some(Integer::from(p - 1u32) >> 1u32)
}
