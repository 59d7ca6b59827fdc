//! # Sieve — Small-Prime Table and Pair Pre-Filter
//!
//! Supplies the trial-division table used by the primality tester and the
//! combined q / 2q+1 pre-filter used by the search loop.
//!
//! ## Wheel-30 Sieve
//!
//! Only integers coprime to 30 = 2·3·5 are tracked, eight residues per block
//! of 30, one byte per block. Composites are struck by stepping odd multiples
//! of each surviving n from n² upward.
//!
//! ## Pair Pre-Filter
//!
//! For a candidate q and small odd prime r, `r | 2q + 1` exactly when
//! `q ≡ (r − 1)/2 (mod r)`. One `mod_u` per table prime therefore rejects a
//! pair when either member has a small factor, before 2q + 1 is even formed.

use rug::Integer;
use std::sync::OnceLock;

/// Trial-division table covers every prime below this bound.
pub const SMALL_PRIME_LIMIT: u32 = 2048;

/// Integers below this value with no factor in the table are proven prime.
pub const PROVEN_BOUND: u64 = (SMALL_PRIME_LIMIT as u64) * (SMALL_PRIME_LIMIT as u64);

static SMALL_PRIMES: OnceLock<Vec<u32>> = OnceLock::new();

/// Every prime below [`SMALL_PRIME_LIMIT`], ascending.
pub fn small_primes() -> &'static [u32] {
    SMALL_PRIMES.get_or_init(|| {
        generate_primes(u64::from(SMALL_PRIME_LIMIT - 1))
            .into_iter()
            .map(|p| p as u32)
            .collect()
    })
}

const WHEEL: [u8; 8] = [1, 7, 11, 13, 17, 19, 23, 29];
const NO_SLOT: u8 = u8::MAX;
// residue mod 30 -> bit position in the block byte
const SLOT: [u8; 30] = [
    NO_SLOT, 0, NO_SLOT, NO_SLOT, NO_SLOT, NO_SLOT, NO_SLOT, 1, NO_SLOT, NO_SLOT, NO_SLOT, 2,
    NO_SLOT, 3, NO_SLOT, NO_SLOT, NO_SLOT, 4, NO_SLOT, 5, NO_SLOT, NO_SLOT, NO_SLOT, 6, NO_SLOT,
    NO_SLOT, NO_SLOT, NO_SLOT, NO_SLOT, 7,
];

/// All primes `<= limit`, via a wheel-30 sieve of Eratosthenes.
pub fn generate_primes(limit: u64) -> Vec<u64> {
    if limit < 2 {
        return vec![];
    }
    if limit < 7 {
        return [2, 3, 5].into_iter().filter(|&p| p <= limit).collect();
    }

    let limit = limit as usize;
    let mut blocks = vec![0xFFu8; limit / 30 + 1];
    let mut n = 7usize;
    while n * n <= limit {
        if unmarked(&blocks, n) {
            // n is odd, so stepping by 2n visits only odd multiples
            let mut m = n * n;
            while m <= limit {
                let slot = SLOT[m % 30];
                if slot != NO_SLOT {
                    blocks[m / 30] &= !(1 << slot);
                }
                m += 2 * n;
            }
        }
        n += 2;
    }

    let mut primes = Vec::with_capacity(approx_prime_count(limit));
    primes.extend_from_slice(&[2, 3, 5]);
    for (block, &byte) in blocks.iter().enumerate() {
        if byte == 0 {
            continue;
        }
        for (bit, &r) in WHEEL.iter().enumerate() {
            let n = block * 30 + r as usize;
            if n > 5 && n <= limit && byte & (1 << bit) != 0 {
                primes.push(n as u64);
            }
        }
    }
    primes
}

fn unmarked(blocks: &[u8], n: usize) -> bool {
    let slot = SLOT[n % 30];
    slot != NO_SLOT && blocks[n / 30] & (1 << slot) != 0
}

fn approx_prime_count(n: usize) -> usize {
    if n < 10 {
        return 4;
    }
    let nf = n as f64;
    (1.3 * nf / nf.ln()) as usize
}

/// True when `n` has a table prime as a proper divisor.
///
/// Single-integer reference for [`pair_has_small_factor`]: the pair filter
/// must agree with `has_small_factor(q) || has_small_factor(2q + 1)`.
pub fn has_small_factor(n: &Integer) -> bool {
    for &p in small_primes() {
        if n.is_divisible_u(p) {
            return *n != p;
        }
    }
    false
}

/// True when q or 2q + 1 has a table prime as a proper divisor.
pub fn pair_has_small_factor(q: &Integer) -> bool {
    for &r in small_primes() {
        let m = q.mod_u(r);
        if m == 0 && *q != r {
            return true;
        }
        if r != 2 && m == (r - 1) / 2 && *q != (r - 1) / 2 {
            return true;
        }
    }
    false
}
