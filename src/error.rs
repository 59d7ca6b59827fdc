//! # Error — Failure Kinds of the Safe-Prime Engine
//!
//! Every fallible operation in the crate returns [`SafePrimeError`]. The four
//! core kinds stay distinct so callers can tell misuse (`InvalidInput`) from
//! dependency failure (`EntropyUnavailable`, `ArithmeticProvider`) from a soft,
//! retryable outcome (`SearchExhausted`).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SafePrimeError>;

#[derive(Debug, Error)]
pub enum SafePrimeError {
    /// Caller misuse: bad bit length, confidence, or integer to test.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The randomness source failed to supply bytes.
    #[error("entropy unavailable: {0}")]
    EntropyUnavailable(#[source] rand::Error),

    /// The attempt budget ran out before a safe prime was found.
    #[error("search exhausted after {attempts} attempts without finding a safe prime")]
    SearchExhausted { attempts: u64 },

    /// The big-integer provider rejected an operation.
    #[error("arithmetic provider error: {0}")]
    ArithmeticProvider(String),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid config: {0}")]
    Config(String),
}

impl SafePrimeError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SafePrimeError::InvalidInput(msg.into())
    }

    /// True for outcomes a caller may retry with a larger attempt budget.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SafePrimeError::SearchExhausted { .. })
    }
}

impl From<rand::Error> for SafePrimeError {
    fn from(e: rand::Error) -> Self {
        SafePrimeError::EntropyUnavailable(e)
    }
}
