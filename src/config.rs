//! # Config — Search Parameters and TOML Loading
//!
//! [`SearchConfig`] carries every knob of a safe-prime search. It can be built
//! in code, or read from a TOML file with a `[search]` table:
//!
//! ```toml
//! [search]
//! bits = 2048
//! confidence = 128
//! max_attempts = 100000
//! threads = 0        # 0 = all logical cores, 1 = caller's thread only
//! shape = "odd"      # or "three-mod-four"
//! ```
//!
//! Missing keys take their defaults; unknown keys are rejected.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::candidate::CandidateShape;
use crate::error::{Result, SafePrimeError};
use crate::primality::{rounds_for_confidence, DEFAULT_CONFIDENCE};

pub const DEFAULT_BITS: u32 = 2048;

/// Smallest safe prime bit length: q must keep at least 2 bits.
pub const MIN_BITS: u32 = 3;

/// Largest accepted bit length. Each candidate draw allocates `bits / 8`
/// bytes and each Miller–Rabin round is cubic in `bits`, so sizes past this
/// would not finish in any useful time.
pub const MAX_BITS: u32 = 65536;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Significant bits of p.
    pub bits: u32,
    /// Bits of assurance for each primality verdict.
    pub confidence: u32,
    /// Candidate budget across all workers; `None` searches until found.
    pub max_attempts: Option<u64>,
    pub threads: usize,
    pub shape: CandidateShape,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            bits: DEFAULT_BITS,
            confidence: DEFAULT_CONFIDENCE,
            max_attempts: None,
            threads: 1,
            shape: CandidateShape::Odd,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    search: SearchConfig,
}

impl SearchConfig {
    pub fn new(bits: u32) -> Self {
        SearchConfig {
            bits,
            ..Default::default()
        }
    }

    pub fn with_confidence(mut self, confidence: u32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_shape(mut self, shape: CandidateShape) -> Self {
        self.shape = shape;
        self
    }

    /// Reject parameters no search could satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.bits < MIN_BITS {
            return Err(SafePrimeError::invalid(format!(
                "safe prime needs at least {} bits, got {}",
                MIN_BITS, self.bits
            )));
        }
        if self.bits > MAX_BITS {
            return Err(SafePrimeError::invalid(format!(
                "safe prime size is capped at {} bits, got {}",
                MAX_BITS, self.bits
            )));
        }
        rounds_for_confidence(self.confidence)?;
        if self.max_attempts == Some(0) {
            return Err(SafePrimeError::invalid("max_attempts must be at least 1"));
        }
        Ok(())
    }

    /// Parse the `[search]` table of a TOML document and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(text).map_err(|e| SafePrimeError::Config(e.to_string()))?;
        file.search.validate()?;
        Ok(file.search)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SafePrimeError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        let file = ConfigFile {
            search: self.clone(),
        };
        toml::to_string(&file).map_err(|e| SafePrimeError::Config(e.to_string()))
    }
}
