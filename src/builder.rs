//! Carry vector builder
//!
//! Runs one independent [`TermEnumerator`] per prefix width `1..=N` and
//! collects the carries. No width feeds another: each one is its own full
//! expansion down to the shared carry-in.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::ConfigError;
use crate::lanes::pack_lanes;
use crate::ripple::ripple_carries;
use crate::term::{term_count, TermEnumerator, WidthResult, MAX_WIDTH};

/// Widths past this log a warning: the expansion gets expensive quickly.
const LARGE_WIDTH: usize = 20;

fn default_parallel() -> bool {
    true
}

/// Construction-time builder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Operand width `N`.
    pub width: usize,
    /// Dispatch prefix widths over the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl BuilderConfig {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            parallel: default_parallel(),
        }
    }

    pub fn sequential(width: usize) -> Self {
        Self {
            width,
            parallel: false,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            ConfigError::InvalidConfig(format!("failed to parse config JSON: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        if self.width > MAX_WIDTH {
            return Err(ConfigError::WidthTooLarge {
                width: self.width,
                max: MAX_WIDTH,
            });
        }
        Ok(())
    }
}

/// Output of one build: `carry.len() == N + 1`, `generate.len() == N`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryVector {
    /// `carry[0]` is the carry-in, `carry[k]` the carry out of prefix width `k`.
    pub carry: Vec<u64>,
    /// `generate[k] = a[k] & b[k]`.
    pub generate: Vec<u64>,
}

impl CarryVector {
    pub fn width(&self) -> usize {
        self.generate.len()
    }

    /// Carry bit `k` in `lane`.
    pub fn carry_bit(&self, k: usize, lane: usize) -> bool {
        (self.carry[k] >> lane) & 1 == 1
    }

    /// Generate bit `k` in `lane`.
    pub fn generate_bit(&self, k: usize, lane: usize) -> bool {
        (self.generate[k] >> lane) & 1 == 1
    }

    /// Compare every carry against sequential propagation of the same inputs.
    pub fn matches_ripple(&self, a: &[u64], b: &[u64], cin: u64) -> bool {
        self.carry == ripple_carries(a, b, cin)
    }
}

/// Carries of a single scalar addition, packed one bit per position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarCarries {
    /// Bit `k` is `carry[k]`, bits `0..=N`.
    pub carry: u64,
    /// Bit `k` is `generate[k]`, bits `0..N`.
    pub generate: u64,
}

/// Builds the full carry vector for a fixed operand width.
#[derive(Debug, Clone)]
pub struct CarryVectorBuilder {
    config: BuilderConfig,
}

impl CarryVectorBuilder {
    pub fn new(config: BuilderConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let total_terms: u64 = (1..=config.width).map(term_count).sum();
        if config.width > LARGE_WIDTH {
            warn!(width = config.width, total_terms, "large expansion");
        }
        info!(
            width = config.width,
            parallel = config.parallel,
            total_terms,
            "carry vector builder ready"
        );

        Ok(Self { config })
    }

    pub fn with_width(width: usize) -> Result<Self, ConfigError> {
        Self::new(BuilderConfig::new(width))
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::new(BuilderConfig::from_json(json)?)
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn width(&self) -> usize {
        self.config.width
    }

    /// Total product terms across all prefix widths.
    pub fn total_terms(&self) -> u64 {
        (1..=self.config.width).map(term_count).sum()
    }

    fn evaluate_width(
        k: usize,
        a: &[u64],
        b: &[u64],
        cin: u64,
    ) -> Result<WidthResult, ConfigError> {
        TermEnumerator::new(k)?.evaluate(&a[..k], &b[..k], cin)
    }

    /// Compute carry and generate vectors over lane masks.
    #[instrument(skip_all, fields(width = self.config.width), err)]
    pub fn build(&self, a: &[u64], b: &[u64], cin: u64) -> Result<CarryVector, ConfigError> {
        let n = self.config.width;
        if a.len() != n || b.len() != n {
            return Err(ConfigError::OperandWidthMismatch {
                expected: n,
                a: a.len(),
                b: b.len(),
            });
        }

        let results: Vec<WidthResult> = if self.config.parallel {
            (1..=n)
                .into_par_iter()
                .map(|k| Self::evaluate_width(k, a, b, cin))
                .collect::<Result<_, _>>()?
        } else {
            (1..=n)
                .map(|k| Self::evaluate_width(k, a, b, cin))
                .collect::<Result<_, _>>()?
        };

        Self::assemble(cin, results)
    }

    /// Collect per-width results, in width order starting at 1.
    fn assemble(cin: u64, results: Vec<WidthResult>) -> Result<CarryVector, ConfigError> {
        let mut carry = Vec::with_capacity(results.len() + 1);
        let mut generate = Vec::with_capacity(results.len());
        carry.push(cin);
        for (i, r) in results.into_iter().enumerate() {
            carry.push(r.carry);
            generate.push(r.generate.ok_or(ConfigError::MissingGenerate { width: i + 1 })?);
        }

        Ok(CarryVector { carry, generate })
    }

    /// Single-vector convenience over the low `N` bits of `a` and `b`.
    pub fn build_scalar(&self, a: u64, b: u64, cin: bool) -> Result<ScalarCarries, ConfigError> {
        let n = self.config.width;
        let a_bits = pack_lanes(&[a], n);
        let b_bits = pack_lanes(&[b], n);
        let v = self.build(&a_bits, &b_bits, cin as u64)?;

        let carry = v
            .carry
            .iter()
            .enumerate()
            .fold(0u64, |acc, (k, &c)| acc | ((c & 1) << k));
        let generate = v
            .generate
            .iter()
            .enumerate()
            .fold(0u64, |acc, (k, &g)| acc | ((g & 1) << k));

        Ok(ScalarCarries { carry, generate })
    }
}
