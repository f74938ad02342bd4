//! Simulation configuration

use amm::{DEFAULT_CREATION_FEE, FEE_DENOMINATOR};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Reasons a configuration cannot drive a simulation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("at least two tokens are needed to form a pool, got {0}")]
    TooFewTokens(u32),

    #[error("fee tier list is empty")]
    NoFeeTiers,

    #[error("swap range is empty: min {min} > max {max}")]
    InvalidSwapRange { min: u64, max: u64 },

    #[error("action probabilities must be within [0, 1] and sum to at most 1")]
    InvalidActionMix,

    #[error("slippage tolerance {0} bps exceeds 100%")]
    InvalidSlippage(u64),

    #[error("need at least one trader and one liquidity provider")]
    NoParticipants,
}

/// Main simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of random actions to run after pools are seeded
    pub steps: u32,

    /// RNG seed; the same seed replays the same run
    pub seed: u64,

    /// Number of distinct tokens; one pool per consecutive pair
    pub num_tokens: u32,

    /// Fee tiers assigned to pools round-robin
    pub fee_tiers: Vec<u16>,

    /// Creation fee charged by the exchange, in native units
    pub creation_fee: u64,

    /// Genesis deposit of the lower-indexed token of each pair
    pub initial_liquidity_a: u64,

    /// Genesis deposit of the higher-indexed token of each pair
    pub initial_liquidity_b: u64,

    pub num_traders: u32,

    /// Starting balance of every token per trader
    pub trader_balance: u64,

    pub num_providers: u32,

    /// Starting balance of every token per liquidity provider
    pub provider_balance: u64,

    /// Minimum swap input
    pub min_swap: u64,

    /// Maximum swap input
    pub max_swap: u64,

    /// Probability a step is a swap
    pub swap_probability: f64,

    /// Probability a step is a deposit; the remainder are withdrawals
    pub add_probability: f64,

    /// Slippage tolerance traders apply to quotes, in basis points
    pub slippage_bps: u64,

    /// Output directory for logs and reports
    pub output_dir: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            steps: 1000,
            seed: 42,
            num_tokens: 3,
            fee_tiers: vec![30, 5, 100],
            creation_fee: DEFAULT_CREATION_FEE,
            initial_liquidity_a: 1_000_000_000_000, // 1000 tokens
            initial_liquidity_b: 500_000_000_000,   // 500 tokens
            num_traders: 10,
            trader_balance: 50_000_000_000,      // 50 tokens
            num_providers: 3,
            provider_balance: 10_000_000_000_000, // 10000 tokens
            min_swap: 100_000_000,               // 0.1 token
            max_swap: 5_000_000_000,             // 5 tokens
            swap_probability: 0.8,
            add_probability: 0.1,
            slippage_bps: 100,
            output_dir: "output".to_string(),
        }
    }
}

impl SimulationConfig {
    /// Create config for a quick test run
    pub fn quick_test() -> Self {
        Self {
            steps: 100,
            num_traders: 4,
            num_providers: 2,
            ..Default::default()
        }
    }

    /// Load a JSON config; missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.num_tokens < 2 {
            return Err(ConfigError::TooFewTokens(self.num_tokens));
        }
        if self.fee_tiers.is_empty() {
            return Err(ConfigError::NoFeeTiers);
        }
        if self.min_swap > self.max_swap {
            return Err(ConfigError::InvalidSwapRange {
                min: self.min_swap,
                max: self.max_swap,
            });
        }

        let in_unit = |p: f64| (0.0..=1.0).contains(&p);
        if !in_unit(self.swap_probability)
            || !in_unit(self.add_probability)
            || self.swap_probability + self.add_probability > 1.0
        {
            return Err(ConfigError::InvalidActionMix);
        }

        if self.slippage_bps > FEE_DENOMINATOR {
            return Err(ConfigError::InvalidSlippage(self.slippage_bps));
        }
        if self.num_traders == 0 || self.num_providers == 0 {
            return Err(ConfigError::NoParticipants);
        }
        Ok(())
    }

    /// Number of pools the run creates
    pub fn num_pools(&self) -> usize {
        self.num_tokens.saturating_sub(1) as usize
    }
}
