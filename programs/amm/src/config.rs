//! Exchange configuration

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::errors::{AmmError, Result};
use crate::state::{DEFAULT_CREATION_FEE, FEE_DENOMINATOR, LOCKED_LIQUIDITY_HOLDER, SUPPORTED_FEE_TIERS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Contract owner, the only identity allowed to withdraw the treasury
    pub owner: Pubkey,

    /// Account holding pooled reserves and the treasury
    pub custody: Pubkey,

    /// Native settlement asset the creation fee is charged in
    pub native_mint: Pubkey,

    /// Flat fee per pool creation, in native asset units
    #[serde(default = "default_creation_fee")]
    pub creation_fee: u64,

    /// Swap fee tiers accepted by the registry, in basis points
    #[serde(default = "default_fee_tiers")]
    pub fee_tiers: Vec<u16>,
}

fn default_creation_fee() -> u64 {
    DEFAULT_CREATION_FEE
}

fn default_fee_tiers() -> Vec<u16> {
    SUPPORTED_FEE_TIERS.to_vec()
}

impl ExchangeConfig {
    pub fn new(owner: Pubkey, custody: Pubkey, native_mint: Pubkey) -> Self {
        Self {
            owner,
            custody,
            native_mint,
            creation_fee: DEFAULT_CREATION_FEE,
            fee_tiers: default_fee_tiers(),
        }
    }

    pub fn with_creation_fee(mut self, creation_fee: u64) -> Self {
        self.creation_fee = creation_fee;
        self
    }

    pub fn with_fee_tiers(mut self, fee_tiers: Vec<u16>) -> Self {
        self.fee_tiers = fee_tiers;
        self
    }

    pub fn supports_fee_tier(&self, fee_bps: u16) -> bool {
        self.fee_tiers.contains(&fee_bps)
    }

    pub fn validate(&self) -> Result<()> {
        if self.owner == LOCKED_LIQUIDITY_HOLDER || self.custody == LOCKED_LIQUIDITY_HOLDER {
            return Err(AmmError::InvalidConfig("owner and custody must be addressable"));
        }
        if self.owner == self.custody {
            return Err(AmmError::InvalidConfig("owner and custody must differ"));
        }
        if self.fee_tiers.is_empty() {
            return Err(AmmError::InvalidConfig("at least one fee tier is required"));
        }
        if self
            .fee_tiers
            .iter()
            .any(|fee| *fee == 0 || *fee as u64 >= FEE_DENOMINATOR)
        {
            return Err(AmmError::InvalidConfig("fee tiers must be within (0, 10000) bps"));
        }
        Ok(())
    }
}
