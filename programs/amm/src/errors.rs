use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::state::PoolId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmmError {
    #[error("Pool already exists")]
    PoolAlreadyExists,

    #[error("Pool not found")]
    PoolNotFound,

    #[error("Pool not initialized")]
    PoolNotInitialized,

    #[error("Slippage tolerance exceeded")]
    SlippageExceeded,

    #[error("Insufficient liquidity")]
    InsufficientLiquidity,

    #[error("Insufficient liquidity minted")]
    InsufficientLiquidityMinted,

    #[error("Minimum liquidity not met")]
    MinimumLiquidityNotMet,

    #[error("Insufficient output amount")]
    InsufficientOutput,

    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Invalid fee tier: {0} bps")]
    InvalidFee(u16),

    #[error("Identical tokens in pair")]
    IdenticalTokens,

    #[error("Token {0} is not part of this pool")]
    InvalidToken(Pubkey),

    #[error("Caller not allowed")]
    InvalidCaller,

    #[error("Caller is not the contract owner")]
    NotOwner,

    #[error("Insufficient treasury balance: requested {requested}, available {available}")]
    InsufficientTreasuryBalance { requested: u64, available: u64 },

    #[error("Arithmetic overflow")]
    MathOverflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("Token transfer failed: {0}")]
    Transfer(#[from] TokenError),

    /// The ledger may now hold a partial settlement.
    #[error("Token transfer failed ({cause}) and could not be reversed ({rollback})")]
    RollbackFailed { cause: TokenError, rollback: TokenError },
}

impl AmmError {
    /// Stable short name, used as a grouping key by reporting tools.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PoolAlreadyExists => "pool_already_exists",
            Self::PoolNotFound => "pool_not_found",
            Self::PoolNotInitialized => "pool_not_initialized",
            Self::SlippageExceeded => "slippage_exceeded",
            Self::InsufficientLiquidity => "insufficient_liquidity",
            Self::InsufficientLiquidityMinted => "insufficient_liquidity_minted",
            Self::MinimumLiquidityNotMet => "minimum_liquidity_not_met",
            Self::InsufficientOutput => "insufficient_output",
            Self::InvalidAmount => "invalid_amount",
            Self::InvalidFee(_) => "invalid_fee",
            Self::IdenticalTokens => "identical_tokens",
            Self::InvalidToken(_) => "invalid_token",
            Self::InvalidCaller => "invalid_caller",
            Self::NotOwner => "not_owner",
            Self::InsufficientTreasuryBalance { .. } => "insufficient_treasury_balance",
            Self::MathOverflow => "math_overflow",
            Self::DivisionByZero => "division_by_zero",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Transfer(_) => "transfer_failed",
            Self::RollbackFailed { .. } => "rollback_failed",
        }
    }
}

/// Failure reported by a token collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Insufficient balance of {token} for {owner}: needed {needed}, available {available}")]
    InsufficientBalance {
        token: Pubkey,
        owner: Pubkey,
        needed: u64,
        available: u64,
    },

    #[error("Token balance overflow")]
    Overflow,

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

/// Broken bookkeeping found by `Exchange::audit`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("{pool}: total supply {supply} differs from summed positions {positions}")]
    SupplyMismatch {
        pool: PoolId,
        supply: u64,
        positions: u64,
    },

    #[error("{pool}: reserves ({reserve0}, {reserve1}) inconsistent with supply {supply}")]
    ReserveMismatch {
        pool: PoolId,
        reserve0: u64,
        reserve1: u64,
        supply: u64,
    },

    #[error("{pool}: locked liquidity is {locked}, expected {expected}")]
    LockedLiquidity {
        pool: PoolId,
        locked: u64,
        expected: u64,
    },

    #[error("{pool}: registry index does not point back to the pool")]
    RegistryIndex { pool: PoolId },

    #[error("Treasury balance {balance} differs from collected {collected} minus withdrawn {withdrawn}")]
    TreasuryMismatch {
        balance: u64,
        collected: u64,
        withdrawn: u64,
    },
}

pub type Result<T> = std::result::Result<T, AmmError>;
