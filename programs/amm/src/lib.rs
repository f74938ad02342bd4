//! Constant-product AMM engine.
//!
//! A single [`Exchange`] holds every pool, liquidity position and the protocol
//! treasury. Operations are serial and atomic: each one either commits all of
//! its state changes and token transfers, or fails with an [`AmmError`] and
//! leaves everything untouched. Token movements go through a [`TokenLedger`]
//! supplied by the caller.

pub mod config;
pub mod errors;
pub mod events;
pub mod exchange;
pub mod instructions;
pub mod math;
pub mod settlement;
pub mod state;
pub mod token;

#[cfg(test)]
mod test_utils;

pub use config::ExchangeConfig;
pub use errors::{AmmError, InvariantViolation, Result, TokenError};
pub use events::{ExchangeEvent, Receipt, TransferEvent};
pub use exchange::Exchange;
pub use state::{
    Deposit, Pool, PoolId, PoolKey, PoolStatus, SwapDirection, SwapQuote, Treasury,
    DEFAULT_CREATION_FEE, FEE_DENOMINATOR, LOCKED_LIQUIDITY_HOLDER, MINIMUM_LIQUIDITY, PRICE_SCALE,
    SUPPORTED_FEE_TIERS,
};
pub use token::{InMemoryLedger, TokenLedger};
