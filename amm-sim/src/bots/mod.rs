//! Market participants driving the simulation

pub mod liquidity_provider;
pub mod trader;

pub use liquidity_provider::{LiquidityAction, LiquidityProvider, LiquidityResult};
pub use trader::{Trader, TradeResult};
