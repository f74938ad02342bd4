//! Mutating exchange operations, grouped by engine

pub mod create_pool;
pub mod liquidity;
pub mod swap;
pub mod treasury;
