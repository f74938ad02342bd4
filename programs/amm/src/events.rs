use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::state::{PoolId, PoolKey, SwapDirection};

/// One asset movement performed by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferEvent {
    pub token: Pubkey,
    pub from: Pubkey,
    pub to: Pubkey,
    pub amount: u64,
}

/// Value returned by a mutating operation together with the transfers it
/// performed, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt<T> {
    pub value: T,
    pub transfers: Vec<TransferEvent>,
}

/// Journal entry appended after every committed operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExchangeEvent {
    PoolCreated {
        pool_id: PoolId,
        key: PoolKey,
        creator: Pubkey,
        creation_fee: u64,
    },
    LiquidityAdded {
        pool_id: PoolId,
        provider: Pubkey,
        amount0: u64,
        amount1: u64,
        liquidity_minted: u64,
        reserve0: u64,
        reserve1: u64,
    },
    LiquidityRemoved {
        pool_id: PoolId,
        provider: Pubkey,
        liquidity_burned: u64,
        amount0: u64,
        amount1: u64,
        reserve0: u64,
        reserve1: u64,
    },
    Swapped {
        pool_id: PoolId,
        trader: Pubkey,
        direction: SwapDirection,
        amount_in: u64,
        amount_out: u64,
        fee: u64,
        reserve0: u64,
        reserve1: u64,
    },
    TreasuryWithdrawn {
        owner: Pubkey,
        amount: u64,
        remaining: u64,
    },
}

