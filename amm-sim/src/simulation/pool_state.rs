//! Pool State Tracking
//!
//! Records pool snapshots throughout the simulation.

use amm::{Pool, PoolId, PRICE_SCALE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of a pool at a point in the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub step: u32,
    pub pool: PoolId,
    pub reserve0: u64,
    pub reserve1: u64,
    pub total_liquidity: u64,
    pub k: u128,
    /// Spot price of token0 in token1
    pub price_0_in_1: f64,
    pub event: String,
}

impl PoolSnapshot {
    pub fn capture(pool: &Pool, step: u32, event: &str) -> Self {
        Self {
            step,
            pool: pool.id,
            reserve0: pool.reserve0,
            reserve1: pool.reserve1,
            total_liquidity: pool.total_liquidity_supply,
            k: pool.k(),
            price_0_in_1: pool.price_0_in_1() as f64 / PRICE_SCALE as f64,
            event: event.to_string(),
        }
    }
}

/// Per-pool snapshot history
#[derive(Debug, Clone, Default)]
pub struct PoolTracker {
    history: BTreeMap<PoolId, Vec<PoolSnapshot>>,
}

impl PoolTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snapshot
    pub fn snapshot(&mut self, pool: &Pool, step: u32, event: &str) {
        self.history
            .entry(pool.id)
            .or_default()
            .push(PoolSnapshot::capture(pool, step, event));
    }

    pub fn history(&self, pool: PoolId) -> &[PoolSnapshot] {
        self.history.get(&pool).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, pool: PoolId) -> Option<&PoolSnapshot> {
        self.history(pool).first()
    }

    pub fn latest(&self, pool: PoolId) -> Option<&PoolSnapshot> {
        self.history(pool).last()
    }

    /// Growth of k since the first snapshot, in percent
    pub fn k_growth_pct(&self, pool: PoolId) -> f64 {
        match (self.first(pool), self.latest(pool)) {
            (Some(first), Some(last)) if first.k > 0 => {
                (last.k as f64 / first.k as f64 - 1.0) * 100.0
            }
            _ => 0.0,
        }
    }

    /// All snapshots in step order, ties broken by pool id
    pub fn all(&self) -> Vec<PoolSnapshot> {
        let mut all: Vec<PoolSnapshot> = self.history.values().flatten().cloned().collect();
        all.sort_by_key(|snapshot| (snapshot.step, snapshot.pool));
        all
    }

    /// Clear history
    pub fn reset(&mut self) {
        self.history.clear();
    }
}
