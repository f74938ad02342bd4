//! The exchange store: pools, positions, the treasury and the event journal.
//!
//! Mutating operations live in `crate::instructions`, one module per concern.
//! Each one plans against committed state, settles its transfers, and only
//! then writes the staged records back here.

use solana_sdk::pubkey::Pubkey;
use std::collections::{BTreeMap, HashMap};

use crate::config::ExchangeConfig;
use crate::errors::{AmmError, InvariantViolation, Result};
use crate::events::ExchangeEvent;
use crate::state::{Pool, PoolId, PoolKey, Treasury, LOCKED_LIQUIDITY_HOLDER, MINIMUM_LIQUIDITY};

#[derive(Debug, Clone)]
pub struct Exchange {
    pub(crate) config: ExchangeConfig,
    pub(crate) pools: BTreeMap<PoolId, Pool>,
    pub(crate) pool_ids: HashMap<PoolKey, PoolId>,
    pub(crate) positions: HashMap<(PoolId, Pubkey), u64>,
    pub(crate) treasury: Treasury,
    pub(crate) next_pool_id: u64,
    /// Number of committed operations
    pub(crate) sequence: u64,
    pub(crate) journal: Vec<ExchangeEvent>,
}

impl Exchange {
    pub fn new(config: ExchangeConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            treasury: Treasury::new(config.owner),
            config,
            pools: BTreeMap::new(),
            pool_ids: HashMap::new(),
            positions: HashMap::new(),
            next_pool_id: 1,
            sequence: 0,
            journal: Vec::new(),
        })
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    pub fn custody(&self) -> Pubkey {
        self.config.custody
    }

    pub fn get_pool_id(&self, key: &PoolKey) -> Option<PoolId> {
        self.pool_ids.get(key).copied()
    }

    pub fn get_pool(&self, id: PoolId) -> Option<&Pool> {
        self.pools.get(&id)
    }

    pub fn pool_by_key(&self, key: &PoolKey) -> Result<&Pool> {
        self.get_pool_id(key)
            .and_then(|id| self.pools.get(&id))
            .ok_or(AmmError::PoolNotFound)
    }

    /// All pools in id order
    pub fn pools(&self) -> impl Iterator<Item = &Pool> {
        self.pools.values()
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub fn get_position_liquidity(&self, id: PoolId, holder: &Pubkey) -> u64 {
        self.positions.get(&(id, *holder)).copied().unwrap_or(0)
    }

    /// Every recorded position in a pool, including emptied ones, ordered by holder.
    pub fn positions_of(&self, id: PoolId) -> Vec<(Pubkey, u64)> {
        let mut positions: Vec<_> = self
            .positions
            .iter()
            .filter(|((pool, _), _)| *pool == id)
            .map(|((_, holder), shares)| (*holder, *shares))
            .collect();
        positions.sort_by(|a, b| a.0.cmp(&b.0));
        positions
    }

    pub fn get_treasury_balance(&self) -> u64 {
        self.treasury.balance
    }

    pub fn get_contract_owner(&self) -> Pubkey {
        self.treasury.owner()
    }

    pub fn treasury(&self) -> &Treasury {
        &self.treasury
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Append-only journal of committed operations
    pub fn events(&self) -> &[ExchangeEvent] {
        &self.journal
    }

    /// Check the bookkeeping invariants across every pool and the treasury.
    pub fn audit(&self) -> std::result::Result<(), InvariantViolation> {
        let mut summed: HashMap<PoolId, u128> = HashMap::new();
        for ((pool, _), shares) in &self.positions {
            *summed.entry(*pool).or_default() += *shares as u128;
        }

        for pool in self.pools.values() {
            if self.pool_ids.get(&pool.key) != Some(&pool.id) {
                return Err(InvariantViolation::RegistryIndex { pool: pool.id });
            }

            let supply = pool.total_liquidity_supply;
            let zeros = [pool.reserve0 == 0, pool.reserve1 == 0, supply == 0];
            if zeros.iter().any(|z| *z) && !zeros.iter().all(|z| *z) {
                return Err(InvariantViolation::ReserveMismatch {
                    pool: pool.id,
                    reserve0: pool.reserve0,
                    reserve1: pool.reserve1,
                    supply,
                });
            }

            let positions = summed.get(&pool.id).copied().unwrap_or(0);
            if positions != supply as u128 {
                return Err(InvariantViolation::SupplyMismatch {
                    pool: pool.id,
                    supply,
                    positions: u64::try_from(positions).unwrap_or(u64::MAX),
                });
            }

            let locked = self.get_position_liquidity(pool.id, &LOCKED_LIQUIDITY_HOLDER);
            let expected = if pool.is_active() { MINIMUM_LIQUIDITY } else { 0 };
            if locked != expected {
                return Err(InvariantViolation::LockedLiquidity {
                    pool: pool.id,
                    locked,
                    expected,
                });
            }
        }

        let treasury = &self.treasury;
        if treasury.total_collected.checked_sub(treasury.total_withdrawn) != Some(treasury.balance) {
            return Err(InvariantViolation::TreasuryMismatch {
                balance: treasury.balance,
                collected: treasury.total_collected,
                withdrawn: treasury.total_withdrawn,
            });
        }

        Ok(())
    }

    /// Reject identities that cannot act as a caller.
    pub(crate) fn ensure_caller(&self, caller: &Pubkey) -> Result<()> {
        if *caller == LOCKED_LIQUIDITY_HOLDER || *caller == self.config.custody {
            return Err(AmmError::InvalidCaller);
        }
        Ok(())
    }

    pub(crate) fn record(&mut self, event: ExchangeEvent) {
        self.sequence += 1;
        self.journal.push(event);
    }
}
