use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info};

use crate::errors::{AmmError, Result};
use crate::events::{ExchangeEvent, Receipt};
use crate::exchange::Exchange;
use crate::math::{checked_add, checked_sub};
use crate::settlement::Settlement;
use crate::state::{Deposit, Pool, PoolKey, LOCKED_LIQUIDITY_HOLDER, MINIMUM_LIQUIDITY};
use crate::token::TokenLedger;

/// Staged result of a liquidity operation, written back only after settlement
struct LiquidityPlan {
    pool: Pool,
    position: u64,
    locked: Option<u64>,
}

impl Exchange {
    /// Deposit both tokens into a pool in exchange for liquidity shares.
    ///
    /// The first deposit sets the price and locks `MINIMUM_LIQUIDITY` shares
    /// forever. Later deposits are trimmed to the current reserve ratio.
    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity<L>(
        &mut self,
        caller: &Pubkey,
        key: &PoolKey,
        amount0_desired: u64,
        amount1_desired: u64,
        amount0_min: u64,
        amount1_min: u64,
        ledger: &mut L,
    ) -> Result<Receipt<Deposit>>
    where
        L: TokenLedger + ?Sized,
    {
        let (deposit, plan) = self
            .plan_add_liquidity(
                caller,
                key,
                amount0_desired,
                amount1_desired,
                amount0_min,
                amount1_min,
            )
            .map_err(|err| {
                debug!("add_liquidity rejected on {}: {}", key, err);
                err
            })?;

        let custody = self.config.custody;
        let transfers = Settlement::new()
            .transfer(key.token0(), *caller, custody, deposit.amount0)
            .transfer(key.token1(), *caller, custody, deposit.amount1)
            .settle(ledger)?;

        let pool_id = plan.pool.id;
        let (reserve0, reserve1) = (plan.pool.reserve0, plan.pool.reserve1);
        self.commit_liquidity(caller, plan);

        info!(
            "Added liquidity to {}: {} token0, {} token1, minted {} LP",
            pool_id, deposit.amount0, deposit.amount1, deposit.liquidity_minted
        );

        self.record(ExchangeEvent::LiquidityAdded {
            pool_id,
            provider: *caller,
            amount0: deposit.amount0,
            amount1: deposit.amount1,
            liquidity_minted: deposit.liquidity_minted,
            reserve0,
            reserve1,
        });

        Ok(Receipt {
            value: deposit,
            transfers,
        })
    }

    /// Burn shares for a proportional cut of both reserves.
    pub fn remove_liquidity<L>(
        &mut self,
        caller: &Pubkey,
        key: &PoolKey,
        liquidity: u64,
        ledger: &mut L,
    ) -> Result<Receipt<(u64, u64)>>
    where
        L: TokenLedger + ?Sized,
    {
        self.remove_liquidity_with_limits(caller, key, liquidity, 0, 0, ledger)
    }

    /// `remove_liquidity` that fails if either payout falls below its minimum.
    pub fn remove_liquidity_with_limits<L>(
        &mut self,
        caller: &Pubkey,
        key: &PoolKey,
        liquidity: u64,
        amount0_min: u64,
        amount1_min: u64,
        ledger: &mut L,
    ) -> Result<Receipt<(u64, u64)>>
    where
        L: TokenLedger + ?Sized,
    {
        let ((amount0, amount1), plan) = self
            .plan_remove_liquidity(caller, key, liquidity, amount0_min, amount1_min)
            .map_err(|err| {
                debug!("remove_liquidity rejected on {}: {}", key, err);
                err
            })?;

        let custody = self.config.custody;
        let transfers = Settlement::new()
            .transfer(key.token0(), custody, *caller, amount0)
            .transfer(key.token1(), custody, *caller, amount1)
            .settle(ledger)?;

        let pool_id = plan.pool.id;
        let (reserve0, reserve1) = (plan.pool.reserve0, plan.pool.reserve1);
        self.commit_liquidity(caller, plan);

        info!(
            "Removed liquidity from {}: burned {} LP, returned {} token0, {} token1",
            pool_id, liquidity, amount0, amount1
        );

        self.record(ExchangeEvent::LiquidityRemoved {
            pool_id,
            provider: *caller,
            liquidity_burned: liquidity,
            amount0,
            amount1,
            reserve0,
            reserve1,
        });

        Ok(Receipt {
            value: (amount0, amount1),
            transfers,
        })
    }

    /// What `add_liquidity` would accept and mint against committed state.
    pub fn quote_add_liquidity(
        &self,
        key: &PoolKey,
        amount0_desired: u64,
        amount1_desired: u64,
    ) -> Result<Deposit> {
        self.pool_by_key(key)?
            .calculate_deposit(amount0_desired, amount1_desired, 0, 0)
    }

    /// What burning `liquidity` shares would pay out against committed state.
    pub fn quote_remove_liquidity(&self, key: &PoolKey, liquidity: u64) -> Result<(u64, u64)> {
        if liquidity == 0 {
            return Err(AmmError::InvalidAmount);
        }
        self.pool_by_key(key)?.calculate_tokens_for_liquidity(liquidity)
    }

    fn plan_add_liquidity(
        &self,
        caller: &Pubkey,
        key: &PoolKey,
        amount0_desired: u64,
        amount1_desired: u64,
        amount0_min: u64,
        amount1_min: u64,
    ) -> Result<(Deposit, LiquidityPlan)> {
        self.ensure_caller(caller)?;
        let current = self.pool_by_key(key)?;

        let deposit =
            current.calculate_deposit(amount0_desired, amount1_desired, amount0_min, amount1_min)?;

        let locked = if current.is_active() {
            None
        } else {
            Some(MINIMUM_LIQUIDITY)
        };

        let mut pool = current.clone();
        pool.reserve0 = checked_add(pool.reserve0, deposit.amount0)?;
        pool.reserve1 = checked_add(pool.reserve1, deposit.amount1)?;
        pool.total_liquidity_supply =
            checked_add(pool.total_liquidity_supply, deposit.liquidity_minted)?;

        let position = checked_add(
            self.get_position_liquidity(pool.id, caller),
            deposit.liquidity_to_caller,
        )?;

        Ok((
            deposit,
            LiquidityPlan {
                pool,
                position,
                locked,
            },
        ))
    }

    fn plan_remove_liquidity(
        &self,
        caller: &Pubkey,
        key: &PoolKey,
        liquidity: u64,
        amount0_min: u64,
        amount1_min: u64,
    ) -> Result<((u64, u64), LiquidityPlan)> {
        self.ensure_caller(caller)?;
        let current = self.pool_by_key(key)?;

        if liquidity == 0 {
            return Err(AmmError::InvalidAmount);
        }
        let held = self.get_position_liquidity(current.id, caller);
        if held < liquidity {
            return Err(AmmError::InsufficientLiquidity);
        }

        let (amount0, amount1) = current.calculate_tokens_for_liquidity(liquidity)?;
        if amount0 < amount0_min || amount1 < amount1_min {
            return Err(AmmError::SlippageExceeded);
        }

        let mut pool = current.clone();
        pool.reserve0 = checked_sub(pool.reserve0, amount0)?;
        pool.reserve1 = checked_sub(pool.reserve1, amount1)?;
        pool.total_liquidity_supply = checked_sub(pool.total_liquidity_supply, liquidity)?;

        Ok((
            (amount0, amount1),
            LiquidityPlan {
                pool,
                position: held - liquidity,
                locked: None,
            },
        ))
    }

    fn commit_liquidity(&mut self, caller: &Pubkey, plan: LiquidityPlan) {
        let pool_id = plan.pool.id;
        if let Some(locked) = plan.locked {
            self.positions.insert((pool_id, LOCKED_LIQUIDITY_HOLDER), locked);
        }
        self.positions.insert((pool_id, *caller), plan.position);
        self.pools.insert(pool_id, plan.pool);
    }
}
