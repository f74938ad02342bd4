use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info};

use crate::errors::{AmmError, Result};
use crate::events::{ExchangeEvent, Receipt};
use crate::exchange::Exchange;
use crate::math::{checked_add, checked_sub};
use crate::settlement::Settlement;
use crate::state::{Pool, PoolKey, SwapDirection, SwapQuote};
use crate::token::TokenLedger;

impl Exchange {
    /// Swap tokens using constant product formula
    pub fn swap<L>(
        &mut self,
        caller: &Pubkey,
        key: &PoolKey,
        amount_in: u64,
        direction: SwapDirection,
        ledger: &mut L,
    ) -> Result<Receipt<SwapQuote>>
    where
        L: TokenLedger + ?Sized,
    {
        self.swap_with_limit(caller, key, amount_in, direction, 0, ledger)
    }

    /// `swap` that fails if the output falls below `min_amount_out`.
    pub fn swap_with_limit<L>(
        &mut self,
        caller: &Pubkey,
        key: &PoolKey,
        amount_in: u64,
        direction: SwapDirection,
        min_amount_out: u64,
        ledger: &mut L,
    ) -> Result<Receipt<SwapQuote>>
    where
        L: TokenLedger + ?Sized,
    {
        let (quote, pool) = self
            .plan_swap(caller, key, amount_in, direction, min_amount_out)
            .map_err(|err| {
                debug!("swap rejected on {}: {}", key, err);
                err
            })?;

        let custody = self.config.custody;
        let (token_in, token_out) = direction.tokens(key);
        let transfers = Settlement::new()
            .transfer(token_in, *caller, custody, quote.amount_in)
            .transfer(token_out, custody, *caller, quote.amount_out)
            .settle(ledger)?;

        let pool_id = pool.id;
        let (reserve0, reserve1) = (pool.reserve0, pool.reserve1);
        self.pools.insert(pool_id, pool);

        info!(
            "Swapped {} {} for {} {} on {} (fee {})",
            quote.amount_in, token_in, quote.amount_out, token_out, pool_id, quote.fee
        );

        self.record(ExchangeEvent::Swapped {
            pool_id,
            trader: *caller,
            direction,
            amount_in: quote.amount_in,
            amount_out: quote.amount_out,
            fee: quote.fee,
            reserve0,
            reserve1,
        });

        Ok(Receipt {
            value: quote,
            transfers,
        })
    }

    /// Price a swap against committed state without executing it.
    pub fn quote_swap(
        &self,
        key: &PoolKey,
        amount_in: u64,
        direction: SwapDirection,
    ) -> Result<SwapQuote> {
        self.pool_by_key(key)?.calculate_swap_output(amount_in, direction)
    }

    fn plan_swap(
        &self,
        caller: &Pubkey,
        key: &PoolKey,
        amount_in: u64,
        direction: SwapDirection,
        min_amount_out: u64,
    ) -> Result<(SwapQuote, Pool)> {
        self.ensure_caller(caller)?;
        let current = self.pool_by_key(key)?;

        let quote = current.calculate_swap_output(amount_in, direction)?;
        if quote.amount_out < min_amount_out {
            return Err(AmmError::SlippageExceeded);
        }

        // The whole input, fee included, stays in the pool
        let mut pool = current.clone();
        match direction {
            SwapDirection::ZeroForOne => {
                pool.reserve0 = checked_add(pool.reserve0, quote.amount_in)?;
                pool.reserve1 = checked_sub(pool.reserve1, quote.amount_out)?;
                pool.cumulative_fee0 = pool.cumulative_fee0.saturating_add(quote.fee);
            }
            SwapDirection::OneForZero => {
                pool.reserve1 = checked_add(pool.reserve1, quote.amount_in)?;
                pool.reserve0 = checked_sub(pool.reserve0, quote.amount_out)?;
                pool.cumulative_fee1 = pool.cumulative_fee1.saturating_add(quote.fee);
            }
        }

        Ok((quote, pool))
    }
}
