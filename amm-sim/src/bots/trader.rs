//! Trader Bot
//!
//! Simulates a user making random swaps. Every swap is priced first with
//! `quote_swap` and submitted with a minimum output derived from the
//! trader's slippage tolerance.

use amm::{Exchange, InMemoryLedger, PoolId, PoolKey, SwapDirection, FEE_DENOMINATOR};
use rand::Rng;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

/// Result of an executed swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeResult {
    /// Simulation step the swap ran at
    pub step: u32,
    /// Trader's public key
    pub trader: String,
    pub pool: PoolId,
    pub direction: SwapDirection,
    /// Amount of input tokens
    pub amount_in: u64,
    /// Output quoted before submission
    pub expected_out: u64,
    /// Output actually received
    pub actual_out: u64,
    /// Minimum output the trader accepted
    pub min_out: u64,
    /// Fee paid, in input tokens
    pub fee_paid: u64,
    /// Price impact in basis points
    pub price_impact_bps: u64,
}

/// Trader that makes direct swaps against the exchange
pub struct Trader {
    wallet: Pubkey,
    /// Tolerated shortfall against the quote, in basis points
    slippage_bps: u64,
    /// Total trades executed
    total_trades: u32,
    /// Total fees paid across all input tokens
    total_fees: u64,
}

impl Trader {
    pub fn new(wallet: Pubkey, slippage_bps: u64) -> Self {
        Self {
            wallet,
            slippage_bps,
            total_trades: 0,
            total_fees: 0,
        }
    }

    /// Get trader's public key
    pub fn pubkey(&self) -> Pubkey {
        self.wallet
    }

    /// (trades executed, fees paid)
    pub fn stats(&self) -> (u32, u64) {
        (self.total_trades, self.total_fees)
    }

    /// Lowest output accepted for a quoted amount
    pub fn min_out(&self, quoted: u64) -> u64 {
        let keep = FEE_DENOMINATOR.saturating_sub(self.slippage_bps) as u128;
        (quoted as u128 * keep / FEE_DENOMINATOR as u128) as u64
    }

    /// Quote and execute a swap of `amount` on `key`.
    pub fn trade(
        &mut self,
        step: u32,
        exchange: &mut Exchange,
        ledger: &mut InMemoryLedger,
        key: &PoolKey,
        amount: u64,
        direction: SwapDirection,
    ) -> amm::Result<TradeResult> {
        let quote = exchange.quote_swap(key, amount, direction)?;
        let min_out = self.min_out(quote.amount_out);

        let receipt =
            exchange.swap_with_limit(&self.wallet, key, amount, direction, min_out, ledger)?;
        let executed = receipt.value;

        self.total_trades += 1;
        self.total_fees = self.total_fees.saturating_add(executed.fee);
        debug!(
            "Trader {} swapped {} -> {} (quoted {})",
            self.wallet, amount, executed.amount_out, quote.amount_out
        );

        let pool = exchange.pool_by_key(key)?.id;
        Ok(TradeResult {
            step,
            trader: self.wallet.to_string(),
            pool,
            direction,
            amount_in: amount,
            expected_out: quote.amount_out,
            actual_out: executed.amount_out,
            min_out,
            fee_paid: executed.fee,
            price_impact_bps: executed.price_impact_bps,
        })
    }
}

/// Generate a random trade amount within the configured range
pub fn random_trade_amount<R: Rng>(rng: &mut R, min: u64, max: u64) -> u64 {
    rng.gen_range(min..=max)
}

/// Generate a random trade direction
pub fn random_direction<R: Rng>(rng: &mut R) -> SwapDirection {
    if rng.gen_bool(0.5) {
        SwapDirection::ZeroForOne
    } else {
        SwapDirection::OneForZero
    }
}
