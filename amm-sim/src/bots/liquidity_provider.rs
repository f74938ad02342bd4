//! Liquidity Provider Bot
//!
//! Deposits near the current pool ratio and periodically withdraws part of
//! its position.

use amm::{Exchange, InMemoryLedger, PoolId, PoolKey, FEE_DENOMINATOR};
use rand::Rng;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

/// Which way liquidity moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidityAction {
    Add,
    Remove,
}

/// Result of an executed deposit or withdrawal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityResult {
    pub step: u32,
    pub provider: String,
    pub pool: PoolId,
    pub action: LiquidityAction,
    pub amount0: u64,
    pub amount1: u64,
    /// Shares minted or burned
    pub liquidity: u64,
}

pub struct LiquidityProvider {
    wallet: Pubkey,
    /// Tolerated deviation from the quoted deposit, in basis points
    slippage_bps: u64,
    deposits: u32,
    withdrawals: u32,
}

impl LiquidityProvider {
    pub fn new(wallet: Pubkey, slippage_bps: u64) -> Self {
        Self {
            wallet,
            slippage_bps,
            deposits: 0,
            withdrawals: 0,
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.wallet
    }

    /// (deposits, withdrawals)
    pub fn stats(&self) -> (u32, u32) {
        (self.deposits, self.withdrawals)
    }

    fn with_slippage(&self, amount: u64) -> u64 {
        let keep = FEE_DENOMINATOR.saturating_sub(self.slippage_bps) as u128;
        (amount as u128 * keep / FEE_DENOMINATOR as u128) as u64
    }

    /// Seed an empty pool at the caller's chosen ratio.
    pub fn seed(
        &mut self,
        exchange: &mut Exchange,
        ledger: &mut InMemoryLedger,
        key: &PoolKey,
        amount0: u64,
        amount1: u64,
    ) -> amm::Result<LiquidityResult> {
        let receipt = exchange.add_liquidity(&self.wallet, key, amount0, amount1, 0, 0, ledger)?;
        self.deposits += 1;

        let deposit = receipt.value;
        Ok(LiquidityResult {
            step: 0,
            provider: self.wallet.to_string(),
            pool: exchange.pool_by_key(key)?.id,
            action: LiquidityAction::Add,
            amount0: deposit.amount0,
            amount1: deposit.amount1,
            liquidity: deposit.liquidity_to_caller,
        })
    }

    /// Deposit `amount0` of token0 and whatever token1 the pool ratio asks for.
    pub fn provide(
        &mut self,
        step: u32,
        exchange: &mut Exchange,
        ledger: &mut InMemoryLedger,
        key: &PoolKey,
        amount0: u64,
    ) -> amm::Result<LiquidityResult> {
        // Over-offer token1; the engine only pulls the ratio-optimal amount
        let quote = exchange.quote_add_liquidity(key, amount0, u64::MAX)?;
        let amount1_desired = quote.amount1.saturating_add(quote.amount1 / 100);

        let receipt = exchange.add_liquidity(
            &self.wallet,
            key,
            amount0,
            amount1_desired,
            self.with_slippage(quote.amount0),
            self.with_slippage(quote.amount1),
            ledger,
        )?;
        self.deposits += 1;

        let deposit = receipt.value;
        debug!(
            "Provider {} deposited ({}, {}) for {} shares",
            self.wallet, deposit.amount0, deposit.amount1, deposit.liquidity_to_caller
        );

        Ok(LiquidityResult {
            step,
            provider: self.wallet.to_string(),
            pool: exchange.pool_by_key(key)?.id,
            action: LiquidityAction::Add,
            amount0: deposit.amount0,
            amount1: deposit.amount1,
            liquidity: deposit.liquidity_to_caller,
        })
    }

    /// Burn a random 10%..=100% of the provider's shares in `key`.
    pub fn withdraw<R: Rng>(
        &mut self,
        step: u32,
        rng: &mut R,
        exchange: &mut Exchange,
        ledger: &mut InMemoryLedger,
        key: &PoolKey,
    ) -> amm::Result<LiquidityResult> {
        let pool = exchange.pool_by_key(key)?.id;
        let held = exchange.get_position_liquidity(pool, &self.wallet);
        let percent: u64 = rng.gen_range(10..=100);
        let shares = (held as u128 * percent as u128 / 100) as u64;

        let (amount0, amount1) = exchange.remove_liquidity(&self.wallet, key, shares, ledger)?.value;
        self.withdrawals += 1;

        debug!(
            "Provider {} burned {} of {} shares for ({}, {})",
            self.wallet, shares, held, amount0, amount1
        );

        Ok(LiquidityResult {
            step,
            provider: self.wallet.to_string(),
            pool,
            action: LiquidityAction::Remove,
            amount0,
            amount1,
            liquidity: shares,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amm::{ExchangeConfig, TokenLedger};
    use rand::{rngs::StdRng, SeedableRng};

    fn market() -> (Exchange, InMemoryLedger, PoolKey, Pubkey) {
        let native = Pubkey::new_unique();
        let mut exchange =
            Exchange::new(ExchangeConfig::new(Pubkey::new_unique(), Pubkey::new_unique(), native))
                .unwrap();
        let mut ledger = InMemoryLedger::new();
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
        let provider = Pubkey::new_unique();
        for token in [&native, &a, &b] {
            ledger.mint_to(token, &provider, 10_000_000_000_000).unwrap();
        }

        let id = exchange.create_pool(&provider, a, b, 30, &mut ledger).unwrap().value;
        let key = exchange.get_pool(id).unwrap().key;
        (exchange, ledger, key, provider)
    }

    #[test]
    fn test_seed_then_provide_at_ratio() {
        let (mut exchange, mut ledger, key, wallet) = market();
        let mut provider = LiquidityProvider::new(wallet, 100);

        let seeded = provider
            .seed(&mut exchange, &mut ledger, &key, 1_000_000, 500_000)
            .unwrap();
        assert_eq!(seeded.liquidity, 706_106);

        let added = provider
            .provide(1, &mut exchange, &mut ledger, &key, 5_000)
            .unwrap();
        assert_eq!((added.amount0, added.amount1), (5_000, 2_500));
        assert_eq!(added.action, LiquidityAction::Add);
        assert_eq!(provider.stats(), (2, 0));
        assert!(exchange.audit().is_ok());
    }

    #[test]
    fn test_withdraw_part_of_position() {
        let (mut exchange, mut ledger, key, wallet) = market();
        let mut provider = LiquidityProvider::new(wallet, 100);
        provider
            .seed(&mut exchange, &mut ledger, &key, 1_000_000, 500_000)
            .unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        let removed = provider
            .withdraw(2, &mut rng, &mut exchange, &mut ledger, &key)
            .unwrap();

        let id = exchange.get_pool_id(&key).unwrap();
        assert_eq!(removed.action, LiquidityAction::Remove);
        assert!(removed.liquidity >= 70_610);
        assert_eq!(
            exchange.get_position_liquidity(id, &wallet),
            706_106 - removed.liquidity
        );
        assert_eq!(
            ledger.balance_of(&key.token0(), &wallet),
            10_000_000_000_000 - 1_000_000 + removed.amount0
        );
    }

    #[test]
    fn test_withdraw_without_position_is_rejected() {
        let (mut exchange, mut ledger, key, wallet) = market();
        let mut outsider = LiquidityProvider::new(Pubkey::new_unique(), 100);
        LiquidityProvider::new(wallet, 100)
            .seed(&mut exchange, &mut ledger, &key, 1_000_000, 500_000)
            .unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        let err = outsider
            .withdraw(3, &mut rng, &mut exchange, &mut ledger, &key)
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_amount");
        assert_eq!(outsider.stats(), (0, 0));
    }
}
