use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info};

use crate::errors::{AmmError, Result};
use crate::events::{ExchangeEvent, Receipt};
use crate::exchange::Exchange;
use crate::math::checked_add;
use crate::settlement::Settlement;
use crate::state::{Pool, PoolId, PoolKey};
use crate::token::TokenLedger;

impl Exchange {
    /// Register a new pool for a token pair and fee tier.
    ///
    /// The pair is canonicalized first, so argument order never matters. The
    /// caller pays the flat creation fee in the native asset into the treasury.
    pub fn create_pool<L>(
        &mut self,
        caller: &Pubkey,
        token_a: Pubkey,
        token_b: Pubkey,
        fee_bps: u16,
        ledger: &mut L,
    ) -> Result<Receipt<PoolId>>
    where
        L: TokenLedger + ?Sized,
    {
        let pool = self
            .plan_create_pool(caller, token_a, token_b, fee_bps)
            .map_err(|err| {
                debug!("create_pool rejected: {}", err);
                err
            })?;

        let creation_fee = self.config.creation_fee;
        let transfers = Settlement::new()
            .transfer(self.config.native_mint, *caller, self.config.custody, creation_fee)
            .settle(ledger)?;

        let pool_id = pool.id;
        let key = pool.key;
        self.treasury.balance += creation_fee;
        self.treasury.total_collected += creation_fee;
        self.next_pool_id += 1;
        self.pool_ids.insert(key, pool_id);
        self.pools.insert(pool_id, pool);

        info!("Pool {} created for {}", pool_id, key);
        info!("Creation fee: {} (treasury {})", creation_fee, self.treasury.balance);

        self.record(ExchangeEvent::PoolCreated {
            pool_id,
            key,
            creator: *caller,
            creation_fee,
        });

        Ok(Receipt {
            value: pool_id,
            transfers,
        })
    }

    fn plan_create_pool(
        &self,
        caller: &Pubkey,
        token_a: Pubkey,
        token_b: Pubkey,
        fee_bps: u16,
    ) -> Result<Pool> {
        self.ensure_caller(caller)?;

        let key = PoolKey::new(token_a, token_b, fee_bps)?;
        if !self.config.supports_fee_tier(fee_bps) {
            return Err(AmmError::InvalidFee(fee_bps));
        }
        if self.pool_ids.contains_key(&key) {
            return Err(AmmError::PoolAlreadyExists);
        }

        // Counters must not overflow at commit time
        checked_add(self.treasury.balance, self.config.creation_fee)?;
        checked_add(self.treasury.total_collected, self.config.creation_fee)?;
        checked_add(self.next_pool_id, 1)?;

        Ok(Pool::new(PoolId(self.next_pool_id), key, *caller, self.sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::Fixture;

    #[test]
    fn test_create_pool() {
        let mut fx = Fixture::new();
        let alice = fx.alice;

        let receipt = fx.create_pool(&alice, 30).unwrap();
        let pool = fx.exchange.get_pool(receipt.value).unwrap();

        assert_eq!(receipt.value, PoolId(1));
        assert_eq!(pool.reserve0, 0);
        assert_eq!(pool.reserve1, 0);
        assert_eq!(pool.total_liquidity_supply, 0);
        assert_eq!(pool.creator, alice);
        assert_eq!(fx.exchange.get_pool_id(&pool.key), Some(PoolId(1)));

        assert_eq!(receipt.transfers.len(), 1);
        assert_eq!(receipt.transfers[0].token, fx.native);
        assert_eq!(receipt.transfers[0].from, alice);
        assert_eq!(receipt.transfers[0].to, fx.exchange.custody());
        assert_eq!(receipt.transfers[0].amount, fx.exchange.config().creation_fee);
    }

    #[test]
    fn test_duplicate_pool_in_either_order() {
        let mut fx = Fixture::new();
        let alice = fx.alice;
        let (a, b, native) = (fx.token_a, fx.token_b, fx.native);

        fx.exchange.create_pool(&alice, a, b, 30, &mut fx.ledger).unwrap();

        assert_eq!(
            fx.exchange.create_pool(&alice, b, a, 30, &mut fx.ledger),
            Err(AmmError::PoolAlreadyExists)
        );
        assert_eq!(
            fx.exchange.create_pool(&alice, a, b, 30, &mut fx.ledger),
            Err(AmmError::PoolAlreadyExists)
        );
        // A different tier is a different pool
        assert_eq!(
            fx.exchange.create_pool(&alice, b, a, 5, &mut fx.ledger).unwrap().value,
            PoolId(2)
        );

        let fee = fx.exchange.config().creation_fee;
        assert_eq!(fx.exchange.get_treasury_balance(), 2 * fee);
        assert_eq!(fx.ledger.balance_of(&native, &fx.exchange.custody()), 2 * fee);
    }

    #[test]
    fn test_rejects_unsupported_fee_tier() {
        let mut fx = Fixture::new();
        let alice = fx.alice;
        assert_eq!(fx.create_pool(&alice, 25), Err(AmmError::InvalidFee(25)));
        assert_eq!(fx.create_pool(&alice, 0), Err(AmmError::InvalidFee(0)));
        assert_eq!(fx.exchange.pool_count(), 0);
    }

    #[test]
    fn test_rejects_identical_tokens() {
        let mut fx = Fixture::new();
        let alice = fx.alice;
        let a = fx.token_a;
        assert_eq!(
            fx.exchange.create_pool(&alice, a, a, 30, &mut fx.ledger),
            Err(AmmError::IdenticalTokens)
        );
    }

    #[test]
    fn test_creation_fee_unpaid_leaves_no_pool() {
        let mut fx = Fixture::new();
        let pauper = Pubkey::new_unique();

        let err = fx.create_pool(&pauper, 30).unwrap_err();

        assert!(matches!(err, AmmError::Transfer(_)));
        assert_eq!(fx.exchange.pool_count(), 0);
        assert_eq!(fx.exchange.get_treasury_balance(), 0);
        assert!(fx.exchange.events().is_empty());

        // The id is not consumed by the failed attempt
        let alice = fx.alice;
        assert_eq!(fx.create_pool(&alice, 30).unwrap().value, PoolId(1));
    }
}
