use solana_sdk::pubkey::Pubkey;

use crate::config::ExchangeConfig;
use crate::errors::Result;
use crate::events::Receipt;
use crate::exchange::Exchange;
use crate::state::{PoolId, PoolKey};
use crate::token::{InMemoryLedger, TokenLedger};

pub const FUNDING: u64 = 1_000_000_000_000;

/// Exchange plus a funded in-memory ledger with two traders.
pub struct Fixture {
    pub exchange: Exchange,
    pub ledger: InMemoryLedger,
    pub owner: Pubkey,
    pub native: Pubkey,
    pub token_a: Pubkey,
    pub token_b: Pubkey,
    pub alice: Pubkey,
    pub bob: Pubkey,
}

impl Fixture {
    pub fn new() -> Self {
        let owner = Pubkey::new_unique();
        let native = Pubkey::new_unique();
        let config = ExchangeConfig::new(owner, Pubkey::new_unique(), native);
        let exchange = Exchange::new(config).unwrap();

        let mut ledger = InMemoryLedger::new();
        let token_a = Pubkey::new_unique();
        let token_b = Pubkey::new_unique();
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        for holder in [&alice, &bob] {
            for token in [&native, &token_a, &token_b] {
                ledger.mint_to(token, holder, FUNDING).unwrap();
            }
        }

        Self {
            exchange,
            ledger,
            owner,
            native,
            token_a,
            token_b,
            alice,
            bob,
        }
    }

    pub fn create_pool(&mut self, caller: &Pubkey, fee_bps: u16) -> Result<Receipt<PoolId>> {
        self.exchange
            .create_pool(caller, self.token_a, self.token_b, fee_bps, &mut self.ledger)
    }

    /// Pool at 30 bps seeded by alice with (1_000_000, 500_000)
    pub fn seeded_pool(&mut self) -> PoolKey {
        let alice = self.alice;
        let id = self.create_pool(&alice, 30).unwrap().value;
        let key = self.exchange.get_pool(id).unwrap().key;
        self.exchange
            .add_liquidity(&alice, &key, 1_000_000, 500_000, 0, 0, &mut self.ledger)
            .unwrap();
        key
    }

    pub fn balance(&self, token: &Pubkey, owner: &Pubkey) -> u64 {
        self.ledger.balance_of(token, owner)
    }
}
