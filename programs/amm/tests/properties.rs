use amm::{
    Exchange, ExchangeConfig, InMemoryLedger, Pool, PoolId, PoolKey, SwapDirection, TokenLedger,
    SUPPORTED_FEE_TIERS,
};
use proptest::prelude::*;
use solana_sdk::pubkey::Pubkey;

const FUNDING: u64 = 1_000_000_000_000;

fn active_pool(fee_bps: u16, reserve0: u64, reserve1: u64) -> Pool {
    let key = PoolKey::new(Pubkey::new_unique(), Pubkey::new_unique(), fee_bps).unwrap();
    let mut pool = Pool::new(PoolId(1), key, Pubkey::new_unique(), 0);
    pool.reserve0 = reserve0;
    pool.reserve1 = reserve1;
    pool.total_liquidity_supply = 10_000;
    pool
}

#[derive(Debug, Clone)]
enum Action {
    Swap { trader: usize, amount: u64, zero_for_one: bool },
    Add { provider: usize, amount0: u64, amount1: u64 },
    Remove { provider: usize, per_mille: u64 },
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0..2usize, 1..2_000_000u64, any::<bool>()).prop_map(|(trader, amount, zero_for_one)| {
            Action::Swap {
                trader,
                amount,
                zero_for_one,
            }
        }),
        (0..2usize, 1..2_000_000u64, 1..2_000_000u64).prop_map(|(provider, amount0, amount1)| {
            Action::Add {
                provider,
                amount0,
                amount1,
            }
        }),
        (0..2usize, 1..=1000u64).prop_map(|(provider, per_mille)| Action::Remove {
            provider,
            per_mille
        }),
    ]
}

struct Market {
    exchange: Exchange,
    ledger: InMemoryLedger,
    key: PoolKey,
    users: [Pubkey; 2],
}

impl Market {
    fn open(seed0: u64, seed1: u64) -> Self {
        let native = Pubkey::new_unique();
        let mut exchange =
            Exchange::new(ExchangeConfig::new(Pubkey::new_unique(), Pubkey::new_unique(), native))
                .unwrap();
        let mut ledger = InMemoryLedger::new();
        let (token_a, token_b) = (Pubkey::new_unique(), Pubkey::new_unique());
        let users = [Pubkey::new_unique(), Pubkey::new_unique()];
        for user in &users {
            for token in [&native, &token_a, &token_b] {
                ledger.mint_to(token, user, FUNDING).unwrap();
            }
        }

        let id = exchange
            .create_pool(&users[0], token_a, token_b, 30, &mut ledger)
            .unwrap()
            .value;
        let key = exchange.get_pool(id).unwrap().key;
        exchange
            .add_liquidity(&users[0], &key, seed0, seed1, 0, 0, &mut ledger)
            .unwrap();

        Self {
            exchange,
            ledger,
            key,
            users,
        }
    }

    fn apply(&mut self, action: &Action) {
        let key = self.key;
        // Rejections are expected here; the checks run on whatever committed
        let _ = match *action {
            Action::Swap {
                trader,
                amount,
                zero_for_one,
            } => {
                let direction = if zero_for_one {
                    SwapDirection::ZeroForOne
                } else {
                    SwapDirection::OneForZero
                };
                self.exchange
                    .swap(&self.users[trader], &key, amount, direction, &mut self.ledger)
                    .map(|_| ())
            }
            Action::Add {
                provider,
                amount0,
                amount1,
            } => self
                .exchange
                .add_liquidity(&self.users[provider], &key, amount0, amount1, 0, 0, &mut self.ledger)
                .map(|_| ()),
            Action::Remove { provider, per_mille } => {
                let id = self.exchange.get_pool_id(&key).unwrap();
                let held = self.exchange.get_position_liquidity(id, &self.users[provider]);
                let shares = held * per_mille / 1000;
                self.exchange
                    .remove_liquidity(&self.users[provider], &key, shares, &mut self.ledger)
                    .map(|_| ())
            }
        };
    }

    fn token_total(&self, token: &Pubkey) -> u64 {
        self.users
            .iter()
            .chain(std::iter::once(&self.exchange.custody()))
            .map(|holder| self.ledger.balance_of(token, holder))
            .sum()
    }
}

proptest! {
    #[test]
    fn higher_fee_never_pays_more(
        reserve0 in 1_000u64..1_000_000_000_000,
        reserve1 in 1_000u64..1_000_000_000_000,
        amount_in in 1u64..1_000_000_000_000,
        zero_for_one in any::<bool>(),
    ) {
        let direction = if zero_for_one {
            SwapDirection::ZeroForOne
        } else {
            SwapDirection::OneForZero
        };
        let outputs: Vec<u64> = SUPPORTED_FEE_TIERS
            .iter()
            .map(|fee| {
                active_pool(*fee, reserve0, reserve1)
                    .calculate_swap_output(amount_in, direction)
                    .map(|quote| quote.amount_out)
                    .unwrap_or(0)
            })
            .collect();

        for pair in outputs.windows(2) {
            prop_assert!(pair[0] >= pair[1], "outputs {:?}", outputs);
        }
    }

    #[test]
    fn swap_output_stays_below_reserve(
        reserve0 in 1u64..1_000_000_000_000,
        reserve1 in 1_000u64..=u64::MAX,
        amount_in in 1u64..u64::MAX / 2,
    ) {
        let pool = active_pool(30, reserve0, reserve1);
        if let Ok(quote) = pool.calculate_swap_output(amount_in, SwapDirection::ZeroForOne) {
            prop_assert!(quote.amount_out < reserve1);
            prop_assert_eq!(quote.fee + quote.amount_in_after_fee, amount_in);
            prop_assert!(quote.price_impact_bps <= 10_000);
        }
    }

    #[test]
    fn withdrawal_is_bounded_by_share(
        seed0 in 10_000u64..100_000_000,
        seed1 in 10_000u64..100_000_000,
        per_mille in 1u64..=1000,
    ) {
        let mut market = Market::open(seed0, seed1);
        let user = market.users[0];
        let key = market.key;
        let pool = market.exchange.pool_by_key(&key).unwrap().clone();
        let held = market.exchange.get_position_liquidity(pool.id, &user);
        let shares = held * per_mille / 1000;
        prop_assume!(shares > 0);

        if let Ok(receipt) = market.exchange.remove_liquidity(&user, &key, shares, &mut market.ledger) {
            let (out0, out1) = receipt.value;
            let supply = pool.total_liquidity_supply as u128;
            prop_assert!(out0 as u128 * supply <= pool.reserve0 as u128 * shares as u128);
            prop_assert!(out1 as u128 * supply <= pool.reserve1 as u128 * shares as u128);
            prop_assert!(out0 < seed0 && out1 < seed1);
        }
    }

    #[test]
    fn random_activity_keeps_books_balanced(
        seed0 in 10_000u64..10_000_000,
        seed1 in 10_000u64..10_000_000,
        actions in prop::collection::vec(action(), 1..40),
    ) {
        let mut market = Market::open(seed0, seed1);
        let key = market.key;
        let custody = market.exchange.custody();

        for action in &actions {
            let k_before = market.exchange.pool_by_key(&key).unwrap().k();
            let events_before = market.exchange.events().len();
            market.apply(action);

            prop_assert!(market.exchange.audit().is_ok(), "{:?}", market.exchange.audit());

            let pool = market.exchange.pool_by_key(&key).unwrap();
            prop_assert_eq!(market.ledger.balance_of(&key.token0(), &custody), pool.reserve0);
            prop_assert_eq!(market.ledger.balance_of(&key.token1(), &custody), pool.reserve1);
            prop_assert_eq!(market.token_total(&key.token0()), 2 * FUNDING);
            prop_assert_eq!(market.token_total(&key.token1()), 2 * FUNDING);

            let committed = market.exchange.events().len() > events_before;
            if committed && matches!(action, Action::Swap { .. }) {
                prop_assert!(pool.k() >= k_before);
            }
        }
    }
}
