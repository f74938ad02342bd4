//! Simulation Orchestrator
//!
//! Builds an exchange over an in-memory ledger, seeds one pool per consecutive
//! token pair, then drives a seeded stream of swaps, deposits and withdrawals
//! through it. Every step is followed by an invariant check.

use crate::bots::{
    trader::{random_direction, random_trade_amount},
    LiquidityProvider, LiquidityResult, TradeResult, Trader,
};
use crate::config::SimulationConfig;
use crate::simulation::pool_state::{PoolSnapshot, PoolTracker};
use crate::utils::WalletManager;
use amm::{AmmError, Exchange, ExchangeConfig, InMemoryLedger, PoolId, PoolKey, SwapDirection};
use anyhow::{Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Results of the complete simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResults {
    /// When the run finished (RFC 3339)
    pub generated_at: String,
    /// Configuration used
    pub config: SimulationConfigSummary,
    /// Executed swaps
    pub trades: Vec<TradeResult>,
    /// Executed deposits and withdrawals, genesis deposits included
    pub liquidity_events: Vec<LiquidityResult>,
    /// Final state per pool
    pub pools: Vec<PoolSummary>,
    /// Pool state history
    pub pool_history: Vec<PoolSnapshot>,
    /// Rejected operations by error kind
    pub rejections: BTreeMap<String, u32>,
    /// Broken invariants, one line each; empty on a healthy run
    pub invariant_violations: Vec<String>,
    /// Summary statistics
    pub summary: SimulationSummary,
}

/// Summary of simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfigSummary {
    pub steps: u32,
    pub seed: u64,
    pub num_tokens: u32,
    pub fee_tiers: Vec<u16>,
    pub creation_fee: u64,
    pub min_swap: u64,
    pub max_swap: u64,
    pub swap_probability: f64,
    pub add_probability: f64,
    pub slippage_bps: u64,
}

impl From<&SimulationConfig> for SimulationConfigSummary {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            steps: config.steps,
            seed: config.seed,
            num_tokens: config.num_tokens,
            fee_tiers: config.fee_tiers.clone(),
            creation_fee: config.creation_fee,
            min_swap: config.min_swap,
            max_swap: config.max_swap,
            swap_probability: config.swap_probability,
            add_probability: config.add_probability,
            slippage_bps: config.slippage_bps,
        }
    }
}

/// Summary statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    /// Random steps run
    pub steps: u32,
    pub accepted: u32,
    pub rejected: u32,
    /// Accepted share of steps (%)
    pub acceptance_rate: f64,
    pub swaps: u32,
    pub deposits: u32,
    pub withdrawals: u32,
    /// Sum of swap inputs across all tokens
    pub total_volume: u128,
    /// Sum of swap fees across all tokens
    pub total_fees: u64,
    pub pools_created: u32,
    /// Creation fees collected by the treasury
    pub treasury_collected: u64,
    /// Treasury paid out to the owner at the end of the run
    pub treasury_withdrawn: u64,
    /// Events in the exchange journal
    pub events_recorded: u64,
    pub invariant_violations: u32,
}

/// Final state of one pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSummary {
    pub id: PoolId,
    pub token0: String,
    pub token1: String,
    pub fee_bps: u16,
    pub reserve0: u64,
    pub reserve1: u64,
    pub total_liquidity: u64,
    pub swaps: u32,
    /// Swap input volume in token0
    pub volume0: u128,
    /// Swap input volume in token1
    pub volume1: u128,
    pub fees0: u64,
    pub fees1: u64,
    /// Growth of k since genesis (%)
    pub k_growth_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Swap,
    Add,
    Remove,
}

/// Main simulation orchestrator
pub struct Orchestrator {
    config: SimulationConfig,
    rng: StdRng,
    exchange: Exchange,
    ledger: InMemoryLedger,
    wallets: WalletManager,
    owner: Pubkey,
    native_mint: Pubkey,
    /// Traded tokens, in creation order
    tokens: Vec<Pubkey>,
    traders: Vec<Trader>,
    providers: Vec<LiquidityProvider>,
    pools: Vec<PoolKey>,
    tracker: PoolTracker,
}

impl Orchestrator {
    /// Create a new orchestrator with the given configuration
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let mut wallets = WalletManager::new(config.seed);
        let owner = wallets.create_wallet("owner")?;
        let custody = wallets.create_wallet("custody")?;
        let native_mint = wallets.create_wallet("native_mint")?;
        let tokens = (0..config.num_tokens)
            .map(|i| wallets.create_wallet(&format!("mint_{}", i)))
            .collect::<Result<Vec<_>>>()?;

        let exchange_config =
            ExchangeConfig::new(owner, custody, native_mint).with_creation_fee(config.creation_fee);
        let exchange = Exchange::new(exchange_config).context("Failed to open exchange")?;

        let mut ledger = InMemoryLedger::new();
        let traders = wallets
            .create_group("trader", config.num_traders, &mut ledger, &tokens, config.trader_balance)?
            .into_iter()
            .map(|wallet| Trader::new(wallet, config.slippage_bps))
            .collect();

        let mut provider_tokens = tokens.clone();
        provider_tokens.push(native_mint);
        let providers = wallets
            .create_group(
                "provider",
                config.num_providers,
                &mut ledger,
                &provider_tokens,
                config.provider_balance,
            )?
            .into_iter()
            .map(|wallet| LiquidityProvider::new(wallet, config.slippage_bps))
            .collect();

        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            exchange,
            ledger,
            wallets,
            owner,
            native_mint,
            tokens,
            traders,
            providers,
            pools: Vec::new(),
            tracker: PoolTracker::new(),
        })
    }

    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    pub fn wallets(&self) -> &WalletManager {
        &self.wallets
    }

    /// Create one pool per consecutive token pair and seed it.
    fn setup(&mut self) -> Result<Vec<LiquidityResult>> {
        let mut genesis = Vec::new();

        let provider_count = self.providers.len();
        for i in 0..self.config.num_pools() {
            let fee_bps = self.config.fee_tiers[i % self.config.fee_tiers.len()];
            let (token_a, token_b) = (self.tokens[i], self.tokens[i + 1]);
            let provider = &mut self.providers[i % provider_count];

            let id = self
                .exchange
                .create_pool(&provider.pubkey(), token_a, token_b, fee_bps, &mut self.ledger)
                .with_context(|| format!("Failed to create pool {}/{}", token_a, token_b))?
                .value;
            let key = self
                .exchange
                .get_pool(id)
                .map(|pool| pool.key)
                .context("Created pool missing from registry")?;

            let (amount0, amount1) = if key.token0() == token_a {
                (self.config.initial_liquidity_a, self.config.initial_liquidity_b)
            } else {
                (self.config.initial_liquidity_b, self.config.initial_liquidity_a)
            };
            let seeded = provider
                .seed(&mut self.exchange, &mut self.ledger, &key, amount0, amount1)
                .with_context(|| format!("Failed to seed {}", id))?;

            let pool = self.exchange.pool_by_key(&key)?;
            self.tracker.snapshot(pool, 0, "genesis");
            info!("Seeded {} at {} bps with ({}, {})", id, fee_bps, amount0, amount1);

            self.pools.push(key);
            genesis.push(seeded);
        }

        Ok(genesis)
    }

    fn pick_action(&mut self) -> Action {
        let roll: f64 = self.rng.gen();
        if roll < self.config.swap_probability {
            Action::Swap
        } else if roll < self.config.swap_probability + self.config.add_probability {
            Action::Add
        } else {
            Action::Remove
        }
    }

    /// Run the complete simulation
    pub fn run(&mut self) -> Result<SimulationResults> {
        info!("Starting AMM simulation...");
        info!("Steps: {}, seed: {}", self.config.steps, self.config.seed);

        let mut liquidity_events = self.setup()?;
        let mut trades = Vec::new();
        let mut rejections: BTreeMap<String, u32> = BTreeMap::new();
        let mut violations = self.check_invariants(0, None);
        let mut summary = SimulationSummary {
            steps: self.config.steps,
            pools_created: self.pools.len() as u32,
            ..Default::default()
        };

        for step in 1..=self.config.steps {
            let key = self.pools[self.rng.gen_range(0..self.pools.len())];
            let k_before = self.exchange.pool_by_key(&key)?.k();
            let action = self.pick_action();

            let outcome: std::result::Result<(), AmmError> = match action {
                Action::Swap => {
                    let idx = self.rng.gen_range(0..self.traders.len());
                    let amount =
                        random_trade_amount(&mut self.rng, self.config.min_swap, self.config.max_swap);
                    let direction = random_direction(&mut self.rng);
                    self.traders[idx]
                        .trade(step, &mut self.exchange, &mut self.ledger, &key, amount, direction)
                        .map(|trade| {
                            summary.swaps += 1;
                            summary.total_volume += trade.amount_in as u128;
                            summary.total_fees = summary.total_fees.saturating_add(trade.fee_paid);
                            trades.push(trade);
                        })
                }
                Action::Add => {
                    let idx = self.rng.gen_range(0..self.providers.len());
                    let amount0 =
                        random_trade_amount(&mut self.rng, self.config.min_swap, self.config.max_swap);
                    self.providers[idx]
                        .provide(step, &mut self.exchange, &mut self.ledger, &key, amount0)
                        .map(|deposit| {
                            summary.deposits += 1;
                            liquidity_events.push(deposit);
                        })
                }
                Action::Remove => {
                    let idx = self.rng.gen_range(0..self.providers.len());
                    self.providers[idx]
                        .withdraw(step, &mut self.rng, &mut self.exchange, &mut self.ledger, &key)
                        .map(|withdrawal| {
                            summary.withdrawals += 1;
                            liquidity_events.push(withdrawal);
                        })
                }
            };

            let swapped = match outcome {
                Ok(()) => {
                    summary.accepted += 1;
                    let pool = self.exchange.pool_by_key(&key)?;
                    let event = match action {
                        Action::Swap => "swap",
                        Action::Add => "add_liquidity",
                        Action::Remove => "remove_liquidity",
                    };
                    self.tracker.snapshot(pool, step, event);
                    action == Action::Swap
                }
                Err(err) => {
                    summary.rejected += 1;
                    debug!("Step {} {:?} on {} rejected: {}", step, action, key, err);
                    *rejections.entry(err.kind().to_string()).or_insert(0) += 1;
                    false
                }
            };

            let k_check = swapped.then_some((key, k_before));
            violations.extend(self.check_invariants(step, k_check));

            // Progress logging
            if step % 100 == 0 || step == 1 {
                info!("Progress: {}/{} steps", step, self.config.steps);
            }
        }

        summary.treasury_withdrawn = self.sweep_treasury()?;
        violations.extend(self.check_invariants(self.config.steps, None));

        let treasury = self.exchange.treasury();
        summary.treasury_collected = treasury.total_collected;
        summary.events_recorded = self.exchange.sequence();
        summary.invariant_violations = violations.len() as u32;
        summary.acceptance_rate = if summary.steps > 0 {
            summary.accepted as f64 / summary.steps as f64 * 100.0
        } else {
            0.0
        };

        info!("Simulation complete!");
        info!(
            "Accepted {} / rejected {} steps, {} swaps, volume {}",
            summary.accepted, summary.rejected, summary.swaps, summary.total_volume
        );
        if !violations.is_empty() {
            warn!("{} invariant violations recorded", violations.len());
        }

        Ok(SimulationResults {
            generated_at: chrono::Utc::now().to_rfc3339(),
            config: SimulationConfigSummary::from(&self.config),
            pools: self.pool_summaries(&trades),
            pool_history: self.tracker.all(),
            trades,
            liquidity_events,
            rejections,
            invariant_violations: violations,
            summary,
        })
    }

    /// Pay the whole treasury out to the owner.
    fn sweep_treasury(&mut self) -> Result<u64> {
        let balance = self.exchange.get_treasury_balance();
        if balance == 0 {
            return Ok(0);
        }

        let owner = self.owner;
        self.exchange
            .withdraw_treasury(&owner, balance, &mut self.ledger)
            .context("Treasury sweep failed")?;
        Ok(balance)
    }

    /// Engine audit, token conservation, and k monotonicity for a committed swap.
    fn check_invariants(&self, step: u32, swap: Option<(PoolKey, u128)>) -> Vec<String> {
        let mut violations = Vec::new();

        if let Err(violation) = self.exchange.audit() {
            violations.push(format!("step {}: {}", step, violation));
        }

        for token in self.tokens.iter().chain(std::iter::once(&self.native_mint)) {
            let supply = self.ledger.total_supply(token) as u128;
            let circulating = self.ledger.circulating(token);
            if supply != circulating {
                violations.push(format!(
                    "step {}: token {} supply {} but {} in circulation",
                    step, token, supply, circulating
                ));
            }
        }

        if let Some((key, k_before)) = swap {
            match self.exchange.pool_by_key(&key) {
                Ok(pool) if pool.k() < k_before => violations.push(format!(
                    "step {}: k on {} fell from {} to {}",
                    step,
                    pool.id,
                    k_before,
                    pool.k()
                )),
                Ok(_) => {}
                Err(err) => violations.push(format!("step {}: {}", step, err)),
            }
        }

        for violation in &violations {
            warn!("Invariant violation: {}", violation);
        }
        violations
    }

    fn pool_summaries(&self, trades: &[TradeResult]) -> Vec<PoolSummary> {
        self.exchange
            .pools()
            .map(|pool| {
                let mut summary = PoolSummary {
                    id: pool.id,
                    token0: pool.key.token0().to_string(),
                    token1: pool.key.token1().to_string(),
                    fee_bps: pool.key.fee_bps(),
                    reserve0: pool.reserve0,
                    reserve1: pool.reserve1,
                    total_liquidity: pool.total_liquidity_supply,
                    swaps: 0,
                    volume0: 0,
                    volume1: 0,
                    fees0: pool.cumulative_fee0,
                    fees1: pool.cumulative_fee1,
                    k_growth_pct: self.tracker.k_growth_pct(pool.id),
                };

                for trade in trades.iter().filter(|trade| trade.pool == pool.id) {
                    summary.swaps += 1;
                    match trade.direction {
                        SwapDirection::ZeroForOne => summary.volume0 += trade.amount_in as u128,
                        SwapDirection::OneForZero => summary.volume1 += trade.amount_in as u128,
                    }
                }
                summary
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amm::TokenLedger;

    fn quick(steps: u32) -> SimulationConfig {
        SimulationConfig {
            steps,
            ..SimulationConfig::quick_test()
        }
    }

    #[test]
    fn test_orchestrator_quick_run() {
        let mut orchestrator = Orchestrator::new(quick(50)).unwrap();
        let results = orchestrator.run().unwrap();
        let summary = &results.summary;

        assert!(results.invariant_violations.is_empty(), "{:?}", results.invariant_violations);
        assert_eq!(summary.accepted + summary.rejected, 50);
        assert_eq!(summary.rejected, results.rejections.values().sum::<u32>());
        assert_eq!(summary.swaps as usize, results.trades.len());
        assert_eq!(summary.pools_created, 2);
        assert_eq!(results.pools.len(), 2);
        assert_eq!(
            results.liquidity_events.len() as u32,
            2 + summary.deposits + summary.withdrawals
        );
    }

    #[test]
    fn test_providers_seed_more_pools_than_they_number() {
        let config = SimulationConfig {
            num_tokens: 5,
            num_providers: 2,
            ..quick(20)
        };
        let results = Orchestrator::new(config).unwrap().run().unwrap();

        assert_eq!(results.summary.pools_created, 4);
        assert_eq!(results.pools.len(), 4);
        assert!(results.pools.iter().all(|pool| pool.total_liquidity > 0));
        assert!(results.invariant_violations.is_empty(), "{:?}", results.invariant_violations);
    }

    #[test]
    fn test_same_seed_same_run() {
        let first = Orchestrator::new(quick(60)).unwrap().run().unwrap();
        let second = Orchestrator::new(quick(60)).unwrap().run().unwrap();

        assert_eq!(first.summary, second.summary);
        assert_eq!(first.trades, second.trades);
        assert_eq!(first.pools, second.pools);
        assert_eq!(first.rejections, second.rejections);
    }

    #[test]
    fn test_treasury_swept_to_owner() {
        let config = quick(10);
        let fee = config.creation_fee;
        let mut orchestrator = Orchestrator::new(config).unwrap();
        let results = orchestrator.run().unwrap();

        assert_eq!(results.summary.treasury_collected, 2 * fee);
        assert_eq!(results.summary.treasury_withdrawn, 2 * fee);
        assert_eq!(orchestrator.exchange().get_treasury_balance(), 0);

        let owner = orchestrator.wallets().pubkey("owner").unwrap();
        let native = orchestrator.wallets().pubkey("native_mint").unwrap();
        assert_eq!(orchestrator.ledger().balance_of(&native, &owner), 2 * fee);
    }

    #[test]
    fn test_swaps_only_grow_k() {
        let config = SimulationConfig {
            swap_probability: 1.0,
            add_probability: 0.0,
            ..quick(80)
        };
        let mut orchestrator = Orchestrator::new(config).unwrap();
        let results = orchestrator.run().unwrap();

        assert_eq!(results.summary.deposits + results.summary.withdrawals, 0);
        assert!(results.invariant_violations.is_empty());
        for pool in &results.pools {
            assert!(pool.k_growth_pct >= 0.0);
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = SimulationConfig {
            num_tokens: 1,
            ..SimulationConfig::quick_test()
        };
        assert!(Orchestrator::new(config).is_err());
    }
}
