//! Wallet Management Utilities
//!
//! Creates deterministic keypairs for simulation participants and funds them
//! on the in-memory token ledger.

use amm::InMemoryLedger;
use anyhow::{anyhow, Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{keypair_from_seed, Keypair, Signer},
};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Manages named wallets for the simulation
pub struct WalletManager {
    /// Seeded source for keypair material
    rng: StdRng,
    /// Created wallets
    wallets: BTreeMap<String, Keypair>,
}

impl WalletManager {
    /// Create a wallet manager whose keys are derived from `seed`
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            wallets: BTreeMap::new(),
        }
    }

    /// Create a new keypair under `name` and return its public key
    pub fn create_wallet(&mut self, name: &str) -> Result<Pubkey> {
        let mut seed = [0u8; 32];
        self.rng.fill(&mut seed);
        let keypair = keypair_from_seed(&seed)
            .map_err(|err| anyhow!("Failed to derive keypair for '{}': {}", name, err))?;

        let pubkey = keypair.pubkey();
        debug!("Created wallet '{}': {}", name, pubkey);
        self.wallets.insert(name.to_string(), keypair);
        Ok(pubkey)
    }

    /// Get a wallet by name
    pub fn get_wallet(&self, name: &str) -> Option<&Keypair> {
        self.wallets.get(name)
    }

    pub fn pubkey(&self, name: &str) -> Option<Pubkey> {
        self.wallets.get(name).map(|keypair| keypair.pubkey())
    }

    /// Mint `amount` of every token in `tokens` to `recipient`
    pub fn fund_wallet(
        &self,
        ledger: &mut InMemoryLedger,
        recipient: &Pubkey,
        tokens: &[Pubkey],
        amount: u64,
    ) -> Result<()> {
        for token in tokens {
            ledger
                .mint_to(token, recipient, amount)
                .with_context(|| format!("Failed to fund {} with {}", recipient, token))?;
        }
        Ok(())
    }

    /// Create and fund `count` wallets named `{prefix}_{i}`
    pub fn create_group(
        &mut self,
        prefix: &str,
        count: u32,
        ledger: &mut InMemoryLedger,
        tokens: &[Pubkey],
        amount: u64,
    ) -> Result<Vec<Pubkey>> {
        let mut pubkeys = Vec::with_capacity(count as usize);

        for i in 0..count {
            let pubkey = self.create_wallet(&format!("{}_{}", prefix, i))?;
            self.fund_wallet(ledger, &pubkey, tokens, amount)?;
            pubkeys.push(pubkey);
        }

        info!("Created {} {} wallets", count, prefix);
        Ok(pubkeys)
    }

    /// Get all wallets
    pub fn all_wallets(&self) -> &BTreeMap<String, Keypair> {
        &self.wallets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amm::TokenLedger;

    #[test]
    fn test_create_wallet() {
        let mut manager = WalletManager::new(1);

        let pubkey = manager.create_wallet("test").unwrap();

        let retrieved = manager.get_wallet("test").unwrap();
        assert_eq!(retrieved.pubkey(), pubkey);
        assert_eq!(manager.pubkey("test"), Some(pubkey));
        assert!(manager.get_wallet("missing").is_none());
    }

    #[test]
    fn test_same_seed_same_keys() {
        let mut first = WalletManager::new(9);
        let mut second = WalletManager::new(9);
        let mut other = WalletManager::new(10);

        let a = first.create_wallet("a").unwrap();
        assert_eq!(a, second.create_wallet("a").unwrap());
        assert_ne!(a, other.create_wallet("a").unwrap());
        assert_ne!(a, first.create_wallet("b").unwrap());
    }

    #[test]
    fn test_create_group_funds_every_token() {
        let mut manager = WalletManager::new(3);
        let mut ledger = InMemoryLedger::new();
        let tokens = [Pubkey::new_unique(), Pubkey::new_unique()];

        let group = manager
            .create_group("trader", 3, &mut ledger, &tokens, 500)
            .unwrap();

        assert_eq!(group.len(), 3);
        assert_eq!(manager.all_wallets().len(), 3);
        for holder in &group {
            for token in &tokens {
                assert_eq!(ledger.balance_of(token, holder), 500);
            }
        }
        assert_eq!(ledger.total_supply(&tokens[0]), 1500);
    }
}
