//! Fungible-asset capability consumed by the exchange.
//!
//! The exchange never owns token balances itself. Every movement of funds goes
//! through a [`TokenLedger`] handed in by the caller of each operation.

use solana_sdk::pubkey::Pubkey;
use std::collections::{BTreeMap, HashMap};

use crate::errors::TokenError;

pub trait TokenLedger {
    /// Move `amount` of `token` from `from` to `to`.
    fn transfer(
        &mut self,
        token: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> Result<(), TokenError>;

    fn balance_of(&self, token: &Pubkey, owner: &Pubkey) -> u64;
}

/// Keyed in-memory balances, used by tests and the simulator.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: HashMap<(Pubkey, Pubkey), u64>,
    supplies: BTreeMap<Pubkey, u64>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` new units of `token` for `owner`.
    pub fn mint_to(&mut self, token: &Pubkey, owner: &Pubkey, amount: u64) -> Result<(), TokenError> {
        let supply = self.supplies.get(token).copied().unwrap_or(0);
        let new_supply = supply.checked_add(amount).ok_or(TokenError::Overflow)?;
        let balance = self.balance_of(token, owner);
        let new_balance = balance.checked_add(amount).ok_or(TokenError::Overflow)?;

        self.supplies.insert(*token, new_supply);
        self.balances.insert((*token, *owner), new_balance);
        Ok(())
    }

    /// Total units of `token` ever minted.
    pub fn total_supply(&self, token: &Pubkey) -> u64 {
        self.supplies.get(token).copied().unwrap_or(0)
    }

    /// Sum of every holder's balance of `token`. Equals `total_supply` unless
    /// transfers created or destroyed units.
    pub fn circulating(&self, token: &Pubkey) -> u128 {
        self.balances
            .iter()
            .filter(|((t, _), _)| t == token)
            .map(|(_, balance)| *balance as u128)
            .sum()
    }
}

impl TokenLedger for InMemoryLedger {
    fn transfer(
        &mut self,
        token: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u64,
    ) -> Result<(), TokenError> {
        let available = self.balance_of(token, from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                token: *token,
                owner: *from,
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }

        let credited = self
            .balance_of(token, to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;

        self.balances.insert((*token, *from), available - amount);
        self.balances.insert((*token, *to), credited);
        Ok(())
    }

    fn balance_of(&self, token: &Pubkey, owner: &Pubkey) -> u64 {
        self.balances.get(&(*token, *owner)).copied().unwrap_or(0)
    }
}
