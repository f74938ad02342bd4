use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info};

use crate::errors::{AmmError, Result};
use crate::events::{ExchangeEvent, Receipt};
use crate::exchange::Exchange;
use crate::settlement::Settlement;
use crate::token::TokenLedger;

impl Exchange {
    /// Owner-only: pay `amount` of collected creation fees out to the owner.
    /// Returns the remaining treasury balance.
    pub fn withdraw_treasury<L>(
        &mut self,
        caller: &Pubkey,
        amount: u64,
        ledger: &mut L,
    ) -> Result<Receipt<u64>>
    where
        L: TokenLedger + ?Sized,
    {
        self.check_withdrawal(caller, amount).map_err(|err| {
            debug!("withdraw_treasury rejected: {}", err);
            err
        })?;

        let owner = self.treasury.owner();
        let transfers = Settlement::new()
            .transfer(self.config.native_mint, self.config.custody, owner, amount)
            .settle(ledger)?;

        self.treasury.balance -= amount;
        self.treasury.total_withdrawn += amount;
        let remaining = self.treasury.balance;

        info!("Treasury withdrawal: {} to {} ({} remaining)", amount, owner, remaining);

        self.record(ExchangeEvent::TreasuryWithdrawn {
            owner,
            amount,
            remaining,
        });

        Ok(Receipt {
            value: remaining,
            transfers,
        })
    }

    fn check_withdrawal(&self, caller: &Pubkey, amount: u64) -> Result<()> {
        if *caller != self.treasury.owner() {
            return Err(AmmError::NotOwner);
        }
        if amount == 0 {
            return Err(AmmError::InvalidAmount);
        }
        if amount > self.treasury.balance {
            return Err(AmmError::InsufficientTreasuryBalance {
                requested: amount,
                available: self.treasury.balance,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::Fixture;

    #[test]
    fn test_treasury_accumulates_creation_fees() {
        let mut fx = Fixture::new();
        let alice = fx.alice;
        for fee in [1, 5, 30, 100] {
            fx.create_pool(&alice, fee).unwrap();
        }

        let fee = fx.exchange.config().creation_fee;
        assert_eq!(fx.exchange.get_treasury_balance(), 4 * fee);
    }

    #[test]
    fn test_withdraw_requires_owner() {
        let mut fx = Fixture::new();
        let alice = fx.alice;
        fx.create_pool(&alice, 30).unwrap();

        assert_eq!(
            fx.exchange.withdraw_treasury(&alice, 1, &mut fx.ledger),
            Err(AmmError::NotOwner)
        );
    }

    #[test]
    fn test_withdraw_more_than_balance() {
        let mut fx = Fixture::new();
        let (alice, owner) = (fx.alice, fx.owner);
        fx.create_pool(&alice, 30).unwrap();
        let fee = fx.exchange.config().creation_fee;

        assert_eq!(
            fx.exchange.withdraw_treasury(&owner, fee + 1, &mut fx.ledger),
            Err(AmmError::InsufficientTreasuryBalance {
                requested: fee + 1,
                available: fee,
            })
        );
        assert_eq!(fx.exchange.get_treasury_balance(), fee);
    }

    #[test]
    fn test_withdraw_pays_owner() {
        let mut fx = Fixture::new();
        let (alice, owner, native) = (fx.alice, fx.owner, fx.native);
        fx.create_pool(&alice, 30).unwrap();
        let fee = fx.exchange.config().creation_fee;

        let receipt = fx
            .exchange
            .withdraw_treasury(&owner, fee / 4, &mut fx.ledger)
            .unwrap();

        assert_eq!(receipt.value, fee - fee / 4);
        assert_eq!(receipt.transfers.len(), 1);
        assert_eq!(receipt.transfers[0].to, owner);
        assert_eq!(fx.balance(&native, &owner), fee / 4);
        assert_eq!(fx.exchange.treasury().total_withdrawn, fee / 4);
        assert!(fx.exchange.audit().is_ok());

        let receipt = fx
            .exchange
            .withdraw_treasury(&owner, fee - fee / 4, &mut fx.ledger)
            .unwrap();
        assert_eq!(receipt.value, 0);
        assert_eq!(fx.balance(&native, &owner), fee);
    }
}
