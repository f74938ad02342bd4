//! Ordered transfer batch with compensating rollback.
//!
//! Operations plan every transfer up front. `settle` executes them in order;
//! if one fails, the transfers already executed are reversed newest-first so
//! the token collaborator ends up where it started.

use solana_sdk::pubkey::Pubkey;
use tracing::{debug, error, warn};

use crate::errors::{AmmError, Result, TokenError};
use crate::events::TransferEvent;
use crate::token::TokenLedger;

#[derive(Debug, Default)]
pub struct Settlement {
    transfers: Vec<TransferEvent>,
}

impl Settlement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transfer(mut self, token: Pubkey, from: Pubkey, to: Pubkey, amount: u64) -> Self {
        self.transfers.push(TransferEvent {
            token,
            from,
            to,
            amount,
        });
        self
    }

    pub fn settle<L>(self, ledger: &mut L) -> Result<Vec<TransferEvent>>
    where
        L: TokenLedger + ?Sized,
    {
        for (index, step) in self.transfers.iter().enumerate() {
            if let Err(err) = ledger.transfer(&step.token, &step.from, &step.to, step.amount) {
                warn!(
                    "Transfer {} of {} failed ({}), rolling back",
                    index + 1,
                    self.transfers.len(),
                    err
                );
                return Err(match Self::rollback(ledger, &self.transfers[..index]) {
                    Ok(()) => AmmError::Transfer(err),
                    Err(rollback) => AmmError::RollbackFailed {
                        cause: err,
                        rollback,
                    },
                });
            }
            debug!(
                "Transferred {} of {} from {} to {}",
                step.amount, step.token, step.from, step.to
            );
        }

        Ok(self.transfers)
    }

    /// Reverse `executed` newest-first. Every reversal is attempted; the first
    /// failure is returned.
    fn rollback<L>(ledger: &mut L, executed: &[TransferEvent]) -> std::result::Result<(), TokenError>
    where
        L: TokenLedger + ?Sized,
    {
        let mut first_failure = None;
        for step in executed.iter().rev() {
            if let Err(err) = ledger.transfer(&step.token, &step.to, &step.from, step.amount) {
                error!(
                    "Rollback of {} {} from {} to {} failed: {}",
                    step.amount, step.token, step.to, step.from, err
                );
                first_failure.get_or_insert(err);
            }
        }
        first_failure.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::InMemoryLedger;

    /// Ledger that rejects the transfers at the given 1-based call numbers.
    struct Flaky {
        inner: InMemoryLedger,
        calls: usize,
        reject: Vec<usize>,
    }

    impl TokenLedger for Flaky {
        fn transfer(
            &mut self,
            token: &Pubkey,
            from: &Pubkey,
            to: &Pubkey,
            amount: u64,
        ) -> std::result::Result<(), TokenError> {
            self.calls += 1;
            if self.reject.contains(&self.calls) {
                return Err(TokenError::Rejected(format!("call {}", self.calls)));
            }
            self.inner.transfer(token, from, to, amount)
        }

        fn balance_of(&self, token: &Pubkey, owner: &Pubkey) -> u64 {
            self.inner.balance_of(token, owner)
        }
    }

    #[test]
    fn test_settle_in_order() {
        let mut ledger = InMemoryLedger::new();
        let token_a = Pubkey::new_unique();
        let token_b = Pubkey::new_unique();
        let user = Pubkey::new_unique();
        let custody = Pubkey::new_unique();
        ledger.mint_to(&token_a, &user, 100).unwrap();
        ledger.mint_to(&token_b, &user, 100).unwrap();

        let transfers = Settlement::new()
            .transfer(token_a, user, custody, 10)
            .transfer(token_b, user, custody, 20)
            .settle(&mut ledger)
            .unwrap();

        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].token, token_a);
        assert_eq!(transfers[1].token, token_b);
        assert_eq!(ledger.balance_of(&token_a, &custody), 10);
        assert_eq!(ledger.balance_of(&token_b, &custody), 20);
    }

    #[test]
    fn test_failed_transfer_rolls_back() {
        let mut ledger = InMemoryLedger::new();
        let token_a = Pubkey::new_unique();
        let token_b = Pubkey::new_unique();
        let user = Pubkey::new_unique();
        let custody = Pubkey::new_unique();
        ledger.mint_to(&token_a, &user, 100).unwrap();
        ledger.mint_to(&token_b, &user, 5).unwrap();

        let err = Settlement::new()
            .transfer(token_a, user, custody, 10)
            .transfer(token_b, user, custody, 20)
            .settle(&mut ledger)
            .unwrap_err();

        assert!(matches!(
            err,
            AmmError::Transfer(TokenError::InsufficientBalance { needed: 20, .. })
        ));
        assert_eq!(ledger.balance_of(&token_a, &user), 100);
        assert_eq!(ledger.balance_of(&token_a, &custody), 0);
        assert_eq!(ledger.balance_of(&token_b, &user), 5);
    }

    #[test]
    fn test_failed_rollback_is_reported() {
        let mut inner = InMemoryLedger::new();
        let token_a = Pubkey::new_unique();
        let token_b = Pubkey::new_unique();
        let user = Pubkey::new_unique();
        let custody = Pubkey::new_unique();
        inner.mint_to(&token_a, &user, 100).unwrap();
        inner.mint_to(&token_b, &user, 100).unwrap();
        // Second transfer fails, then so does the reversal of the first
        let mut ledger = Flaky {
            inner,
            calls: 0,
            reject: vec![2, 3],
        };

        let err = Settlement::new()
            .transfer(token_a, user, custody, 10)
            .transfer(token_b, user, custody, 20)
            .settle(&mut ledger)
            .unwrap_err();

        assert_eq!(
            err,
            AmmError::RollbackFailed {
                cause: TokenError::Rejected("call 2".to_string()),
                rollback: TokenError::Rejected("call 3".to_string()),
            }
        );
        assert_eq!(err.kind(), "rollback_failed");
        assert_eq!(ledger.balance_of(&token_a, &custody), 10);
    }

    #[test]
    fn test_clean_rollback_reports_transfer() {
        let mut inner = InMemoryLedger::new();
        let token_a = Pubkey::new_unique();
        let user = Pubkey::new_unique();
        let custody = Pubkey::new_unique();
        inner.mint_to(&token_a, &user, 100).unwrap();
        let mut ledger = Flaky {
            inner,
            calls: 0,
            reject: vec![2],
        };

        let err = Settlement::new()
            .transfer(token_a, user, custody, 10)
            .transfer(token_a, user, custody, 20)
            .settle(&mut ledger)
            .unwrap_err();

        assert_eq!(err, AmmError::Transfer(TokenError::Rejected("call 2".to_string())));
        assert_eq!(ledger.balance_of(&token_a, &user), 100);
    }
}
