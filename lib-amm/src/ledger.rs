//! LP share balances.
//!
//! The share balance is GLOBAL per account, not scoped per pool: an account
//! providing liquidity to two different pools accumulates one combined
//! count. Withdrawal accounting across multiple pools is therefore
//! ambiguous for the same account. Known limitation; see DESIGN.md.

use std::cell::RefCell;
use std::collections::HashMap;

use lib_types::{AccountId, Amount, ExchangeResult};

/// Per-account LP share balances; mutated by the liquidity engine only.
pub trait ShareLedger {
    /// Share balance for an account (zero if never credited)
    fn balance(&self, account: &AccountId) -> ExchangeResult<Amount>;

    /// Overwrite an account's share balance
    fn set_balance(&self, account: &AccountId, amount: Amount) -> ExchangeResult<()>;
}

/// In-memory share ledger for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryShares {
    balances: RefCell<HashMap<AccountId, Amount>>,
}

impl MemoryShares {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShareLedger for MemoryShares {
    fn balance(&self, account: &AccountId) -> ExchangeResult<Amount> {
        Ok(*self.balances.borrow().get(account).unwrap_or(&0))
    }

    fn set_balance(&self, account: &AccountId, amount: Amount) -> ExchangeResult<()> {
        self.balances.borrow_mut().insert(*account, amount);
        Ok(())
    }
}

/// Read-only share balance lookup
pub fn get_lp_balance(ledger: &dyn ShareLedger, account: &AccountId) -> ExchangeResult<Amount> {
    ledger.balance(account)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_defaults_to_zero() {
        let ledger = MemoryShares::new();
        let account = AccountId::new([1u8; 32]);
        assert_eq!(ledger.balance(&account).unwrap(), 0);
    }

    #[test]
    fn test_set_then_get() {
        let ledger = MemoryShares::new();
        let account = AccountId::new([1u8; 32]);

        ledger.set_balance(&account, 2_000).unwrap();
        assert_eq!(ledger.balance(&account).unwrap(), 2_000);
        assert_eq!(get_lp_balance(&ledger, &account).unwrap(), 2_000);
    }
}
