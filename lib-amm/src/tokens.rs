//! Token-transfer capability.
//!
//! Each tradable asset exposes debit/credit semantics and metadata through
//! the [`TokenTransfer`] trait. The engine treats a transfer failure as the
//! failure of the whole surrounding operation.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::warn;

use lib_types::{AccountId, Amount, AssetId, ExchangeError, ExchangeResult};

/// Capability exposed by a tradable asset.
///
/// The engines are polymorphic over this trait; each asset supplies its own
/// implementation.
pub trait TokenTransfer {
    /// Identifier of the asset this capability moves
    fn asset_id(&self) -> AssetId;

    /// Ticker symbol for display
    fn symbol(&self) -> &str;

    /// Decimal places of the smallest unit
    fn decimals(&self) -> u8;

    /// Move `amount` from `from` to `to`.
    ///
    /// Implementations must either fully apply the movement or leave both
    /// balances untouched and return an error.
    fn transfer(
        &self,
        amount: Amount,
        from: &AccountId,
        to: &AccountId,
        memo: Option<&str>,
    ) -> ExchangeResult<()>;
}

/// One leg of a two-transfer operation
pub(crate) struct TransferLeg<'a> {
    pub token: &'a dyn TokenTransfer,
    pub amount: Amount,
    pub from: &'a AccountId,
    pub to: &'a AccountId,
}

/// Execute two transfer legs as a single failure domain.
///
/// If the second leg fails, the first is compensated before the error
/// returns, so a failed operation leaves no committed value movement.
pub(crate) fn transfer_both(
    first: TransferLeg<'_>,
    second: TransferLeg<'_>,
    memo: &str,
) -> ExchangeResult<()> {
    first
        .token
        .transfer(first.amount, first.from, first.to, Some(memo))?;

    if let Err(err) = second
        .token
        .transfer(second.amount, second.from, second.to, Some(memo))
    {
        // Undo the first leg; its destination just received the funds, so
        // the compensating transfer can only fail on a broken capability.
        if let Err(refund_err) =
            first
                .token
                .transfer(first.amount, first.to, first.from, Some("rollback"))
        {
            warn!(%refund_err, "compensating transfer failed after aborted operation");
        }
        return Err(err);
    }

    Ok(())
}

/// In-memory ledger-backed token for embedding and tests
#[derive(Debug)]
pub struct LedgerToken {
    asset: AssetId,
    symbol: String,
    decimals: u8,
    balances: RefCell<HashMap<AccountId, Amount>>,
}

impl LedgerToken {
    pub fn new(asset: AssetId, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            asset,
            symbol: symbol.into(),
            decimals,
            balances: RefCell::new(HashMap::new()),
        }
    }

    /// Credit an account out of thin air (test/bootstrap setup)
    pub fn mint(&self, account: &AccountId, amount: Amount) {
        let mut balances = self.balances.borrow_mut();
        let entry = balances.entry(*account).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Current balance of an account
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        *self.balances.borrow().get(account).unwrap_or(&0)
    }
}

impl TokenTransfer for LedgerToken {
    fn asset_id(&self) -> AssetId {
        self.asset
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn transfer(
        &self,
        amount: Amount,
        from: &AccountId,
        to: &AccountId,
        _memo: Option<&str>,
    ) -> ExchangeResult<()> {
        if amount == 0 {
            return Ok(());
        }

        let mut balances = self.balances.borrow_mut();

        let from_balance = *balances.get(from).unwrap_or(&0);
        if from_balance < amount {
            return Err(ExchangeError::InsufficientBalance {
                have: from_balance,
                need: amount,
            });
        }

        let to_balance = *balances.get(to).unwrap_or(&0);
        let new_to_balance = to_balance
            .checked_add(amount)
            .ok_or(ExchangeError::Overflow)?;

        balances.insert(*from, from_balance - amount);
        balances.insert(*to, new_to_balance);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: u8) -> AccountId {
        AccountId::new([id; 32])
    }

    #[test]
    fn test_transfer_moves_balance() {
        let token = LedgerToken::new(AssetId::new([1u8; 32]), "USD", 6);
        token.mint(&account(1), 1_000);

        token
            .transfer(400, &account(1), &account(2), Some("test"))
            .unwrap();

        assert_eq!(token.balance_of(&account(1)), 600);
        assert_eq!(token.balance_of(&account(2)), 400);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let token = LedgerToken::new(AssetId::new([1u8; 32]), "USD", 6);
        token.mint(&account(1), 100);

        let err = token
            .transfer(400, &account(1), &account(2), None)
            .unwrap_err();
        assert_eq!(
            err,
            ExchangeError::InsufficientBalance {
                have: 100,
                need: 400
            }
        );

        // Nothing moved
        assert_eq!(token.balance_of(&account(1)), 100);
        assert_eq!(token.balance_of(&account(2)), 0);
    }

    #[test]
    fn test_zero_transfer_is_a_no_op() {
        let token = LedgerToken::new(AssetId::new([1u8; 32]), "USD", 6);
        token.transfer(0, &account(1), &account(2), None).unwrap();
        assert_eq!(token.balance_of(&account(1)), 0);
        assert_eq!(token.balance_of(&account(2)), 0);
    }

    #[test]
    fn test_metadata_accessors() {
        let token = LedgerToken::new(AssetId::new([9u8; 32]), "EUR", 2);
        assert_eq!(token.asset_id(), AssetId::new([9u8; 32]));
        assert_eq!(token.symbol(), "EUR");
        assert_eq!(token.decimals(), 2);
    }
}
