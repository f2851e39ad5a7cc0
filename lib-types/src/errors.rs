//! Exchange Engine Errors
//!
//! One taxonomy for every engine operation. Each variant carries a stable
//! numeric identifier (see [`ExchangeError::code`]) so external callers can
//! match on codes across releases.

use thiserror::Error;

use crate::primitives::{AccountId, Amount, AssetId};

/// Error during exchange operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("caller is not authorized for this operation")]
    NotAuthorized,

    #[error("delegated authorization already consumed for {0:?}")]
    InvalidNonce(AccountId),

    #[error("slippage tolerance exceeded: got {got}, minimum {min}")]
    Slippage { got: Amount, min: Amount },

    #[error("insufficient liquidity in pool")]
    InsufficientLiquidity,

    #[error("both sides of the pair are {0:?}")]
    IdenticalAssets(AssetId),

    #[error("zero amount not allowed")]
    ZeroAmount,

    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },

    #[error("pool already exists for ordered pair ({0:?}, {1:?})")]
    PoolExists(AssetId, AssetId),

    #[error("no pool for ordered pair ({0:?}, {1:?})")]
    PoolNotFound(AssetId, AssetId),

    #[error("signature recovery failed or recovered key mismatch")]
    InvalidSignature,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("arithmetic underflow")]
    Underflow,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("token transfer failed: {0}")]
    TransferFailed(String),
}

impl ExchangeError {
    /// Stable numeric identifier for external compatibility.
    ///
    /// Codes 1-10 cover the canonical operation failures; codes >= 100 are
    /// engine-internal rejection conditions (arithmetic, storage, transfer).
    pub const fn code(&self) -> u16 {
        match self {
            ExchangeError::NotAuthorized => 1,
            ExchangeError::InvalidNonce(_) => 2,
            ExchangeError::Slippage { .. } => 3,
            ExchangeError::InsufficientLiquidity => 4,
            ExchangeError::IdenticalAssets(_) => 5,
            ExchangeError::ZeroAmount => 6,
            ExchangeError::InsufficientBalance { .. } => 7,
            ExchangeError::PoolExists(_, _) => 8,
            ExchangeError::PoolNotFound(_, _) => 9,
            ExchangeError::InvalidSignature => 10,
            ExchangeError::Overflow => 100,
            ExchangeError::Underflow => 101,
            ExchangeError::Storage(_) => 102,
            ExchangeError::TransferFailed(_) => 103,
        }
    }
}

/// Result type for exchange operations
pub type ExchangeResult<T> = Result<T, ExchangeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ExchangeError::NotAuthorized.code(), 1);
        assert_eq!(ExchangeError::InvalidNonce(AccountId::zero()).code(), 2);
        assert_eq!(ExchangeError::Slippage { got: 1, min: 2 }.code(), 3);
        assert_eq!(ExchangeError::InsufficientLiquidity.code(), 4);
        assert_eq!(ExchangeError::IdenticalAssets(AssetId::zero()).code(), 5);
        assert_eq!(ExchangeError::ZeroAmount.code(), 6);
        assert_eq!(
            ExchangeError::InsufficientBalance { have: 0, need: 1 }.code(),
            7
        );
        assert_eq!(
            ExchangeError::PoolExists(AssetId::zero(), AssetId::zero()).code(),
            8
        );
        assert_eq!(
            ExchangeError::PoolNotFound(AssetId::zero(), AssetId::zero()).code(),
            9
        );
        assert_eq!(ExchangeError::InvalidSignature.code(), 10);
        assert_eq!(ExchangeError::Overflow.code(), 100);
    }

    #[test]
    fn test_display_includes_context() {
        let err = ExchangeError::InsufficientBalance { have: 5, need: 10 };
        assert_eq!(err.to_string(), "insufficient balance: have 5, need 10");

        let err = ExchangeError::Slippage { got: 99, min: 100 };
        assert_eq!(
            err.to_string(),
            "slippage tolerance exceeded: got 99, minimum 100"
        );
    }
}
