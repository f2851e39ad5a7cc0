//! Constant-product swap execution.
//!
//! Pricing follows `x * y = k` with a 30 bps fee charged on the input and
//! retained by the reserves: the product of reserves never decreases across
//! a swap and strictly increases for any non-zero input.

use serde::{Deserialize, Serialize};
use tracing::debug;

use lib_types::{AccountId, Amount, AssetId, ExchangeError, ExchangeResult};

use crate::pool::{custody_account, Pool, PoolStore};
use crate::tokens::{transfer_both, TokenTransfer, TransferLeg};
use crate::{BPS_DENOMINATOR, SWAP_FEE_BPS};

/// Snapshot of one completed swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapEvent {
    pub account: AccountId,
    pub asset_in: AssetId,
    pub asset_out: AssetId,
    pub amount_in: Amount,
    pub amount_out: Amount,
}

/// Result of `execute_swap`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    /// Amount of the input asset consumed
    pub amount_in: Amount,
    /// Amount of the output asset received
    pub amount_out: Amount,
    /// Input-side reserve after the swap
    pub new_reserve_in: Amount,
    /// Output-side reserve after the swap
    pub new_reserve_out: Amount,
    /// Event record for observers
    pub event: SwapEvent,
}

/// Output quote for a given input against fixed reserves.
///
/// Returns 0 if any of `amount_in`, `reserve_in`, `reserve_out` is zero.
/// Otherwise:
///
/// ```text
/// with_fee = amount_in * (10000 - 30)
/// out      = with_fee * reserve_out / (reserve_in * 10000 + with_fee)
/// ```
///
/// The fee stays in the pool; there is no separate fee vault.
pub fn quote(
    reserve_in: Amount,
    reserve_out: Amount,
    amount_in: Amount,
) -> ExchangeResult<Amount> {
    if amount_in == 0 || reserve_in == 0 || reserve_out == 0 {
        return Ok(0);
    }

    let with_fee = (amount_in as u128)
        .checked_mul(BPS_DENOMINATOR - SWAP_FEE_BPS as u128)
        .ok_or(ExchangeError::Overflow)?;

    let numerator = with_fee
        .checked_mul(reserve_out as u128)
        .ok_or(ExchangeError::Overflow)?;

    let denominator = (reserve_in as u128)
        .checked_mul(BPS_DENOMINATOR)
        .ok_or(ExchangeError::Overflow)?
        .checked_add(with_fee)
        .ok_or(ExchangeError::Overflow)?;

    // Safe to cast: amount_out < reserve_out, which is an Amount.
    Ok((numerator / denominator) as Amount)
}

/// Swap `amount_in` of the input asset for the output asset against the
/// pool keyed by the ordered pair `(asset_in, asset_out)`.
///
/// The direct path and the delegated (meta-transaction) path share this
/// state transition; they differ only in how `authorized` was established.
///
/// # Errors
/// - `PoolNotFound`: no pool for the ordered pair
/// - `IdenticalAssets`: input and output name the same asset
/// - `ZeroAmount`: `amount_in` is zero
/// - `Slippage`: quoted output below `min_amount_out`
/// - `InsufficientLiquidity`: the trade would consume an entire reserve
///   side (full drain is disallowed even when arithmetically computable)
pub fn execute_swap(
    pools: &dyn PoolStore,
    token_in: &dyn TokenTransfer,
    token_out: &dyn TokenTransfer,
    amount_in: Amount,
    min_amount_out: Amount,
    authorized: AccountId,
) -> ExchangeResult<SwapOutcome> {
    let asset_in = token_in.asset_id();
    let asset_out = token_out.asset_id();

    let pool = pools
        .get(&asset_in, &asset_out)?
        .ok_or(ExchangeError::PoolNotFound(asset_in, asset_out))?;

    if asset_in == asset_out {
        return Err(ExchangeError::IdenticalAssets(asset_in));
    }
    if amount_in == 0 {
        return Err(ExchangeError::ZeroAmount);
    }

    let reserve_in = pool.reserve_a;
    let reserve_out = pool.reserve_b;

    let amount_out = quote(reserve_in, reserve_out, amount_in)?;
    if amount_out < min_amount_out {
        return Err(ExchangeError::Slippage {
            got: amount_out,
            min: min_amount_out,
        });
    }

    if amount_in >= reserve_in || amount_out >= reserve_out {
        return Err(ExchangeError::InsufficientLiquidity);
    }

    let new_pool = Pool {
        reserve_a: reserve_in
            .checked_add(amount_in)
            .ok_or(ExchangeError::Overflow)?,
        reserve_b: reserve_out
            .checked_sub(amount_out)
            .ok_or(ExchangeError::Underflow)?,
        total_shares: pool.total_shares,
    };

    let custody = custody_account(&asset_in, &asset_out);
    transfer_both(
        TransferLeg {
            token: token_in,
            amount: amount_in,
            from: &authorized,
            to: &custody,
        },
        TransferLeg {
            token: token_out,
            amount: amount_out,
            from: &custody,
            to: &authorized,
        },
        "swap",
    )?;

    pools.update(&asset_in, &asset_out, new_pool)?;

    debug!(
        ?asset_in,
        ?asset_out,
        amount_in,
        amount_out,
        "swap executed"
    );

    Ok(SwapOutcome {
        amount_in,
        amount_out,
        new_reserve_in: new_pool.reserve_a,
        new_reserve_out: new_pool.reserve_b,
        event: SwapEvent {
            account: authorized,
            asset_in,
            asset_out,
            amount_in,
            amount_out,
        },
    })
}

/// Read-only quote against the pool for the ordered pair.
///
/// Fails `PoolNotFound` if the pair has no pool.
pub fn get_amount_out(
    pools: &dyn PoolStore,
    asset_in: &AssetId,
    asset_out: &AssetId,
    amount_in: Amount,
) -> ExchangeResult<Amount> {
    let pool = pools
        .get(asset_in, asset_out)?
        .ok_or(ExchangeError::PoolNotFound(*asset_in, *asset_out))?;

    quote(pool.reserve_a, pool.reserve_b, amount_in)
}
