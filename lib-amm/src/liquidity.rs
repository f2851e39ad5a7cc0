//! Liquidity provisioning and withdrawal.
//!
//! # Rules
//!
//! 1. **First deposit creates the pool**: minted shares are the two-step
//!    integer square root of `desired_a * desired_b`.
//! 2. **Top-ups are ratio-matched**: the engine takes the largest
//!    contribution at the current reserve ratio that fits inside both
//!    desired amounts, and mints shares proportionally.
//! 3. **Withdrawal is proportional**: `shares / total_shares` of each
//!    reserve, floor division.
//! 4. **All-or-nothing**: the two transfer legs and the store writes of one
//!    call either all commit or none do.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lib_types::{AccountId, Amount, AssetId, ExchangeError, ExchangeResult};

use crate::ledger::ShareLedger;
use crate::math::{isqrt_two_step, mul_div};
use crate::pool::{custody_account, Pool, PoolStore};
use crate::tokens::{transfer_both, TokenTransfer, TransferLeg};

/// Direction of a liquidity event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidityKind {
    Added,
    Removed,
}

/// Snapshot of one completed liquidity operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityEvent {
    pub kind: LiquidityKind,
    pub account: AccountId,
    pub asset_a: AssetId,
    pub asset_b: AssetId,
    pub amount_a: Amount,
    pub amount_b: Amount,
    pub shares: Amount,
}

/// Result of `add_liquidity`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityOutcome {
    /// Amount of asset A actually deposited
    pub final_a: Amount,
    /// Amount of asset B actually deposited
    pub final_b: Amount,
    /// LP shares minted to the caller
    pub minted_shares: Amount,
    /// Reserve of asset A after the deposit
    pub new_reserve_a: Amount,
    /// Reserve of asset B after the deposit
    pub new_reserve_b: Amount,
    /// Outstanding shares after the deposit
    pub new_total_shares: Amount,
    /// Event record for observers
    pub event: LiquidityEvent,
}

/// Result of `remove_liquidity`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawOutcome {
    /// Amount of asset A returned to the caller
    pub amount_a: Amount,
    /// Amount of asset B returned to the caller
    pub amount_b: Amount,
    /// Reserve of asset A after the withdrawal
    pub new_reserve_a: Amount,
    /// Reserve of asset B after the withdrawal
    pub new_reserve_b: Amount,
    /// Outstanding shares after the withdrawal
    pub new_total_shares: Amount,
    /// Event record for observers
    pub event: LiquidityEvent,
}

/// Deposit liquidity into the pool for the ordered pair
/// `(token_a.asset_id(), token_b.asset_id())`, creating the pool on first
/// deposit.
///
/// # Errors
/// - `IdenticalAssets`: both capabilities name the same asset
/// - `ZeroAmount`: either desired amount is zero
/// - `InsufficientLiquidity`: first deposit would mint zero shares, or an
///   existing pool has an empty reserve side
/// - `Slippage`: ratio-matched contribution fell below a caller minimum
/// - `Overflow`: an intermediate value exceeded the representable range
#[allow(clippy::too_many_arguments)]
pub fn add_liquidity(
    pools: &dyn PoolStore,
    ledger: &dyn ShareLedger,
    token_a: &dyn TokenTransfer,
    token_b: &dyn TokenTransfer,
    desired_a: Amount,
    desired_b: Amount,
    min_a: Amount,
    min_b: Amount,
    caller: AccountId,
) -> ExchangeResult<LiquidityOutcome> {
    let asset_a = token_a.asset_id();
    let asset_b = token_b.asset_id();

    if asset_a == asset_b {
        return Err(ExchangeError::IdenticalAssets(asset_a));
    }
    if desired_a == 0 || desired_b == 0 {
        return Err(ExchangeError::ZeroAmount);
    }

    match pools.get(&asset_a, &asset_b)? {
        None => create_pool(
            pools, ledger, token_a, token_b, desired_a, desired_b, caller,
        ),
        Some(pool) => top_up_pool(
            pools, ledger, token_a, token_b, pool, desired_a, desired_b, min_a, min_b, caller,
        ),
    }
}

fn create_pool(
    pools: &dyn PoolStore,
    ledger: &dyn ShareLedger,
    token_a: &dyn TokenTransfer,
    token_b: &dyn TokenTransfer,
    desired_a: Amount,
    desired_b: Amount,
    caller: AccountId,
) -> ExchangeResult<LiquidityOutcome> {
    let asset_a = token_a.asset_id();
    let asset_b = token_b.asset_id();

    let product = (desired_a as u128)
        .checked_mul(desired_b as u128)
        .ok_or(ExchangeError::Overflow)?;
    let minted = Amount::try_from(isqrt_two_step(product)).map_err(|_| ExchangeError::Overflow)?;
    if minted == 0 {
        return Err(ExchangeError::InsufficientLiquidity);
    }

    // Plan every store write before moving any value.
    let new_balance = ledger
        .balance(&caller)?
        .checked_add(minted)
        .ok_or(ExchangeError::Overflow)?;

    let custody = custody_account(&asset_a, &asset_b);
    transfer_both(
        TransferLeg {
            token: token_a,
            amount: desired_a,
            from: &caller,
            to: &custody,
        },
        TransferLeg {
            token: token_b,
            amount: desired_b,
            from: &caller,
            to: &custody,
        },
        "liquidity deposit",
    )?;

    pools.insert(&asset_a, &asset_b, Pool::new(desired_a, desired_b, minted))?;
    ledger.set_balance(&caller, new_balance)?;

    info!(
        ?asset_a,
        ?asset_b,
        reserve_a = desired_a,
        reserve_b = desired_b,
        minted,
        "pool created"
    );

    Ok(LiquidityOutcome {
        final_a: desired_a,
        final_b: desired_b,
        minted_shares: minted,
        new_reserve_a: desired_a,
        new_reserve_b: desired_b,
        new_total_shares: minted,
        event: LiquidityEvent {
            kind: LiquidityKind::Added,
            account: caller,
            asset_a,
            asset_b,
            amount_a: desired_a,
            amount_b: desired_b,
            shares: minted,
        },
    })
}

#[allow(clippy::too_many_arguments)]
fn top_up_pool(
    pools: &dyn PoolStore,
    ledger: &dyn ShareLedger,
    token_a: &dyn TokenTransfer,
    token_b: &dyn TokenTransfer,
    pool: Pool,
    desired_a: Amount,
    desired_b: Amount,
    min_a: Amount,
    min_b: Amount,
    caller: AccountId,
) -> ExchangeResult<LiquidityOutcome> {
    let asset_a = token_a.asset_id();
    let asset_b = token_b.asset_id();

    if pool.reserve_a == 0 || pool.reserve_b == 0 {
        return Err(ExchangeError::InsufficientLiquidity);
    }

    // Ratio-match the contribution: take all of the constraining side and
    // scale the other to the current reserve ratio.
    let optimal_b = mul_div(desired_a, pool.reserve_b, pool.reserve_a)?;
    let (final_a, final_b, minted) = if optimal_b <= desired_b {
        let minted = mul_div(desired_a, pool.total_shares, pool.reserve_a)?;
        (desired_a, optimal_b, minted)
    } else {
        let optimal_a = mul_div(desired_b, pool.reserve_a, pool.reserve_b)?;
        let minted = mul_div(desired_b, pool.total_shares, pool.reserve_b)?;
        (optimal_a, desired_b, minted)
    };

    if final_a < min_a {
        return Err(ExchangeError::Slippage {
            got: final_a,
            min: min_a,
        });
    }
    if final_b < min_b {
        return Err(ExchangeError::Slippage {
            got: final_b,
            min: min_b,
        });
    }

    let new_pool = Pool {
        reserve_a: pool
            .reserve_a
            .checked_add(final_a)
            .ok_or(ExchangeError::Overflow)?,
        reserve_b: pool
            .reserve_b
            .checked_add(final_b)
            .ok_or(ExchangeError::Overflow)?,
        total_shares: pool
            .total_shares
            .checked_add(minted)
            .ok_or(ExchangeError::Overflow)?,
    };
    let new_balance = ledger
        .balance(&caller)?
        .checked_add(minted)
        .ok_or(ExchangeError::Overflow)?;

    let custody = custody_account(&asset_a, &asset_b);
    transfer_both(
        TransferLeg {
            token: token_a,
            amount: final_a,
            from: &caller,
            to: &custody,
        },
        TransferLeg {
            token: token_b,
            amount: final_b,
            from: &caller,
            to: &custody,
        },
        "liquidity deposit",
    )?;

    pools.update(&asset_a, &asset_b, new_pool)?;
    ledger.set_balance(&caller, new_balance)?;

    debug!(
        ?asset_a,
        ?asset_b,
        final_a,
        final_b,
        minted,
        "liquidity added"
    );

    Ok(LiquidityOutcome {
        final_a,
        final_b,
        minted_shares: minted,
        new_reserve_a: new_pool.reserve_a,
        new_reserve_b: new_pool.reserve_b,
        new_total_shares: new_pool.total_shares,
        event: LiquidityEvent {
            kind: LiquidityKind::Added,
            account: caller,
            asset_a,
            asset_b,
            amount_a: final_a,
            amount_b: final_b,
            shares: minted,
        },
    })
}

/// Burn `shares` and return the proportional slice of each reserve to the
/// caller.
///
/// # Errors
/// - `PoolNotFound`: no pool for the ordered pair
/// - `ZeroAmount`: `shares` is zero
/// - `InsufficientBalance`: caller holds fewer shares than requested
/// - `Slippage`: a computed amount fell below a caller minimum
/// - `Underflow`: the proportional amounts exceed the pool's reserves
///   (possible because share balances are global, not per-pool)
#[allow(clippy::too_many_arguments)]
pub fn remove_liquidity(
    pools: &dyn PoolStore,
    ledger: &dyn ShareLedger,
    token_a: &dyn TokenTransfer,
    token_b: &dyn TokenTransfer,
    shares: Amount,
    min_a: Amount,
    min_b: Amount,
    caller: AccountId,
) -> ExchangeResult<WithdrawOutcome> {
    let asset_a = token_a.asset_id();
    let asset_b = token_b.asset_id();

    let pool = pools
        .get(&asset_a, &asset_b)?
        .ok_or(ExchangeError::PoolNotFound(asset_a, asset_b))?;

    if shares == 0 {
        return Err(ExchangeError::ZeroAmount);
    }

    let balance = ledger.balance(&caller)?;
    if balance < shares {
        return Err(ExchangeError::InsufficientBalance {
            have: balance,
            need: shares,
        });
    }

    let amount_a = mul_div(shares, pool.reserve_a, pool.total_shares)?;
    let amount_b = mul_div(shares, pool.reserve_b, pool.total_shares)?;

    if amount_a < min_a {
        return Err(ExchangeError::Slippage {
            got: amount_a,
            min: min_a,
        });
    }
    if amount_b < min_b {
        return Err(ExchangeError::Slippage {
            got: amount_b,
            min: min_b,
        });
    }

    let new_pool = Pool {
        reserve_a: pool
            .reserve_a
            .checked_sub(amount_a)
            .ok_or(ExchangeError::Underflow)?,
        reserve_b: pool
            .reserve_b
            .checked_sub(amount_b)
            .ok_or(ExchangeError::Underflow)?,
        total_shares: pool
            .total_shares
            .checked_sub(shares)
            .ok_or(ExchangeError::Underflow)?,
    };
    let new_balance = balance
        .checked_sub(shares)
        .ok_or(ExchangeError::Underflow)?;

    let custody = custody_account(&asset_a, &asset_b);
    transfer_both(
        TransferLeg {
            token: token_a,
            amount: amount_a,
            from: &custody,
            to: &caller,
        },
        TransferLeg {
            token: token_b,
            amount: amount_b,
            from: &custody,
            to: &caller,
        },
        "liquidity withdrawal",
    )?;

    pools.update(&asset_a, &asset_b, new_pool)?;
    ledger.set_balance(&caller, new_balance)?;

    debug!(
        ?asset_a,
        ?asset_b,
        amount_a,
        amount_b,
        shares,
        "liquidity removed"
    );

    Ok(WithdrawOutcome {
        amount_a,
        amount_b,
        new_reserve_a: new_pool.reserve_a,
        new_reserve_b: new_pool.reserve_b,
        new_total_shares: new_pool.total_shares,
        event: LiquidityEvent {
            kind: LiquidityKind::Removed,
            account: caller,
            asset_a,
            asset_b,
            amount_a,
            amount_b,
            shares,
        },
    })
}
