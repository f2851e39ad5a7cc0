//! # Constant-Product Exchange Engine
//!
//! Pool state machine for an automated market maker: liquidity
//! provisioning with proportional LP-share accounting, and constant-product
//! swaps with a fixed 30 bps fee retained by the reserves.
//!
//! ## Key Invariants
//!
//! ### Invariant P1: Reserve Conservation
//! After any swap: `reserve_in * reserve_out` does not decrease, and
//! strictly increases for any non-zero input (the fee accrues to reserves).
//!
//! ### Invariant P2: Ordered Pairs
//! Pools are keyed by the *ordered* pair `(asset_a, asset_b)`; `(X, Y)` and
//! `(Y, X)` are distinct pools with independent reserves.
//!
//! ### Invariant P3: Atomic Operations
//! Each public operation commits all of its reserve/ledger writes or none of
//! them; the two token-transfer legs inside an operation form a single
//! failure domain.
//!
//! ## Usage
//!
//! ```ignore
//! use lib_amm::{add_liquidity, execute_swap, MemoryPools, MemoryShares};
//!
//! let pools = MemoryPools::new();
//! let shares = MemoryShares::new();
//! let outcome = add_liquidity(&pools, &shares, &usd, &eur, 1000, 4000, 0, 0, alice)?;
//! let swap = execute_swap(&pools, &usd, &eur, 100, 0, bob)?;
//! ```

pub mod ledger;
pub mod liquidity;
pub mod pool;
pub mod swap;
pub mod tokens;

mod math;

pub use ledger::{get_lp_balance, MemoryShares, ShareLedger};
pub use liquidity::{
    add_liquidity, remove_liquidity, LiquidityEvent, LiquidityKind, LiquidityOutcome,
    WithdrawOutcome,
};
pub use pool::{custody_account, get_reserves, MemoryPools, Pool, PoolStore};
pub use swap::{execute_swap, get_amount_out, quote, SwapEvent, SwapOutcome};
pub use tokens::{LedgerToken, TokenTransfer};

use lib_types::Bps;

/// Swap fee in basis points, retained by the pool's reserves
pub const SWAP_FEE_BPS: Bps = 30;

/// Basis-point denominator (10000 = 100%)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Domain separator for pool custody account derivation
pub const CUSTODY_DOMAIN: &[u8] = b"AMM_POOL_CUSTODY_V1";
