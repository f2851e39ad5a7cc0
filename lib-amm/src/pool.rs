//! Pool records and the keyed pool registry.
//!
//! Pools are keyed by the *ordered* pair of asset identifiers. The pair is
//! not order-normalized: `(X, Y)` and `(Y, X)` address two independent
//! pools whose prices drift separately.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;

use lib_types::{AccountId, Amount, AssetId, ExchangeError, ExchangeResult};

use crate::CUSTODY_DOMAIN;

/// Reserve pair plus outstanding LP share count for one ordered asset pair.
///
/// Created on the first liquidity deposit for the pair; never deleted. An
/// exhaustive withdrawal can bring both reserves to zero while the record
/// stays addressable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Reserve of the first asset of the ordered pair
    pub reserve_a: Amount,
    /// Reserve of the second asset of the ordered pair
    pub reserve_b: Amount,
    /// Cumulative LP shares minted minus burned for this pool
    pub total_shares: Amount,
}

impl Pool {
    /// Create a new pool record
    pub const fn new(reserve_a: Amount, reserve_b: Amount, total_shares: Amount) -> Self {
        Self {
            reserve_a,
            reserve_b,
            total_shares,
        }
    }

    /// Spot prices as fixed-point values with 18 decimals of precision:
    /// `(a_per_b, b_per_a)`.
    ///
    /// These are marginal prices and do not account for slippage or fee on
    /// actual trades.
    pub fn spot_price(&self) -> ExchangeResult<(u128, u128)> {
        if self.reserve_a == 0 || self.reserve_b == 0 {
            return Err(ExchangeError::InsufficientLiquidity);
        }

        const PRECISION: u128 = 1_000_000_000_000_000_000; // 1e18

        let a_per_b = (self.reserve_a as u128)
            .checked_mul(PRECISION)
            .ok_or(ExchangeError::Overflow)?
            / (self.reserve_b as u128);

        let b_per_a = (self.reserve_b as u128)
            .checked_mul(PRECISION)
            .ok_or(ExchangeError::Overflow)?
            / (self.reserve_a as u128);

        Ok((a_per_b, b_per_a))
    }
}

/// Derive the deterministic custodial account holding a pool's funds.
///
/// Custody = Blake3(CUSTODY_DOMAIN || asset_a || asset_b). The ordered pair
/// feeds the hash directly, so the two orderings of the same assets custody
/// their funds separately.
pub fn custody_account(asset_a: &AssetId, asset_b: &AssetId) -> AccountId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(CUSTODY_DOMAIN);
    hasher.update(asset_a.as_bytes());
    hasher.update(asset_b.as_bytes());

    AccountId::new(hasher.finalize().into())
}

/// Keyed storage for pool records, exact ordered-pair match only.
///
/// Callers hold the exclusive right to mutate a looked-up pool within one
/// logical operation; no partial writes are visible to other operations.
pub trait PoolStore {
    /// Get the pool for an ordered pair
    fn get(&self, asset_a: &AssetId, asset_b: &AssetId) -> ExchangeResult<Option<Pool>>;

    /// Create a pool; fails `PoolExists` if the ordered pair is present
    fn insert(&self, asset_a: &AssetId, asset_b: &AssetId, pool: Pool) -> ExchangeResult<()>;

    /// Replace a pool; fails `PoolNotFound` if the ordered pair is absent
    fn update(&self, asset_a: &AssetId, asset_b: &AssetId, pool: Pool) -> ExchangeResult<()>;
}

/// In-memory pool registry for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryPools {
    pools: RefCell<HashMap<(AssetId, AssetId), Pool>>,
}

impl MemoryPools {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PoolStore for MemoryPools {
    fn get(&self, asset_a: &AssetId, asset_b: &AssetId) -> ExchangeResult<Option<Pool>> {
        Ok(self.pools.borrow().get(&(*asset_a, *asset_b)).copied())
    }

    fn insert(&self, asset_a: &AssetId, asset_b: &AssetId, pool: Pool) -> ExchangeResult<()> {
        let mut pools = self.pools.borrow_mut();
        if pools.contains_key(&(*asset_a, *asset_b)) {
            return Err(ExchangeError::PoolExists(*asset_a, *asset_b));
        }
        pools.insert((*asset_a, *asset_b), pool);
        Ok(())
    }

    fn update(&self, asset_a: &AssetId, asset_b: &AssetId, pool: Pool) -> ExchangeResult<()> {
        let mut pools = self.pools.borrow_mut();
        match pools.get_mut(&(*asset_a, *asset_b)) {
            Some(entry) => {
                *entry = pool;
                Ok(())
            }
            None => Err(ExchangeError::PoolNotFound(*asset_a, *asset_b)),
        }
    }
}

/// Read-only reserve lookup for an ordered pair
pub fn get_reserves(
    pools: &dyn PoolStore,
    asset_a: &AssetId,
    asset_b: &AssetId,
) -> ExchangeResult<Option<Pool>> {
    pools.get(asset_a, asset_b)
}
