//! Exchange engine primitives.
//! Stable, protocol-neutral, behavior-free.
//!
//! Rule: No String identifiers in engine state. Ever.

pub mod errors;
pub mod primitives;

pub use errors::{ExchangeError, ExchangeResult};
pub use primitives::{AccountId, Amount, AssetId, Bps, Nonce};
