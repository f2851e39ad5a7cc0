//! Delegated swap authorization and nonce bookkeeping.
//!
//! Per-account state machine: **unused** (no record) -> **used** (record
//! present). The transition fires at most once per account, ever: any
//! existing record rejects further delegated swaps regardless of the nonce
//! value presented. Records are never cleared.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::debug;

use lib_amm::{execute_swap, PoolStore, SwapOutcome, TokenTransfer};
use lib_types::{AccountId, Amount, AssetId, ExchangeError, ExchangeResult, Nonce};

use crate::digest::swap_request_digest;
use crate::recovery::{recover_public_key, PUBLIC_KEY_BYTES, SIGNATURE_BYTES};

/// Storage of the most recently consumed nonce per account.
///
/// Written once per account, never cleared.
pub trait NonceStore {
    /// Recorded nonce for an account, if any
    fn get(&self, account: &AccountId) -> ExchangeResult<Option<Nonce>>;

    /// Record a consumed nonce for an account
    fn put(&self, account: &AccountId, nonce: Nonce) -> ExchangeResult<()>;
}

/// In-memory nonce store for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryNonces {
    records: RefCell<HashMap<AccountId, Nonce>>,
}

impl MemoryNonces {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NonceStore for MemoryNonces {
    fn get(&self, account: &AccountId) -> ExchangeResult<Option<Nonce>> {
        Ok(self.records.borrow().get(account).copied())
    }

    fn put(&self, account: &AccountId, nonce: Nonce) -> ExchangeResult<()> {
        self.records.borrow_mut().insert(*account, nonce);
        Ok(())
    }
}

/// Replay and signature checks without any state write.
///
/// Shared by [`authorize`] and [`execute_delegated_swap`]; the nonce record
/// is committed by the caller only once the whole operation is certain to
/// succeed.
fn check_authorization(
    nonces: &dyn NonceStore,
    amount_in: Amount,
    min_amount_out: Amount,
    nonce: Nonce,
    signature: &[u8; SIGNATURE_BYTES],
    public_key: &[u8; PUBLIC_KEY_BYTES],
    account: AccountId,
) -> ExchangeResult<()> {
    if nonces.get(&account)?.is_some() {
        return Err(ExchangeError::InvalidNonce(account));
    }

    let digest = swap_request_digest(nonce, amount_in, min_amount_out);
    let recovered = recover_public_key(&digest, signature).ok_or(ExchangeError::InvalidSignature)?;
    if recovered != *public_key {
        return Err(ExchangeError::InvalidSignature);
    }

    Ok(())
}

/// Verify a delegated swap request and consume the account's nonce slot.
///
/// Returns the signing `account` as the authorized principal for the swap
/// engine to act on behalf of. The relayer submitting the request is a
/// separate, unauthenticated transport and never becomes the principal.
///
/// Asset and amount validity are NOT checked here; the swap engine
/// re-validates them, so an authorization failure short-circuits before any
/// reserve mutation.
///
/// # Errors
/// - `InvalidNonce`: the account already consumed its delegated slot
/// - `InvalidSignature`: recovery failed or the recovered key mismatches
#[allow(clippy::too_many_arguments)]
pub fn authorize(
    nonces: &dyn NonceStore,
    asset_in: AssetId,
    asset_out: AssetId,
    amount_in: Amount,
    min_amount_out: Amount,
    nonce: Nonce,
    signature: &[u8; SIGNATURE_BYTES],
    public_key: &[u8; PUBLIC_KEY_BYTES],
    account: AccountId,
) -> ExchangeResult<AccountId> {
    check_authorization(
        nonces,
        amount_in,
        min_amount_out,
        nonce,
        signature,
        public_key,
        account,
    )?;
    nonces.put(&account, nonce)?;

    debug!(?account, ?asset_in, ?asset_out, nonce, "delegated swap authorized");
    Ok(account)
}

/// Run a relayer-submitted swap end to end: verify the authorization, run
/// the swap transition for the signing account, then record the nonce.
///
/// The nonce commit happens only together with a committed swap, so a
/// failed swap leaves the account's delegated slot intact; an
/// authorization failure short-circuits before any reserve mutation.
#[allow(clippy::too_many_arguments)]
pub fn execute_delegated_swap(
    nonces: &dyn NonceStore,
    pools: &dyn PoolStore,
    token_in: &dyn TokenTransfer,
    token_out: &dyn TokenTransfer,
    amount_in: Amount,
    min_amount_out: Amount,
    nonce: Nonce,
    signature: &[u8; SIGNATURE_BYTES],
    public_key: &[u8; PUBLIC_KEY_BYTES],
    account: AccountId,
) -> ExchangeResult<SwapOutcome> {
    check_authorization(
        nonces,
        amount_in,
        min_amount_out,
        nonce,
        signature,
        public_key,
        account,
    )?;

    let outcome = execute_swap(
        pools,
        token_in,
        token_out,
        amount_in,
        min_amount_out,
        account,
    )?;

    nonces.put(&account, nonce)?;

    debug!(
        ?account,
        nonce,
        amount_in = outcome.amount_in,
        amount_out = outcome.amount_out,
        "delegated swap executed"
    );
    Ok(outcome)
}

/// True only if the stored nonce for `account` equals `nonce`.
///
/// Distinct from "has the account ever transacted": a recorded but
/// different nonce yields `false`.
pub fn is_nonce_used(
    nonces: &dyn NonceStore,
    account: &AccountId,
    nonce: Nonce,
) -> ExchangeResult<bool> {
    Ok(nonces.get(account)? == Some(nonce))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::{Message, Secp256k1, SecretKey};

    fn account(id: u8) -> AccountId {
        AccountId::new([id; 32])
    }

    fn asset(id: u8) -> AssetId {
        AssetId::new([id; 32])
    }

    fn keypair(seed: u8) -> (SecretKey, [u8; PUBLIC_KEY_BYTES]) {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&[seed; 32]).unwrap();
        let public = secret.public_key(&secp).serialize();
        (secret, public)
    }

    fn sign_request(
        secret: &SecretKey,
        nonce: Nonce,
        amount_in: Amount,
        min_amount_out: Amount,
    ) -> [u8; SIGNATURE_BYTES] {
        let secp = Secp256k1::new();
        let digest = swap_request_digest(nonce, amount_in, min_amount_out);
        let (recovery_id, compact) = secp
            .sign_ecdsa_recoverable(&Message::from_digest(digest), secret)
            .serialize_compact();

        let mut signature = [0u8; SIGNATURE_BYTES];
        signature[..64].copy_from_slice(&compact);
        signature[64] = recovery_id.to_i32() as u8;
        signature
    }

    #[test]
    fn test_authorize_returns_signer_account() {
        let nonces = MemoryNonces::new();
        let (secret, public) = keypair(7);
        let signature = sign_request(&secret, 1, 1_000, 900);

        let principal = authorize(
            &nonces,
            asset(1),
            asset(2),
            1_000,
            900,
            1,
            &signature,
            &public,
            account(10),
        )
        .unwrap();

        assert_eq!(principal, account(10));
        assert!(is_nonce_used(&nonces, &account(10), 1).unwrap());
        assert!(!is_nonce_used(&nonces, &account(10), 2).unwrap());
    }

    #[test]
    fn test_authorize_is_single_use_per_account() {
        let nonces = MemoryNonces::new();
        let (secret, public) = keypair(7);

        let signature = sign_request(&secret, 1, 1_000, 900);
        authorize(
            &nonces,
            asset(1),
            asset(2),
            1_000,
            900,
            1,
            &signature,
            &public,
            account(10),
        )
        .unwrap();

        // A fresh, never-used nonce with a valid signature is still
        // rejected: the record's presence gates the account.
        let signature = sign_request(&secret, 2, 1_000, 900);
        let err = authorize(
            &nonces,
            asset(1),
            asset(2),
            1_000,
            900,
            2,
            &signature,
            &public,
            account(10),
        )
        .unwrap_err();
        assert_eq!(err, ExchangeError::InvalidNonce(account(10)));
    }

    #[test]
    fn test_authorize_rejects_wrong_key() {
        let nonces = MemoryNonces::new();
        let (secret, _) = keypair(7);
        let (_, other_public) = keypair(8);

        let signature = sign_request(&secret, 1, 1_000, 900);
        let err = authorize(
            &nonces,
            asset(1),
            asset(2),
            1_000,
            900,
            1,
            &signature,
            &other_public,
            account(10),
        )
        .unwrap_err();
        assert_eq!(err, ExchangeError::InvalidSignature);

        // A failed authorization must not consume the account's slot.
        assert_eq!(nonces.get(&account(10)).unwrap(), None);
    }

    #[test]
    fn test_authorize_rejects_tampered_amounts() {
        let nonces = MemoryNonces::new();
        let (secret, public) = keypair(7);

        // Signed for 1_000 in, presented as 2_000 in.
        let signature = sign_request(&secret, 1, 1_000, 900);
        let err = authorize(
            &nonces,
            asset(1),
            asset(2),
            2_000,
            900,
            1,
            &signature,
            &public,
            account(10),
        )
        .unwrap_err();
        assert_eq!(err, ExchangeError::InvalidSignature);
    }

    #[test]
    fn test_nonce_slots_are_per_account() {
        let nonces = MemoryNonces::new();
        let (secret, public) = keypair(7);

        let signature = sign_request(&secret, 1, 1_000, 900);
        authorize(
            &nonces,
            asset(1),
            asset(2),
            1_000,
            900,
            1,
            &signature,
            &public,
            account(10),
        )
        .unwrap();

        // The same signed payload authorizes a different account: the
        // account-key binding is out of scope here, and account 11 still
        // has its slot.
        let signature = sign_request(&secret, 1, 1_000, 900);
        authorize(
            &nonces,
            asset(1),
            asset(2),
            1_000,
            900,
            1,
            &signature,
            &public,
            account(11),
        )
        .unwrap();
    }
}
