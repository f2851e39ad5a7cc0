//! Canonical message digest for delegated swap requests.

use sha3::{Digest, Sha3_256};

use lib_types::{Amount, Nonce};

/// Sha3-256 of an arbitrary byte string
pub fn hash256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Digest a swap request: Sha3-256 over the fixed-width big-endian
/// encoding of `nonce (8) || amount_in (8) || min_amount_out (8)`.
///
/// The asset pair is deliberately absent; signature and nonce checks are
/// decoupled from asset/amount validity, which the swap engine re-validates.
pub fn swap_request_digest(nonce: Nonce, amount_in: Amount, min_amount_out: Amount) -> [u8; 32] {
    let mut message = [0u8; 24];
    message[0..8].copy_from_slice(&nonce.to_be_bytes());
    message[8..16].copy_from_slice(&amount_in.to_be_bytes());
    message[16..24].copy_from_slice(&min_amount_out.to_be_bytes());

    hash256(&message)
}
