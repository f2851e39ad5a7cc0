//! # Meta-Transaction Authorization
//!
//! Delegated ("gasless") swap authorization: an account signs a swap
//! request offline, an unauthenticated relayer submits it, and the engine
//! verifies the signature and replay protection before running the same
//! swap transition the direct path uses.
//!
//! # Authorization Pipeline
//!
//! 1. **Replay check**: an account with any recorded nonce is rejected.
//!    The record's presence, not its value, gates the account, so each
//!    account can authorize at most ONE delegated swap, ever.
//! 2. **Digest**: Sha3-256 over the fixed-width big-endian encoding of
//!    `nonce || amount_in || min_amount_out`.
//! 3. **Recovery**: the signer's compressed secp256k1 key is recovered
//!    from the digest and signature and must equal the supplied key.
//! 4. The signing `account` becomes the authorized principal; the relayer
//!    never does.
//!
//! The one-shot nonce behavior is deliberate; see DESIGN.md before
//! "fixing" it.

pub mod authorize;
pub mod digest;
pub mod recovery;

pub use authorize::{
    authorize, execute_delegated_swap, is_nonce_used, MemoryNonces, NonceStore,
};
pub use digest::{hash256, swap_request_digest};
pub use recovery::{recover_public_key, PUBLIC_KEY_BYTES, SIGNATURE_BYTES};
