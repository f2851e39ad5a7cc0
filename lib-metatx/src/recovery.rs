//! ECDSA public-key recovery over secp256k1.

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};

/// Wire size of a recoverable signature: r (32) || s (32) || v (1)
pub const SIGNATURE_BYTES: usize = 65;

/// Wire size of a compressed public key
pub const PUBLIC_KEY_BYTES: usize = 33;

/// Recover the compressed public key that produced `signature` over
/// `digest`.
///
/// The final signature byte is the recovery id, accepted either raw (0-3)
/// or in the legacy offset form (27-30). Returns `None` when the signature
/// does not decode or no key can be recovered.
pub fn recover_public_key(
    digest: &[u8; 32],
    signature: &[u8; SIGNATURE_BYTES],
) -> Option<[u8; PUBLIC_KEY_BYTES]> {
    let v = signature[64];
    let recovery = if v >= 27 { v - 27 } else { v };
    let recovery_id = RecoveryId::from_i32(i32::from(recovery)).ok()?;

    let sig = RecoverableSignature::from_compact(&signature[..64], recovery_id).ok()?;
    let message = Message::from_digest(*digest);

    let secp = Secp256k1::new();
    let key = secp.recover_ecdsa(&message, &sig).ok()?;
    Some(key.serialize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::SecretKey;

    fn sign(digest: &[u8; 32], secret: &SecretKey) -> [u8; SIGNATURE_BYTES] {
        let secp = Secp256k1::new();
        let message = Message::from_digest(*digest);
        let (recovery_id, compact) = secp
            .sign_ecdsa_recoverable(&message, secret)
            .serialize_compact();

        let mut signature = [0u8; SIGNATURE_BYTES];
        signature[..64].copy_from_slice(&compact);
        signature[64] = recovery_id.to_i32() as u8;
        signature
    }

    #[test]
    fn test_recover_round_trip() {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&[7u8; 32]).unwrap();
        let expected = secret.public_key(&secp).serialize();

        let digest = [42u8; 32];
        let signature = sign(&digest, &secret);

        assert_eq!(recover_public_key(&digest, &signature), Some(expected));
    }

    #[test]
    fn test_recover_accepts_legacy_offset_v() {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&[7u8; 32]).unwrap();
        let expected = secret.public_key(&secp).serialize();

        let digest = [42u8; 32];
        let mut signature = sign(&digest, &secret);
        signature[64] += 27;

        assert_eq!(recover_public_key(&digest, &signature), Some(expected));
    }

    #[test]
    fn test_recover_wrong_digest_yields_different_key() {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&[7u8; 32]).unwrap();
        let expected = secret.public_key(&secp).serialize();

        let signature = sign(&[42u8; 32], &secret);
        let recovered = recover_public_key(&[43u8; 32], &signature);

        // Recovery over the wrong digest produces some key, but not ours.
        assert_ne!(recovered, Some(expected));
    }

    #[test]
    fn test_recover_rejects_invalid_recovery_id() {
        let mut signature = [1u8; SIGNATURE_BYTES];
        signature[64] = 9;
        assert_eq!(recover_public_key(&[0u8; 32], &signature), None);
    }
}
