// ============================================
// File: crates/coordnode-core/src/crypto/mac.rs
// ============================================
//! # Truncated HMAC-SHA-256
//!
//! ## Creation Reason
//! Sensor radios have little room per frame, so authenticated messages
//! carry only the first 8 bytes of an HMAC-SHA-256 tag.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Verification compares in constant time via `subtle`
//! - A tag of the wrong length is a plain mismatch, not an error
//!
//! ## Last Modified
//! v0.1.0 - Initial MAC implementation

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::keys::SymmetricKey;
use super::MAC_TAG_SIZE;

type HmacSha256 = Hmac<Sha256>;

/// Truncated tag as sent on the wire.
pub type MacTag = [u8; MAC_TAG_SIZE];

/// Computes the first 8 bytes of HMAC-SHA-256(`key`, `data`).
#[must_use]
pub fn generate(key: &SymmetricKey, data: &[u8]) -> MacTag {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(data);
    let full = mac.finalize().into_bytes();

    let mut tag = [0u8; MAC_TAG_SIZE];
    tag.copy_from_slice(&full[..MAC_TAG_SIZE]);
    tag
}

/// Checks `tag` against the expected tag for `data`.
#[must_use]
pub fn verify(key: &SymmetricKey, data: &[u8], tag: &[u8]) -> bool {
    if tag.len() != MAC_TAG_SIZE {
        return false;
    }
    let expected = generate(key, data);
    bool::from(expected.ct_eq(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc4231_case_2_truncated() {
        // HMAC-SHA-256 with a 4-byte key; only the key length differs
        // from ours, so build the MAC directly for the reference value.
        let mut mac = HmacSha256::new_from_slice(b"Jefe").unwrap();
        mac.update(b"what do ya want for nothing?");
        let full = mac.finalize().into_bytes();
        assert_eq!(hex::encode(&full[..MAC_TAG_SIZE]), "5bdcc146bf60754e");
    }

    #[test]
    fn test_generate_is_deterministic_and_truncated() {
        let key = SymmetricKey::from_bytes([0x0b; 16]);
        let a = generate(&key, b"payload");
        let b = generate(&key, b"payload");
        assert_eq!(a, b);
        assert_eq!(a.len(), MAC_TAG_SIZE);
    }

    #[test]
    fn test_verify() {
        let key = SymmetricKey::from_bytes([0x0b; 16]);
        let other = SymmetricKey::from_bytes([0x0c; 16]);
        let tag = generate(&key, b"payload");

        assert!(verify(&key, b"payload", &tag));
        assert!(!verify(&other, b"payload", &tag));
        assert!(!verify(&key, b"payloaD", &tag));
        assert!(!verify(&key, b"payload", &tag[..7]));

        let mut flipped = tag;
        flipped[0] ^= 0x80;
        assert!(!verify(&key, b"payload", &flipped));
    }
}
