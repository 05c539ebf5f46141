// ============================================
// File: crates/coordnode-core/src/crypto/kdf.rs
// ============================================
//! # Key Derivation
//!
//! Hashes the X || Y shared secret with SHA-256 and splits the digest
//! into 16-byte keys. The digest is zeroed as soon as the keys are cut.
//!
//! ## Last Modified
//! v0.1.0 - Initial KDF implementation

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::keys::SymmetricKey;
use super::SYMMETRIC_KEY_SIZE;

fn digest(shared_secret: &[u8]) -> Zeroizing<[u8; 2 * SYMMETRIC_KEY_SIZE]> {
    Zeroizing::new(Sha256::digest(shared_secret).into())
}

/// Derives the node identification key (first half of the digest).
#[must_use]
pub fn derive_nik(shared_secret: &[u8]) -> SymmetricKey {
    let digest = digest(shared_secret);
    let mut key = [0u8; SYMMETRIC_KEY_SIZE];
    key.copy_from_slice(&digest[..SYMMETRIC_KEY_SIZE]);
    SymmetricKey::from_bytes(key)
}

/// Derives a key pair from both halves of the digest.
///
/// Used for (S, AK) after mID 0x03 and (SIK, SCK) after mID 0x05.
#[must_use]
pub fn derive_pair(shared_secret: &[u8]) -> (SymmetricKey, SymmetricKey) {
    let digest = digest(shared_secret);
    let mut first = [0u8; SYMMETRIC_KEY_SIZE];
    let mut second = [0u8; SYMMETRIC_KEY_SIZE];
    first.copy_from_slice(&digest[..SYMMETRIC_KEY_SIZE]);
    second.copy_from_slice(&digest[SYMMETRIC_KEY_SIZE..]);
    (
        SymmetricKey::from_bytes(first),
        SymmetricKey::from_bytes(second),
    )
}
