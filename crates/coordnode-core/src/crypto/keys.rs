// ============================================
// File: crates/coordnode-core/src/crypto/keys.rs
// ============================================
//! # Symmetric Key Type
//!
//! ## Creation Reason
//! Every key a node session holds (NIK, S, AK, SIK, SCK) is a 16-byte
//! secret with the same handling rules; one container covers them all.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Key bytes must never reach a log line or an error message
//! - `Debug` is redacted; there is intentionally no `Display`
//!
//! ## Last Modified
//! v0.1.0 - Initial key type definitions

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::SYMMETRIC_KEY_SIZE;
use crate::error::{CoreError, Result};

// ============================================
// SymmetricKey
// ============================================

/// 128-bit symmetric key, zeroed on drop.
///
/// # Example
/// ```
/// use coordnode_core::crypto::SymmetricKey;
///
/// let key = SymmetricKey::from_bytes([0x2b; 16]);
/// assert_eq!(format!("{key:?}"), "SymmetricKey([REDACTED])");
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; SYMMETRIC_KEY_SIZE]);

impl SymmetricKey {
    /// Creates a key from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SYMMETRIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Creates a key from a slice.
    ///
    /// # Errors
    /// Returns `KeyGeneration` unless the slice is exactly 16 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array = <[u8; SYMMETRIC_KEY_SIZE]>::try_from(bytes).map_err(|_| {
            CoreError::KeyGeneration {
                context: format!(
                    "symmetric key must be {SYMMETRIC_KEY_SIZE} bytes, got {}",
                    bytes.len()
                ),
            }
        })?;
        Ok(Self(array))
    }

    /// Returns the raw key bytes.
    ///
    /// # Security Warning
    /// Do not log or persist the returned bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey([REDACTED])")
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SymmetricKey {}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_length() {
        assert!(SymmetricKey::from_slice(&[0u8; 16]).is_ok());
        assert!(SymmetricKey::from_slice(&[0u8; 15]).is_err());
        assert!(SymmetricKey::from_slice(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = SymmetricKey::from_bytes([0xab; 16]);
        let shown = format!("{key:?}");
        assert!(!shown.contains("ab"));
        assert!(shown.contains("REDACTED"));
    }

    #[test]
    fn test_equality() {
        let a = SymmetricKey::from_bytes([1; 16]);
        let b = SymmetricKey::from_bytes([1; 16]);
        let c = SymmetricKey::from_bytes([2; 16]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
