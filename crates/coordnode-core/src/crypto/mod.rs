// ============================================
// File: crates/coordnode-core/src/crypto/mod.rs
// ============================================
//! # Cryptography Module
//!
//! ## Creation Reason
//! Collects the primitives the per-node handshake is built from, all of
//! them backed by RustCrypto implementations.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`ecdh`]: Elliptic-curve Diffie-Hellman over configurable curve params
//! - [`blockcipher`]: AES-128-CBC with constant-time PKCS#7 handling
//! - [`mac`]: HMAC-SHA-256 truncated to 8 bytes
//! - [`kdf`]: SHA-256 based key splitting
//! - [`keys`]: Zeroizing key containers
//!
//! ## Key Schedule
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  mID 0x01   ECDH (no auth)      ──► NIK      = H[0..16]      │
//! │  mID 0x03   ECDH (MAC by NIK)   ──► S, AK    = H[0..16], H[16..32] │
//! │  mID 0x05   ECDH (MAC by AK)    ──► SIK, SCK = H[0..16], H[16..32] │
//! │                                                             │
//! │  H = SHA-256(X || Y) of the shared point                    │
//! │                                                             │
//! │  afterwards: MAC by SIK, AES-CBC by SCK                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The derivation is plain SHA-256 with no salt or context; this is
//!   what deployed sensors implement, do not "improve" it unilaterally
//! - ALL key containers implement Zeroize
//! - Comparisons of tags and padding go through `subtle`
//!
//! ## Last Modified
//! v0.1.0 - Initial crypto implementation

pub mod blockcipher;
pub mod ecdh;
pub mod kdf;
pub mod keys;
pub mod mac;

// Re-export primary types at module level
pub use ecdh::{CurveParams, Ecdh, EphemeralKeyPair, PrivateScalar, SharedSecret};
pub use keys::SymmetricKey;

// ============================================
// Constants
// ============================================

/// Size of every symmetric key (NIK, S, AK, SIK, SCK) in bytes.
pub const SYMMETRIC_KEY_SIZE: usize = 16;

/// Size of a truncated MAC tag in bytes.
pub const MAC_TAG_SIZE: usize = 8;

/// Size of one affine coordinate in bytes.
pub const COORDINATE_SIZE: usize = 32;

/// Size of an encoded public point (X || Y) in bytes.
pub const PUBLIC_KEY_SIZE: usize = 2 * COORDINATE_SIZE;

/// Size of the raw shared secret (X || Y) in bytes.
pub const SHARED_SECRET_SIZE: usize = 2 * COORDINATE_SIZE;

/// AES block size in bytes (also the IV size).
pub const BLOCK_SIZE: usize = 16;
