// ============================================
// File: crates/coordnode-core/src/lib.rs
// ============================================
//! # Coordnode Core - Protocol & Cryptography Library
//!
//! ## Creation Reason
//! Provides the WDC frame codec and the cryptographic primitives the
//! sensor handshake is built from. Nothing in here does I/O; the gateway
//! crate drives it.
//!
//! ## Main Functionality
//!
//! ### Protocol Module ([`protocol`])
//! - Message id definitions (`MessageId`)
//! - Data request parsing, MAC frame and indication construction
//! - Downlink MAC verification helpers
//!
//! ### Crypto Module ([`crypto`])
//! - ECDH over the deployed curve (`Ecdh`, `EphemeralKeyPair`)
//! - AES-128-CBC with PKCS#7 padding
//! - HMAC-SHA-256 truncated to 8 bytes
//! - SHA-256 key splitting and the zeroizing `SymmetricKey`
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              coordnode-gateway                      │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │   coordnode-core  ◄──   coordnode-transport        │
//! │   You are here        │                            │
//! │         │             │                            │
//! │         └──────────┬──────────┘                    │
//! │                    ▼                               │
//! │            coordnode-common                         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Properties
//! - **Confidentiality**: AES-128-CBC under SCK for SBK and app data
//! - **Integrity**: truncated HMAC-SHA-256 over header and body
//! - **Replay Protection**: 32-bit counter in every uplink data frame
//!
//! ## ⚠️ Important Note for Next Developer
//! - ALL cryptographic code uses RustCrypto implementations
//! - NEVER implement custom crypto primitives
//! - ALL keys MUST implement Zeroize for secure cleanup
//! - The key schedule is fixed by the sensors in the field; see
//!   [`crypto`] before touching it
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod crypto;
pub mod error;
pub mod protocol;

// Re-export commonly used items
pub use crypto::{CurveParams, Ecdh, EphemeralKeyPair, SharedSecret, SymmetricKey};
pub use error::{CoreError, Result};
pub use protocol::{
    DownlinkAuthFrame, DownlinkRequest, Indication, MacHeader, MessageId, UplinkFrame,
};
