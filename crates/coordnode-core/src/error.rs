// ============================================
// File: crates/coordnode-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Defines error types for frame parsing and the cryptographic
//! primitives used by the per-node handshake.
//!
//! ## Error Categories
//! 1. **Crypto Errors**: peer key rejected, MAC mismatch, bad padding
//! 2. **Protocol Errors**: length mismatch, unknown command or message id
//! 3. **State Errors**: keys not yet established, counter exhausted
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER include key material in error messages
//! - `MacMismatch` and `BadPadding` carry no detail on purpose: the
//!   caller must not learn which byte or which check failed
//! - Every variant here is terminal for one request only
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use coordnode_common::error::CommonError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// CoreError
// ============================================

/// Core error types for framing and cryptographic operations.
///
/// # Security Note
/// Messages are safe to log; none of them contain key bytes.
#[derive(Error, Debug)]
pub enum CoreError {
    // ========================================
    // Cryptographic Errors
    // ========================================

    /// Peer public point is not a valid curve point.
    #[error("Invalid peer public key")]
    InvalidPeerKey,

    /// Keyed-MAC verification failed (or the key is not established yet).
    #[error("MAC verification failed")]
    MacMismatch,

    /// PKCS#7 padding validation failed.
    #[error("Bad padding")]
    BadPadding,

    /// Configured curve parameters do not match the arithmetic backend.
    #[error("Unsupported curve: {reason}")]
    UnsupportedCurve {
        /// Which parameter disagrees
        reason: String,
    },

    /// Failed to generate key material.
    #[error("Key generation failed: {context}")]
    KeyGeneration {
        /// What key was being generated
        context: String,
    },

    // ========================================
    // Protocol Errors
    // ========================================

    /// Declared payload length disagrees with the bytes received.
    #[error("Length mismatch: declared {declared}, received {actual}")]
    LengthMismatch {
        /// Length field value
        declared: usize,
        /// Bytes actually present
        actual: usize,
    },

    /// Unknown or unexpected message id.
    #[error("Unknown message id: 0x{0:02x}")]
    UnknownMessageId(u8),

    /// Unknown WDC command byte.
    #[error("Unknown command: 0x{0:02x}")]
    UnknownCommand(u8),

    /// Message is malformed.
    #[error("Malformed message: {reason}")]
    MalformedMessage {
        /// What's wrong with the message
        reason: String,
    },

    /// Message is too short to be valid.
    #[error("Message too short: expected at least {expected} bytes, got {actual}")]
    MessageTooShort {
        /// Minimum expected length
        expected: usize,
        /// Actual length received
        actual: usize,
    },

    /// Message does not fit a one-byte length field.
    #[error("Message too large: max {max} bytes, got {actual}")]
    MessageTooLarge {
        /// Maximum allowed size
        max: usize,
        /// Actual size
        actual: usize,
    },

    // ========================================
    // State Errors
    // ========================================

    /// An operation needs keys that have not been established.
    #[error("Missing session keys: {operation} requires {required}")]
    MissingSessionKeys {
        /// What operation was attempted
        operation: String,
        /// Which keys were required
        required: String,
    },

    /// The 32-bit uplink counter is exhausted; the session must be rekeyed.
    #[error("Replay counter exhausted, rekey required")]
    CounterExhausted,

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl CoreError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a `MalformedMessage` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            reason: reason.into(),
        }
    }

    /// Creates a `MessageTooShort` error.
    pub const fn too_short(expected: usize, actual: usize) -> Self {
        Self::MessageTooShort { expected, actual }
    }

    /// Creates a `MessageTooLarge` error.
    pub const fn too_large(max: usize, actual: usize) -> Self {
        Self::MessageTooLarge { max, actual }
    }

    /// Creates a `LengthMismatch` error.
    pub const fn length_mismatch(declared: usize, actual: usize) -> Self {
        Self::LengthMismatch { declared, actual }
    }

    /// Creates an `UnsupportedCurve` error.
    pub fn unsupported_curve(reason: impl Into<String>) -> Self {
        Self::UnsupportedCurve {
            reason: reason.into(),
        }
    }

    /// Creates a `MissingSessionKeys` error.
    pub fn missing_keys(operation: impl Into<String>, required: impl Into<String>) -> Self {
        Self::MissingSessionKeys {
            operation: operation.into(),
            required: required.into(),
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if this error might indicate an attack.
    ///
    /// These errors are logged at warn level by the session engine.
    #[must_use]
    pub const fn is_suspicious(&self) -> bool {
        matches!(
            self,
            Self::InvalidPeerKey | Self::MacMismatch | Self::BadPadding
        )
    }
}

// ============================================
// Tests
// ============================================
