// ============================================
// File: crates/coordnode-transport/src/error.rs
// ============================================
//! # Transport Error Types
//!
//! ## Creation Reason
//! Defines error types for the link between the gateway and the
//! concentrator.
//!
//! ## Main Functionality
//! - `TransportError`: Primary error enum for transport operations
//! - Error conversion from system errors
//! - Categorization of retryable vs fatal errors
//!
//! ## Error Categories
//! 1. **Network Errors**: socket bind/send/receive failures
//! 2. **Configuration Errors**: unusable peer addresses
//! 3. **Lifecycle Errors**: timeouts, shutdown in progress
//!
//! ## ⚠️ Important Note for Next Developer
//! - Network errors are often transient and retryable
//! - `Timeout` is the only timeout in the whole gateway; protocol code
//!   never waits on a clock
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

// ============================================
// Result Type Alias
// ============================================

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

// ============================================
// TransportError
// ============================================

/// Transport layer error types.
#[derive(Error, Debug)]
pub enum TransportError {
    // ========================================
    // Network Errors
    // ========================================

    /// Failed to bind to address.
    #[error("Failed to bind to {addr}: {reason}")]
    BindFailed {
        /// Address we tried to bind to
        addr: SocketAddr,
        /// Why binding failed
        reason: String,
    },

    /// Send operation failed.
    #[error("Failed to send to {dest}: {reason}")]
    SendFailed {
        /// Destination address
        dest: SocketAddr,
        /// Why send failed
        reason: String,
    },

    /// Receive operation failed.
    #[error("Failed to receive: {reason}")]
    ReceiveFailed {
        /// Why receive failed
        reason: String,
    },

    /// Address already in use.
    #[error("Address {addr} already in use")]
    AddressInUse {
        /// The address that's in use
        addr: SocketAddr,
    },

    // ========================================
    // Configuration Errors
    // ========================================

    /// Peer address the link cannot send to.
    #[error("Invalid address: {addr}")]
    InvalidAddress {
        /// The invalid address string
        addr: String,
    },

    // ========================================
    // Lifecycle Errors
    // ========================================

    /// Operation timed out.
    #[error("Operation timed out: {operation}")]
    Timeout {
        /// What operation timed out
        operation: String,
    },

    /// Link is shutting down.
    #[error("Transport is shutting down")]
    ShuttingDown,

    // ========================================
    // Wrapped Errors
    // ========================================

    /// I/O error from the system.
    #[error("I/O error: {context}")]
    Io {
        /// What was happening when the error occurred
        context: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a `BindFailed` error.
    pub fn bind_failed(addr: SocketAddr, reason: impl Into<String>) -> Self {
        Self::BindFailed {
            addr,
            reason: reason.into(),
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Creates an `Io` error with context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates an `InvalidAddress` error.
    pub fn invalid_address(addr: SocketAddr) -> Self {
        Self::InvalidAddress {
            addr: addr.to_string(),
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if this error is transient and retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::SendFailed { .. } | Self::ReceiveFailed { .. } => true,
            Self::Io { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    /// Returns `true` if the link is gone for good.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::ShuttingDown)
    }
}

// ============================================
// Error Conversions
// ============================================

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            context: "unspecified I/O operation".into(),
            source: err,
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransportError::bind_failed("127.0.0.1:5557".parse().unwrap(), "address in use");
        assert!(err.to_string().contains("127.0.0.1:5557"));
        assert!(err.to_string().contains("address in use"));

        assert_eq!(
            TransportError::timeout("recv").to_string(),
            "Operation timed out: recv"
        );
    }

    #[test]
    fn test_error_classification() {
        let network_err = TransportError::SendFailed {
            dest: "127.0.0.1:5556".parse().unwrap(),
            reason: "unreachable".into(),
        };
        assert!(network_err.is_retryable());
        assert!(!network_err.is_closed());

        assert!(TransportError::timeout("recv").is_retryable());
        assert!(TransportError::ShuttingDown.is_closed());
        assert!(!TransportError::ShuttingDown.is_retryable());

        let bad_peer = TransportError::invalid_address("0.0.0.0:0".parse().unwrap());
        assert_eq!(bad_peer.to_string(), "Invalid address: 0.0.0.0:0");
        assert!(!bad_peer.is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::WouldBlock, "would block");
        let transport_err: TransportError = io_err.into();
        assert!(transport_err.is_retryable());
    }
}
