// ============================================
// File: crates/coordnode-gateway/src/error.rs
// ============================================
//! # Gateway Error Types
//!
//! ## Error Categories
//! 1. **Configuration**: load, invalid or missing values
//! 2. **Registry**: node registration and lookup
//! 3. **Lifecycle**: startup and shutdown
//! 4. **Wrapped**: errors bubbling up from core and transport
//!
//! ## ⚠️ Important Note for Next Developer
//! - Per-frame protocol failures stay inside the node task as
//!   `CoreError`s and are logged there; only lifecycle problems surface
//!   as `GatewayError`
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use coordnode_common::error::CommonError;
use coordnode_common::types::NodeAddress;
use coordnode_core::error::CoreError;
use coordnode_transport::error::TransportError;

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Gateway error types.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration file could not be read or parsed.
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        /// Path that was loaded
        path: String,
        /// What went wrong
        reason: String,
    },

    /// A configuration value is invalid.
    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        /// Offending field
        field: String,
        /// Why it is invalid
        reason: String,
    },

    /// A node with this address is already registered.
    #[error("Node {0} already registered")]
    NodeExists(NodeAddress),

    /// No node with this address is registered.
    #[error("Node {0} not registered")]
    NodeNotFound(NodeAddress),

    /// Startup failed.
    #[error("Gateway failed to start: {reason}")]
    StartupFailed {
        /// What went wrong
        reason: String,
    },

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Error from core crate.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Error from transport crate.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Creates a `ConfigLoad` error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `ConfigInvalid` error.
    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `StartupFailed` error.
    pub fn startup_failed(reason: impl Into<String>) -> Self {
        Self::StartupFailed {
            reason: reason.into(),
        }
    }

    /// Returns `true` for configuration problems.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigLoad { .. } | Self::ConfigInvalid { .. })
    }

    /// Returns `true` if the process cannot continue.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigLoad { .. }
                | Self::ConfigInvalid { .. }
                | Self::StartupFailed { .. }
                | Self::Core(CoreError::UnsupportedCurve { .. })
        )
    }

    /// Returns `true` if retrying the operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GatewayError::config_load("/etc/coordnode.toml", "file not found");
        assert!(err.to_string().contains("/etc/coordnode.toml"));

        let err = GatewayError::NodeExists(NodeAddress::from_index(3));
        assert_eq!(err.to_string(), "Node 0003 already registered");
    }

    #[test]
    fn test_error_classification() {
        let config_err = GatewayError::config_invalid("nodes.count", "must be > 0");
        assert!(config_err.is_config_error());
        assert!(config_err.is_fatal());

        let curve: GatewayError = CoreError::unsupported_curve("b").into();
        assert!(curve.is_fatal());

        let timeout: GatewayError = TransportError::timeout("recv").into();
        assert!(timeout.is_retryable());
        assert!(!timeout.is_fatal());
    }
}
