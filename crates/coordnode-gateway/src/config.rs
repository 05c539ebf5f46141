// ============================================
// File: crates/coordnode-gateway/src/config.rs
// ============================================
//! # Gateway Configuration
//!
//! ## Creation Reason
//! Provides configuration management for the coordnode gateway from a
//! TOML file, with every section defaulted.
//!
//! ## Main Functionality
//! - `GatewayConfig`: Main configuration structure
//! - TOML file loading and parsing
//! - Configuration validation
//!
//! ## Configuration Sections
//! - `network`: local bind address and concentrator address
//! - `radio`: PAN id of the emulated nodes, trailing metadata size
//! - `nodes`: which node addresses to answer for, sample reporting
//! - `crypto`: curve constants
//! - `limits`: queue depth, shutdown timeout
//! - `logging`: Log level
//!
//! ## Example Configuration
//! ```toml
//! [network]
//! listen_addr = "0.0.0.0:5557"
//! concentrator_addr = "127.0.0.1:5556"
//!
//! [radio]
//! pan_id = "1caa"
//!
//! [nodes]
//! count = 2
//! addresses = ["0011223344556677"]
//! report_interval_secs = 5
//!
//! [limits]
//! queue_depth = 64
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - All config changes require a restart
//! - `crypto` is validated against the ECDH backend; a mismatch is a
//!   startup error, not a warning
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use coordnode_common::types::{NodeAddress, PanId};
use coordnode_core::crypto::{CurveParams, Ecdh};

use crate::error::{GatewayError, Result};

// ============================================
// GatewayConfig
// ============================================

/// Main gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Network configuration.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Radio parameters of the emulated nodes.
    #[serde(default)]
    pub radio: RadioConfig,

    /// Node set.
    #[serde(default)]
    pub nodes: NodesConfig,

    /// Curve constants.
    #[serde(default)]
    pub crypto: CurveParams,

    /// Resource limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed or validated.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GatewayError::config_load(&path_str, e.to_string()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| GatewayError::config_load(&path_str, e.to_string()))?;

        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Loads configuration from a string.
    ///
    /// # Errors
    /// Returns error if the text cannot be parsed or validated.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| GatewayError::config_load("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        self.radio.validate()?;
        self.nodes.validate()?;
        self.limits.validate()?;

        Ecdh::new(self.crypto.clone())
            .map_err(|e| GatewayError::config_invalid("crypto", e.to_string()))?;

        Ok(())
    }

    /// Serializes configuration to TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Returns every node address to register, in configuration order
    /// and without duplicates.
    #[must_use]
    pub fn node_addresses(&self) -> Vec<NodeAddress> {
        let mut out: Vec<NodeAddress> = (0..self.nodes.count).map(NodeAddress::from_index).collect();
        for addr in &self.nodes.addresses {
            if !out.contains(addr) {
                out.push(*addr);
            }
        }
        out
    }

    /// Returns the trailing metadata appended to every indication.
    #[must_use]
    pub fn trailing(&self) -> Vec<u8> {
        vec![0u8; self.radio.trailing_len]
    }

    /// Returns the per-node shutdown bound.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.limits.shutdown_timeout_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            radio: RadioConfig::default(),
            nodes: NodesConfig::default(),
            crypto: CurveParams::default(),
            limits: LimitsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

// ============================================
// NetworkConfig
// ============================================

/// Network configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Local UDP bind address.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Address of the concentrator bridge.
    #[serde(default = "default_concentrator_addr")]
    pub concentrator_addr: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5557))
}

fn default_concentrator_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5556))
}

impl NetworkConfig {
    fn validate(&self) -> Result<()> {
        if self.listen_addr.port() == 0 {
            return Err(GatewayError::config_invalid(
                "network.listen_addr",
                "port cannot be 0",
            ));
        }
        if self.concentrator_addr.port() == 0 {
            return Err(GatewayError::config_invalid(
                "network.concentrator_addr",
                "port cannot be 0",
            ));
        }
        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            concentrator_addr: default_concentrator_addr(),
        }
    }
}

// ============================================
// RadioConfig
// ============================================

/// Radio parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioConfig {
    /// PAN id the emulated nodes belong to.
    #[serde(default = "default_pan_id")]
    pub pan_id: PanId,

    /// Number of trailing metadata bytes (LQI, ED, RX status, RX slot).
    #[serde(default = "default_trailing_len")]
    pub trailing_len: usize,
}

fn default_pan_id() -> PanId {
    PanId::new([0x1c, 0xaa])
}

fn default_trailing_len() -> usize {
    6
}

/// Upper bound on trailing metadata; it shares the one-byte length.
const MAX_TRAILING_LEN: usize = 32;

impl RadioConfig {
    fn validate(&self) -> Result<()> {
        if self.pan_id == PanId::COORDINATOR {
            return Err(GatewayError::config_invalid(
                "radio.pan_id",
                "ffff is reserved for the coordinator",
            ));
        }
        if self.trailing_len > MAX_TRAILING_LEN {
            return Err(GatewayError::config_invalid(
                "radio.trailing_len",
                format!("cannot exceed {MAX_TRAILING_LEN}"),
            ));
        }
        Ok(())
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            pan_id: default_pan_id(),
            trailing_len: default_trailing_len(),
        }
    }
}

// ============================================
// NodesConfig
// ============================================

/// Node set configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodesConfig {
    /// Number of short-addressed nodes, `0000` to `count - 1`.
    #[serde(default = "default_node_count")]
    pub count: u16,

    /// Additional explicit addresses (4 or 16 hex digits).
    #[serde(default)]
    pub addresses: Vec<NodeAddress>,

    /// Seconds between sample reports per node; 0 disables reporting.
    #[serde(default)]
    pub report_interval_secs: u64,

    /// Sample payload (hex) reported by every node.
    #[serde(default = "default_report_payload")]
    pub report_payload: String,
}

fn default_node_count() -> u16 {
    1
}

fn default_report_payload() -> String {
    // temperature sample of the reference sensor application
    "a001000008ad000017700000000000000000c6e0".to_string()
}

impl NodesConfig {
    fn validate(&self) -> Result<()> {
        if self.count == 0 && self.addresses.is_empty() {
            return Err(GatewayError::config_invalid(
                "nodes",
                "at least one node is required",
            ));
        }
        if self.count == u16::MAX {
            return Err(GatewayError::config_invalid(
                "nodes.count",
                "ffff is the broadcast address",
            ));
        }
        if let Some(addr) = self.addresses.iter().find(|a| a.is_broadcast()) {
            return Err(GatewayError::config_invalid(
                "nodes.addresses",
                format!("{addr} is the broadcast address"),
            ));
        }
        self.report_payload_bytes()?;
        Ok(())
    }

    /// Decodes the sample payload.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` if the payload is not valid hex.
    pub fn report_payload_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.report_payload)
            .map_err(|e| GatewayError::config_invalid("nodes.report_payload", e.to_string()))
    }

    /// Returns the reporting period, if reporting is enabled.
    #[must_use]
    pub const fn report_interval(&self) -> Option<Duration> {
        if self.report_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.report_interval_secs))
        }
    }
}

impl Default for NodesConfig {
    fn default() -> Self {
        Self {
            count: default_node_count(),
            addresses: Vec::new(),
            report_interval_secs: 0,
            report_payload: default_report_payload(),
        }
    }
}

// ============================================
// LimitsConfig
// ============================================

/// Resource limits configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Capacity of each per-node queue.
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,

    /// Bound on each shutdown phase, in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

fn default_queue_depth() -> usize {
    64
}

fn default_shutdown_timeout() -> u64 {
    5
}

impl LimitsConfig {
    fn validate(&self) -> Result<()> {
        if self.queue_depth == 0 {
            return Err(GatewayError::config_invalid(
                "limits.queue_depth",
                "must be greater than 0",
            ));
        }

        if self.shutdown_timeout_secs == 0 {
            return Err(GatewayError::config_invalid(
                "limits.shutdown_timeout_secs",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            queue_depth: default_queue_depth(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

// ============================================
// LoggingConfig
// ============================================

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
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
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.node_addresses(), vec![NodeAddress::from_index(0)]);
        assert_eq!(config.trailing(), vec![0u8; 6]);
        assert_eq!(config.nodes.report_interval(), None);
    }

    #[test]
    fn test_full_config_format() {
        let toml = r#"
            [network]
            listen_addr = "0.0.0.0:5557"
            concentrator_addr = "10.0.0.2:5556"

            [radio]
            pan_id = "1CAA"
            trailing_len = 6

            [nodes]
            count = 2
            addresses = ["0001", "0011223344556677"]
            report_interval_secs = 5

            [crypto]
            p  = "ffffffff00000001000000000000000000000000ffffffffffffffffffffffff"
            n  = "ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551"
            b  = "5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b"
            gx = "6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296"
            gy = "4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5"

            [limits]
            queue_depth = 16
            shutdown_timeout_secs = 2

            [logging]
            level = "debug"
        "#;

        let config = GatewayConfig::from_str(toml).unwrap();
        assert_eq!(config.network.concentrator_addr.port(), 5556);
        assert_eq!(config.radio.pan_id, PanId::new([0x1c, 0xaa]));
        assert_eq!(
            config.node_addresses(),
            vec![
                NodeAddress::from_index(0),
                NodeAddress::from_index(1),
                NodeAddress::Long([0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77]),
            ]
        );
        assert_eq!(config.nodes.report_interval(), Some(Duration::from_secs(5)));
        assert_eq!(config.limits.queue_depth, 16);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = GatewayConfig::from_str("").unwrap();
        assert_eq!(config.network.listen_addr.port(), 5557);
        assert_eq!(config.crypto, CurveParams::deployed());
    }

    #[test]
    fn test_rejects_foreign_curve() {
        let toml = r#"
            [crypto]
            p  = "ffffffff00000001000000000000000000000000ffffffffffffffffffffffff"
            n  = "ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551"
            b  = "0000000000000000000000000000000000000000000000000000000000000007"
            gx = "6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296"
            gy = "4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5"
        "#;
        let err = GatewayConfig::from_str(toml).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(GatewayConfig::from_str("[nodes]\ncount = 0\n").is_err());
        assert!(GatewayConfig::from_str("[nodes]\naddresses = [\"ffff\"]\n").is_err());
        assert!(GatewayConfig::from_str("[nodes]\nreport_payload = \"zz\"\n").is_err());
        assert!(GatewayConfig::from_str("[limits]\nqueue_depth = 0\n").is_err());
        assert!(GatewayConfig::from_str("[radio]\npan_id = \"ffff\"\n").is_err());
        assert!(GatewayConfig::from_str("[radio]\npan_id = \"1c\"\n").is_err());
    }

    #[test]
    fn test_duplicate_addresses_collapse() {
        let config = GatewayConfig::from_str("[nodes]\ncount = 2\naddresses = [\"0001\"]\n").unwrap();
        assert_eq!(config.node_addresses().len(), 2);
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let config = GatewayConfig::default();
        let text = config.to_toml();
        let back = GatewayConfig::from_str(&text).unwrap();
        assert_eq!(back.radio.pan_id, config.radio.pan_id);
        assert_eq!(back.crypto, config.crypto);
    }

    #[test]
    fn test_shipped_example_is_valid() {
        let config =
            GatewayConfig::from_str(include_str!("../../../config/gateway.toml")).unwrap();
        assert_eq!(config.node_addresses().len(), 3);
        assert_eq!(config.nodes.report_interval(), Some(Duration::from_secs(30)));
    }
}
