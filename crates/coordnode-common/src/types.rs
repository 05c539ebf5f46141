// ============================================
// File: crates/coordnode-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Creation Reason
//! Centralizes the addressing types of the sensor network so that the
//! frame codec, the session engine and the dispatcher agree on a single
//! representation of "who a frame is for".
//!
//! ## Main Functionality
//! - `PanId`: 2-byte personal area network identifier
//! - `NodeAddress`: 16-bit short or 64-bit long node address
//! - `AddressingMode`: selects the address layout on the wire
//! - `ReplayCounter`: 32-bit uplink counter, never wraps
//!
//! ## Main Logical Flow
//! 1. Addresses are parsed from inbound data requests or from config
//! 2. Used as keys in the dispatcher's node registry
//! 3. Written back verbatim into MAC frame headers
//!
//! ## ⚠️ Important Note for Next Developer
//! - Bytes are kept in the order they appear on the wire
//! - `Display`/`FromStr` use lowercase hex of the wire bytes
//! - The all-ones short address doubles as broadcast and as the
//!   concentrator's own address; callers disambiguate by direction
//!
//! ## Last Modified
//! v0.1.0 - Initial address types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommonError;

// ============================================
// Constants
// ============================================

/// Size of a PAN identifier in bytes.
pub const PAN_ID_SIZE: usize = 2;

/// Size of a short (16-bit) node address in bytes.
pub const SHORT_ADDRESS_SIZE: usize = 2;

/// Size of a long (64-bit) node address in bytes.
pub const LONG_ADDRESS_SIZE: usize = 8;

// ============================================
// PanId
// ============================================

/// Personal area network identifier.
///
/// # Example
/// ```
/// use coordnode_common::types::PanId;
///
/// let pan: PanId = "1caa".parse().unwrap();
/// assert_eq!(pan.as_bytes(), &[0x1c, 0xaa]);
/// assert_eq!(pan.to_string(), "1caa");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanId([u8; PAN_ID_SIZE]);

impl PanId {
    /// PAN of the concentrator side (`0xFFFF`).
    pub const COORDINATOR: Self = Self([0xff, 0xff]);

    /// Creates a PAN identifier from wire bytes.
    #[must_use]
    pub const fn new(bytes: [u8; PAN_ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Creates a PAN identifier from a slice.
    ///
    /// Returns `None` unless the slice is exactly 2 bytes.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; PAN_ID_SIZE]>::try_from(bytes).ok().map(Self)
    }

    /// Returns the wire bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PAN_ID_SIZE] {
        &self.0
    }
}

impl fmt::Display for PanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for PanId {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
            .ok_or_else(|| CommonError::invalid_length(PAN_ID_SIZE, bytes.len()))
    }
}

impl Serialize for PanId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PanId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================
// AddressingMode
// ============================================

/// Address layout selected by the tx-options byte of a data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    /// 16-bit node address.
    Short,
    /// 64-bit node address.
    Long,
}

impl AddressingMode {
    /// Bit of the tx-options byte selecting the long layout.
    pub const TX_OPTIONS_MASK: u8 = 0x08;

    /// Reads the addressing mode out of a tx-options byte.
    #[must_use]
    pub const fn from_tx_options(tx_options: u8) -> Self {
        if tx_options & Self::TX_OPTIONS_MASK == 0 {
            Self::Short
        } else {
            Self::Long
        }
    }

    /// Returns the address size in bytes for this mode.
    #[must_use]
    pub const fn address_len(self) -> usize {
        match self {
            Self::Short => SHORT_ADDRESS_SIZE,
            Self::Long => LONG_ADDRESS_SIZE,
        }
    }
}

// ============================================
// NodeAddress
// ============================================

/// Address of a sensor node (or of the concentrator).
///
/// # Wire Format
/// ```text
/// Short: ┌──────────┐        Long: ┌──────────────────────────┐
///        │ 2 bytes  │              │         8 bytes          │
///        └──────────┘              └──────────────────────────┘
/// ```
///
/// # Example
/// ```
/// use coordnode_common::types::{AddressingMode, NodeAddress};
///
/// let addr = NodeAddress::from_index(1);
/// assert_eq!(addr.as_bytes(), &[0x00, 0x01]);
/// assert_eq!(addr.mode(), AddressingMode::Short);
///
/// let long: NodeAddress = "0011223344556677".parse().unwrap();
/// assert_eq!(long.mode(), AddressingMode::Long);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeAddress {
    /// 16-bit short address.
    Short([u8; SHORT_ADDRESS_SIZE]),
    /// 64-bit extended address.
    Long([u8; LONG_ADDRESS_SIZE]),
}

impl NodeAddress {
    /// Short broadcast address (`0xFFFF`).
    pub const BROADCAST: Self = Self::Short([0xff, 0xff]);

    /// Short address of the concentrator (`0xFFFF`).
    pub const COORDINATOR: Self = Self::Short([0xff, 0xff]);

    /// Creates the short address for node number `index` (big-endian).
    #[must_use]
    pub const fn from_index(index: u16) -> Self {
        Self::Short(index.to_be_bytes())
    }

    /// Creates an address from a 2- or 8-byte slice.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        match bytes.len() {
            SHORT_ADDRESS_SIZE => <[u8; SHORT_ADDRESS_SIZE]>::try_from(bytes)
                .ok()
                .map(Self::Short),
            LONG_ADDRESS_SIZE => <[u8; LONG_ADDRESS_SIZE]>::try_from(bytes)
                .ok()
                .map(Self::Long),
            _ => None,
        }
    }

    /// Returns the addressing mode matching this address.
    #[must_use]
    pub const fn mode(&self) -> AddressingMode {
        match self {
            Self::Short(_) => AddressingMode::Short,
            Self::Long(_) => AddressingMode::Long,
        }
    }

    /// Returns the wire bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Short(bytes) => bytes,
            Self::Long(bytes) => bytes,
        }
    }

    /// Returns the address size in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.mode().address_len()
    }

    /// Always `false`; addresses have a fixed non-zero size.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` for the short broadcast address.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl fmt::Debug for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeAddress({})", hex::encode(self.as_bytes()))
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.as_bytes()))
    }
}

impl FromStr for NodeAddress {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes).ok_or_else(|| {
            CommonError::invalid_input("node address", "must be 2 or 8 bytes of hex")
        })
    }
}

impl Serialize for NodeAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for NodeAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl AsRef<[u8]> for NodeAddress {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

// ============================================
// ReplayCounter
// ============================================

/// 32-bit uplink replay counter.
///
/// Starts at 0 when session keys are established; the first uplink
/// carries 1. The counter never wraps: once exhausted the session
/// must be rekeyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ReplayCounter(u32);

impl ReplayCounter {
    /// Creates a counter with value 0.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Returns the counter as big-endian bytes, the wire order.
    #[must_use]
    pub const fn to_be_bytes(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Advances the counter and returns the new value, or `None`
    /// when it would overflow (the stored value is left unchanged).
    pub fn increment(&mut self) -> Option<Self> {
        self.0 = self.0.checked_add(1)?;
        Some(*self)
    }

    /// Resets the counter to 0.
    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

impl From<u32> for ReplayCounter {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pan_id_parse_and_display() {
        let pan: PanId = "1CAA".parse().unwrap();
        assert_eq!(pan, PanId::new([0x1c, 0xaa]));
        assert_eq!(pan.to_string(), "1caa");

        assert!("1c".parse::<PanId>().is_err());
        assert!("xyz1".parse::<PanId>().is_err());
    }

    #[test]
    fn test_addressing_mode_from_tx_options() {
        assert_eq!(AddressingMode::from_tx_options(0x00), AddressingMode::Short);
        assert_eq!(AddressingMode::from_tx_options(0x01), AddressingMode::Short);
        assert_eq!(AddressingMode::from_tx_options(0x08), AddressingMode::Long);
        assert_eq!(AddressingMode::from_tx_options(0xf9), AddressingMode::Long);
        assert_eq!(AddressingMode::Long.address_len(), 8);
    }

    #[test]
    fn test_node_address_from_index() {
        assert_eq!(NodeAddress::from_index(0).as_bytes(), &[0x00, 0x00]);
        assert_eq!(NodeAddress::from_index(0x0102).as_bytes(), &[0x01, 0x02]);
        assert!(NodeAddress::from_index(0xffff).is_broadcast());
    }

    #[test]
    fn test_node_address_from_slice() {
        assert_eq!(
            NodeAddress::from_slice(&[0xab, 0xcd]),
            Some(NodeAddress::Short([0xab, 0xcd]))
        );
        let long = NodeAddress::from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(long.mode(), AddressingMode::Long);
        assert_eq!(long.len(), 8);
        assert!(NodeAddress::from_slice(&[1, 2, 3]).is_none());
    }

    #[test]
    fn test_node_address_text_form() {
        let addr: NodeAddress = "0011223344556677".parse().unwrap();
        assert_eq!(addr.to_string(), "0011223344556677");
        assert_eq!(format!("{addr:?}"), "NodeAddress(0011223344556677)");
        assert!("001122".parse::<NodeAddress>().is_err());
    }

    #[test]
    fn test_serde_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            pan: PanId,
            nodes: Vec<NodeAddress>,
        }

        let parsed: Wrapper = toml::from_str(
            r#"
            pan = "1caa"
            nodes = ["0001", "0011223344556677"]
            "#,
        )
        .unwrap();

        assert_eq!(parsed.pan, PanId::new([0x1c, 0xaa]));
        assert_eq!(parsed.nodes[0], NodeAddress::from_index(1));
        assert_eq!(parsed.nodes[1].mode(), AddressingMode::Long);
    }

    #[test]
    fn test_replay_counter() {
        let mut counter = ReplayCounter::new();
        assert_eq!(counter.increment(), Some(ReplayCounter::from(1)));
        assert_eq!(counter.increment().map(|c| c.value()), Some(2));
        assert_eq!(counter.to_be_bytes(), [0, 0, 0, 2]);

        counter.reset();
        assert_eq!(counter.value(), 0);

        let mut exhausted = ReplayCounter::from(u32::MAX);
        assert_eq!(exhausted.increment(), None);
        assert_eq!(exhausted.value(), u32::MAX);
    }
}
