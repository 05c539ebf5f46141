// ============================================
// File: crates/coordnode-core/src/protocol/messages.rs
// ============================================
//! # Protocol Message Definitions
//!
//! ## Creation Reason
//! Defines the structures exchanged between the concentrator, the
//! gateway and the sensors it answers for.
//!
//! ## Main Functionality
//! - `MessageId`: first MSDU byte, selects the handshake step
//! - `MacHeader`: addressing block of a MAC frame
//! - `DownlinkRequest`: parsed WDC data request
//! - `DownlinkAuthFrame`: downlink payload split for MAC verification
//! - `UplinkFrame`: MAC frame sent towards the concentrator
//! - `Indication`: WDC envelope around an uplink MAC frame
//!
//! ## Message Ids
//! | Request | Response | Step |
//! |---------|----------|------|
//! | 0x01 | 0x02 | NIK, unauthenticated ECDH |
//! | 0x03 | 0x04 | LTSS (S, AK), MAC by NIK |
//! | 0x05 | 0x06 | Session keys (SIK, SCK), MAC by AK |
//! | 0x07 | 0x08 | SBK update, MAC by SIK |
//! | 0x0B | 0x0C | Policy update, MAC by SIK |
//! | 0x09 / 0x0A | - | Application data, plain / encrypted |
//!
//! ## Last Modified
//! v0.1.0 - Initial message definitions

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use coordnode_common::types::{AddressingMode, NodeAddress, PanId};

use super::{FRAME_CONTROL, FRAME_TRAILER, SEQUENCE_NUMBER};
use crate::crypto::mac::{self, MacTag};
use crate::crypto::{SymmetricKey, MAC_TAG_SIZE};

// ============================================
// MessageId
// ============================================

/// Message identifier carried as the first byte of every MSDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageId {
    /// Sensor asks for a node identification key.
    NikRequest = 0x01,
    /// Our public point for the NIK exchange.
    NikResponse = 0x02,
    /// Long-term shared secret request, authenticated by NIK.
    LtssRequest = 0x03,
    /// Our public point for the LTSS exchange.
    LtssResponse = 0x04,
    /// Session key request, authenticated by AK.
    SessionKeyRequest = 0x05,
    /// Our public point for the session key exchange.
    SessionKeyResponse = 0x06,
    /// Encrypted SBK delivery, authenticated by SIK.
    SbkUpdate = 0x07,
    /// SBK acknowledgement.
    SbkResponse = 0x08,
    /// Plaintext application data.
    AppData = 0x09,
    /// Encrypted application data.
    AppDataEncrypted = 0x0A,
    /// Uplink policy update, authenticated by SIK.
    PolicyUpdate = 0x0B,
    /// Policy acknowledgement.
    PolicyResponse = 0x0C,
}

impl MessageId {
    /// Converts a byte to a `MessageId`.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::NikRequest),
            0x02 => Some(Self::NikResponse),
            0x03 => Some(Self::LtssRequest),
            0x04 => Some(Self::LtssResponse),
            0x05 => Some(Self::SessionKeyRequest),
            0x06 => Some(Self::SessionKeyResponse),
            0x07 => Some(Self::SbkUpdate),
            0x08 => Some(Self::SbkResponse),
            0x09 => Some(Self::AppData),
            0x0A => Some(Self::AppDataEncrypted),
            0x0B => Some(Self::PolicyUpdate),
            0x0C => Some(Self::PolicyResponse),
            _ => None,
        }
    }

    /// Converts the `MessageId` to its byte representation.
    #[must_use]
    pub const fn as_byte(&self) -> u8 {
        *self as u8
    }

    /// Returns the id of the reply to this request, if it has one.
    #[must_use]
    pub const fn response(&self) -> Option<Self> {
        match self {
            Self::NikRequest => Some(Self::NikResponse),
            Self::LtssRequest => Some(Self::LtssResponse),
            Self::SessionKeyRequest => Some(Self::SessionKeyResponse),
            Self::SbkUpdate => Some(Self::SbkResponse),
            Self::PolicyUpdate => Some(Self::PolicyResponse),
            _ => None,
        }
    }
}

impl TryFrom<u8> for MessageId {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_byte(value).ok_or(value)
    }
}

// ============================================
// MacHeader
// ============================================

/// Addressing block of a MAC frame.
///
/// # Wire Format
/// ```text
/// fc(2) = 01 88 | seq(1) = 00 | dst_pan(2) | dst_addr(2|8) | src_pan(2) | src_addr(2|8)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacHeader {
    /// Destination PAN.
    pub dst_pan: PanId,
    /// Destination address.
    pub dst_addr: NodeAddress,
    /// Source PAN.
    pub src_pan: PanId,
    /// Source address.
    pub src_addr: NodeAddress,
}

impl MacHeader {
    /// Header of a frame sent by the coordinator to a sensor.
    #[must_use]
    pub const fn downlink(sensor_pan: PanId, sensor_addr: NodeAddress) -> Self {
        Self {
            dst_pan: sensor_pan,
            dst_addr: sensor_addr,
            src_pan: PanId::COORDINATOR,
            src_addr: NodeAddress::COORDINATOR,
        }
    }

    /// Header of a frame sent by a sensor to the coordinator.
    #[must_use]
    pub const fn uplink(sensor_pan: PanId, sensor_addr: NodeAddress) -> Self {
        Self {
            dst_pan: PanId::COORDINATOR,
            dst_addr: NodeAddress::COORDINATOR,
            src_pan: sensor_pan,
            src_addr: sensor_addr,
        }
    }

    /// Encoded size in bytes.
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        FRAME_CONTROL.len() + 1 + 2 * 2 + self.dst_addr.len() + self.src_addr.len()
    }

    /// Appends the encoded header to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(self.encoded_len());
        buf.put_slice(&FRAME_CONTROL);
        buf.put_u8(SEQUENCE_NUMBER);
        buf.put_slice(self.dst_pan.as_bytes());
        buf.put_slice(self.dst_addr.as_bytes());
        buf.put_slice(self.src_pan.as_bytes());
        buf.put_slice(self.src_addr.as_bytes());
    }
}

// ============================================
// DownlinkRequest
// ============================================

/// Parsed WDC MAC data request.
///
/// The declared MSDU length is checked against the received bytes while
/// parsing, so `payload.len()` is the declared length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownlinkRequest {
    /// Concentrator handle, echoed in the data confirmation.
    pub handle: u8,
    /// Transmit options; bit 0x08 selects 64-bit addressing.
    pub tx_options: u8,
    /// Destination PAN of the addressed sensor.
    pub dst_pan: PanId,
    /// Destination address of the addressed sensor.
    pub dst_addr: NodeAddress,
    /// MSDU: message id followed by the message body.
    pub payload: Bytes,
}

impl DownlinkRequest {
    /// Returns the addressing mode selected by the transmit options.
    #[must_use]
    pub const fn addressing_mode(&self) -> AddressingMode {
        AddressingMode::from_tx_options(self.tx_options)
    }

    /// Returns the raw message id byte, if the payload is non-empty.
    #[must_use]
    pub fn message_id(&self) -> Option<u8> {
        self.payload.first().copied()
    }
}

// ============================================
// DownlinkAuthFrame
// ============================================

/// Downlink payload decomposed for MAC verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownlinkAuthFrame {
    /// Header the sender authenticated (sensor destination, coordinator source).
    pub header: MacHeader,
    /// Raw message id byte.
    pub message_id: u8,
    /// Message body between the id and the tag.
    pub data: Bytes,
    /// Truncated MAC tag.
    pub tag: MacTag,
    /// `header || message_id || data`, the bytes the tag covers.
    pub authenticated: Bytes,
}

impl DownlinkAuthFrame {
    /// Verifies the tag under `key`.
    #[must_use]
    pub fn verify(&self, key: &SymmetricKey) -> bool {
        mac::verify(key, &self.authenticated, &self.tag)
    }
}

// ============================================
// UplinkFrame
// ============================================

/// MAC frame sent by a node towards the concentrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UplinkFrame {
    /// Frame addressing.
    pub header: MacHeader,
    /// Message id.
    pub message_id: u8,
    /// Message body.
    pub payload: Bytes,
    /// Truncated MAC over header, id and payload, when authenticated.
    pub mac: Option<MacTag>,
}

impl UplinkFrame {
    /// Returns `header || message_id || payload`.
    #[must_use]
    pub fn authenticated_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.header.encoded_len() + 1 + self.payload.len());
        self.header.encode(&mut buf);
        buf.put_u8(self.message_id);
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    /// Length of `to_bytes()` without serializing.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let tag = if self.mac.is_some() { MAC_TAG_SIZE } else { 0 };
        self.header.encoded_len() + 1 + self.payload.len() + tag + FRAME_TRAILER.len()
    }

    /// Serializes the frame: `header || mid || payload || [MAC] || de ad`.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::from(&self.authenticated_bytes()[..]);
        if let Some(tag) = &self.mac {
            buf.put_slice(tag);
        }
        buf.put_slice(&FRAME_TRAILER);
        buf.freeze()
    }

    /// Verifies the attached MAC under `key`; an unauthenticated frame
    /// never verifies.
    #[must_use]
    pub fn verify(&self, key: &SymmetricKey) -> bool {
        self.mac
            .as_ref()
            .is_some_and(|tag| mac::verify(key, &self.authenticated_bytes(), tag))
    }
}

// ============================================
// Indication
// ============================================

/// WDC MAC data indication: an uplink MAC frame plus radio metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indication {
    /// The wrapped MAC frame.
    pub mac_frame: Bytes,
    /// Trailing metadata (LQI, ED, RX status, RX slot).
    pub trailing: Bytes,
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_roundtrip() {
        for byte in 0x01..=0x0C {
            let id = MessageId::from_byte(byte).unwrap();
            assert_eq!(id.as_byte(), byte);
            assert_eq!(MessageId::try_from(byte), Ok(id));
        }
        assert!(MessageId::from_byte(0x00).is_none());
        assert!(MessageId::from_byte(0x0D).is_none());
        assert_eq!(MessageId::try_from(0x42), Err(0x42));
    }

    #[test]
    fn test_message_id_responses() {
        assert_eq!(MessageId::NikRequest.response(), Some(MessageId::NikResponse));
        assert_eq!(MessageId::PolicyUpdate.response(), Some(MessageId::PolicyResponse));
        assert_eq!(MessageId::AppData.response(), None);
        assert_eq!(MessageId::SbkResponse.response(), None);
    }

    #[test]
    fn test_header_layouts() {
        let pan = PanId::new([0x1c, 0xaa]);
        let addr = NodeAddress::from_index(0);

        let mut down = BytesMut::new();
        MacHeader::downlink(pan, addr).encode(&mut down);
        assert_eq!(hex::encode(&down), "0188001caa0000ffffffff");

        let mut up = BytesMut::new();
        MacHeader::uplink(pan, addr).encode(&mut up);
        assert_eq!(hex::encode(&up), "018800ffffffff1caa0000");
        assert_eq!(MacHeader::uplink(pan, addr).encoded_len(), up.len());
    }

    #[test]
    fn test_long_address_header_len() {
        let header = MacHeader::uplink(
            PanId::new([0x1c, 0xaa]),
            NodeAddress::Long([1, 2, 3, 4, 5, 6, 7, 8]),
        );
        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        assert_eq!(buf.len(), 3 + 2 + 2 + 2 + 8);
    }

    #[test]
    fn test_unauthenticated_frame_never_verifies() {
        let frame = UplinkFrame {
            header: MacHeader::uplink(PanId::new([0, 1]), NodeAddress::from_index(1)),
            message_id: MessageId::NikResponse.as_byte(),
            payload: Bytes::from_static(&[1, 2, 3]),
            mac: None,
        };
        let key = SymmetricKey::from_bytes([0; 16]);
        assert!(!frame.verify(&key));
        assert!(frame.to_bytes().ends_with(&FRAME_TRAILER));
        assert_eq!(frame.encoded_len(), frame.to_bytes().len());

        let tagged = UplinkFrame {
            mac: Some(mac::generate(&key, &frame.authenticated_bytes())),
            ..frame.clone()
        };
        assert_eq!(tagged.encoded_len(), tagged.to_bytes().len());
    }
}
