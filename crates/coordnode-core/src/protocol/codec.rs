// ============================================
// File: crates/coordnode-core/src/protocol/codec.rs
// ============================================
//! # WDC Frame Codec
//!
//! ## Creation Reason
//! Parses data requests arriving from the concentrator and builds the
//! MAC frames and indication envelopes sent back to it.
//!
//! ## Main Functionality
//! - `Codec` trait: Generic encode/decode interface
//! - `WdcCodec`: Implementation for requests and indications
//! - Free functions for the individual frame shapes
//!
//! ## Parsing Strategy
//! 1. Check the command tag
//! 2. Read transmit options to learn the address width
//! 3. Check the minimum length for that width
//! 4. Compare the declared MSDU length with the bytes received
//!
//! ## ⚠️ Important Note for Next Developer
//! - Always validate buffer lengths before slicing
//! - A declared/actual length mismatch drops the frame; never truncate
//!   or pad to make it fit
//! - The leading length byte of a data request is not trusted; the
//!   MSDU length byte is
//!
//! ## Last Modified
//! v0.1.0 - Initial codec implementation

use bytes::{Buf, BufMut, Bytes, BytesMut};

use coordnode_common::types::{AddressingMode, NodeAddress, PanId, PAN_ID_SIZE};

use super::messages::{DownlinkAuthFrame, DownlinkRequest, Indication, MacHeader, UplinkFrame};
use super::{DATA_CONFIRM_CMD, DATA_REQUEST_CMD, ERROR_CMD, FRAME_TRAILER, INDICATION_CMD};
use crate::crypto::mac::{self, MacTag};
use crate::crypto::{SymmetricKey, MAC_TAG_SIZE};
use crate::error::{CoreError, Result};

/// Largest value a one-byte length field can carry.
const MAX_LEN_FIELD: usize = u8::MAX as usize;

/// Bytes before the destination address: len, cmd, handle, txopts, pan.
const REQUEST_PREFIX_LEN: usize = 4 + PAN_ID_SIZE;

// ============================================
// Codec Trait
// ============================================

/// Trait for encoding and decoding WDC messages.
///
/// # Type Parameters
/// * `T` - The message type to encode/decode
pub trait Codec<T> {
    /// Encodes a message into a byte buffer.
    ///
    /// # Errors
    /// Fails if a length does not fit its one-byte field.
    fn encode(&self, msg: &T, buf: &mut BytesMut) -> Result<()>;

    /// Decodes one message, consuming it from `buf`.
    ///
    /// # Errors
    /// Fails if the bytes do not form a valid message.
    fn decode(&self, buf: &mut Bytes) -> Result<T>;
}

// ============================================
// WdcCodec
// ============================================

/// Codec for the WDC commands the gateway exchanges with the concentrator.
#[derive(Debug, Default, Clone)]
pub struct WdcCodec;

impl WdcCodec {
    /// Creates a new codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the WDC command tag of a frame without consuming it.
    #[must_use]
    pub fn peek_command(frame: &[u8]) -> Option<u8> {
        frame.get(1).copied()
    }

    /// Checks if the frame is a MAC data request.
    #[must_use]
    pub fn is_data_request(frame: &[u8]) -> bool {
        Self::peek_command(frame) == Some(DATA_REQUEST_CMD)
    }
}

impl Codec<DownlinkRequest> for WdcCodec {
    fn encode(&self, msg: &DownlinkRequest, buf: &mut BytesMut) -> Result<()> {
        let encoded = encode_downlink_request(msg)?;
        buf.put_slice(&encoded);
        Ok(())
    }

    fn decode(&self, buf: &mut Bytes) -> Result<DownlinkRequest> {
        let request = parse_downlink_request(buf)?;
        buf.advance(buf.len());
        Ok(request)
    }
}

impl Codec<Indication> for WdcCodec {
    fn encode(&self, msg: &Indication, buf: &mut BytesMut) -> Result<()> {
        let encoded = wrap_indication(&msg.mac_frame, &msg.trailing)?;
        buf.put_slice(&encoded);
        Ok(())
    }

    fn decode(&self, buf: &mut Bytes) -> Result<Indication> {
        let indication = unwrap_indication(buf)?;
        buf.advance(buf.len());
        Ok(indication)
    }
}

// ============================================
// Data Requests
// ============================================

/// Parses a WDC MAC data request.
///
/// # Layout
/// ```text
/// len | 0x17 | handle | txopts | dst_pan(2) | dst_addr(2|8) | msdu_len | msdu
/// ```
///
/// # Errors
/// - `MessageTooShort` if the fixed part is incomplete
/// - `UnknownCommand` if the tag is not 0x17
/// - `LengthMismatch` if `msdu_len` disagrees with the bytes present
pub fn parse_downlink_request(frame: &[u8]) -> Result<DownlinkRequest> {
    if frame.len() < 4 {
        return Err(CoreError::too_short(4, frame.len()));
    }
    if frame[1] != DATA_REQUEST_CMD {
        return Err(CoreError::UnknownCommand(frame[1]));
    }

    let handle = frame[2];
    let tx_options = frame[3];
    let mode = AddressingMode::from_tx_options(tx_options);

    let msdu_len_at = REQUEST_PREFIX_LEN + mode.address_len();
    if frame.len() <= msdu_len_at {
        return Err(CoreError::too_short(msdu_len_at + 1, frame.len()));
    }

    let dst_pan = PanId::from_slice(&frame[4..REQUEST_PREFIX_LEN])
        .ok_or_else(|| CoreError::malformed("destination PAN"))?;
    let dst_addr = NodeAddress::from_slice(&frame[REQUEST_PREFIX_LEN..msdu_len_at])
        .ok_or_else(|| CoreError::malformed("destination address"))?;

    let declared = usize::from(frame[msdu_len_at]);
    let msdu = &frame[msdu_len_at + 1..];
    if declared != msdu.len() {
        return Err(CoreError::length_mismatch(declared, msdu.len()));
    }

    Ok(DownlinkRequest {
        handle,
        tx_options,
        dst_pan,
        dst_addr,
        payload: Bytes::copy_from_slice(msdu),
    })
}

/// Encodes a data request as the concentrator sends it.
///
/// The leading length byte counts the bytes after the command tag.
///
/// # Errors
/// - `MalformedMessage` if `tx_options` disagrees with the address width
/// - `MessageTooLarge` if the frame does not fit the length fields
pub fn encode_downlink_request(req: &DownlinkRequest) -> Result<Bytes> {
    if req.addressing_mode() != req.dst_addr.mode() {
        return Err(CoreError::malformed(
            "tx options disagree with destination address width",
        ));
    }
    let msdu_len = u8::try_from(req.payload.len())
        .map_err(|_| CoreError::too_large(MAX_LEN_FIELD, req.payload.len()))?;
    let body_len = 2 + PAN_ID_SIZE + req.dst_addr.len() + 1 + req.payload.len();
    let len = u8::try_from(body_len).map_err(|_| CoreError::too_large(MAX_LEN_FIELD, body_len))?;

    let mut buf = BytesMut::with_capacity(2 + body_len);
    buf.put_u8(len);
    buf.put_u8(DATA_REQUEST_CMD);
    buf.put_u8(req.handle);
    buf.put_u8(req.tx_options);
    buf.put_slice(req.dst_pan.as_bytes());
    buf.put_slice(req.dst_addr.as_bytes());
    buf.put_u8(msdu_len);
    buf.put_slice(&req.payload);
    Ok(buf.freeze())
}

/// Builds the data confirmation for an accepted request:
/// `0x02 | 0x18 | handle | status`.
#[must_use]
pub fn make_data_confirm(handle: u8, status: u8) -> Bytes {
    Bytes::copy_from_slice(&[0x02, DATA_CONFIRM_CMD, handle, status])
}

/// Builds an error report: `0x01 | ERROR_CMD | code`.
#[must_use]
pub fn make_error_report(code: u8) -> Bytes {
    Bytes::copy_from_slice(&[0x01, ERROR_CMD, code])
}

// ============================================
// Downlink Authentication
// ============================================

/// Splits an authenticated downlink payload into id, body and tag.
///
/// # Errors
/// Returns `MessageTooShort` unless the payload is longer than the tag.
pub fn make_downlink_auth_frame(req: &DownlinkRequest) -> Result<DownlinkAuthFrame> {
    let payload = &req.payload;
    if payload.len() <= MAC_TAG_SIZE {
        return Err(CoreError::too_short(MAC_TAG_SIZE + 1, payload.len()));
    }

    let tag_at = payload.len() - MAC_TAG_SIZE;
    let message_id = payload[0];
    let data = payload.slice(1..tag_at);
    let mut tag: MacTag = [0u8; MAC_TAG_SIZE];
    tag.copy_from_slice(&payload[tag_at..]);

    let header = MacHeader::downlink(req.dst_pan, req.dst_addr);
    let mut authenticated = BytesMut::with_capacity(header.encoded_len() + tag_at);
    header.encode(&mut authenticated);
    authenticated.put_u8(message_id);
    authenticated.put_slice(&data);

    Ok(DownlinkAuthFrame {
        header,
        message_id,
        data,
        tag,
        authenticated: authenticated.freeze(),
    })
}

/// Builds a downlink MSDU as a sensor would: `mid || data || [MAC]`,
/// the MAC covering the downlink header addressed to `dst_pan`/`dst_addr`.
#[must_use]
pub fn make_downlink_payload(
    dst_pan: PanId,
    dst_addr: NodeAddress,
    message_id: u8,
    data: &[u8],
    auth_key: Option<&SymmetricKey>,
) -> Bytes {
    let mut msdu = BytesMut::with_capacity(1 + data.len() + MAC_TAG_SIZE);
    msdu.put_u8(message_id);
    msdu.put_slice(data);

    if let Some(key) = auth_key {
        let header = MacHeader::downlink(dst_pan, dst_addr);
        let mut covered = BytesMut::with_capacity(header.encoded_len() + msdu.len());
        header.encode(&mut covered);
        covered.put_slice(&msdu);
        msdu.put_slice(&mac::generate(key, &covered));
    }

    msdu.freeze()
}

// ============================================
// Uplink Frames
// ============================================

/// Builds an uplink MAC frame, authenticated when `auth_key` is given.
#[must_use]
pub fn make_uplink_frame(
    dst_pan: PanId,
    dst_addr: NodeAddress,
    src_pan: PanId,
    src_addr: NodeAddress,
    message_id: u8,
    payload: &[u8],
    auth_key: Option<&SymmetricKey>,
) -> UplinkFrame {
    let mut frame = UplinkFrame {
        header: MacHeader {
            dst_pan,
            dst_addr,
            src_pan,
            src_addr,
        },
        message_id,
        payload: Bytes::copy_from_slice(payload),
        mac: None,
    };
    if let Some(key) = auth_key {
        frame.mac = Some(mac::generate(key, &frame.authenticated_bytes()));
    }
    frame
}

/// Parses an uplink MAC frame addressed to the coordinator.
///
/// # Errors
/// - `MessageTooShort` if the frame cannot hold header, id, tag and trailer
/// - `MalformedMessage` if the header constants or trailer are wrong
pub fn parse_uplink_frame(
    frame: &[u8],
    src_mode: AddressingMode,
    authenticated: bool,
) -> Result<UplinkFrame> {
    let dst_len = AddressingMode::Short.address_len();
    let header_len = 3 + PAN_ID_SIZE + dst_len + PAN_ID_SIZE + src_mode.address_len();
    let tag_len = if authenticated { MAC_TAG_SIZE } else { 0 };
    let min_len = header_len + 1 + tag_len + FRAME_TRAILER.len();
    if frame.len() < min_len {
        return Err(CoreError::too_short(min_len, frame.len()));
    }

    let mut buf = Bytes::copy_from_slice(frame);
    let mut fixed = [0u8; 3];
    buf.copy_to_slice(&mut fixed);
    if fixed[..2] != super::FRAME_CONTROL || fixed[2] != super::SEQUENCE_NUMBER {
        return Err(CoreError::malformed("unexpected frame control or sequence"));
    }

    let dst_pan = PanId::from_slice(&buf.split_to(PAN_ID_SIZE))
        .ok_or_else(|| CoreError::malformed("destination PAN"))?;
    let dst_addr = NodeAddress::from_slice(&buf.split_to(dst_len))
        .ok_or_else(|| CoreError::malformed("destination address"))?;
    let src_pan = PanId::from_slice(&buf.split_to(PAN_ID_SIZE))
        .ok_or_else(|| CoreError::malformed("source PAN"))?;
    let src_addr = NodeAddress::from_slice(&buf.split_to(src_mode.address_len()))
        .ok_or_else(|| CoreError::malformed("source address"))?;

    let trailer = buf.split_off(buf.len() - FRAME_TRAILER.len());
    if trailer[..] != FRAME_TRAILER {
        return Err(CoreError::malformed("missing frame trailer"));
    }

    let mac = if authenticated {
        let tag_bytes = buf.split_off(buf.len() - MAC_TAG_SIZE);
        let mut tag: MacTag = [0u8; MAC_TAG_SIZE];
        tag.copy_from_slice(&tag_bytes);
        Some(tag)
    } else {
        None
    };

    let message_id = buf.get_u8();

    Ok(UplinkFrame {
        header: MacHeader {
            dst_pan,
            dst_addr,
            src_pan,
            src_addr,
        },
        message_id,
        payload: buf,
        mac,
    })
}

// ============================================
// Indications
// ============================================

/// Largest MAC frame `wrap_indication` accepts next to `trailing_len`
/// bytes of radio metadata.
#[must_use]
pub const fn max_indication_frame_len(trailing_len: usize) -> usize {
    MAX_LEN_FIELD.saturating_sub(1 + trailing_len)
}

/// Wraps a MAC frame into a WDC data indication:
/// `outer_len | 0x19 | mpdu_len | mpdu | trailing`,
/// with `outer_len = 1 + len(mpdu) + len(trailing)`.
///
/// # Errors
/// Returns `MessageTooLarge` if a length does not fit one byte.
pub fn wrap_indication(mac_frame: &[u8], trailing: &[u8]) -> Result<Bytes> {
    let inner = u8::try_from(mac_frame.len())
        .map_err(|_| CoreError::too_large(MAX_LEN_FIELD, mac_frame.len()))?;
    let outer_len = 1 + mac_frame.len() + trailing.len();
    let outer =
        u8::try_from(outer_len).map_err(|_| CoreError::too_large(MAX_LEN_FIELD, outer_len))?;

    let mut buf = BytesMut::with_capacity(2 + outer_len);
    buf.put_u8(outer);
    buf.put_u8(INDICATION_CMD);
    buf.put_u8(inner);
    buf.put_slice(mac_frame);
    buf.put_slice(trailing);
    Ok(buf.freeze())
}

/// Splits a WDC data indication into MAC frame and trailing metadata.
///
/// # Errors
/// - `MessageTooShort` if the fixed part is incomplete
/// - `UnknownCommand` if the tag is not 0x19
/// - `LengthMismatch` if either length byte disagrees with the bytes present
pub fn unwrap_indication(bytes: &[u8]) -> Result<Indication> {
    if bytes.len() < 3 {
        return Err(CoreError::too_short(3, bytes.len()));
    }
    if bytes[1] != INDICATION_CMD {
        return Err(CoreError::UnknownCommand(bytes[1]));
    }

    let outer = usize::from(bytes[0]);
    if outer != bytes.len() - 2 {
        return Err(CoreError::length_mismatch(outer, bytes.len() - 2));
    }

    let inner = usize::from(bytes[2]);
    let rest = &bytes[3..];
    if inner > rest.len() {
        return Err(CoreError::length_mismatch(inner, rest.len()));
    }

    Ok(Indication {
        mac_frame: Bytes::copy_from_slice(&rest[..inner]),
        trailing: Bytes::copy_from_slice(&rest[inner..]),
    })
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::MessageId;
    use crate::protocol::DEFAULT_TRAILING;

    fn pan() -> PanId {
        PanId::new([0x1c, 0xaa])
    }

    fn short_request(msdu: &[u8]) -> Vec<u8> {
        let mut frame = vec![0x00, DATA_REQUEST_CMD, 0x07, 0x00, 0x1c, 0xaa, 0x00, 0x00];
        frame.push(msdu.len() as u8);
        frame.extend_from_slice(msdu);
        frame[0] = (frame.len() - 2) as u8;
        frame
    }

    #[test]
    fn test_indication_vector() {
        let ind = wrap_indication(&[0xde, 0xad, 0xbe, 0xef], &DEFAULT_TRAILING).unwrap();
        assert_eq!(hex::encode(&ind), "0b1904deadbeef000000000000");

        let back = unwrap_indication(&ind).unwrap();
        assert_eq!(&back.mac_frame[..], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(&back.trailing[..], &DEFAULT_TRAILING);
    }

    #[test]
    fn test_indication_too_large() {
        let frame = vec![0u8; 250];
        assert!(matches!(
            wrap_indication(&frame, &DEFAULT_TRAILING),
            Err(CoreError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn test_error_report_layout() {
        let report = make_error_report(crate::protocol::ERROR_WRONG_CMD);
        assert_eq!(&report[..], &[0x01, 0x00, 0x01]);
        assert_eq!(WdcCodec::peek_command(&report), Some(ERROR_CMD));
        assert!(!WdcCodec::is_data_request(&report));
    }

    #[test]
    fn test_indication_frame_limit() {
        let max = max_indication_frame_len(DEFAULT_TRAILING.len());
        assert_eq!(max, 248);
        assert!(wrap_indication(&vec![0u8; max], &DEFAULT_TRAILING).is_ok());
        assert!(wrap_indication(&vec![0u8; max + 1], &DEFAULT_TRAILING).is_err());
        assert_eq!(max_indication_frame_len(0), 254);
    }

    #[test]
    fn test_unwrap_indication_errors() {
        assert!(matches!(
            unwrap_indication(&[0x02, 0x18, 0x00, 0x00]),
            Err(CoreError::UnknownCommand(0x18))
        ));
        assert!(matches!(
            unwrap_indication(&[0x09, 0x19, 0x01, 0xaa]),
            Err(CoreError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_short_request() {
        let frame = short_request(&[0x01, 0xaa, 0xbb]);
        let req = parse_downlink_request(&frame).unwrap();

        assert_eq!(req.handle, 0x07);
        assert_eq!(req.dst_pan, pan());
        assert_eq!(req.dst_addr, NodeAddress::from_index(0));
        assert_eq!(req.addressing_mode(), AddressingMode::Short);
        assert_eq!(&req.payload[..], &[0x01, 0xaa, 0xbb]);
        assert_eq!(req.message_id(), Some(0x01));
    }

    #[test]
    fn test_parse_long_request() {
        let mut frame = vec![0x00, DATA_REQUEST_CMD, 0x01, 0x08, 0x1c, 0xaa];
        frame.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        frame.extend_from_slice(&[0x02, 0x09, 0x55]);

        let req = parse_downlink_request(&frame).unwrap();
        assert_eq!(req.dst_addr, NodeAddress::Long([1, 2, 3, 4, 5, 6, 7, 8]));
        assert_eq!(&req.payload[..], &[0x09, 0x55]);
    }

    #[test]
    fn test_parse_length_mismatch() {
        let mut frame = short_request(&[0x01, 0xaa, 0xbb]);
        frame.pop();
        assert!(matches!(
            parse_downlink_request(&frame),
            Err(CoreError::LengthMismatch {
                declared: 3,
                actual: 2
            })
        ));

        let mut frame = short_request(&[0x01]);
        frame.push(0xff);
        assert!(matches!(
            parse_downlink_request(&frame),
            Err(CoreError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_other_commands_and_short_frames() {
        assert!(matches!(
            parse_downlink_request(&[0x02, 0x09, 0x00, 0x00]),
            Err(CoreError::UnknownCommand(0x09))
        ));
        assert!(matches!(
            parse_downlink_request(&[0x02, DATA_REQUEST_CMD]),
            Err(CoreError::MessageTooShort { .. })
        ));
        // long mode announced, only a short address present
        assert!(matches!(
            parse_downlink_request(&[0x07, DATA_REQUEST_CMD, 0, 0x08, 0x1c, 0xaa, 0, 0, 0]),
            Err(CoreError::MessageTooShort { .. })
        ));
    }

    #[test]
    fn test_encode_matches_parse() {
        let frame = short_request(&[0x0b, 0x01]);
        let req = parse_downlink_request(&frame).unwrap();
        assert_eq!(&encode_downlink_request(&req).unwrap()[..], &frame[..]);

        let mut via_codec = BytesMut::new();
        WdcCodec::new().encode(&req, &mut via_codec).unwrap();
        let mut bytes = via_codec.freeze();
        let decoded: DownlinkRequest = WdcCodec::new().decode(&mut bytes).unwrap();
        assert_eq!(decoded, req);
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_encode_rejects_inconsistent_mode() {
        let req = DownlinkRequest {
            handle: 0,
            tx_options: 0x08,
            dst_pan: pan(),
            dst_addr: NodeAddress::from_index(1),
            payload: Bytes::from_static(&[0x01]),
        };
        assert!(encode_downlink_request(&req).is_err());
    }

    #[test]
    fn test_data_confirm() {
        assert_eq!(&make_data_confirm(0x42, 0x00)[..], &[0x02, 0x18, 0x42, 0x00]);
        assert!(WdcCodec::is_data_request(&short_request(&[0x01])));
        assert!(!WdcCodec::is_data_request(&[0x02, 0x01]));
        assert_eq!(WdcCodec::peek_command(&[0x02]), None);
    }

    #[test]
    fn test_auth_frame_split_and_verify() {
        let key = SymmetricKey::from_bytes([0x33; 16]);
        let addr = NodeAddress::from_index(0);
        let msdu = make_downlink_payload(pan(), addr, 0x0b, &[0x01], Some(&key));
        assert_eq!(msdu.len(), 1 + 1 + MAC_TAG_SIZE);

        let req = parse_downlink_request(&short_request(&msdu)).unwrap();
        let auth = make_downlink_auth_frame(&req).unwrap();

        assert_eq!(auth.message_id, 0x0b);
        assert_eq!(&auth.data[..], &[0x01]);
        assert_eq!(auth.header, MacHeader::downlink(pan(), addr));
        assert!(auth.verify(&key));
        assert!(!auth.verify(&SymmetricKey::from_bytes([0x34; 16])));
    }

    #[test]
    fn test_auth_frame_detects_readdressing() {
        let key = SymmetricKey::from_bytes([0x33; 16]);
        let msdu = make_downlink_payload(pan(), NodeAddress::from_index(1), 0x0b, &[0x01], Some(&key));

        // delivered to node 0 instead of node 1
        let req = parse_downlink_request(&short_request(&msdu)).unwrap();
        assert!(!make_downlink_auth_frame(&req).unwrap().verify(&key));
    }

    #[test]
    fn test_auth_frame_requires_more_than_tag() {
        let req = parse_downlink_request(&short_request(&[0x03; MAC_TAG_SIZE])).unwrap();
        assert!(matches!(
            make_downlink_auth_frame(&req),
            Err(CoreError::MessageTooShort { .. })
        ));

        // id + tag, empty body
        let req = parse_downlink_request(&short_request(&[0x03; MAC_TAG_SIZE + 1])).unwrap();
        assert!(make_downlink_auth_frame(&req).unwrap().data.is_empty());
    }

    #[test]
    fn test_uplink_frame_layout_and_parse() {
        let key = SymmetricKey::from_bytes([0x44; 16]);
        let addr = NodeAddress::from_index(0);
        let frame = make_uplink_frame(
            PanId::COORDINATOR,
            NodeAddress::COORDINATOR,
            pan(),
            addr,
            MessageId::SbkResponse.as_byte(),
            &[0x00],
            Some(&key),
        );
        let bytes = frame.to_bytes();

        assert_eq!(hex::encode(&bytes[..11]), "018800ffffffff1caa0000");
        assert_eq!(bytes[11], 0x08);
        assert_eq!(bytes[12], 0x00);
        assert_eq!(bytes.len(), 11 + 1 + 1 + MAC_TAG_SIZE + 2);
        assert!(bytes.ends_with(&FRAME_TRAILER));

        let parsed = parse_uplink_frame(&bytes, AddressingMode::Short, true).unwrap();
        assert_eq!(parsed, frame);
        assert!(parsed.verify(&key));
    }

    #[test]
    fn test_uplink_frame_unauthenticated() {
        let frame = make_uplink_frame(
            PanId::COORDINATOR,
            NodeAddress::COORDINATOR,
            pan(),
            NodeAddress::Long([9; 8]),
            MessageId::NikResponse.as_byte(),
            &[0xab; 64],
            None,
        );
        assert!(frame.mac.is_none());

        let parsed = parse_uplink_frame(&frame.to_bytes(), AddressingMode::Long, false).unwrap();
        assert_eq!(parsed.payload.len(), 64);
        assert_eq!(parsed.header.src_addr, NodeAddress::Long([9; 8]));
    }

    #[test]
    fn test_parse_uplink_rejects_bad_trailer() {
        let frame = make_uplink_frame(
            PanId::COORDINATOR,
            NodeAddress::COORDINATOR,
            pan(),
            NodeAddress::from_index(0),
            0x02,
            &[1, 2],
            None,
        );
        let mut bytes = frame.to_bytes().to_vec();
        let last = bytes.len() - 1;
        bytes[last] = 0x00;
        assert!(parse_uplink_frame(&bytes, AddressingMode::Short, false).is_err());
        assert!(parse_uplink_frame(&bytes[..5], AddressingMode::Short, false).is_err());
    }
}
