// ============================================
// File: crates/coordnode-core/src/protocol/mod.rs
// ============================================
//! # Protocol Module
//!
//! ## Creation Reason
//! Defines the WDC wire protocol spoken with the concentrator and the
//! 802.15.4-style MAC frames tunnelled inside it.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`messages`]: Message ids and frame structures
//! - [`codec`]: Binary parsing and construction
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Downlink (concentrator ──► node)          │
//! │                                                             │
//! │  len | 0x17 | handle | txopts | pan | addr | msdu_len | msdu │
//! │                                                   │         │
//! │                               mid | data | [MAC(8)]         │
//! │                                                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    Uplink (node ──► concentrator)            │
//! │                                                             │
//! │  len | 0x19 | mpdu_len | mpdu | trailing(6)                 │
//! │                            │                                │
//! │   01 88 00 | ffff ffff | pan addr | mid | payload | [MAC] | de ad │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format Principles
//! - Multi-byte integers (replay counter) are big-endian
//! - Length bytes count what follows the command tag
//! - Addresses are 2 or 8 bytes, selected by bit 0x08 of txopts
//!
//! ## ⚠️ Important Note for Next Developer
//! - The frame control, sequence and trailer are fixed values the
//!   concentrator firmware expects; they are not computed
//! - The MAC covers the header, so a frame re-addressed in transit
//!   fails verification
//!
//! ## Last Modified
//! v0.1.0 - Initial protocol definitions

pub mod codec;
pub mod messages;

// Re-export primary types
pub use codec::{Codec, WdcCodec};
pub use messages::{
    DownlinkAuthFrame, DownlinkRequest, Indication, MacHeader, MessageId, UplinkFrame,
};

// ============================================
// Wire Constants
// ============================================

/// Frame control field of every MAC frame.
pub const FRAME_CONTROL: [u8; 2] = [0x01, 0x88];

/// Sequence number; the concentrator requires zero.
pub const SEQUENCE_NUMBER: u8 = 0x00;

/// Placeholder frame check sequence appended to every MAC frame.
pub const FRAME_TRAILER: [u8; 2] = [0xde, 0xad];

/// WDC command tag of a MAC data request (downlink).
pub const DATA_REQUEST_CMD: u8 = 0x17;

/// WDC command tag of a MAC data confirmation.
pub const DATA_CONFIRM_CMD: u8 = 0x18;

/// WDC command tag of a MAC data indication (uplink).
pub const INDICATION_CMD: u8 = 0x19;

/// WDC command tag of an error report.
pub const ERROR_CMD: u8 = 0x00;

/// Error code reported for a command the coordinator does not know.
pub const ERROR_WRONG_CMD: u8 = 0x01;

/// Status byte of a successful data confirmation.
pub const STATUS_SUCCESS: u8 = 0x00;

/// Default trailing metadata: LQI, ED, RX status and RX slot, all zero.
pub const DEFAULT_TRAILING: [u8; 6] = [0u8; 6];
