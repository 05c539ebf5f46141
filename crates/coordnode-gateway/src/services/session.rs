// ============================================
// File: crates/coordnode-gateway/src/services/session.rs
// ============================================
//! # Node Session Engine
//!
//! ## Creation Reason
//! Each emulated sensor node accumulates secret material over a three
//! step ECDH handshake and then exchanges authenticated application
//! data. This module holds that state and the state machine driving it.
//!
//! ## Main Functionality
//! - `NodeSession`: keys, uplink policy and replay counter of one node
//! - `SessionEngine`: handles one inbound request at a time, builds uplinks
//! - `UplinkPolicy`: plaintext or encrypted application uplinks
//!
//! ## Handshake Flow
//! ```text
//!   sensor                                   node
//!     │  0x01 | Qs                             │  NIK = H(ECDH)[0:16]
//!     │ ─────────────────────────────────────► │
//!     │  0x02 | Qn                             │
//!     │ ◄───────────────────────────────────── │
//!     │  0x03 | Qs | MAC(NIK)                  │  S, AK = split(H(ECDH))
//!     │ ─────────────────────────────────────► │
//!     │  0x04 | Qn | MAC(NIK)                  │
//!     │ ◄───────────────────────────────────── │
//!     │  0x05 | Qs | MAC(AK)                   │  SIK, SCK = split(H(ECDH))
//!     │ ─────────────────────────────────────► │  counter = 0
//!     │  0x06 | Qn | MAC(AK)                   │
//!     │ ◄───────────────────────────────────── │
//!     │                                        │
//!     │  0x07 | CBC(SCK, SBK) | MAC(SIK)       │  0x08 | 00 | MAC(SIK)
//!     │  0x0B | policy | MAC(SIK)              │  0x0C | 00 | MAC(SIK)
//!     │  0x09/0x0A | ctr | body | MAC(SIK)     │  → application sink
//! ```
//!
//! ## Uplink Path
//! counter += 1, body = payload or CBC(SCK, payload) depending on the
//! policy, frame = `0x09|0x0A | ctr(4, BE) | body | MAC(SIK)`. The
//! counter only moves once the frame is known to fit an indication.
//!
//! ## ⚠️ Important Note for Next Developer
//! - A `SessionEngine` is owned by exactly one node task; it is not
//!   `Sync`-shared and takes `&mut self` everywhere
//! - Every error is terminal for the request that caused it only; the
//!   caller drops the request and emits nothing
//! - A missing key is reported as `MacMismatch`, the same as a bad tag
//! - Replies and uplinks carry the PAN of the last accepted request,
//!   starting from the configured one
//! - Never log key bytes, shared secrets or decrypted SBKs
//!
//! ## Last Modified
//! v0.1.0 - Initial session engine

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};
use zeroize::Zeroizing;

use coordnode_common::types::{NodeAddress, PanId, ReplayCounter};
use coordnode_core::crypto::blockcipher::{decrypt_cbc_pkcs7, encrypt_cbc_pkcs7};
use coordnode_core::crypto::{kdf, Ecdh, SymmetricKey, PUBLIC_KEY_SIZE};
use coordnode_core::error::{CoreError, Result};
use coordnode_core::protocol::codec::{
    make_downlink_auth_frame, make_uplink_frame, max_indication_frame_len,
};
use coordnode_core::protocol::{
    DownlinkAuthFrame, DownlinkRequest, MacHeader, MessageId, UplinkFrame, DEFAULT_TRAILING,
    STATUS_SUCCESS,
};

/// Size of the replay counter prefix on application data.
const COUNTER_SIZE: usize = 4;

// ============================================
// UplinkPolicy
// ============================================

/// How application uplinks are protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UplinkPolicy {
    /// Authenticated plaintext (mID 0x09).
    #[default]
    Plaintext,
    /// Authenticated and encrypted under SCK (mID 0x0A).
    Encrypted,
}

impl UplinkPolicy {
    /// Interprets a policy byte: bit 0 set selects encryption.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        if byte & 0x01 == 0 {
            Self::Plaintext
        } else {
            Self::Encrypted
        }
    }

    /// Message id used for uplinks under this policy.
    #[must_use]
    pub const fn message_id(self) -> MessageId {
        match self {
            Self::Plaintext => MessageId::AppData,
            Self::Encrypted => MessageId::AppDataEncrypted,
        }
    }
}

// ============================================
// NodeSession
// ============================================

/// Long-term secret pair established by mID 0x03.
struct LongTermSecret {
    /// Long-term shared secret (S); kept for future rekeying.
    #[allow(dead_code)]
    secret: SymmetricKey,
    /// Authentication key (AK).
    ak: SymmetricKey,
}

/// Session key pair established by mID 0x05.
struct SessionKeys {
    /// Session integrity key.
    sik: SymmetricKey,
    /// Session cipher key.
    sck: SymmetricKey,
}

/// Secret and policy state of one node.
///
/// Each stage is only present once its handshake step has succeeded; the
/// key types zero themselves on drop.
#[derive(Default)]
pub struct NodeSession {
    nik: Option<SymmetricKey>,
    ltss: Option<LongTermSecret>,
    keys: Option<SessionKeys>,
    sbk: Option<Zeroizing<Vec<u8>>>,
    policy: UplinkPolicy,
    counter: ReplayCounter,
}

impl NodeSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once the NIK exchange succeeded.
    #[must_use]
    pub const fn has_nik(&self) -> bool {
        self.nik.is_some()
    }

    /// Returns `true` once S and AK are established.
    #[must_use]
    pub const fn has_long_term_secret(&self) -> bool {
        self.ltss.is_some()
    }

    /// Returns `true` once SIK and SCK are established.
    #[must_use]
    pub const fn has_session_keys(&self) -> bool {
        self.keys.is_some()
    }

    /// Returns `true` once an SBK has been delivered.
    #[must_use]
    pub const fn has_sbk(&self) -> bool {
        self.sbk.is_some()
    }

    /// Current uplink policy.
    #[must_use]
    pub const fn policy(&self) -> UplinkPolicy {
        self.policy
    }

    /// Current replay counter (value of the last uplink sent).
    #[must_use]
    pub const fn counter(&self) -> ReplayCounter {
        self.counter
    }
}

impl std::fmt::Debug for NodeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeSession")
            .field("nik", &self.has_nik())
            .field("ltss", &self.has_long_term_secret())
            .field("session_keys", &self.has_session_keys())
            .field("sbk", &self.has_sbk())
            .field("policy", &self.policy)
            .field("counter", &self.counter.value())
            .finish()
    }
}

// ============================================
// Outcome
// ============================================

/// Application data received from the sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppMessage {
    /// Sender's replay counter.
    pub counter: u32,
    /// Plaintext body.
    pub payload: Bytes,
    /// Whether the body arrived encrypted.
    pub encrypted: bool,
}

/// Result of a successfully handled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A response frame to send up.
    Reply(UplinkFrame),
    /// Application data for the node's sink.
    Deliver(AppMessage),
}

// ============================================
// SessionEngine
// ============================================

/// Handshake state machine and uplink builder of one node.
pub struct SessionEngine {
    ecdh: Arc<Ecdh>,
    pan: PanId,
    addr: NodeAddress,
    session: NodeSession,
    max_frame_len: usize,
}

impl SessionEngine {
    /// Creates an engine for the node at `pan`/`addr` with an empty session.
    pub fn new(ecdh: Arc<Ecdh>, pan: PanId, addr: NodeAddress) -> Self {
        Self {
            ecdh,
            pan,
            addr,
            session: NodeSession::new(),
            max_frame_len: max_indication_frame_len(DEFAULT_TRAILING.len()),
        }
    }

    /// Sizes uplinks for indications carrying `len` trailing bytes.
    #[must_use]
    pub fn with_trailing_len(mut self, len: usize) -> Self {
        self.max_frame_len = max_indication_frame_len(len);
        self
    }

    /// Node address.
    #[must_use]
    pub const fn address(&self) -> NodeAddress {
        self.addr
    }

    /// PAN carried by the node's next frame.
    #[must_use]
    pub const fn pan(&self) -> PanId {
        self.pan
    }

    /// Read-only view of the session state.
    #[must_use]
    pub const fn session(&self) -> &NodeSession {
        &self.session
    }

    /// Handles one inbound data request addressed to this node.
    ///
    /// # Errors
    /// - `UnknownMessageId` for ids that are not inbound requests
    /// - `MacMismatch` if the tag is wrong or the required key is missing
    /// - `InvalidPeerKey` if the sensor's point is not on the curve
    /// - `BadPadding` / `MalformedMessage` if an encrypted body is invalid
    /// - `MessageTooShort` for truncated payloads
    ///
    /// On success the request's PAN becomes the node's PAN; a failed
    /// request leaves it untouched.
    pub fn handle_request(&mut self, req: &DownlinkRequest) -> Result<Outcome> {
        let previous = std::mem::replace(&mut self.pan, req.dst_pan);
        let result = self.handle_addressed(req);
        if result.is_err() {
            self.pan = previous;
        }
        result
    }

    /// Builds the next authenticated application uplink.
    ///
    /// # Errors
    /// - `MissingSessionKeys` before the session-key exchange completed
    /// - `CounterExhausted` when the replay counter would wrap
    /// - `MessageTooLarge` when the frame would not fit an indication; the
    ///   counter is not advanced
    pub fn prepare_uplink(&mut self, payload: &[u8]) -> Result<UplinkFrame> {
        let keys = self
            .session
            .keys
            .as_ref()
            .ok_or_else(|| CoreError::missing_keys("application uplink", "SIK/SCK"))?;
        let mut next = self.session.counter;
        let counter = next.increment().ok_or(CoreError::CounterExhausted)?;
        let policy = self.session.policy;

        let mut data = Vec::with_capacity(COUNTER_SIZE + payload.len() + 32);
        data.extend_from_slice(&counter.to_be_bytes());
        match policy {
            UplinkPolicy::Plaintext => data.extend_from_slice(payload),
            UplinkPolicy::Encrypted => data.extend_from_slice(&encrypt_cbc_pkcs7(&keys.sck, payload)),
        }

        let frame = self.frame(policy.message_id(), &data, Some(&keys.sik));
        if frame.encoded_len() > self.max_frame_len {
            return Err(CoreError::too_large(self.max_frame_len, frame.encoded_len()));
        }
        self.session.counter = next;
        Ok(frame)
    }

    // ========================================
    // Handshake steps
    // ========================================

    fn handle_addressed(&mut self, req: &DownlinkRequest) -> Result<Outcome> {
        let raw = req.message_id().ok_or(CoreError::too_short(1, 0))?;
        let mid = MessageId::try_from(raw).map_err(CoreError::UnknownMessageId)?;

        match mid {
            MessageId::NikRequest => self.on_nik_request(&req.payload[1..]),
            MessageId::LtssRequest => {
                let frame = authenticate(req, self.session.nik.as_ref())?;
                self.on_ltss_request(&frame)
            }
            MessageId::SessionKeyRequest => {
                let frame = authenticate(req, self.session.ltss.as_ref().map(|l| &l.ak))?;
                self.on_session_key_request(&frame)
            }
            MessageId::SbkUpdate => {
                let frame = authenticate(req, self.sik())?;
                self.on_sbk_update(&frame)
            }
            MessageId::PolicyUpdate => {
                let frame = authenticate(req, self.sik())?;
                self.on_policy_update(&frame)
            }
            MessageId::AppData | MessageId::AppDataEncrypted => {
                let frame = authenticate(req, self.sik())?;
                self.on_app_data(mid, &frame)
            }
            MessageId::NikResponse
            | MessageId::LtssResponse
            | MessageId::SessionKeyResponse
            | MessageId::SbkResponse
            | MessageId::PolicyResponse => Err(CoreError::UnknownMessageId(raw)),
        }
    }

    fn on_nik_request(&mut self, peer: &[u8]) -> Result<Outcome> {
        let (public, secret) = self.agree(peer)?;
        self.session.nik = Some(kdf::derive_nik(&secret[..]));
        drop(secret);

        info!(node = %self.addr, "NIK established");
        self.reply(MessageId::NikRequest, &public, None)
    }

    fn on_ltss_request(&mut self, frame: &DownlinkAuthFrame) -> Result<Outcome> {
        let (public, secret) = self.agree(&frame.data)?;
        let (s, ak) = kdf::derive_pair(&secret[..]);
        drop(secret);
        self.session.ltss = Some(LongTermSecret { secret: s, ak });

        info!(node = %self.addr, "Long-term secret established");
        self.reply(MessageId::LtssRequest, &public, self.session.nik.as_ref())
    }

    fn on_session_key_request(&mut self, frame: &DownlinkAuthFrame) -> Result<Outcome> {
        let (public, secret) = self.agree(&frame.data)?;
        let (sik, sck) = kdf::derive_pair(&secret[..]);
        drop(secret);
        self.session.keys = Some(SessionKeys { sik, sck });
        self.session.counter.reset();

        info!(node = %self.addr, "Session keys established");
        self.reply(
            MessageId::SessionKeyRequest,
            &public,
            self.session.ltss.as_ref().map(|l| &l.ak),
        )
    }

    fn on_sbk_update(&mut self, frame: &DownlinkAuthFrame) -> Result<Outcome> {
        let sck = self.sck()?;
        let sbk = decrypt_cbc_pkcs7(sck, &frame.data)?;
        self.session.sbk = Some(Zeroizing::new(sbk));

        info!(node = %self.addr, "SBK updated");
        self.reply(MessageId::SbkUpdate, &[STATUS_SUCCESS], self.sik())
    }

    fn on_policy_update(&mut self, frame: &DownlinkAuthFrame) -> Result<Outcome> {
        let byte = *frame
            .data
            .first()
            .ok_or_else(|| CoreError::malformed("empty policy update"))?;
        self.session.policy = UplinkPolicy::from_byte(byte);

        info!(node = %self.addr, policy = ?self.session.policy, "Uplink policy updated");
        self.reply(MessageId::PolicyUpdate, &[STATUS_SUCCESS], self.sik())
    }

    fn on_app_data(&self, mid: MessageId, frame: &DownlinkAuthFrame) -> Result<Outcome> {
        if frame.data.len() < COUNTER_SIZE {
            return Err(CoreError::too_short(COUNTER_SIZE, frame.data.len()));
        }
        let mut counter = [0u8; COUNTER_SIZE];
        counter.copy_from_slice(&frame.data[..COUNTER_SIZE]);
        let counter = u32::from_be_bytes(counter);
        let body = frame.data.slice(COUNTER_SIZE..);

        let encrypted = mid == MessageId::AppDataEncrypted;
        let payload = if encrypted {
            Bytes::from(decrypt_cbc_pkcs7(self.sck()?, &body)?)
        } else {
            body
        };

        debug!(node = %self.addr, counter, len = payload.len(), encrypted, "Application data received");
        Ok(Outcome::Deliver(AppMessage {
            counter,
            payload,
            encrypted,
        }))
    }

    // ========================================
    // Helpers
    // ========================================

    /// Fresh ephemeral ECDH against `peer`; returns our public point and
    /// the raw shared secret.
    fn agree(&self, peer: &[u8]) -> Result<([u8; PUBLIC_KEY_SIZE], coordnode_core::SharedSecret)> {
        if !self.ecdh.check_public(peer) {
            return Err(CoreError::InvalidPeerKey);
        }
        let pair = self.ecdh.generate_key_pair();
        let public = *pair.public_bytes();
        let secret = pair.agree(&self.ecdh, peer)?;
        Ok((public, secret))
    }

    fn frame(&self, mid: MessageId, payload: &[u8], key: Option<&SymmetricKey>) -> UplinkFrame {
        let header = MacHeader::uplink(self.pan, self.addr);
        make_uplink_frame(
            header.dst_pan,
            header.dst_addr,
            header.src_pan,
            header.src_addr,
            mid.as_byte(),
            payload,
            key,
        )
    }

    /// Answers `request` with its paired response id.
    fn reply(
        &self,
        request: MessageId,
        payload: &[u8],
        key: Option<&SymmetricKey>,
    ) -> Result<Outcome> {
        let mid = request
            .response()
            .ok_or(CoreError::UnknownMessageId(request.as_byte()))?;
        Ok(Outcome::Reply(self.frame(mid, payload, key)))
    }

    fn sik(&self) -> Option<&SymmetricKey> {
        self.session.keys.as_ref().map(|k| &k.sik)
    }

    fn sck(&self) -> Result<&SymmetricKey> {
        self.session
            .keys
            .as_ref()
            .map(|k| &k.sck)
            .ok_or(CoreError::MacMismatch)
    }
}

impl std::fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine")
            .field("pan", &self.pan)
            .field("addr", &self.addr)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Splits and verifies an authenticated request; a missing key fails the
/// same way as a wrong tag.
fn authenticate(req: &DownlinkRequest, key: Option<&SymmetricKey>) -> Result<DownlinkAuthFrame> {
    let frame = make_downlink_auth_frame(req)?;
    match key {
        Some(key) if frame.verify(key) => Ok(frame),
        _ => Err(CoreError::MacMismatch),
    }
}

// ============================================
// Tests
// ============================================
