// ============================================
// File: crates/coordnode-gateway/src/services/outbound.rs
// ============================================
//! # Outbound Sender
//!
//! ## Creation Reason
//! Every node task, the dispatcher and the admin seam write to the same
//! concentrator link. Two writes must never interleave on the byte
//! stream, so all of them pass through this single writer.
//!
//! ## Main Functionality
//! - `OutboundSender`: serializes `send` calls on a shared transport
//! - Frame and error counters
//!
//! ## ⚠️ Important Note for Next Developer
//! - The lock is held for exactly one `send`; never call anything else
//!   while holding it
//! - Wire order is the order callers reach the lock, not the order they
//!   built their frames
//!
//! ## Last Modified
//! v0.1.0 - Initial outbound sender

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{trace, warn};

use coordnode_transport::{LinkTransport, Result as TransportResult};

/// Single writer in front of the concentrator link.
pub struct OutboundSender {
    /// Shared link
    transport: Arc<dyn LinkTransport>,
    /// Guards the write call only
    write_lock: Mutex<()>,
    /// Frames written successfully
    frames_sent: AtomicU64,
    /// Failed writes
    send_errors: AtomicU64,
}

impl OutboundSender {
    /// Creates a sender over `transport`.
    pub fn new(transport: Arc<dyn LinkTransport>) -> Self {
        Self {
            transport,
            write_lock: Mutex::new(()),
            frames_sent: AtomicU64::new(0),
            send_errors: AtomicU64::new(0),
        }
    }

    /// Writes one complete frame.
    ///
    /// # Errors
    /// Returns the transport's error; the caller decides whether to log
    /// or drop.
    pub async fn send(&self, frame: &[u8]) -> TransportResult<usize> {
        let result = {
            let _guard = self.write_lock.lock().await;
            self.transport.send(frame).await
        };

        match &result {
            Ok(len) => {
                self.frames_sent.fetch_add(1, Ordering::Relaxed);
                trace!(len, frame = %hex::encode(frame), "Frame written");
            }
            Err(e) => {
                self.send_errors.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "Outbound write failed");
            }
        }
        result
    }

    /// Returns the number of frames written.
    #[must_use]
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    /// Returns the number of failed writes.
    #[must_use]
    pub fn send_errors(&self) -> u64 {
        self.send_errors.load(Ordering::Relaxed)
    }

    /// Returns the underlying link.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn LinkTransport> {
        &self.transport
    }
}

impl std::fmt::Debug for OutboundSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundSender")
            .field("frames_sent", &self.frames_sent())
            .field("send_errors", &self.send_errors())
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================
