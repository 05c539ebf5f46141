// ============================================
// File: crates/coordnode-transport/src/mock.rs
// ============================================
//! # Mock Link Implementation
//!
//! ## Creation Reason
//! Lets gateway tests play the concentrator without sockets: frames are
//! injected into an in-memory receive queue and everything the gateway
//! writes is captured for inspection.
//!
//! ## Usage in Tests
//! ```
//! use coordnode_transport::{LinkTransport, MockLink};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let link = MockLink::new();
//! link.inject_frame(vec![0x02, 0x09, 0x00]).unwrap();
//!
//! let frame = link.recv().await.unwrap();
//! assert_eq!(&frame[..], &[0x02, 0x09, 0x00]);
//!
//! link.send(b"reply").await.unwrap();
//! assert_eq!(link.take_sent(), vec![b"reply".to_vec()]);
//! # }
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This is for testing only - do not use in production
//! - Queues are bounded to prevent memory issues
//!
//! ## Last Modified
//! v0.1.0 - Initial mock implementation

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::{Result, TransportError};
use crate::traits::LinkTransport;

// ============================================
// Constants
// ============================================

/// Maximum number of frames to queue in either direction.
const MAX_QUEUE_SIZE: usize = 1000;

// ============================================
// MockLink
// ============================================

/// In-memory link for tests.
pub struct MockLink {
    /// Frames waiting to be received (injected by the test)
    recv_queue: Mutex<VecDeque<Bytes>>,
    /// Frames the code under test has sent
    sent_queue: Mutex<VecDeque<Vec<u8>>>,
    /// Shutdown flag
    shutdown: AtomicBool,
    /// Wakes `recv` on injection or shutdown
    recv_notify: Notify,
    /// Wakes `wait_for_sent` on every send
    sent_notify: Notify,
}

impl MockLink {
    /// Creates an empty mock link.
    #[must_use]
    pub fn new() -> Self {
        Self {
            recv_queue: Mutex::new(VecDeque::with_capacity(100)),
            sent_queue: Mutex::new(VecDeque::with_capacity(100)),
            shutdown: AtomicBool::new(false),
            recv_notify: Notify::new(),
            sent_notify: Notify::new(),
        }
    }

    /// Queues a frame for the next `recv()` call.
    ///
    /// # Errors
    /// Returns `ReceiveFailed` if the queue already holds too many frames.
    pub fn inject_frame(&self, frame: impl Into<Bytes>) -> Result<()> {
        let mut queue = self.recv_queue.lock();
        if queue.len() >= MAX_QUEUE_SIZE {
            return Err(TransportError::ReceiveFailed {
                reason: "mock receive queue full".into(),
            });
        }
        queue.push_back(frame.into());
        drop(queue);
        self.recv_notify.notify_one();
        Ok(())
    }

    /// Takes every frame sent so far, oldest first.
    #[must_use]
    pub fn take_sent(&self) -> Vec<Vec<u8>> {
        self.sent_queue.lock().drain(..).collect()
    }

    /// Returns the number of captured frames.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent_queue.lock().len()
    }

    /// Returns the number of frames waiting to be received.
    #[must_use]
    pub fn pending_recv_count(&self) -> usize {
        self.recv_queue.lock().len()
    }

    /// Waits until at least `count` frames have been captured.
    ///
    /// Returns `false` if that does not happen within `within`.
    pub async fn wait_for_sent(&self, count: usize, within: Duration) -> bool {
        tokio::time::timeout(within, async {
            loop {
                let notified = self.sent_notify.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                if self.sent_count() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

#[async_trait]
impl LinkTransport for MockLink {
    async fn recv(&self) -> Result<Bytes> {
        loop {
            if self.shutdown.load(Ordering::Acquire) {
                return Err(TransportError::ShuttingDown);
            }

            if let Some(frame) = self.recv_queue.lock().pop_front() {
                return Ok(frame);
            }

            self.recv_notify.notified().await;
        }
    }

    async fn send(&self, frame: &[u8]) -> Result<usize> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(TransportError::ShuttingDown);
        }

        let mut queue = self.sent_queue.lock();
        if queue.len() >= MAX_QUEUE_SIZE {
            return Err(TransportError::io(
                "mock send",
                io::Error::new(io::ErrorKind::Other, "mock send queue full"),
            ));
        }
        queue.push_back(frame.to_vec());
        drop(queue);

        self.sent_notify.notify_waiters();
        Ok(frame.len())
    }

    async fn shutdown(&self) -> Result<()> {
        self.shutdown.store(true, Ordering::Release);
        self.recv_notify.notify_one();
        Ok(())
    }

    fn is_active(&self) -> bool {
        !self.shutdown.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for MockLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLink")
            .field("active", &self.is_active())
            .field("pending_recv", &self.pending_recv_count())
            .field("sent", &self.sent_count())
            .finish()
    }
}

impl Default for MockLink {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_inject_recv_in_order() {
        let link = MockLink::new();
        link.inject_frame(vec![1]).unwrap();
        link.inject_frame(vec![2]).unwrap();
        assert_eq!(link.pending_recv_count(), 2);

        assert_eq!(&link.recv().await.unwrap()[..], &[1]);
        assert_eq!(&link.recv().await.unwrap()[..], &[2]);
        assert_eq!(link.pending_recv_count(), 0);
    }

    #[tokio::test]
    async fn test_recv_waits_for_injection() {
        let link = Arc::new(MockLink::new());
        let reader = {
            let link = Arc::clone(&link);
            tokio::spawn(async move { link.recv().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        link.inject_frame(vec![0xaa]).unwrap();

        let frame = reader.await.unwrap().unwrap();
        assert_eq!(&frame[..], &[0xaa]);
    }

    #[tokio::test]
    async fn test_send_capture() {
        let link = MockLink::new();
        link.send(b"one").await.unwrap();
        link.send(b"two").await.unwrap();
        assert_eq!(link.sent_count(), 2);

        assert_eq!(link.take_sent(), vec![b"one".to_vec(), b"two".to_vec()]);
        assert_eq!(link.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_wait_for_sent() {
        let link = Arc::new(MockLink::new());
        assert!(!link.wait_for_sent(1, Duration::from_millis(10)).await);

        let writer = {
            let link = Arc::clone(&link);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                link.send(b"late").await.unwrap();
            })
        };

        assert!(link.wait_for_sent(1, Duration::from_secs(2)).await);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_wakes_receiver() {
        let link = Arc::new(MockLink::new());
        let reader = {
            let link = Arc::clone(&link);
            tokio::spawn(async move { link.recv().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        link.shutdown().await.unwrap();

        assert!(matches!(
            reader.await.unwrap(),
            Err(TransportError::ShuttingDown)
        ));
        assert!(!link.is_active());
        assert!(link.send(b"x").await.is_err());
    }

    #[tokio::test]
    async fn test_recv_timeout_default_method() {
        let link = MockLink::new();
        let result = link.recv_timeout(Duration::from_millis(10)).await;
        assert!(matches!(result, Err(TransportError::Timeout { .. })));
    }
}
