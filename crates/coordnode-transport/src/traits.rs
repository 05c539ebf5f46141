// ============================================
// File: crates/coordnode-transport/src/traits.rs
// ============================================
//! # Link Transport Trait
//!
//! ## Creation Reason
//! The gateway talks to exactly one concentrator over some byte link
//! (a UDP bridge in production, an in-memory queue in tests). This
//! trait is the seam between the two.
//!
//! ## Main Functionality
//! - `LinkTransport`: frame-oriented send/receive interface
//! - `DEFAULT_RECV_TIMEOUT`: bound used by `recv_timeout`
//!
//! ## Design Philosophy
//! - Traits enable mock implementations for testing
//! - Async-first design with `async_trait`
//! - One call = one whole WDC frame; no stream reassembly upstream
//!
//! ## ⚠️ Important Note for Next Developer
//! - Implementations must be Send + Sync; one instance is shared by the
//!   receive loop and the outbound sender
//! - `send` is not required to be atomic with respect to other senders;
//!   callers serialize writes themselves
//!
//! ## Last Modified
//! v0.1.0 - Initial trait definitions

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Result, TransportError};

/// Default bound for [`LinkTransport::recv_timeout`].
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================
// LinkTransport Trait
// ============================================

/// Frame-oriented link to the concentrator.
///
/// # Example
/// ```ignore
/// async fn echo<T: LinkTransport>(link: &T) -> Result<()> {
///     loop {
///         let frame = link.recv().await?;
///         link.send(&frame).await?;
///     }
/// }
/// ```
#[async_trait]
pub trait LinkTransport: Send + Sync {
    /// Receives one frame.
    ///
    /// # Errors
    /// Returns `ShuttingDown` after [`LinkTransport::shutdown`], or an
    /// I/O error from the underlying link.
    async fn recv(&self) -> Result<Bytes>;

    /// Sends one frame.
    ///
    /// # Returns
    /// Number of bytes written
    ///
    /// # Errors
    /// Returns error if the write fails or the link is shut down.
    async fn send(&self, frame: &[u8]) -> Result<usize>;

    /// Gracefully shuts down the link.
    ///
    /// After shutdown, all operations will return errors.
    ///
    /// # Errors
    /// Returns error if shutdown fails
    async fn shutdown(&self) -> Result<()>;

    /// Returns `true` if the link is still active.
    fn is_active(&self) -> bool;

    /// Receives one frame, failing with `Timeout` after `within`.
    ///
    /// # Errors
    /// Returns `Timeout` if nothing arrives in time, otherwise whatever
    /// [`LinkTransport::recv`] returns.
    async fn recv_timeout(&self, within: Duration) -> Result<Bytes> {
        match tokio::time::timeout(within, self.recv()).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::timeout(format!(
                "recv after {}ms",
                within.as_millis()
            ))),
        }
    }
}
