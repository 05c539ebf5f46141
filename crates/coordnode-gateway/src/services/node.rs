// ============================================
// File: crates/coordnode-gateway/src/services/node.rs
// ============================================
//! # Node Task
//!
//! ## Creation Reason
//! Requests for one node must be handled strictly in arrival order while
//! different nodes proceed in parallel. Each node therefore runs as its
//! own task with a private FIFO and exclusive ownership of its
//! `SessionEngine`.
//!
//! ## Main Functionality
//! - `spawn_node`: starts a node task, returns its handle and endpoint
//! - `NodeHandle`: dispatcher side (forward requests, close)
//! - `AppEndpoint`: application side (payloads in, payloads out)
//! - Optional periodic sample reporting
//!
//! ## Task Loop
//! ```text
//!              ┌──────────────── node task ────────────────┐
//! dispatcher ─►│ inbound FIFO ─► SessionEngine ─► reply ───┼─► OutboundSender
//!              │                      │                    │
//!              │                      └─► deliver ─────────┼─► app incoming
//! app ────────►│ outgoing FIFO ─► prepare_uplink ──────────┼─► OutboundSender
//!              │ report tick ───► prepare_uplink ──────────┼─► OutboundSender
//!              └───────────────────────────────────────────┘
//! ```
//!
//! ## Shutdown
//! 1. The dispatcher drops the `NodeHandle`'s sender; no new requests
//! 2. The task finishes its current step, sends any application payloads
//!    already queued, then exits
//! 3. `NodeHandle::close` awaits the task, aborting it past the bound
//!
//! ## ⚠️ Important Note for Next Developer
//! - Inbound requests are polled first (`biased`), so a burst of
//!   application data cannot starve the handshake
//! - Delivery to the application never waits: a full sink drops the
//!   payload with a warning
//!
//! ## Last Modified
//! v0.1.0 - Initial node task

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, trace, warn};

use coordnode_common::types::NodeAddress;
use coordnode_core::error::CoreError;
use coordnode_core::protocol::codec::wrap_indication;
use coordnode_core::protocol::{DownlinkRequest, UplinkFrame};

use super::outbound::OutboundSender;
use super::session::{AppMessage, Outcome, SessionEngine};

// ============================================
// Options
// ============================================

/// Periodic sample report.
#[derive(Debug, Clone)]
pub struct SampleReport {
    /// Period between reports.
    pub interval: Duration,
    /// Payload sent on every tick.
    pub payload: Bytes,
}

/// Settings shared by every node task.
#[derive(Debug, Clone)]
pub struct NodeOptions {
    /// Trailing metadata appended to every indication.
    pub trailing: Bytes,
    /// Capacity of each per-node queue.
    pub queue_depth: usize,
    /// Sample reporting, if enabled.
    pub report: Option<SampleReport>,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            trailing: Bytes::from_static(&[0u8; 6]),
            queue_depth: 64,
            report: None,
        }
    }
}

// ============================================
// AppEndpoint
// ============================================

/// Application side of a node.
#[derive(Debug)]
pub struct AppEndpoint {
    /// Node this endpoint belongs to.
    pub address: NodeAddress,
    /// Payloads to send up as application data.
    pub outgoing: mpsc::Sender<Bytes>,
    /// Payloads received from the sensor, already verified and decrypted.
    pub incoming: mpsc::Receiver<Bytes>,
}

// ============================================
// NodeHandle
// ============================================

/// Dispatcher side of a node.
#[derive(Debug)]
pub struct NodeHandle {
    address: NodeAddress,
    inbound: mpsc::Sender<DownlinkRequest>,
    task: JoinHandle<()>,
}

impl NodeHandle {
    /// Node address.
    #[must_use]
    pub const fn address(&self) -> NodeAddress {
        self.address
    }

    /// Queues a request without waiting.
    ///
    /// # Errors
    /// Returns the request back if the queue is full or the task is gone.
    pub fn forward(&self, req: DownlinkRequest) -> Result<(), TrySendError<DownlinkRequest>> {
        self.inbound.try_send(req)
    }

    /// Stops accepting requests and waits for the task to drain.
    ///
    /// Returns `false` if the task had to be aborted after `within`.
    pub async fn close(self, within: Duration) -> bool {
        let Self {
            address,
            inbound,
            mut task,
        } = self;
        drop(inbound);

        match tokio::time::timeout(within, &mut task).await {
            Ok(Ok(())) => {
                debug!(node = %address, "Node task completed");
                true
            }
            Ok(Err(e)) => {
                warn!(node = %address, error = %e, "Node task failed");
                true
            }
            Err(_) => {
                warn!(node = %address, "Node task timed out during shutdown");
                task.abort();
                false
            }
        }
    }
}

// ============================================
// Node Task
// ============================================

/// Starts the task for `engine`'s node.
#[must_use]
pub fn spawn_node(
    engine: SessionEngine,
    outbound: Arc<OutboundSender>,
    options: &NodeOptions,
) -> (NodeHandle, AppEndpoint) {
    let engine = engine.with_trailing_len(options.trailing.len());
    let address = engine.address();
    let depth = options.queue_depth.max(1);
    let (inbound_tx, inbound_rx) = mpsc::channel(depth);
    let (outgoing_tx, outgoing_rx) = mpsc::channel(depth);
    let (incoming_tx, incoming_rx) = mpsc::channel(depth);

    let task = NodeTask {
        engine,
        outbound,
        trailing: options.trailing.clone(),
        sink: incoming_tx,
    };
    let handle = tokio::spawn(task.run(inbound_rx, outgoing_rx, options.report.clone()));

    (
        NodeHandle {
            address,
            inbound: inbound_tx,
            task: handle,
        },
        AppEndpoint {
            address,
            outgoing: outgoing_tx,
            incoming: incoming_rx,
        },
    )
}

struct NodeTask {
    engine: SessionEngine,
    outbound: Arc<OutboundSender>,
    trailing: Bytes,
    sink: mpsc::Sender<Bytes>,
}

impl NodeTask {
    async fn run(
        mut self,
        mut inbound: mpsc::Receiver<DownlinkRequest>,
        mut outgoing: mpsc::Receiver<Bytes>,
        report: Option<SampleReport>,
    ) {
        let node = self.engine.address();
        debug!(node = %node, "Node task started");

        let mut ticker = report.as_ref().map(|r| {
            let mut interval = tokio::time::interval_at(Instant::now() + r.interval, r.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        let mut outgoing_open = true;

        loop {
            tokio::select! {
                biased;

                req = inbound.recv() => match req {
                    Some(req) => self.on_request(&req).await,
                    None => break,
                },
                payload = outgoing.recv(), if outgoing_open => match payload {
                    Some(payload) => self.send_uplink(&payload).await,
                    None => outgoing_open = false,
                },
                () = next_tick(&mut ticker) => {
                    if let Some(report) = &report {
                        self.send_uplink(&report.payload).await;
                    }
                }
            }
        }

        let mut drained = 0usize;
        while let Ok(payload) = outgoing.try_recv() {
            self.send_uplink(&payload).await;
            drained += 1;
        }
        debug!(node = %node, drained, "Node task stopped");
    }

    async fn on_request(&mut self, req: &DownlinkRequest) {
        let node = self.engine.address();
        match self.engine.handle_request(req) {
            Ok(Outcome::Reply(frame)) => self.emit(&frame).await,
            Ok(Outcome::Deliver(msg)) => self.deliver(msg),
            Err(e) if e.is_suspicious() => {
                warn!(node = %node, error = %e, "Dropping request");
            }
            Err(e) => {
                debug!(node = %node, error = %e, "Dropping request");
            }
        }
    }

    async fn send_uplink(&mut self, payload: &[u8]) {
        let node = self.engine.address();
        match self.engine.prepare_uplink(payload) {
            Ok(frame) => self.emit(&frame).await,
            Err(e @ CoreError::MissingSessionKeys { .. }) => {
                debug!(node = %node, error = %e, "Uplink skipped");
            }
            Err(e) => {
                warn!(node = %node, error = %e, "Uplink failed");
            }
        }
    }

    async fn emit(&self, frame: &UplinkFrame) {
        let indication = match wrap_indication(&frame.to_bytes(), &self.trailing) {
            Ok(indication) => indication,
            Err(e) => {
                warn!(node = %self.engine.address(), error = %e, "Cannot wrap uplink frame");
                return;
            }
        };
        trace!(node = %self.engine.address(), mid = frame.message_id, "Sending indication");
        // failures are counted and logged by the sender
        let _ = self.outbound.send(&indication).await;
    }

    fn deliver(&self, msg: AppMessage) {
        let node = self.engine.address();
        match self.sink.try_send(msg.payload) {
            Ok(()) => trace!(node = %node, counter = msg.counter, "Delivered application data"),
            Err(TrySendError::Full(_)) => {
                warn!(node = %node, "Application sink full, dropping payload");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(node = %node, "Application sink closed, dropping payload");
            }
        }
    }
}

/// Waits for the next tick; never completes without a ticker.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

// ============================================
// Tests
// ============================================
