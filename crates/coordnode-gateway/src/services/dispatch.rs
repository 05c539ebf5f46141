// ============================================
// File: crates/coordnode-gateway/src/services/dispatch.rs
// ============================================
//! # Dispatcher
//!
//! ## Creation Reason
//! Fans concentrator frames out to the node tasks by destination address
//! and owns the registry of running nodes.
//!
//! ## Main Functionality
//! - `Dispatcher`: node registry plus per-frame routing
//! - Node registration and two-phase deregistration
//! - Data confirmation for every accepted data request
//!
//! ## Routing
//! ```text
//! frame ──► 0x17 data request? ──no──► AdminHandler ──► [reply] ──► OutboundSender
//!                 │
//!                yes
//!                 │
//!          parse_downlink_request ──err──► drop (debug)
//!                 │
//!          data confirm (0x18) ──► OutboundSender
//!                 │
//!          dst_addr == ffff ──► every node
//!          registered       ──► that node
//!          otherwise        ──► drop (debug)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Registry references are never held across an `.await`; forwarding
//!   is a non-blocking `try_send`
//! - A full node queue drops the frame instead of stalling every node
//!
//! ## Last Modified
//! v0.1.0 - Initial dispatcher

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinSet;
use tracing::{debug, info, trace, warn};

use coordnode_common::types::{NodeAddress, PanId};
use coordnode_core::crypto::Ecdh;
use coordnode_core::protocol::codec::{make_data_confirm, parse_downlink_request, WdcCodec};
use coordnode_core::protocol::{DownlinkRequest, STATUS_SUCCESS};

use crate::error::{GatewayError, Result};
use crate::handlers::AdminHandler;

use super::node::{spawn_node, AppEndpoint, NodeHandle, NodeOptions};
use super::outbound::OutboundSender;
use super::session::SessionEngine;

// ============================================
// Dispatcher
// ============================================

/// Routes concentrator frames to node tasks.
///
/// # Thread Safety
/// All operations take `&self`; the registry is a `DashMap`.
pub struct Dispatcher {
    /// Running nodes by address
    nodes: DashMap<NodeAddress, NodeHandle>,
    /// Shared writer
    outbound: Arc<OutboundSender>,
    /// Administrative command seam
    admin: Arc<dyn AdminHandler>,
    /// Curve context shared by every engine
    ecdh: Arc<Ecdh>,
    /// PAN of the emulated nodes
    pan: PanId,
    /// Per-node task settings
    options: NodeOptions,
    /// Requests handed to a node queue
    routed: AtomicU64,
    /// Requests dropped (malformed, unknown address, full queue)
    dropped: AtomicU64,
}

impl Dispatcher {
    /// Creates a dispatcher with no nodes.
    pub fn new(
        outbound: Arc<OutboundSender>,
        admin: Arc<dyn AdminHandler>,
        ecdh: Arc<Ecdh>,
        pan: PanId,
        options: NodeOptions,
    ) -> Self {
        Self {
            nodes: DashMap::new(),
            outbound,
            admin,
            ecdh,
            pan,
            options,
            routed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Spawns a node task for `addr`.
    ///
    /// # Errors
    /// - `ConfigInvalid` for the broadcast address
    /// - `NodeExists` if `addr` is already registered
    pub fn register(&self, addr: NodeAddress) -> Result<AppEndpoint> {
        if addr.is_broadcast() {
            return Err(GatewayError::config_invalid(
                "nodes",
                "the broadcast address cannot be registered",
            ));
        }

        match self.nodes.entry(addr) {
            Entry::Occupied(_) => Err(GatewayError::NodeExists(addr)),
            Entry::Vacant(slot) => {
                let engine = SessionEngine::new(Arc::clone(&self.ecdh), self.pan, addr);
                let (handle, endpoint) =
                    spawn_node(engine, Arc::clone(&self.outbound), &self.options);
                slot.insert(handle);
                info!(node = %addr, "Node registered");
                Ok(endpoint)
            }
        }
    }

    /// Removes `addr` and waits for its task to drain.
    ///
    /// # Errors
    /// Returns `NodeNotFound` if `addr` is not registered.
    pub async fn deregister(&self, addr: NodeAddress, within: Duration) -> Result<()> {
        let (_, handle) = self
            .nodes
            .remove(&addr)
            .ok_or(GatewayError::NodeNotFound(addr))?;
        handle.close(within).await;
        info!(node = %addr, "Node deregistered");
        Ok(())
    }

    /// Closes every node concurrently, each bounded by `within`.
    pub async fn shutdown_all(&self, within: Duration) {
        let addrs: Vec<NodeAddress> = self.nodes.iter().map(|e| *e.key()).collect();
        let mut closing = JoinSet::new();
        for addr in addrs {
            if let Some((_, handle)) = self.nodes.remove(&addr) {
                closing.spawn(handle.close(within));
            }
        }

        let total = closing.len();
        let mut clean = 0usize;
        while let Some(result) = closing.join_next().await {
            if matches!(result, Ok(true)) {
                clean += 1;
            }
        }
        info!(total, clean, "All nodes stopped");
    }

    /// Handles one frame from the concentrator.
    pub async fn dispatch(&self, frame: &[u8]) {
        trace!(frame = %hex::encode(frame), "Frame received");

        if !WdcCodec::is_data_request(frame) {
            if let Some(reply) = self.admin.handle(frame) {
                // failures are counted and logged by the sender
                let _ = self.outbound.send(&reply).await;
            }
            return;
        }

        let req = match parse_downlink_request(frame) {
            Ok(req) => req,
            Err(e) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(error = %e, "Dropping data request");
                return;
            }
        };

        let _ = self
            .outbound
            .send(&make_data_confirm(req.handle, STATUS_SUCCESS))
            .await;

        if req.dst_addr.is_broadcast() {
            for node in self.nodes.iter() {
                self.forward(node.value(), req.clone());
            }
        } else if let Some(node) = self.nodes.get(&req.dst_addr) {
            self.forward(node.value(), req);
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            debug!(node = %req.dst_addr, "No node registered for address");
        }
    }

    fn forward(&self, node: &NodeHandle, req: DownlinkRequest) {
        match node.forward(req) {
            Ok(()) => {
                self.routed.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(node = %node.address(), "Node queue full, dropping request");
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(node = %node.address(), "Node task gone, dropping request");
            }
        }
    }

    /// Number of registered nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if `addr` is registered.
    #[must_use]
    pub fn contains(&self, addr: &NodeAddress) -> bool {
        self.nodes.contains_key(addr)
    }

    /// Requests handed to node queues so far.
    #[must_use]
    pub fn routed(&self) -> u64 {
        self.routed.load(Ordering::Relaxed)
    }

    /// Requests dropped so far.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pan", &self.pan)
            .field("nodes", &self.node_count())
            .field("routed", &self.routed())
            .field("dropped", &self.dropped())
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use coordnode_common::types::AddressingMode;
    use coordnode_core::crypto::CurveParams;
    use coordnode_core::protocol::codec::{
        encode_downlink_request, parse_uplink_frame, unwrap_indication,
    };
    use coordnode_transport::MockLink;

    use super::*;
    use crate::handlers::RejectingAdmin;

    const PAN: PanId = PanId::new([0x1c, 0xaa]);
    const WAIT: Duration = Duration::from_secs(2);

    fn dispatcher_with(admin: Arc<dyn AdminHandler>) -> (Dispatcher, Arc<MockLink>, Arc<Ecdh>) {
        let link = Arc::new(MockLink::new());
        let outbound = Arc::new(OutboundSender::new(link.clone()));
        let ecdh = Arc::new(Ecdh::new(CurveParams::deployed()).unwrap());
        let dispatcher = Dispatcher::new(
            outbound,
            admin,
            Arc::clone(&ecdh),
            PAN,
            NodeOptions::default(),
        );
        (dispatcher, link, ecdh)
    }

    fn dispatcher() -> (Dispatcher, Arc<MockLink>, Arc<Ecdh>) {
        dispatcher_with(Arc::new(RejectingAdmin))
    }

    fn nik_request(ecdh: &Ecdh, handle: u8, dst_addr: NodeAddress) -> Bytes {
        let pair = ecdh.generate_key_pair();
        let mut msdu = vec![0x01];
        msdu.extend_from_slice(pair.public_bytes());
        let tx_options = match dst_addr.mode() {
            AddressingMode::Short => 0x00,
            AddressingMode::Long => 0x08,
        };
        encode_downlink_request(&DownlinkRequest {
            handle,
            tx_options,
            dst_pan: PAN,
            dst_addr,
            payload: Bytes::from(msdu),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_register_and_duplicate() {
        let (dispatcher, _, _) = dispatcher();
        let addr = NodeAddress::from_index(3);

        let endpoint = dispatcher.register(addr).unwrap();
        assert_eq!(endpoint.address, addr);
        assert!(dispatcher.contains(&addr));
        assert!(matches!(
            dispatcher.register(addr),
            Err(GatewayError::NodeExists(a)) if a == addr
        ));
        assert!(dispatcher.register(NodeAddress::BROADCAST).is_err());
        assert_eq!(dispatcher.node_count(), 1);
    }

    #[tokio::test]
    async fn test_nik_request_is_confirmed_and_answered() {
        let (dispatcher, link, ecdh) = dispatcher();
        dispatcher.register(NodeAddress::from_index(0)).unwrap();

        dispatcher
            .dispatch(&nik_request(&ecdh, 0x42, NodeAddress::from_index(0)))
            .await;
        assert!(link.wait_for_sent(2, WAIT).await);

        let sent = link.take_sent();
        assert_eq!(sent[0], vec![0x02, 0x18, 0x42, 0x00]);

        let ind = unwrap_indication(&sent[1]).unwrap();
        let frame = parse_uplink_frame(&ind.mac_frame, AddressingMode::Short, false).unwrap();
        assert_eq!(frame.message_id, 0x02);
        assert!(ecdh.check_public(&frame.payload));
        assert_eq!(dispatcher.routed(), 1);
    }

    #[tokio::test]
    async fn test_long_address_node() {
        let (dispatcher, link, ecdh) = dispatcher();
        let addr = NodeAddress::Long([0, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77]);
        dispatcher.register(addr).unwrap();

        dispatcher.dispatch(&nik_request(&ecdh, 1, addr)).await;
        assert!(link.wait_for_sent(2, WAIT).await);

        let sent = link.take_sent();
        let ind = unwrap_indication(&sent[1]).unwrap();
        let frame = parse_uplink_frame(&ind.mac_frame, AddressingMode::Long, false).unwrap();
        assert_eq!(frame.header.src_addr, addr);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_node() {
        let (dispatcher, link, ecdh) = dispatcher();
        for i in 0..3 {
            dispatcher.register(NodeAddress::from_index(i)).unwrap();
        }

        dispatcher
            .dispatch(&nik_request(&ecdh, 7, NodeAddress::BROADCAST))
            .await;
        // one confirmation plus one reply per node
        assert!(link.wait_for_sent(4, WAIT).await);
        assert_eq!(dispatcher.routed(), 3);
    }

    #[tokio::test]
    async fn test_unknown_address_and_malformed_frames_dropped() {
        let (dispatcher, link, ecdh) = dispatcher();
        dispatcher.register(NodeAddress::from_index(0)).unwrap();

        dispatcher
            .dispatch(&nik_request(&ecdh, 1, NodeAddress::from_index(9)))
            .await;
        // length byte claims more MSDU than present
        dispatcher
            .dispatch(&[0x08, 0x17, 0x01, 0x00, 0x1c, 0xaa, 0x00, 0x00, 0x05, 0x01])
            .await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        // the known-format request was still confirmed
        assert_eq!(link.take_sent(), vec![vec![0x02, 0x18, 0x01, 0x00]]);
        assert_eq!(dispatcher.dropped(), 2);
        assert_eq!(dispatcher.routed(), 0);
    }

    #[tokio::test]
    async fn test_admin_frames_use_admin_handler() {
        struct Ack;
        impl AdminHandler for Ack {
            fn handle(&self, frame: &[u8]) -> Option<Bytes> {
                Some(Bytes::from(vec![0x02, frame[1] + 1, 0x00]))
            }
        }

        let (ack, link, _) = dispatcher_with(Arc::new(Ack));
        ack.dispatch(&[0x01, 0x01]).await;
        assert_eq!(link.take_sent(), vec![vec![0x02, 0x02, 0x00]]);

        let (rejecting, link, _) = dispatcher();
        rejecting.dispatch(&[0x01, 0x10]).await;
        assert_eq!(link.take_sent(), vec![vec![0x01, 0x00, 0x01]]);
        assert_eq!(rejecting.routed(), 0);
    }

    #[tokio::test]
    async fn test_deregister_and_shutdown() {
        let (dispatcher, _, _) = dispatcher();
        for i in 0..4 {
            dispatcher.register(NodeAddress::from_index(i)).unwrap();
        }

        dispatcher
            .deregister(NodeAddress::from_index(0), WAIT)
            .await
            .unwrap();
        assert!(matches!(
            dispatcher.deregister(NodeAddress::from_index(0), WAIT).await,
            Err(GatewayError::NodeNotFound(_))
        ));
        assert_eq!(dispatcher.node_count(), 3);

        dispatcher.shutdown_all(WAIT).await;
        assert_eq!(dispatcher.node_count(), 0);
    }
}
