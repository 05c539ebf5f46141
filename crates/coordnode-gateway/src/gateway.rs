// ============================================
// File: crates/coordnode-gateway/src/gateway.rs
// ============================================
//! # Gateway Orchestrator
//!
//! ## Creation Reason
//! Wires configuration, curve context, transport, outbound sender and
//! dispatcher together and owns the gateway lifecycle.
//!
//! ## Main Functionality
//! - `Gateway`: lifecycle entry point (`run`, `start`, `shutdown`)
//! - `RunningGateway`: a started gateway; endpoints, stop
//! - Receive loop feeding the dispatcher
//!
//! ## Gateway Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Gateway                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │   LinkTransport ──► receive task ──► Dispatcher             │
//! │        ▲                                 │                  │
//! │        │                     ┌───────────┼───────────┐      │
//! │        │                     ▼           ▼           ▼      │
//! │        │                  node 0000   node 0001   node …    │
//! │        │                     │           │           │      │
//! │        │                     └───────────┼───────────┘      │
//! │        │                                 ▼                  │
//! │        └──────────────────────────── OutboundSender         │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Shutdown Order
//! 1. Stop the receive task (no new inbound work)
//! 2. Close every node; queued uplinks are drained
//! 3. Shut the transport down
//!
//! Every phase is bounded by `limits.shutdown_timeout_secs`.
//!
//! ## ⚠️ Important Note for Next Developer
//! - `start` needs a running Tokio runtime; it spawns the node tasks
//! - `run` binds the UDP link itself; tests use `start` with a `MockLink`
//!
//! ## Last Modified
//! v0.1.0 - Initial gateway implementation

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use coordnode_common::types::NodeAddress;
use coordnode_core::crypto::Ecdh;
use coordnode_transport::{LinkTransport, UdpLink};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::handlers::{AdminHandler, RejectingAdmin};
use crate::services::{AppEndpoint, Dispatcher, NodeOptions, OutboundSender, SampleReport};

// ============================================
// Gateway
// ============================================

/// Coordinator-node gateway.
///
/// # Lifecycle
/// 1. Create with `Gateway::new(config)`
/// 2. Start with `gateway.run().await`
/// 3. Shutdown via `shutdown()` or Ctrl+C
pub struct Gateway {
    /// Gateway configuration.
    config: GatewayConfig,
    /// Administrative command seam.
    admin: Arc<dyn AdminHandler>,
    /// Shutdown flag.
    shutdown: Arc<AtomicBool>,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
}

impl Gateway {
    /// Creates a new gateway instance.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            admin: Arc::new(RejectingAdmin),
            shutdown: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Replaces the administrative command handler.
    #[must_use]
    pub fn with_admin(mut self, admin: Arc<dyn AdminHandler>) -> Self {
        self.admin = admin;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Runs the gateway on a UDP link until shutdown.
    ///
    /// Application data received by the nodes is logged.
    ///
    /// # Errors
    /// Returns error if the gateway fails to start.
    pub async fn run(&self) -> Result<()> {
        info!("Starting coordnode gateway v{}", env!("CARGO_PKG_VERSION"));

        let link = UdpLink::bind(
            self.config.network.listen_addr,
            self.config.network.concentrator_addr,
        )
        .await
        .map_err(|e| GatewayError::startup_failed(format!("UDP bind failed: {e}")))?;

        let mut running = self.start(Arc::new(link))?;
        let mut loggers = Vec::new();
        for addr in self.config.node_addresses() {
            if let Some(endpoint) = running.take_endpoint(&addr) {
                loggers.push(spawn_app_logger(endpoint));
            }
        }

        info!("Gateway started successfully");

        self.wait_for_shutdown().await;

        info!("Shutting down gateway...");
        running.stop().await;
        for logger in loggers {
            logger.abort();
        }

        info!("Gateway shutdown complete");
        Ok(())
    }

    /// Starts the gateway on `transport` and returns immediately.
    ///
    /// # Errors
    /// - `Core(UnsupportedCurve)` if the curve constants are not supported
    /// - `ConfigInvalid` if node settings are invalid
    pub fn start(&self, transport: Arc<dyn LinkTransport>) -> Result<RunningGateway> {
        let ecdh = Arc::new(Ecdh::new(self.config.crypto.clone())?);
        let outbound = Arc::new(OutboundSender::new(Arc::clone(&transport)));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&outbound),
            Arc::clone(&self.admin),
            ecdh,
            self.config.radio.pan_id,
            self.node_options()?,
        ));

        let mut endpoints = HashMap::new();
        for addr in self.config.node_addresses() {
            let endpoint = dispatcher.register(addr)?;
            endpoints.insert(addr, endpoint);
        }
        info!(
            pan = %self.config.radio.pan_id,
            nodes = endpoints.len(),
            "Nodes registered"
        );

        let recv_task = self.spawn_receive_task(Arc::clone(&transport), Arc::clone(&dispatcher));

        Ok(RunningGateway {
            dispatcher,
            outbound,
            transport,
            endpoints,
            recv_task,
            shutdown: Arc::clone(&self.shutdown),
            shutdown_tx: self.shutdown_tx.clone(),
            timeout: self.config.shutdown_timeout(),
        })
    }

    /// Triggers gateway shutdown programmatically.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
    }

    fn node_options(&self) -> Result<NodeOptions> {
        let report = match self.config.nodes.report_interval() {
            Some(interval) => Some(SampleReport {
                interval,
                payload: Bytes::from(self.config.nodes.report_payload_bytes()?),
            }),
            None => None,
        };
        Ok(NodeOptions {
            trailing: Bytes::from(self.config.trailing()),
            queue_depth: self.config.limits.queue_depth,
            report,
        })
    }

    /// Spawns the receive loop.
    fn spawn_receive_task(
        &self,
        transport: Arc<dyn LinkTransport>,
        dispatcher: Arc<Dispatcher>,
    ) -> JoinHandle<()> {
        let shutdown = Arc::clone(&self.shutdown);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Receive task received shutdown signal");
                        break;
                    }
                    result = transport.recv() => {
                        match result {
                            Ok(frame) => {
                                if shutdown.load(Ordering::SeqCst) {
                                    break;
                                }
                                dispatcher.dispatch(&frame).await;
                            }
                            Err(e) if e.is_closed() => {
                                debug!("Transport closed");
                                break;
                            }
                            Err(e) => {
                                if !shutdown.load(Ordering::SeqCst) {
                                    error!("Transport receive error: {}", e);
                                }
                            }
                        }
                    }
                }
            }

            debug!("Receive task exiting");
        })
    }

    /// Waits for shutdown signal (Ctrl+C or programmatic).
    async fn wait_for_shutdown(&self) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        if self.shutdown.load(Ordering::SeqCst) {
            return;
        }

        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => info!("Received shutdown signal"),
                Err(e) => {
                    error!("Failed to listen for Ctrl+C: {}", e);
                    let _ = shutdown_rx.recv().await;
                }
            },
            _ = shutdown_rx.recv() => info!("Shutdown requested"),
        }
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("listen_addr", &self.config.network.listen_addr)
            .field("concentrator_addr", &self.config.network.concentrator_addr)
            .field("pan_id", &self.config.radio.pan_id)
            .finish_non_exhaustive()
    }
}

// ============================================
// RunningGateway
// ============================================

/// A started gateway.
pub struct RunningGateway {
    dispatcher: Arc<Dispatcher>,
    outbound: Arc<OutboundSender>,
    transport: Arc<dyn LinkTransport>,
    endpoints: HashMap<NodeAddress, AppEndpoint>,
    recv_task: JoinHandle<()>,
    shutdown: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    timeout: Duration,
}

impl RunningGateway {
    /// Takes the application endpoint of a configured node.
    pub fn take_endpoint(&mut self, addr: &NodeAddress) -> Option<AppEndpoint> {
        self.endpoints.remove(addr)
    }

    /// Returns the dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Returns the outbound sender.
    #[must_use]
    pub const fn outbound(&self) -> &Arc<OutboundSender> {
        &self.outbound
    }

    /// Stops receiving, drains every node and shuts the transport down.
    pub async fn stop(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(self.timeout, self.recv_task).await {
            Ok(Ok(())) => debug!("Receive task completed"),
            Ok(Err(e)) => warn!("Receive task failed: {}", e),
            Err(_) => warn!("Receive task timed out during shutdown"),
        }

        self.dispatcher.shutdown_all(self.timeout).await;

        if let Err(e) = self.transport.shutdown().await {
            warn!("Transport shutdown error: {}", e);
        }
        info!(
            frames_sent = self.outbound.frames_sent(),
            send_errors = self.outbound.send_errors(),
            "Gateway stopped"
        );
    }
}

impl std::fmt::Debug for RunningGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningGateway")
            .field("dispatcher", &self.dispatcher)
            .field("outbound", &self.outbound)
            .field("unclaimed_endpoints", &self.endpoints.len())
            .finish_non_exhaustive()
    }
}

/// Logs application data a node receives.
fn spawn_app_logger(endpoint: AppEndpoint) -> JoinHandle<()> {
    tokio::spawn(async move {
        // keeps the outgoing side open for the node's lifetime
        let AppEndpoint {
            address,
            outgoing: _outgoing,
            mut incoming,
        } = endpoint;
        while let Some(payload) = incoming.recv().await {
            info!(node = %address, data = %hex::encode(&payload), "Application data");
        }
    })
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use coordnode_common::types::AddressingMode;
    use coordnode_core::protocol::codec::{
        encode_downlink_request, parse_uplink_frame, unwrap_indication,
    };
    use coordnode_core::protocol::DownlinkRequest;
    use coordnode_transport::MockLink;

    use super::*;

    const WAIT: Duration = Duration::from_secs(2);

    fn config(count: u16) -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.nodes.count = count;
        config.limits.shutdown_timeout_secs = 2;
        config
    }

    fn nik_frame(gateway: &Gateway, addr: NodeAddress) -> Bytes {
        let ecdh = Ecdh::new(gateway.config().crypto.clone()).unwrap();
        let pair = ecdh.generate_key_pair();
        let mut msdu = vec![0x01];
        msdu.extend_from_slice(pair.public_bytes());
        encode_downlink_request(&DownlinkRequest {
            handle: 5,
            tx_options: 0,
            dst_pan: gateway.config().radio.pan_id,
            dst_addr: addr,
            payload: Bytes::from(msdu),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_start_registers_configured_nodes() {
        let gateway = Gateway::new(config(3));
        let link = Arc::new(MockLink::new());
        let mut running = gateway.start(link).unwrap();

        assert_eq!(running.dispatcher().node_count(), 3);
        assert!(running.take_endpoint(&NodeAddress::from_index(2)).is_some());
        assert!(running.take_endpoint(&NodeAddress::from_index(2)).is_none());
        running.stop().await;
    }

    #[tokio::test]
    async fn test_end_to_end_nik_exchange() {
        let gateway = Gateway::new(config(1));
        let link = Arc::new(MockLink::new());
        let running = gateway.start(link.clone()).unwrap();

        link.inject_frame(nik_frame(&gateway, NodeAddress::from_index(0)))
            .unwrap();
        assert!(link.wait_for_sent(2, WAIT).await);

        let sent = link.take_sent();
        assert_eq!(sent[0], vec![0x02, 0x18, 0x05, 0x00]);
        let ind = unwrap_indication(&sent[1]).unwrap();
        assert_eq!(ind.trailing.len(), 6);
        let frame = parse_uplink_frame(&ind.mac_frame, AddressingMode::Short, false).unwrap();
        assert_eq!(frame.message_id, 0x02);
        assert_eq!(frame.payload.len(), 64);

        running.stop().await;
        assert!(!link.is_active());
    }

    #[tokio::test]
    async fn test_shutdown_before_run_returns_immediately() {
        let mut config = config(1);
        config.network.listen_addr = "127.0.0.1:0".parse().unwrap();
        let gateway = Arc::new(Gateway::new(config));
        gateway.shutdown();

        let result = tokio::time::timeout(WAIT, gateway.run()).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mut config = config(2);
        config.network.listen_addr = "127.0.0.1:0".parse().unwrap();
        let gateway = Arc::new(Gateway::new(config));

        let task = {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move { gateway.run().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        gateway.shutdown();

        let result = tokio::time::timeout(WAIT, task).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }

    #[tokio::test]
    async fn test_unsupported_curve_is_fatal() {
        let mut config = config(1);
        config.crypto.b = "07".to_string();
        let gateway = Gateway::new(config);

        let err = gateway.start(Arc::new(MockLink::new())).unwrap_err();
        assert!(err.is_fatal());
    }
}
