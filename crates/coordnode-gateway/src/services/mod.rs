// ============================================
// File: crates/coordnode-gateway/src/services/mod.rs
// ============================================
//! # Gateway Services
//!
//! ## Creation Reason
//! Holds the node-facing logic of the gateway, separated from transport
//! and wire-format concerns.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`session`]: per-node key state and handshake state machine
//! - [`node`]: one task per node owning its session engine
//! - [`dispatch`]: routes concentrator frames to node tasks
//! - [`outbound`]: single writer in front of the concentrator link
//!
//! ## Service Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Service Layer                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌──────────────┐      ┌────────────────────────────────┐   │
//! │  │  Dispatcher  │─────►│  node task (one per address)   │   │
//! │  │              │      │   ┌──────────────────────────┐ │   │
//! │  │ - registry   │      │   │      SessionEngine       │ │   │
//! │  │ - routing    │      │   │  NIK → S/AK → SIK/SCK    │ │   │
//! │  └──────┬───────┘      │   └──────────────────────────┘ │   │
//! │         │              └───────────────┬────────────────┘   │
//! │         │                              │                    │
//! │         ▼                              ▼                    │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                 OutboundSender                       │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Session state is owned by exactly one node task; share it by
//!   message passing, never by locking
//! - Only `OutboundSender` may write to the transport
//!
//! ## Last Modified
//! v0.1.0 - Initial services structure

pub mod dispatch;
pub mod node;
pub mod outbound;
pub mod session;

// Re-export primary types
pub use dispatch::Dispatcher;
pub use node::{spawn_node, AppEndpoint, NodeHandle, NodeOptions, SampleReport};
pub use outbound::OutboundSender;
pub use session::{AppMessage, NodeSession, Outcome, SessionEngine, UplinkPolicy};
