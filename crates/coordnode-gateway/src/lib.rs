// ============================================
// File: crates/coordnode-gateway/src/lib.rs
// ============================================
//! # Coordnode Gateway Library
//!
//! ## Creation Reason
//! Plays the coordinator role for a population of simulated sensor nodes:
//! every data request the concentrator relays is confirmed, routed to the
//! addressed node and answered with an authenticated indication.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`config`]: Gateway configuration management
//! - [`gateway`]: Lifecycle orchestration
//! - [`services`]: Business logic services
//!   - [`services::session`]: Per-node key agreement state machine
//!   - [`services::node`]: One task per node
//!   - [`services::dispatch`]: Frame routing by destination address
//!   - [`services::outbound`]: Single writer to the concentrator
//! - [`handlers`]: Administrative command seam
//! - [`error`]: Gateway-specific error types
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Coordnode Gateway                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────────┐    │
//! │  │   Config    │────►│   Gateway   │────►│   Dispatcher    │    │
//! │  │             │     │ Orchestrator│     │                 │    │
//! │  └─────────────┘     └──────┬──────┘     └────────┬────────┘    │
//! │                             │                     │             │
//! │                             │          ┌──────────┼──────────┐  │
//! │                             │          ▼          ▼          ▼  │
//! │                             │     ┌─────────┐┌─────────┐┌──────┐│
//! │                             │     │ Node    ││ Node    ││ ...  ││
//! │                             │     │ Session ││ Session ││      ││
//! │                             │     └────┬────┘└────┬────┘└──┬───┘│
//! │                             ▼          ▼          ▼        ▼    │
//! │                      ┌──────────────────────────────────────┐   │
//! │                      │           Outbound Sender            │   │
//! │                      └──────────────────────────────────────┘   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                     Concentrator link (UDP)                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data Flow
//! ```text
//! Concentrator → data request → Dispatcher → Node → indication → Concentrator
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Configuration changes require restart (no hot-reload)
//! - Session keys live in memory only; a restart forgets every node
//!
//! ## Last Modified
//! v0.1.0 - Initial gateway library

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod services;

// Re-export primary types
pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use gateway::{Gateway, RunningGateway};
