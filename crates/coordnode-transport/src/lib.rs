// ============================================
// File: crates/coordnode-transport/src/lib.rs
// ============================================
//! # Coordnode Transport - Concentrator Link Layer
//!
//! ## Creation Reason
//! Provides the byte link between the gateway and the WDC concentrator,
//! behind a trait so the gateway can be tested without a socket.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`traits`]: `LinkTransport` trait definition
//! - [`udp`]: UDP datagram link to a concentrator bridge
//! - [`mock`]: In-memory link for tests
//! - [`error`]: Transport-specific error types
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              coordnode-gateway                      │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │   coordnode-core       coordnode-transport         │
//! │         │              You are here ◄──            │
//! │         ▼                                          │
//! │   coordnode-common                                 │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Always use traits for testability
//! - The transport knows nothing about WDC framing or node addressing;
//!   it moves opaque frames and depends on no other workspace crate
//!
//! ## Last Modified
//! v0.1.0 - Initial transport layer implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod mock;
pub mod traits;
pub mod udp;

// Re-export primary types
pub use error::{Result, TransportError};
pub use mock::MockLink;
pub use traits::{LinkTransport, DEFAULT_RECV_TIMEOUT};
pub use udp::UdpLink;
