// ============================================
// File: crates/coordnode-common/src/lib.rs
// ============================================
//! # Coordnode Common - Shared Types Library
//!
//! ## Creation Reason
//! Holds the addressing vocabulary every other coordnode crate speaks:
//! PAN identifiers, sensor node addresses and the addressing mode that
//! selects between 16-bit and 64-bit layouts on the wire.
//!
//! ## Main Functionality
//! - [`types`]: `PanId`, `NodeAddress`, `AddressingMode`, `ReplayCounter`
//! - [`error`]: Common error types and result aliases
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              coordnode-gateway                      │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │   coordnode-core       coordnode-transport         │
//! │         │                     │                    │
//! │         └──────────┬──────────┘                    │
//! │                    ▼                               │
//! │            coordnode-common  ◄── You are here      │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This crate is the foundation - changes affect everything
//! - Addresses are stored in wire byte order, never as host integers
//! - Keep dependencies minimal
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{CommonError, Result};
pub use types::{AddressingMode, NodeAddress, PanId, ReplayCounter};
