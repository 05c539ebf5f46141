// ============================================
// File: crates/coordnode-gateway/src/handlers/mod.rs
// ============================================
//! # Frame Handlers
//!
//! ## Creation Reason
//! Hosts the seams for WDC traffic the gateway does not own itself.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`admin`]: administrative WDC commands (connect, disconnect, TDMA)
//!
//! ## Data Flow
//! ```text
//! concentrator frame
//!        │
//!        ▼
//!   Dispatcher ── data request (0x17) ──► node task
//!        │
//!        └──────── anything else ───────► AdminHandler
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial handlers structure

pub mod admin;

pub use admin::{AdminHandler, RejectingAdmin};
