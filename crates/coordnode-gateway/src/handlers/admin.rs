// ============================================
// File: crates/coordnode-gateway/src/handlers/admin.rs
// ============================================
//! # Administrative Command Seam
//!
//! ## Creation Reason
//! Connect, disconnect, reset and TDMA control commands are answered by a
//! stateless lookup table that lives outside the gateway. The dispatcher
//! only needs somewhere to hand those frames.
//!
//! ## Main Functionality
//! - `AdminHandler`: trait the dispatcher calls for every non-data frame
//! - `RejectingAdmin`: default implementation, answers every command with
//!   a wrong-command error report
//!
//! ## ⚠️ Important Note for Next Developer
//! - Replies must already be complete WDC frames; the dispatcher writes
//!   them through the shared outbound sender untouched
//! - Handlers run on the dispatcher's receive loop, keep them cheap
//! - A deployment with a real command table plugs it in through
//!   `Gateway::with_admin`; the default knows no command at all
//!
//! ## Last Modified
//! v0.1.0 - Initial admin seam

use bytes::Bytes;
use tracing::debug;

use coordnode_core::protocol::codec::{make_error_report, WdcCodec};
use coordnode_core::protocol::ERROR_WRONG_CMD;

/// Handles administrative WDC commands.
pub trait AdminHandler: Send + Sync {
    /// Processes one administrative frame.
    ///
    /// Returns the response frame to send back, if any.
    fn handle(&self, frame: &[u8]) -> Option<Bytes>;
}

/// Admin handler that knows no command.
///
/// Every frame carrying a command tag is answered with an error report
/// (`ERROR_WRONG_CMD`). Frames too short to carry a tag get no reply.
#[derive(Debug, Default, Clone, Copy)]
pub struct RejectingAdmin;

impl AdminHandler for RejectingAdmin {
    fn handle(&self, frame: &[u8]) -> Option<Bytes> {
        match WdcCodec::peek_command(frame) {
            Some(command) => {
                debug!(command = %hex::encode([command]), "Rejecting administrative command");
                Some(make_error_report(ERROR_WRONG_CMD))
            }
            None => {
                debug!(len = frame.len(), "Ignoring truncated frame");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_command_gets_error_report() {
        let admin = RejectingAdmin;
        let reply = admin.handle(&[0x02, 0x01, 0x00]).unwrap();
        assert_eq!(&reply[..], &[0x01, 0x00, ERROR_WRONG_CMD]);
        assert_eq!(admin.handle(&[0x00, 0x15]), Some(reply));
    }

    #[test]
    fn test_truncated_frame_gets_no_reply() {
        let admin = RejectingAdmin;
        assert!(admin.handle(&[]).is_none());
        assert!(admin.handle(&[0x05]).is_none());
    }

    #[test]
    fn test_trait_object() {
        struct Echo;
        impl AdminHandler for Echo {
            fn handle(&self, frame: &[u8]) -> Option<Bytes> {
                Some(Bytes::copy_from_slice(frame))
            }
        }

        let handlers: Vec<Box<dyn AdminHandler>> = vec![Box::new(RejectingAdmin), Box::new(Echo)];
        let replies: Vec<_> = handlers.iter().map(|h| h.handle(&[0x01, 0x03])).collect();
        assert_eq!(replies[0].as_deref(), Some(&[0x01, 0x00, 0x01][..]));
        assert_eq!(replies[1].as_deref(), Some(&[0x01, 0x03][..]));
    }
}
