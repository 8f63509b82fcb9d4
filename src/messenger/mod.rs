//! Cross-context messenger
//!
//! A narrow request/response contract between the popup, content scripts
//! and block page on one side and the background responder on the other,
//! plus a fire-and-forget broadcast of [`OutboundMessage`]s.

pub mod client;
pub mod protocol;
pub mod responder;
pub mod tabs;

use std::time::Duration;
use tokio::sync::mpsc;

pub use client::{BlockChecker, MessengerClient, PendingCall, DEFAULT_REQUEST_TIMEOUT};
pub use protocol::{BlockCheck, Envelope, MessageSender, OutboundMessage, Request, Response};
pub use responder::Messenger;
pub use tabs::{EventTabController, TabController};

/// Create a connected client and the receiver the responder serves
pub fn channel(timeout: Duration) -> (MessengerClient, mpsc::Receiver<PendingCall>) {
    let (tx, rx) = mpsc::channel(64);
    (MessengerClient::new(tx, timeout), rx)
}
