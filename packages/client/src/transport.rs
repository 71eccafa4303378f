//! Push transport seam.

use std::future::Future;
use std::pin::Pin;

use report_core::{ClientEvent, HubCommand};
use tokio::sync::mpsc;

/// A live push session toward the hub.
///
/// The `events` channel closing is the transport-reported disconnect.
#[derive(Debug)]
pub struct PushLink {
    /// Commands toward the hub.
    pub commands: mpsc::UnboundedSender<HubCommand>,
    /// Events pushed by the hub.
    pub events: mpsc::UnboundedReceiver<ClientEvent>,
}

/// Future type for transport handshakes.
pub type ConnectFuture = Pin<Box<dyn Future<Output = Result<PushLink, String>> + Send>>;

/// Seam to whatever carries the persistent server-to-client channel.
///
/// The session manager calls `connect` once per attempt; attempts are
/// never overlapped.
pub trait PushTransport: Send + Sync + 'static {
    /// Perform the handshake and return a live link.
    fn connect(&self) -> ConnectFuture;
}
