//! In-process transport straight into a hub actor.

use hub::{attach_client, ActorRef, HubMessage};

use crate::transport::{ConnectFuture, PushLink, PushTransport};

/// Push transport for embeddings that run the hub in the same process.
///
/// Each connect registers a fresh client with the hub, so a reconnect is
/// a brand-new connection with empty group membership.
pub struct LoopbackTransport {
    hub: ActorRef<HubMessage>,
}

impl LoopbackTransport {
    pub fn new(hub: ActorRef<HubMessage>) -> Self {
        Self { hub }
    }
}

impl PushTransport for LoopbackTransport {
    fn connect(&self) -> ConnectFuture {
        let hub = self.hub.clone();
        Box::pin(async move {
            let link = attach_client(hub);
            Ok(PushLink {
                commands: link.commands,
                events: link.events,
            })
        })
    }
}
