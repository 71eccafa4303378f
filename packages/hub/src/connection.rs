//! Transport-neutral attachment of a client connection to the hub.

use ractor::ActorRef;
use report_core::{ClientEvent, ClientId, HubCommand};
use tokio::sync::mpsc;

use crate::messages::HubMessage;

/// A live client connection to the hub.
///
/// Dropping `commands` disconnects: the bridge task tells the hub to
/// release the client's handle and memberships.
pub struct ClientLink {
    /// Identity of this connection.
    pub client_id: ClientId,
    /// Inbound commands toward the hub.
    pub commands: mpsc::UnboundedSender<HubCommand>,
    /// Outbound events pushed by the hub.
    pub events: mpsc::UnboundedReceiver<ClientEvent>,
}

/// Register a new client connection and return its command/event link.
///
/// A spawned bridge task translates wire commands into hub messages and
/// issues the disconnect when the command sender goes away.
pub fn attach_client(hub: ActorRef<HubMessage>) -> ClientLink {
    let client_id = ClientId::new();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (command_tx, mut command_rx) = mpsc::unbounded_channel::<HubCommand>();

    if hub
        .send_message(HubMessage::Connect {
            client: client_id,
            sender: event_tx.clone(),
        })
        .is_err()
    {
        tracing::warn!("Hub is gone, connection {} is stillborn", client_id);
    }

    tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            let message = match command {
                HubCommand::SubscribeToReport {
                    report_type,
                    from_date,
                    to_date,
                    data_type,
                } => HubMessage::SubscribeToReport {
                    client: client_id,
                    report_type,
                    from_date,
                    to_date,
                    data_type,
                },
                HubCommand::UnsubscribeFromReport {
                    report_type,
                    from_date,
                    to_date,
                    data_type,
                } => HubMessage::UnsubscribeFromReport {
                    client: client_id,
                    report_type,
                    from_date,
                    to_date,
                    data_type,
                },
                HubCommand::NotifyNewTransaction {
                    transaction_id,
                    amount,
                    department,
                } => HubMessage::NotifyNewTransaction {
                    transaction_id,
                    amount,
                    department,
                },
                HubCommand::NotifyLowStock {
                    product_id,
                    product_name,
                    current_stock,
                    reorder_level,
                } => HubMessage::NotifyLowStock {
                    product_id,
                    product_name,
                    current_stock,
                    reorder_level,
                },
                HubCommand::Ping => {
                    let result =
                        ractor::rpc::call(&hub, |reply| HubMessage::Ping { reply }, None).await;
                    match result {
                        Ok(ractor::rpc::CallResult::Success(_)) => {
                            let _ = event_tx.send(ClientEvent::Pong);
                        }
                        _ => break,
                    }
                    continue;
                }
            };

            if hub.send_message(message).is_err() {
                break;
            }
        }

        let _ = hub.send_message(HubMessage::Disconnect { client: client_id });
    });

    ClientLink {
        client_id,
        commands: command_tx,
        events: event_rx,
    }
}
