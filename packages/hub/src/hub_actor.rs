//! Fan-out hub actor: the connection-facing side of the notification layer.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use report_core::{
    ClientEvent, ClientId, DataType, DateRange, GroupKey, ReportKind, StockAlert,
    TransactionNotice,
};
use tokio::sync::mpsc;

use crate::messages::{HubError, HubMessage};
use crate::provider::ReportProvider;
use crate::registry::SubscriptionRegistry;

/// State for the hub actor.
///
/// The connection map is owned here explicitly; there is no process-global
/// connection manager to look up.
pub struct HubState {
    /// Report computation seam.
    provider: Arc<dyn ReportProvider>,
    /// Group membership.
    registry: Arc<SubscriptionRegistry>,
    /// Push channel per connected client.
    connections: HashMap<ClientId, mpsc::UnboundedSender<ClientEvent>>,
}

impl HubState {
    /// Create hub state around a report provider.
    pub fn new(provider: Arc<dyn ReportProvider>) -> Self {
        Self {
            provider,
            registry: Arc::new(SubscriptionRegistry::new()),
            connections: HashMap::new(),
        }
    }

    /// The shared subscription registry.
    pub fn registry(&self) -> Arc<SubscriptionRegistry> {
        self.registry.clone()
    }

    /// Deliver an event to one client, skipping dead channels.
    fn send_to(&self, client: ClientId, event: ClientEvent) {
        if let Some(sender) = self.connections.get(&client) {
            if sender.send(event).is_err() {
                tracing::debug!("Dropped event for closed connection {}", client);
            }
        }
    }

    /// Deliver an event to every connected client.
    fn send_to_all(&self, event: &ClientEvent) {
        tracing::debug!(
            "Broadcasting {} to {} clients",
            event.description(),
            self.connections.len()
        );
        for (client, sender) in &self.connections {
            if sender.send(event.clone()).is_err() {
                tracing::debug!("Dropped broadcast for closed connection {}", client);
            }
        }
    }

    /// Fetch the group's payload and fan it out to the membership snapshot.
    ///
    /// A provider failure is surfaced to `triggered_by` only; other
    /// members receive nothing for the failed attempt.
    async fn push_group(&self, key: &GroupKey, triggered_by: Option<ClientId>) {
        let members = self.registry.members_of(key);
        if members.is_empty() {
            tracing::debug!("No members in group {}, skipping push", key);
            return;
        }

        match self.provider.fetch(key).await {
            Ok(payload) => {
                let event = ClientEvent::report_update(payload);
                for member in members {
                    self.send_to(member, event.clone());
                }
            }
            Err(message) => {
                tracing::warn!("Report query failed for group {}: {}", key, message);
                if let Some(caller) = triggered_by {
                    self.send_to(caller, ClientEvent::ReportError { message });
                }
            }
        }
    }
}

fn group_key(
    report_type: &str,
    from_date: chrono::NaiveDate,
    to_date: chrono::NaiveDate,
    data_type: DataType,
) -> Option<GroupKey> {
    let kind = ReportKind::parse(report_type)?;
    Some(GroupKey::new(
        kind,
        DateRange::new(from_date, to_date),
        data_type,
    ))
}

/// Fan-out hub actor.
///
/// Invoked concurrently by many independent connections; message handling
/// serializes registry mutation against fan-out iteration.
pub struct HubActor;

impl Actor for HubActor {
    type Msg = HubMessage;
    type State = HubState;
    type Arguments = Arc<dyn ReportProvider>;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        provider: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting report fan-out hub");
        Ok(HubState::new(provider))
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            HubMessage::Connect { client, sender } => {
                state.connections.insert(client, sender);
                tracing::debug!("Client {} connected", client);
            }

            HubMessage::Disconnect { client } => {
                state.connections.remove(&client);
                state.registry.remove_client(client);
                tracing::debug!("Client {} disconnected", client);
            }

            HubMessage::SubscribeToReport {
                client,
                report_type,
                from_date,
                to_date,
                data_type,
            } => {
                let Some(key) = group_key(&report_type, from_date, to_date, data_type) else {
                    tracing::warn!(
                        "Client {} asked for unknown report type '{}', ignoring",
                        client,
                        report_type
                    );
                    return Ok(());
                };

                state.registry.subscribe(client, key.clone());

                // Send initial data immediately so the subscriber can
                // render without waiting for the next change trigger.
                match state.provider.fetch(&key).await {
                    Ok(payload) => {
                        state.send_to(client, ClientEvent::report_update(payload));
                    }
                    Err(message) => {
                        tracing::warn!("Snapshot query failed for group {}: {}", key, message);
                        state.send_to(client, ClientEvent::ReportError { message });
                    }
                }
            }

            HubMessage::UnsubscribeFromReport {
                client,
                report_type,
                from_date,
                to_date,
                data_type,
            } => {
                if let Some(key) = group_key(&report_type, from_date, to_date, data_type) {
                    state.registry.unsubscribe(client, &key);
                }
            }

            HubMessage::PushUpdate { key, triggered_by } => {
                state.push_group(&key, triggered_by).await;
            }

            HubMessage::NotifyNewTransaction {
                transaction_id,
                amount,
                department,
            } => {
                state.send_to_all(&ClientEvent::NewTransaction {
                    record: TransactionNotice {
                        transaction_id,
                        amount,
                        department,
                        timestamp: Utc::now(),
                    },
                });
            }

            HubMessage::NotifyLowStock {
                product_id,
                product_name,
                current_stock,
                reorder_level,
            } => {
                state.send_to_all(&ClientEvent::LowStockAlert {
                    record: StockAlert {
                        product_id,
                        product_name,
                        current_stock,
                        reorder_level,
                        timestamp: Utc::now(),
                    },
                });
            }

            HubMessage::Ping { reply } => {
                let _ = reply.send("pong".to_string());
            }

            HubMessage::GetConnectionCount { reply } => {
                let _ = reply.send(state.connections.len());
            }

            HubMessage::Tick => {
                for key in state.registry.group_keys() {
                    state.push_group(&key, None).await;
                }
            }
        }

        Ok(())
    }
}

/// Spawn the fan-out hub around a report provider.
pub async fn start_hub(
    provider: Arc<dyn ReportProvider>,
) -> Result<(ActorRef<HubMessage>, tokio::task::JoinHandle<()>), HubError> {
    let (actor, handle) = Actor::spawn(None, HubActor, provider).await?;

    Ok((actor, handle))
}
