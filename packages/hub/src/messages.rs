//! Message types for the fan-out hub actor.

use chrono::NaiveDate;
use ractor::RpcReplyPort;
use report_core::{ClientEvent, ClientId, DataType, GroupKey};
use tokio::sync::mpsc;

/// Messages for the HubActor.
#[derive(Debug)]
pub enum HubMessage {
    /// A new client connection; bookkeeping only, no side effects.
    Connect {
        client: ClientId,
        sender: mpsc::UnboundedSender<ClientEvent>,
    },

    /// A client disconnected; drops its handle and all memberships.
    Disconnect { client: ClientId },

    /// Join a report group and receive an immediate snapshot.
    ///
    /// An unrecognized report type is ignored with a logged warning.
    SubscribeToReport {
        client: ClientId,
        report_type: String,
        from_date: NaiveDate,
        to_date: NaiveDate,
        data_type: DataType,
    },

    /// Leave a report group. No-op if the client was never a member.
    UnsubscribeFromReport {
        client: ClientId,
        report_type: String,
        from_date: NaiveDate,
        to_date: NaiveDate,
        data_type: DataType,
    },

    /// Query the provider and fan the payload out to the group.
    ///
    /// A provider failure is reported back to `triggered_by` only, if
    /// present; otherwise it is logged and swallowed.
    PushUpdate {
        key: GroupKey,
        triggered_by: Option<ClientId>,
    },

    /// Broadcast a new-transaction notice to every connected client.
    NotifyNewTransaction {
        transaction_id: i64,
        amount: f64,
        department: String,
    },

    /// Broadcast a low-stock alert to every connected client.
    NotifyLowStock {
        product_id: i64,
        product_name: String,
        current_stock: i32,
        reorder_level: i32,
    },

    /// Liveness check.
    Ping { reply: RpcReplyPort<String> },

    /// Number of currently connected clients.
    GetConnectionCount { reply: RpcReplyPort<usize> },

    /// Re-push every group that currently has members.
    Tick,
}

/// Error type for hub lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("Failed to spawn hub actor: {0}")]
    Spawn(#[from] ractor::SpawnErr),
}
