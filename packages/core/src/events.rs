//! Wire protocol between clients and the fan-out hub.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::report::{DataType, ReportKind, ReportPayload};

/// Unique identifier for a connected client session.
///
/// Owned by the transport layer; created on connect, destroyed on
/// disconnect. A physical reconnect yields a brand-new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub Ulid);

impl ClientId {
    /// Create a new unique client ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Record broadcast to all clients when a transaction is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionNotice {
    pub transaction_id: i64,
    pub amount: f64,
    pub department: String,
    pub timestamp: DateTime<Utc>,
}

/// Record broadcast to all clients when stock falls below reorder level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAlert {
    pub product_id: i64,
    pub product_name: String,
    pub current_stock: i32,
    pub reorder_level: i32,
    pub timestamp: DateTime<Utc>,
}

/// Events pushed from the hub to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// New departmental report data for a subscribed group.
    UpdateDepartmentalReport { payload: ReportPayload },
    /// New hourly report data for a subscribed group.
    UpdateHourlyReport { payload: ReportPayload },
    /// New employee report data for a subscribed group.
    UpdateEmployeeReport { payload: ReportPayload },
    /// New payment report data for a subscribed group.
    UpdatePaymentReport { payload: ReportPayload },
    /// A report query failed; sent to the triggering caller only.
    ReportError { message: String },
    /// A transaction was recorded (broadcast, unscoped).
    NewTransaction { record: TransactionNotice },
    /// A product fell below its reorder level (broadcast, unscoped).
    LowStockAlert { record: StockAlert },
    /// Liveness reply to a ping command.
    Pong,
}

impl ClientEvent {
    /// Wrap a payload in the update event matching its report kind.
    pub fn report_update(payload: ReportPayload) -> Self {
        match payload.kind() {
            ReportKind::Departmental => Self::UpdateDepartmentalReport { payload },
            ReportKind::Hourly => Self::UpdateHourlyReport { payload },
            ReportKind::Employee => Self::UpdateEmployeeReport { payload },
            ReportKind::Payment => Self::UpdatePaymentReport { payload },
        }
    }

    /// The payload carried by a report update event, if any.
    pub fn payload(&self) -> Option<&ReportPayload> {
        match self {
            Self::UpdateDepartmentalReport { payload }
            | Self::UpdateHourlyReport { payload }
            | Self::UpdateEmployeeReport { payload }
            | Self::UpdatePaymentReport { payload } => Some(payload),
            _ => None,
        }
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            Self::UpdateDepartmentalReport { .. } => "departmental report update".to_string(),
            Self::UpdateHourlyReport { .. } => "hourly report update".to_string(),
            Self::UpdateEmployeeReport { .. } => "employee report update".to_string(),
            Self::UpdatePaymentReport { .. } => "payment report update".to_string(),
            Self::ReportError { message } => format!("report error: {}", message),
            Self::NewTransaction { record } => {
                format!("transaction {} for {:.2}", record.transaction_id, record.amount)
            }
            Self::LowStockAlert { record } => {
                format!("low stock: {} ({} left)", record.product_name, record.current_stock)
            }
            Self::Pong => "pong".to_string(),
        }
    }
}

fn default_data_type() -> DataType {
    DataType::default()
}

/// Commands sent from a client to the hub over the push transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum HubCommand {
    /// Join the group for a report view and receive an immediate snapshot.
    SubscribeToReport {
        report_type: String,
        from_date: NaiveDate,
        to_date: NaiveDate,
        #[serde(default = "default_data_type")]
        data_type: DataType,
    },
    /// Leave the group for a report view.
    UnsubscribeFromReport {
        report_type: String,
        from_date: NaiveDate,
        to_date: NaiveDate,
        #[serde(default = "default_data_type")]
        data_type: DataType,
    },
    /// Announce a recorded transaction to every connected client.
    NotifyNewTransaction {
        transaction_id: i64,
        amount: f64,
        department: String,
    },
    /// Announce a low stock condition to every connected client.
    NotifyLowStock {
        product_id: i64,
        product_name: String,
        current_stock: i32,
        reorder_level: i32,
    },
    /// Liveness check; answered with `ClientEvent::Pong`.
    Ping,
}
