//! Message and state types for the session actor.

use ractor::RpcReplyPort;
use report_core::{
    ClientEvent, DataType, DateRange, HubCommand, ReportKind, ReportPayload, StockAlert,
    TransactionNotice,
};

use crate::transport::PushLink;

/// The report view currently shown by the UI.
///
/// Derived from UI state (report kind, date range, data type); drives both
/// the active subscription and the fallback refresh request.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveView {
    pub kind: ReportKind,
    pub range: DateRange,
    pub data_type: DataType,
}

impl ActiveView {
    pub fn new(kind: ReportKind, range: DateRange, data_type: DataType) -> Self {
        Self {
            kind,
            range,
            data_type,
        }
    }

    /// The subscribe command for this view.
    pub fn subscribe(&self) -> HubCommand {
        HubCommand::SubscribeToReport {
            report_type: self.kind.as_str().to_string(),
            from_date: self.range.from,
            to_date: self.range.to,
            data_type: self.data_type.clone(),
        }
    }

    /// The unsubscribe command for this view.
    pub fn unsubscribe(&self) -> HubCommand {
        HubCommand::UnsubscribeFromReport {
            report_type: self.kind.as_str().to_string(),
            from_date: self.range.from,
            to_date: self.range.to,
            data_type: self.data_type.clone(),
        }
    }
}

/// Delivery state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Not started yet.
    Uninitialized,
    /// A connect attempt is in flight.
    Connecting,
    /// Push delivery is live.
    Connected,
    /// Waiting out the delay before the next connect attempt.
    Retrying,
    /// Push given up; periodic stateless refresh is active.
    FallbackPolling,
}

/// Events surfaced to the embedding UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Fresh report data for the active view; re-render.
    Update(ReportPayload),
    /// A transaction was recorded somewhere in the store.
    Notification(TransactionNotice),
    /// A product fell below its reorder level.
    StockWarning(StockAlert),
    /// A report query failed server-side.
    Error(String),
    /// The retry budget is spent; the session degraded to polling.
    Degraded,
}

/// Messages for the SessionActor.
#[derive(Debug)]
pub enum SessionMessage {
    /// A handshake finished.
    ConnectFinished(Result<PushLink, String>),

    /// An event arrived over the push channel.
    PushEvent(ClientEvent),

    /// The push channel closed.
    TransportClosed,

    /// The reconnect delay elapsed.
    RetryTick,

    /// The polling interval elapsed.
    PollTick,

    /// The UI switched to a different report view.
    ChangeView(ActiveView),

    /// Abandon polling and start the push handshake over.
    Reinitialize,

    /// Page teardown: best-effort unsubscribe, then stop.
    Teardown,

    /// Current delivery phase (for the UI status indicator).
    GetPhase { reply: RpcReplyPort<SessionPhase> },
}
