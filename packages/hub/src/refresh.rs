//! Auto-refresh schedule for active report groups.

use std::time::Duration;

use ractor::ActorRef;
use tokio::task::JoinHandle;

use crate::messages::HubMessage;

/// Explicitly owned handle for the periodic re-push of active groups.
///
/// The owner of the hub's lifecycle starts and stops this; there is no
/// timer implicitly tied to the first or last connection. Dropping the
/// handle stops the schedule.
pub struct AutoRefresh {
    handle: JoinHandle<()>,
}

impl AutoRefresh {
    /// Start ticking the hub at the given interval.
    ///
    /// Each tick re-pushes every group that currently has members. The
    /// first tick fires one full interval after start.
    pub fn start(hub: ActorRef<HubMessage>, period: Duration) -> Self {
        tracing::info!("Starting auto-refresh every {:?}", period);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick of a tokio interval completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if hub.send_message(HubMessage::Tick).is_err() {
                    break;
                }
            }
        });

        Self { handle }
    }

    /// Stop the schedule.
    pub fn stop(self) {
        tracing::info!("Stopping auto-refresh");
        // Drop aborts the task.
    }

    /// Whether the schedule task is still alive.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
