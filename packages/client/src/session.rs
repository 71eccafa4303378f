//! Session actor: reconnect and fallback state machine.

use std::sync::Arc;

use ractor::{Actor, ActorProcessingErr, ActorRef};
use report_core::{ClientEvent, HubCommand, RealtimeConfig};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::messages::{ActiveView, SessionEvent, SessionMessage, SessionPhase};
use crate::refresh::RefreshClient;
use crate::transport::PushTransport;

/// Arguments for spawning a session.
pub struct SessionArgs {
    pub config: RealtimeConfig,
    pub transport: Arc<dyn PushTransport>,
    pub refresh: Arc<dyn RefreshClient>,
    /// The report view shown when the session starts.
    pub view: ActiveView,
    /// Where rendered updates and notifications go.
    pub sink: mpsc::UnboundedSender<SessionEvent>,
}

/// State for the session actor.
pub struct SessionState {
    config: RealtimeConfig,
    transport: Arc<dyn PushTransport>,
    refresh: Arc<dyn RefreshClient>,
    sink: mpsc::UnboundedSender<SessionEvent>,
    view: ActiveView,
    phase: SessionPhase,
    /// Failed connect attempts since the last successful handshake.
    attempts: u32,
    /// Command half of the live push link, while connected.
    commands: Option<mpsc::UnboundedSender<HubCommand>>,
    /// Task forwarding push events into the mailbox.
    reader: Option<JoinHandle<()>>,
    /// Pending reconnect delay.
    retry_timer: Option<JoinHandle<()>>,
    /// Fallback polling interval.
    poll_timer: Option<JoinHandle<()>>,
}

impl SessionState {
    fn new(args: SessionArgs) -> Self {
        Self {
            config: args.config,
            transport: args.transport,
            refresh: args.refresh,
            sink: args.sink,
            view: args.view,
            phase: SessionPhase::Uninitialized,
            attempts: 0,
            commands: None,
            reader: None,
            retry_timer: None,
            poll_timer: None,
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.sink.send(event);
    }

    /// Fire a command over the live link, if any.
    fn send_command(&self, command: HubCommand) {
        if let Some(commands) = &self.commands {
            let _ = commands.send(command);
        }
    }

    fn cancel_retry(&mut self) {
        if let Some(timer) = self.retry_timer.take() {
            timer.abort();
        }
    }

    fn cancel_polling(&mut self) {
        if let Some(timer) = self.poll_timer.take() {
            timer.abort();
        }
    }

    fn drop_link(&mut self) {
        self.commands = None;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }

    /// Kick off one serialized connect attempt.
    fn start_connect(&mut self, myself: &ActorRef<SessionMessage>) {
        self.phase = SessionPhase::Connecting;
        let transport = self.transport.clone();
        let session = myself.clone();
        tokio::spawn(async move {
            let result = transport.connect().await;
            let _ = session.send_message(SessionMessage::ConnectFinished(result));
        });
    }

    /// Wait out the reconnect delay, then try again.
    fn schedule_retry(&mut self, myself: &ActorRef<SessionMessage>) {
        self.phase = SessionPhase::Retrying;
        let delay = self.config.reconnect_delay();
        let session = myself.clone();
        self.retry_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = session.send_message(SessionMessage::RetryTick);
        }));
    }

    /// Count a failed attempt, then retry or give up and poll.
    fn handle_connect_failure(&mut self, myself: &ActorRef<SessionMessage>) {
        self.attempts += 1;
        if self.attempts < self.config.reconnect_attempts {
            tracing::info!(
                "Connect attempt {} of {} failed, retrying in {:?}",
                self.attempts,
                self.config.reconnect_attempts,
                self.config.reconnect_delay()
            );
            self.schedule_retry(myself);
        } else {
            tracing::warn!("Reconnect budget exhausted, degrading to polling");
            self.enter_fallback(myself);
            self.emit(SessionEvent::Degraded);
        }
    }

    /// Start the unconditional polling timer. Push stays off until an
    /// explicit reinitialization.
    fn enter_fallback(&mut self, myself: &ActorRef<SessionMessage>) {
        self.cancel_retry();
        self.drop_link();
        self.phase = SessionPhase::FallbackPolling;

        let period = self.config.poll_interval();
        let session = myself.clone();
        self.poll_timer = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick of a tokio interval completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if session.send_message(SessionMessage::PollTick).is_err() {
                    break;
                }
            }
        }));
    }
}

/// Client session manager actor.
///
/// One logical timeline: at most one delivery mechanism (push or polling)
/// is live at any moment, and connect attempts never overlap.
pub struct SessionActor;

impl Actor for SessionActor {
    type Msg = SessionMessage;
    type State = SessionState;
    type Arguments = SessionArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let enable_push = args.config.enable_push;
        let mut state = SessionState::new(args);

        if enable_push {
            tracing::info!("Starting session with push transport");
            state.start_connect(&myself);
        } else {
            tracing::info!("Push disabled by configuration, polling only");
            state.enter_fallback(&myself);
        }

        Ok(state)
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.cancel_retry();
        state.cancel_polling();
        state.drop_link();
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SessionMessage::ConnectFinished(result) => {
                if state.phase != SessionPhase::Connecting {
                    // A stale handshake from before a teardown/reinit.
                    return Ok(());
                }
                match result {
                    Ok(link) => {
                        tracing::info!("Push transport connected");
                        state.phase = SessionPhase::Connected;
                        state.attempts = 0;
                        state.cancel_polling();

                        state.commands = Some(link.commands);
                        let mut events = link.events;
                        let session = myself.clone();
                        state.reader = Some(tokio::spawn(async move {
                            while let Some(event) = events.recv().await {
                                if session
                                    .send_message(SessionMessage::PushEvent(event))
                                    .is_err()
                                {
                                    return;
                                }
                            }
                            let _ = session.send_message(SessionMessage::TransportClosed);
                        }));

                        // Restore server-side group membership; the hub
                        // holds nothing across reconnects.
                        state.send_command(state.view.subscribe());
                    }
                    Err(error) => {
                        tracing::debug!("Push handshake failed: {}", error);
                        state.handle_connect_failure(&myself);
                    }
                }
            }

            SessionMessage::PushEvent(event) => {
                match event {
                    ClientEvent::UpdateDepartmentalReport { payload }
                    | ClientEvent::UpdateHourlyReport { payload }
                    | ClientEvent::UpdateEmployeeReport { payload }
                    | ClientEvent::UpdatePaymentReport { payload } => {
                        state.emit(SessionEvent::Update(payload));
                    }
                    ClientEvent::ReportError { message } => {
                        state.emit(SessionEvent::Error(message));
                    }
                    ClientEvent::NewTransaction { record } => {
                        state.emit(SessionEvent::Notification(record));
                    }
                    ClientEvent::LowStockAlert { record } => {
                        state.emit(SessionEvent::StockWarning(record));
                    }
                    ClientEvent::Pong => {
                        tracing::debug!("Pong from hub");
                    }
                }
            }

            SessionMessage::TransportClosed => {
                if state.phase == SessionPhase::Connected {
                    tracing::info!("Push transport lost, reconnecting");
                    state.drop_link();
                    state.schedule_retry(&myself);
                }
            }

            SessionMessage::RetryTick => {
                if state.phase == SessionPhase::Retrying {
                    state.retry_timer = None;
                    state.start_connect(&myself);
                }
            }

            SessionMessage::PollTick => {
                if state.phase != SessionPhase::FallbackPolling {
                    return Ok(());
                }
                match state.refresh.refresh(&state.view).await {
                    Ok(payload) => state.emit(SessionEvent::Update(payload)),
                    Err(error) => {
                        // Stale data stays on screen until the next poll.
                        tracing::error!("Fallback refresh failed: {}", error);
                    }
                }
            }

            SessionMessage::ChangeView(view) => {
                if view == state.view {
                    return Ok(());
                }
                if state.phase == SessionPhase::Connected {
                    // Leave the old group before joining the new one, or
                    // abandoned views pile up in the registry.
                    state.send_command(state.view.unsubscribe());
                    state.send_command(view.subscribe());
                }
                state.view = view;
            }

            SessionMessage::Reinitialize => {
                tracing::info!("Reinitializing push transport");
                state.cancel_polling();
                state.cancel_retry();
                state.drop_link();
                state.attempts = 0;
                state.start_connect(&myself);
            }

            SessionMessage::Teardown => {
                if state.phase == SessionPhase::Connected {
                    // Fire-and-forget; the process is going away anyway.
                    state.send_command(state.view.unsubscribe());
                }
                myself.stop(None);
            }

            SessionMessage::GetPhase { reply } => {
                let _ = reply.send(state.phase);
            }
        }

        Ok(())
    }
}

/// Error type for session lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to spawn session actor: {0}")]
    Spawn(#[from] ractor::SpawnErr),
}

/// Spawn the session manager.
pub async fn start_session(
    args: SessionArgs,
) -> Result<(ActorRef<SessionMessage>, tokio::task::JoinHandle<()>), SessionError> {
    let (actor, handle) = Actor::spawn(None, SessionActor, args).await?;

    Ok((actor, handle))
}
