//! Client session manager for the real-time report layer.
//!
//! This crate owns one logical connection to the fan-out hub and mediates
//! between push delivery and a timer-based polling fallback.
//!
//! # Architecture
//!
//! - `SessionActor` - the reconnect/fallback state machine
//! - `PushTransport` - seam to whatever carries the push channel
//! - `RefreshClient` - seam for the stateless HTTP refresh used while polling
//! - `LoopbackTransport` - in-process transport straight into a hub actor
//!
//! # Usage
//!
//! ```ignore
//! use client::{start_session, SessionArgs, LoopbackTransport, HttpRefreshClient};
//!
//! let (session, handle) = start_session(args).await?;
//! session.send_message(SessionMessage::ChangeView(view))?;
//! ```

mod loopback;
mod messages;
mod refresh;
mod session;
mod transport;

pub use loopback::LoopbackTransport;
pub use messages::{ActiveView, SessionEvent, SessionMessage, SessionPhase};
pub use refresh::{HttpRefreshClient, RefreshClient, RefreshFuture, RefreshResult};
pub use session::{start_session, SessionActor, SessionArgs, SessionError};
pub use transport::{ConnectFuture, PushLink, PushTransport};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort};
