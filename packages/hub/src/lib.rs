//! Server side of the real-time report notification layer.
//!
//! This crate provides the ractor-based fan-out hub that lets connected
//! clients join report groups and receive pushed updates.
//!
//! # Architecture
//!
//! - `SubscriptionRegistry` - maps group keys to member sets
//! - `HubActor` - connection-facing actor that fans payloads out to groups
//! - `ReportProvider` - seam to the external report computation service
//! - `AutoRefresh` - explicitly owned schedule that re-pushes active groups
//!
//! # Usage
//!
//! ```ignore
//! use hub::{start_hub, attach_client, AutoRefresh};
//!
//! let (hub, handle) = start_hub(provider).await?;
//! let link = attach_client(hub.clone());
//! let refresh = AutoRefresh::start(hub.clone(), Duration::from_secs(30));
//! ```

mod connection;
mod hub_actor;
mod messages;
mod provider;
mod refresh;
pub mod registry;

pub use connection::{attach_client, ClientLink};
pub use hub_actor::{start_hub, HubActor, HubState};
pub use messages::{HubError, HubMessage};
pub use provider::{FnProvider, ProviderFuture, ProviderResult, ReportProvider};
pub use refresh::AutoRefresh;
pub use registry::SubscriptionRegistry;

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort};
