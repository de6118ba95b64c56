pub mod event;
pub mod notification;
pub mod server;
pub mod session;

pub use event::{ClientEvent, ServerEvent};
pub use notification::AgentNotificationSession;
pub use server::ChatServer;
pub use session::{ChatSession, RejectSession};

use std::time::Duration;

/// Heartbeat ping interval for every WebSocket actor.
pub(crate) const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
/// Close the connection if no heartbeat response arrives within this window.
pub(crate) const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Close code for connections without a resolvable identity.
pub const CLOSE_UNAUTHENTICATED: u16 = 4001;
/// Close code for authenticated users who are not conversation participants
/// (or non-agents on the agent notification channel).
pub const CLOSE_NOT_PARTICIPANT: u16 = 4003;
