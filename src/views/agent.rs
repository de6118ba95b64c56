use chrono::{DateTime, Utc};
use serde::Serialize;

/// One agent currently holding an open notification channel.
#[derive(Debug, Clone, Serialize)]
pub struct AgentPresence {
    pub user_id: String,
    pub username: String,
    pub since: DateTime<Utc>,
}
