use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Advisory typing state, never authoritative for delivery.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TypingIndicator {
    pub id: i32,
    pub conversation_id: Uuid,
    pub user_id: String,
    pub is_typing: bool,
    pub last_typed_at: DateTime<Utc>,
}
