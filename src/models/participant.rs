use super::user::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One (conversation, user) membership row. Unique per pair; the role is
/// fixed at creation, only the activity flags move afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Participant {
    pub id: i32,
    pub conversation_id: Uuid,
    pub user_id: String,
    pub role: Role,
    pub is_active: bool,
    pub is_online: bool,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub last_read_at: Option<DateTime<Utc>>,
}

/// Participant row joined with the user directory, as the API views need it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParticipantProfile {
    pub id: i32,
    pub conversation_id: Uuid,
    pub user_id: String,
    pub role: Role,
    pub is_active: bool,
    pub is_online: bool,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub last_read_at: Option<DateTime<Utc>>,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub user_role: Role,
}
