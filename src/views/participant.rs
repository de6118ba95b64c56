use super::user::UserView;
use crate::models;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantView {
    pub id: i32,
    pub user: UserView,
    pub role: models::Role,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_online: bool,
    pub last_read_at: Option<DateTime<Utc>>,
}

impl From<models::ParticipantProfile> for ParticipantView {
    fn from(profile: models::ParticipantProfile) -> Self {
        Self {
            id: profile.id,
            user: UserView {
                id: profile.user_id,
                username: profile.username,
                first_name: profile.first_name,
                last_name: profile.last_name,
                is_agent: profile.user_role.is_agent(),
            },
            role: profile.role,
            joined_at: profile.joined_at,
            left_at: profile.left_at,
            is_active: profile.is_active,
            is_online: profile.is_online,
            last_read_at: profile.last_read_at,
        }
    }
}
