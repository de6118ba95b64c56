use crate::models;
use serde::Serialize;

/// Basic user information attached to messages and participants.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_agent: bool,
}

impl From<&models::User> for UserView {
    fn from(user: &models::User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_agent: user.is_agent(),
        }
    }
}
