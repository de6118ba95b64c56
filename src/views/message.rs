use super::user::UserView;
use crate::models;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: UserView,
    pub content: String,
    pub message_type: models::MessageType,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub is_edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MessageView {
    /// Used on the streaming path, where the sender is already in hand.
    pub fn from_message(message: models::Message, sender: &models::User) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender: UserView::from(sender),
            content: message.content,
            message_type: message.message_type,
            is_read: message.is_read,
            read_at: message.read_at,
            is_edited: message.is_edited,
            created_at: message.created_at,
            updated_at: message.updated_at,
        }
    }
}

impl From<models::MessageWithSender> for MessageView {
    fn from(row: models::MessageWithSender) -> Self {
        Self {
            id: row.id,
            conversation_id: row.conversation_id,
            sender: UserView {
                id: row.sender_id,
                username: row.username,
                first_name: row.first_name,
                last_name: row.last_name,
                is_agent: row.sender_role.is_agent(),
            },
            content: row.content,
            message_type: row.message_type,
            is_read: row.is_read,
            read_at: row.read_at,
            is_edited: row.is_edited,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
