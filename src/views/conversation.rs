use super::message::MessageView;
use super::participant::ParticipantView;
use crate::models;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// List-item representation: participants, last message, caller's unread.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub id: Uuid,
    pub title: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub participants: Vec<ParticipantView>,
    pub participants_count: usize,
    pub last_message: Option<MessageView>,
    pub unread_count: i64,
}

/// Detail representation: adds the recent-message window and the "other
/// participant" shortcut for 1:1 conversations.
#[derive(Debug, Clone, Serialize)]
pub struct Detail {
    pub id: Uuid,
    pub title: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub participants: Vec<ParticipantView>,
    pub recent_messages: Vec<MessageView>,
    pub unread_count: i64,
    pub other_participant: Option<ParticipantView>,
}

/// Body of the create-or-get response; `created` distinguishes 201 from 200.
#[derive(Debug, Clone, Serialize)]
pub struct CreateResult {
    pub conversation: Detail,
    pub created: bool,
}

impl Summary {
    pub fn new(
        conversation: models::Conversation,
        participants: Vec<ParticipantView>,
        last_message: Option<MessageView>,
        unread_count: i64,
    ) -> Self {
        let participants_count = participants.iter().filter(|p| p.is_active).count();
        Self {
            id: conversation.id,
            title: conversation.title,
            is_active: conversation.is_active,
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
            participants,
            participants_count,
            last_message,
            unread_count,
        }
    }
}

impl Detail {
    pub fn new(
        conversation: models::Conversation,
        participants: Vec<ParticipantView>,
        recent_messages: Vec<MessageView>,
        unread_count: i64,
        caller_id: &str,
    ) -> Self {
        let other_participant = participants
            .iter()
            .find(|p| p.user.id != caller_id)
            .cloned();
        Self {
            id: conversation.id,
            title: conversation.title,
            is_active: conversation.is_active,
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
            participants,
            recent_messages,
            unread_count,
            other_participant,
        }
    }
}
