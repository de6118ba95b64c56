use super::assignment;
use super::error::ConversationError;
use crate::db;
use crate::models;
use crate::ws::event::ServerEvent;
use crate::ws::server::{ChatServer, NotifyAgent};
use actix::Addr;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

/// The broker: validates membership, mutates the store transactionally and
/// hands results back for the caller to broadcast. Persistence always
/// precedes broadcast; a message other sessions see is recoverable from
/// history.
pub struct ConversationService<'a> {
    pg: &'a PgPool,
    server: &'a Addr<ChatServer>,
}

impl<'a> ConversationService<'a> {
    pub fn new(pg: &'a PgPool, server: &'a Addr<ChatServer>) -> Self {
        Self { pg, server }
    }

    /// Returns the caller's reusable active conversation, or creates one:
    /// user participant, assigned agent (if any), announcement message,
    /// agent notification. The created flag distinguishes 201 from 200.
    pub async fn get_or_create(
        &self,
        user: &models::User,
        requested_agent_id: Option<&str>,
    ) -> Result<(models::Conversation, bool), ConversationError> {
        {
            let mut conn = self.pg.acquire().await?;
            if let Some(conversation) =
                find_reusable(&mut conn, user, requested_agent_id).await?
            {
                return Ok((conversation, false));
            }
        }

        let mut tx = self.pg.begin().await?;

        // serializes concurrent creates for the same user; the loser of the
        // race finds the winner's conversation on the re-check below
        db::conversation::advisory_lock_for_user(&mut *tx, &user.id).await?;
        if let Some(conversation) = find_reusable(&mut tx, user, requested_agent_id).await? {
            tx.commit().await?;
            return Ok((conversation, false));
        }

        let title = format!("Conversation with {}", user.username);
        let conversation = db::conversation::insert(&mut *tx, Some(&title)).await?;
        db::participant::insert(&mut *tx, conversation.id, &user.id, models::Role::User).await?;

        let agent = assignment::assign_agent(&mut tx, requested_agent_id).await?;
        if let Some(agent) = &agent {
            db::participant::insert(&mut *tx, conversation.id, &agent.id, models::Role::Agent)
                .await?;

            let announcement =
                format!("Agent {} has joined the conversation.", agent.full_name());
            db::message::insert(
                &mut *tx,
                conversation.id,
                &agent.id,
                &announcement,
                models::MessageType::System,
            )
            .await?;
        }

        tx.commit().await?;

        // after commit: a notification failure must never unwind creation
        if let Some(agent) = agent {
            let event = if requested_agent_id.is_some() {
                ServerEvent::conversation_assigned(conversation.id, user)
            } else {
                ServerEvent::new_conversation_request(conversation.id, user)
            };
            self.server.do_send(NotifyAgent {
                agent_id: agent.id,
                event,
            });
        }

        Ok((conversation, true))
    }

    /// Persists a message and bumps the conversation timestamp in one
    /// transaction. Callers broadcast the returned message afterwards.
    pub async fn send_message(
        &self,
        conversation_id: Uuid,
        sender: &models::User,
        content: &str,
        message_type: models::MessageType,
    ) -> Result<models::Message, ConversationError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ConversationError::Validation(
                "Message content cannot be empty".to_string(),
            ));
        }

        let mut tx = self.pg.begin().await?;

        let conversation = db::conversation::fetch(&mut *tx, conversation_id)
            .await?
            .ok_or_else(|| ConversationError::NotFound("Conversation not found".to_string()))?;
        if !conversation.is_active {
            return Err(ConversationError::PermissionDenied(
                "This conversation is closed.".to_string(),
            ));
        }

        db::participant::fetch_active(&mut *tx, conversation_id, &sender.id)
            .await?
            .ok_or_else(ConversationError::not_a_participant)?;

        let message = db::message::insert(
            &mut *tx,
            conversation_id,
            &sender.id,
            content,
            message_type,
        )
        .await?;
        db::conversation::touch(&mut *tx, conversation_id).await?;

        tx.commit().await?;
        Ok(message)
    }

    /// Advances the caller's read marker to now. Safe to repeat.
    pub async fn mark_read(
        &self,
        conversation_id: Uuid,
        user: &models::User,
    ) -> Result<(), ConversationError> {
        db::participant::fetch_active(self.pg, conversation_id, &user.id)
            .await?
            .ok_or_else(ConversationError::not_a_participant)?;

        db::participant::mark_read(self.pg, conversation_id, &user.id).await?;
        Ok(())
    }

    /// Deactivates the conversation and every participant. Terminal: all
    /// later state-changing operations fail the membership check.
    pub async fn close(
        &self,
        conversation_id: Uuid,
        user: &models::User,
    ) -> Result<models::Conversation, ConversationError> {
        let mut tx = self.pg.begin().await?;

        let conversation = db::conversation::fetch(&mut *tx, conversation_id)
            .await?
            .ok_or_else(|| ConversationError::NotFound("Conversation not found".to_string()))?;

        db::participant::fetch_active(&mut *tx, conversation_id, &user.id)
            .await?
            .ok_or_else(ConversationError::not_a_participant)?;

        db::conversation::deactivate(&mut *tx, conversation_id).await?;
        db::participant::deactivate_all(&mut *tx, conversation_id).await?;

        tx.commit().await?;
        Ok(conversation)
    }

    /// Conversation plus the caller's active membership row, for retrieval
    /// operations.
    pub async fn validate_access(
        &self,
        conversation_id: Uuid,
        user_id: &str,
    ) -> Result<(models::Conversation, models::Participant), ConversationError> {
        let conversation = db::conversation::fetch(self.pg, conversation_id)
            .await?
            .ok_or_else(|| ConversationError::NotFound("Conversation not found".to_string()))?;

        let participant = db::participant::fetch_active(self.pg, conversation_id, user_id)
            .await?
            .ok_or_else(ConversationError::not_a_participant)?;

        Ok((conversation, participant))
    }

    pub async fn unread_count(
        &self,
        participant: &models::Participant,
    ) -> Result<i64, ConversationError> {
        db::message::unread_count(
            self.pg,
            participant.conversation_id,
            &participant.user_id,
            participant.last_read_at,
        )
        .await
        .map_err(Into::into)
    }

    /// A history page, newest first; `before` anchors strictly earlier
    /// messages. An unknown anchor is ignored rather than failing the read.
    pub async fn history(
        &self,
        conversation_id: Uuid,
        user_id: &str,
        before: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<models::MessageWithSender>, ConversationError> {
        self.validate_access(conversation_id, user_id).await?;

        let before_created_at = match before {
            Some(message_id) => db::message::fetch(self.pg, message_id)
                .await?
                .filter(|m| m.conversation_id == conversation_id)
                .map(|m| m.created_at),
            None => None,
        };

        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        db::message::fetch_page_with_senders(self.pg, conversation_id, before_created_at, limit)
            .await
            .map_err(Into::into)
    }
}

async fn find_reusable(
    conn: &mut PgConnection,
    user: &models::User,
    requested_agent_id: Option<&str>,
) -> Result<Option<models::Conversation>, ConversationError> {
    let Some(conversation) = db::conversation::fetch_active_for_user(&mut *conn, &user.id).await?
    else {
        return Ok(None);
    };

    match requested_agent_id {
        None => Ok(Some(conversation)),
        Some(agent_id) => {
            let present =
                db::participant::agent_in_conversation(&mut *conn, conversation.id, agent_id)
                    .await?;
            Ok(present.then_some(conversation))
        }
    }
}
