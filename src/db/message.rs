use crate::models;
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use tracing::Instrument;
use uuid::Uuid;

pub async fn insert(
    db: impl PgExecutor<'_>,
    conversation_id: Uuid,
    sender_id: &str,
    content: &str,
    message_type: models::MessageType,
) -> Result<models::Message, sqlx::Error> {
    let query_span = tracing::info_span!("Inserting new message.");
    sqlx::query_as::<_, models::Message>(
        r#"INSERT INTO messages (conversation_id, sender_id, content, message_type)
           VALUES ($1, $2, $3, $4)
           RETURNING id, conversation_id, sender_id, content, message_type,
                     is_read, read_at, is_edited, created_at, updated_at"#,
    )
    .bind(conversation_id)
    .bind(sender_id)
    .bind(content)
    .bind(message_type)
    .fetch_one(db)
    .instrument(query_span)
    .await
}

pub async fn fetch(
    db: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<models::Message>, sqlx::Error> {
    let query_span = tracing::info_span!("Fetching message by id.");
    sqlx::query_as::<_, models::Message>(
        r#"SELECT id, conversation_id, sender_id, content, message_type,
                  is_read, read_at, is_edited, created_at, updated_at
           FROM messages
           WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(db)
    .instrument(query_span)
    .await
}

/// A page of history, newest first, joined with each sender. `before`
/// bounds the page to messages created strictly earlier; callers reverse
/// for display.
pub async fn fetch_page_with_senders(
    db: impl PgExecutor<'_>,
    conversation_id: Uuid,
    before: Option<DateTime<Utc>>,
    limit: i64,
) -> Result<Vec<models::MessageWithSender>, sqlx::Error> {
    let query_span = tracing::info_span!("Fetching message page with senders.");
    sqlx::query_as::<_, models::MessageWithSender>(
        r#"SELECT m.id, m.conversation_id, m.sender_id, m.content, m.message_type,
                  m.is_read, m.read_at, m.is_edited, m.created_at, m.updated_at,
                  u.username, u.first_name, u.last_name, u.role AS sender_role
           FROM messages m
           JOIN users u ON u.id = m.sender_id
           WHERE m.conversation_id = $1
             AND ($2::timestamptz IS NULL OR m.created_at < $2)
           ORDER BY m.created_at DESC, m.id DESC
           LIMIT $3"#,
    )
    .bind(conversation_id)
    .bind(before)
    .bind(limit)
    .fetch_all(db)
    .instrument(query_span)
    .await
}

/// The most recent message joined with its sender.
pub async fn fetch_last_with_sender(
    db: impl PgExecutor<'_>,
    conversation_id: Uuid,
) -> Result<Option<models::MessageWithSender>, sqlx::Error> {
    let query_span = tracing::info_span!("Fetching last message with sender.");
    sqlx::query_as::<_, models::MessageWithSender>(
        r#"SELECT m.id, m.conversation_id, m.sender_id, m.content, m.message_type,
                  m.is_read, m.read_at, m.is_edited, m.created_at, m.updated_at,
                  u.username, u.first_name, u.last_name, u.role AS sender_role
           FROM messages m
           JOIN users u ON u.id = m.sender_id
           WHERE m.conversation_id = $1
           ORDER BY m.created_at DESC, m.id DESC
           LIMIT 1"#,
    )
    .bind(conversation_id)
    .fetch_optional(db)
    .instrument(query_span)
    .await
}

/// Messages the participant has not read: everything from other senders
/// when no marker is set, otherwise only those created after the marker.
pub async fn unread_count(
    db: impl PgExecutor<'_>,
    conversation_id: Uuid,
    user_id: &str,
    last_read_at: Option<DateTime<Utc>>,
) -> Result<i64, sqlx::Error> {
    let query_span = tracing::info_span!("Counting unread messages.");
    sqlx::query_scalar::<_, i64>(
        r#"SELECT COUNT(*)
           FROM messages
           WHERE conversation_id = $1
             AND sender_id <> $2
             AND ($3::timestamptz IS NULL OR created_at > $3)"#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .bind(last_read_at)
    .fetch_one(db)
    .instrument(query_span)
    .await
}
