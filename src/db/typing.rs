use crate::models;
use sqlx::PgExecutor;
use tracing::Instrument;
use uuid::Uuid;

/// Upserts the advisory typing flag for a (conversation, user) pair.
pub async fn upsert(
    db: impl PgExecutor<'_>,
    conversation_id: Uuid,
    user_id: &str,
    is_typing: bool,
) -> Result<models::TypingIndicator, sqlx::Error> {
    let query_span = tracing::info_span!("Upserting typing indicator.");
    sqlx::query_as::<_, models::TypingIndicator>(
        r#"INSERT INTO typing_indicators (conversation_id, user_id, is_typing)
           VALUES ($1, $2, $3)
           ON CONFLICT (conversation_id, user_id)
           DO UPDATE SET is_typing = EXCLUDED.is_typing, last_typed_at = NOW()
           RETURNING id, conversation_id, user_id, is_typing, last_typed_at"#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .bind(is_typing)
    .fetch_one(db)
    .instrument(query_span)
    .await
}
