use crate::models;
use sqlx::PgExecutor;
use tracing::Instrument;
use uuid::Uuid;

/// Adds a participant, reactivating the existing row if the pair was seen
/// before. The role never changes after the first insert.
pub async fn insert(
    db: impl PgExecutor<'_>,
    conversation_id: Uuid,
    user_id: &str,
    role: models::Role,
) -> Result<models::Participant, sqlx::Error> {
    let query_span = tracing::info_span!("Inserting conversation participant.");
    sqlx::query_as::<_, models::Participant>(
        r#"INSERT INTO conversation_participants (conversation_id, user_id, role, is_active)
           VALUES ($1, $2, $3, TRUE)
           ON CONFLICT (conversation_id, user_id)
           DO UPDATE SET is_active = TRUE, left_at = NULL
           RETURNING id, conversation_id, user_id, role, is_active, is_online,
                     joined_at, left_at, last_read_at"#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .bind(role)
    .fetch_one(db)
    .instrument(query_span)
    .await
}

pub async fn fetch(
    db: impl PgExecutor<'_>,
    conversation_id: Uuid,
    user_id: &str,
) -> Result<Option<models::Participant>, sqlx::Error> {
    let query_span = tracing::info_span!("Fetching participant.");
    sqlx::query_as::<_, models::Participant>(
        r#"SELECT id, conversation_id, user_id, role, is_active, is_online,
                  joined_at, left_at, last_read_at
           FROM conversation_participants
           WHERE conversation_id = $1 AND user_id = $2"#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_optional(db)
    .instrument(query_span)
    .await
}

/// Active membership check used by every broker operation.
pub async fn fetch_active(
    db: impl PgExecutor<'_>,
    conversation_id: Uuid,
    user_id: &str,
) -> Result<Option<models::Participant>, sqlx::Error> {
    let query_span = tracing::info_span!("Fetching active participant.");
    sqlx::query_as::<_, models::Participant>(
        r#"SELECT id, conversation_id, user_id, role, is_active, is_online,
                  joined_at, left_at, last_read_at
           FROM conversation_participants
           WHERE conversation_id = $1 AND user_id = $2 AND is_active"#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_optional(db)
    .instrument(query_span)
    .await
}

/// Participants joined with the user directory, oldest joiner first.
pub async fn fetch_profiles(
    db: impl PgExecutor<'_>,
    conversation_id: Uuid,
) -> Result<Vec<models::ParticipantProfile>, sqlx::Error> {
    let query_span = tracing::info_span!("Fetching participant profiles.");
    sqlx::query_as::<_, models::ParticipantProfile>(
        r#"SELECT cp.id, cp.conversation_id, cp.user_id, cp.role, cp.is_active,
                  cp.is_online, cp.joined_at, cp.left_at, cp.last_read_at,
                  u.username, u.first_name, u.last_name, u.role AS user_role
           FROM conversation_participants cp
           JOIN users u ON u.id = cp.user_id
           WHERE cp.conversation_id = $1
           ORDER BY cp.joined_at ASC"#,
    )
    .bind(conversation_id)
    .fetch_all(db)
    .instrument(query_span)
    .await
}

/// Whether the given agent is an active participant of the conversation.
pub async fn agent_in_conversation(
    db: impl PgExecutor<'_>,
    conversation_id: Uuid,
    agent_id: &str,
) -> Result<bool, sqlx::Error> {
    let query_span = tracing::info_span!("Checking agent membership.");
    sqlx::query_scalar::<_, bool>(
        r#"SELECT EXISTS (
               SELECT 1 FROM conversation_participants
               WHERE conversation_id = $1
                 AND user_id = $2
                 AND role = 'agent'
                 AND is_active
           )"#,
    )
    .bind(conversation_id)
    .bind(agent_id)
    .fetch_one(db)
    .instrument(query_span)
    .await
}

pub async fn deactivate_all(
    db: impl PgExecutor<'_>,
    conversation_id: Uuid,
) -> Result<(), sqlx::Error> {
    let query_span = tracing::info_span!("Deactivating conversation participants.");
    sqlx::query(
        r#"UPDATE conversation_participants
           SET is_active = FALSE, left_at = NOW()
           WHERE conversation_id = $1"#,
    )
    .bind(conversation_id)
    .execute(db)
    .instrument(query_span)
    .await
    .map(|_| ())
}

/// Soft presence flag; loss on restart is acceptable.
pub async fn set_online(
    db: impl PgExecutor<'_>,
    conversation_id: Uuid,
    user_id: &str,
    is_online: bool,
) -> Result<(), sqlx::Error> {
    let query_span = tracing::info_span!("Updating participant online flag.");
    sqlx::query(
        r#"UPDATE conversation_participants
           SET is_online = $3
           WHERE conversation_id = $1 AND user_id = $2"#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .bind(is_online)
    .execute(db)
    .instrument(query_span)
    .await
    .map(|_| ())
}

/// Advances `last_read_at` to now; calling twice is harmless.
pub async fn mark_read(
    db: impl PgExecutor<'_>,
    conversation_id: Uuid,
    user_id: &str,
) -> Result<(), sqlx::Error> {
    let query_span = tracing::info_span!("Advancing participant read marker.");
    sqlx::query(
        r#"UPDATE conversation_participants
           SET last_read_at = NOW()
           WHERE conversation_id = $1 AND user_id = $2"#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .execute(db)
    .instrument(query_span)
    .await
    .map(|_| ())
}
