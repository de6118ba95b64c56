use crate::models;
use sqlx::PgExecutor;
use tracing::Instrument;
use uuid::Uuid;

pub async fn insert(
    db: impl PgExecutor<'_>,
    title: Option<&str>,
) -> Result<models::Conversation, sqlx::Error> {
    let query_span = tracing::info_span!("Inserting new conversation.");
    sqlx::query_as::<_, models::Conversation>(
        r#"INSERT INTO conversations (title)
           VALUES ($1)
           RETURNING id, title, is_active, created_at, updated_at"#,
    )
    .bind(title)
    .fetch_one(db)
    .instrument(query_span)
    .await
}

pub async fn fetch(
    db: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<models::Conversation>, sqlx::Error> {
    let query_span = tracing::info_span!("Fetching conversation by id.");
    sqlx::query_as::<_, models::Conversation>(
        r#"SELECT id, title, is_active, created_at, updated_at
           FROM conversations
           WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(db)
    .instrument(query_span)
    .await
}

/// The caller's most-recently-updated active conversation in which they
/// hold the `user` role.
pub async fn fetch_active_for_user(
    db: impl PgExecutor<'_>,
    user_id: &str,
) -> Result<Option<models::Conversation>, sqlx::Error> {
    let query_span = tracing::info_span!("Fetching active conversation for user.");
    sqlx::query_as::<_, models::Conversation>(
        r#"SELECT c.id, c.title, c.is_active, c.created_at, c.updated_at
           FROM conversations c
           JOIN conversation_participants cp ON cp.conversation_id = c.id
           WHERE cp.user_id = $1
             AND cp.role = 'user'
             AND cp.is_active
             AND c.is_active
           ORDER BY c.updated_at DESC
           LIMIT 1"#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .instrument(query_span)
    .await
}

/// Every conversation the user actively participates in, newest first.
pub async fn fetch_all_for_user(
    db: impl PgExecutor<'_>,
    user_id: &str,
) -> Result<Vec<models::Conversation>, sqlx::Error> {
    let query_span = tracing::info_span!("Fetching conversations for user.");
    sqlx::query_as::<_, models::Conversation>(
        r#"SELECT c.id, c.title, c.is_active, c.created_at, c.updated_at
           FROM conversations c
           JOIN conversation_participants cp ON cp.conversation_id = c.id
           WHERE cp.user_id = $1
             AND cp.is_active
           ORDER BY c.updated_at DESC"#,
    )
    .bind(user_id)
    .fetch_all(db)
    .instrument(query_span)
    .await
}

/// Bumps `updated_at`; every message send goes through this.
pub async fn touch(db: impl PgExecutor<'_>, id: Uuid) -> Result<(), sqlx::Error> {
    let query_span = tracing::info_span!("Touching conversation timestamp.");
    sqlx::query(r#"UPDATE conversations SET updated_at = NOW() WHERE id = $1"#)
        .bind(id)
        .execute(db)
        .instrument(query_span)
        .await
        .map(|_| ())
}

pub async fn deactivate(db: impl PgExecutor<'_>, id: Uuid) -> Result<(), sqlx::Error> {
    let query_span = tracing::info_span!("Deactivating conversation.");
    sqlx::query(r#"UPDATE conversations SET is_active = FALSE, updated_at = NOW() WHERE id = $1"#)
        .bind(id)
        .execute(db)
        .instrument(query_span)
        .await
        .map(|_| ())
}

/// Serializes concurrent create attempts for one user inside the calling
/// transaction. Released automatically on commit or rollback.
pub async fn advisory_lock_for_user(
    db: impl PgExecutor<'_>,
    user_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(r#"SELECT pg_advisory_xact_lock(hashtext($1))"#)
        .bind(user_id)
        .execute(db)
        .await
        .map(|_| ())
}
