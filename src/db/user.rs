use crate::models;
use sqlx::PgExecutor;
use tracing::Instrument;

/// Keeps the local user directory in sync with the auth collaborator.
/// Called on every successful authentication.
pub async fn upsert(db: impl PgExecutor<'_>, user: &models::User) -> Result<(), sqlx::Error> {
    let query_span = tracing::info_span!("Upserting user into the directory.");
    sqlx::query(
        r#"INSERT INTO users (id, username, first_name, last_name, role)
           VALUES ($1, $2, $3, $4, $5)
           ON CONFLICT (id)
           DO UPDATE SET username = EXCLUDED.username,
                         first_name = EXCLUDED.first_name,
                         last_name = EXCLUDED.last_name,
                         role = EXCLUDED.role,
                         updated_at = NOW()"#,
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(user.role)
    .execute(db)
    .instrument(query_span)
    .await
    .map(|_| ())
}

/// A specific user, only if they carry the agent role.
pub async fn fetch_agent(
    db: impl PgExecutor<'_>,
    user_id: &str,
) -> Result<Option<models::User>, sqlx::Error> {
    let query_span = tracing::info_span!("Fetching agent by id.");
    sqlx::query_as::<_, models::User>(
        r#"SELECT id, username, first_name, last_name, role
           FROM users
           WHERE id = $1 AND role = 'agent'"#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .instrument(query_span)
    .await
}

/// The agent with the fewest active agent-participations in active
/// conversations. Ties break on the lowest user id.
pub async fn fetch_least_loaded_agent(
    db: impl PgExecutor<'_>,
) -> Result<Option<models::User>, sqlx::Error> {
    let query_span = tracing::info_span!("Selecting least loaded agent.");
    sqlx::query_as::<_, models::User>(
        r#"SELECT u.id, u.username, u.first_name, u.last_name, u.role
           FROM users u
           LEFT JOIN conversation_participants cp
                  ON cp.user_id = u.id
                 AND cp.role = 'agent'
                 AND cp.is_active
           LEFT JOIN conversations c
                  ON c.id = cp.conversation_id
                 AND c.is_active
           WHERE u.role = 'agent'
           GROUP BY u.id
           ORDER BY COUNT(c.id) ASC, u.id ASC
           LIMIT 1"#,
    )
    .fetch_optional(db)
    .instrument(query_span)
    .await
}
