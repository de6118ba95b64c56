use crate::db;
use crate::models;
use sqlx::PgConnection;

/// Selects the agent to attach to a fresh conversation.
///
/// A requested agent wins if they actually carry the agent role; otherwise
/// the least-loaded agent is chosen (fewest active agent-participations in
/// active conversations, lowest id on ties). `None` is a valid outcome:
/// the conversation proceeds unassigned.
pub async fn assign_agent(
    conn: &mut PgConnection,
    requested_agent_id: Option<&str>,
) -> Result<Option<models::User>, sqlx::Error> {
    if let Some(agent_id) = requested_agent_id {
        match db::user::fetch_agent(&mut *conn, agent_id).await? {
            Some(agent) => return Ok(Some(agent)),
            None => {
                tracing::warn!(
                    agent_id,
                    "Requested agent not found or not an agent, falling back to load balancing"
                );
            }
        }
    }

    db::user::fetch_least_loaded_agent(&mut *conn).await
}
