pub(crate) mod add;
pub(crate) mod close;
pub(crate) mod get;
pub(crate) mod messages;
pub(crate) mod read;

use crate::db;
use crate::models;
use crate::services::ConversationError;
use crate::views;
use sqlx::PgPool;

/// Recent-message window on the detail view, oldest first.
const RECENT_MESSAGES: i64 = 20;

/// Assembles the detail representation: participants, the last
/// `RECENT_MESSAGES` messages oldest-first, the caller's unread count and
/// the other participant for 1:1 conversations.
pub(crate) async fn detail_view(
    pg_pool: &PgPool,
    conversation: models::Conversation,
    caller_id: &str,
) -> Result<views::Detail, ConversationError> {
    let participants: Vec<views::ParticipantView> =
        db::participant::fetch_profiles(pg_pool, conversation.id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

    let mut recent_messages: Vec<views::MessageView> =
        db::message::fetch_page_with_senders(pg_pool, conversation.id, None, RECENT_MESSAGES)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
    recent_messages.reverse();

    let unread_count = match db::participant::fetch(pg_pool, conversation.id, caller_id).await? {
        Some(participant) => {
            db::message::unread_count(
                pg_pool,
                conversation.id,
                caller_id,
                participant.last_read_at,
            )
            .await?
        }
        None => 0,
    };

    Ok(views::Detail::new(
        conversation,
        participants,
        recent_messages,
        unread_count,
        caller_id,
    ))
}
