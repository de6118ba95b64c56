use crate::db;
use crate::helpers::JsonResponse;
use crate::models;
use crate::services::conversation::ConversationService;
use crate::views;
use crate::ws::server::ChatServer;
use actix::Addr;
use actix_web::{get, web, Responder, Result};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// GET /conversations
/// Every conversation the caller actively participates in, newest first.
#[tracing::instrument(name = "List conversations.", skip(pg_pool))]
#[get("")]
pub async fn list(
    user: web::ReqData<Arc<models::User>>,
    pg_pool: web::Data<PgPool>,
) -> Result<impl Responder> {
    let user = user.into_inner();

    let conversations = db::conversation::fetch_all_for_user(pg_pool.get_ref(), &user.id)
        .await
        .map_err(|err| {
            tracing::error!("Failed to list conversations: {:?}", err);
            JsonResponse::<views::Summary>::build().internal_server_error("")
        })?;

    let mut summaries = Vec::with_capacity(conversations.len());
    for conversation in conversations {
        let summary = summary_view(pg_pool.get_ref(), conversation, &user.id)
            .await
            .map_err(|err| {
                tracing::error!("Failed to assemble conversation summary: {:?}", err);
                JsonResponse::<views::Summary>::build().internal_server_error("")
            })?;
        summaries.push(summary);
    }

    Ok(JsonResponse::build().set_list(summaries).ok("OK"))
}

/// GET /conversations/{id}
#[tracing::instrument(name = "Get conversation detail.", skip(pg_pool, server))]
#[get("/{id}")]
pub async fn item(
    path: web::Path<(Uuid,)>,
    user: web::ReqData<Arc<models::User>>,
    pg_pool: web::Data<PgPool>,
    server: web::Data<Addr<ChatServer>>,
) -> Result<impl Responder> {
    let conversation_id = path.into_inner().0;
    let user = user.into_inner();

    let service = ConversationService::new(pg_pool.get_ref(), server.get_ref());
    let (conversation, _participant) = service
        .validate_access(conversation_id, &user.id)
        .await
        .map_err(|err| err.into_response_error::<views::Detail>())?;

    let detail = super::detail_view(pg_pool.get_ref(), conversation, &user.id)
        .await
        .map_err(|err| err.into_response_error::<views::Detail>())?;

    Ok(JsonResponse::build()
        .set_id(conversation_id)
        .set_item(detail)
        .ok("OK"))
}

async fn summary_view(
    pg_pool: &PgPool,
    conversation: models::Conversation,
    caller_id: &str,
) -> Result<views::Summary, sqlx::Error> {
    let participants: Vec<views::ParticipantView> =
        db::participant::fetch_profiles(pg_pool, conversation.id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

    let last_message = db::message::fetch_last_with_sender(pg_pool, conversation.id)
        .await?
        .map(Into::into);

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

    Ok(views::Summary::new(
        conversation,
        participants,
        last_message,
        unread_count,
    ))
}
