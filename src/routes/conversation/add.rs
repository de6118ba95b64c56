use crate::forms;
use crate::helpers::JsonResponse;
use crate::models;
use crate::services::conversation::ConversationService;
use crate::views;
use crate::ws::event::ServerEvent;
use crate::ws::server::{Broadcast, ChatServer};
use actix::Addr;
use actix_web::{post, web, Responder, Result};
use sqlx::PgPool;
use std::sync::Arc;

/// POST /conversations
/// Returns the caller's existing active conversation, or creates one with
/// an assigned agent. 201 on create, 200 on reuse; the body carries the
/// `created` flag either way.
#[tracing::instrument(name = "Create or get conversation.", skip(pg_pool, server))]
#[post("")]
pub async fn item(
    user: web::ReqData<Arc<models::User>>,
    web::Json(body): web::Json<forms::ConversationCreate>,
    pg_pool: web::Data<PgPool>,
    server: web::Data<Addr<ChatServer>>,
) -> Result<impl Responder> {
    let user = user.into_inner();
    let service = ConversationService::new(pg_pool.get_ref(), server.get_ref());

    let (conversation, created) = service
        .get_or_create(&user, body.agent_id.as_deref())
        .await
        .map_err(|err| err.into_response_error::<views::CreateResult>())?;

    if let Some(content) = body.message.as_deref().filter(|c| !c.trim().is_empty()) {
        let message = service
            .send_message(conversation.id, &user, content, models::MessageType::Text)
            .await
            .map_err(|err| err.into_response_error::<views::CreateResult>())?;

        server.do_send(Broadcast {
            conversation_id: conversation.id,
            event: ServerEvent::message(views::MessageView::from_message(message, &user)),
            exclude: None,
        });
    }

    let conversation_id = conversation.id;
    let detail = super::detail_view(pg_pool.get_ref(), conversation, &user.id)
        .await
        .map_err(|err| err.into_response_error::<views::CreateResult>())?;

    let result = views::CreateResult {
        conversation: detail,
        created,
    };

    let response = JsonResponse::build().set_id(conversation_id).set_item(result);
    if created {
        Ok(response.created("Conversation created successfully"))
    } else {
        Ok(response.ok("Existing conversation found"))
    }
}
