use crate::helpers::JsonResponse;
use crate::models;
use crate::services::conversation::ConversationService;
use crate::ws::event::ServerEvent;
use crate::ws::server::{Broadcast, ChatServer};
use actix::Addr;
use actix_web::{post, web, Responder, Result};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// POST /conversations/{id}/close
/// Terminal: deactivates the conversation and every participant, then
/// tells connected sessions. Sessions stay connected; further mutations
/// fail their membership checks.
#[tracing::instrument(name = "Close conversation.", skip(pg_pool, server))]
#[post("/{id}/close")]
pub async fn item(
    path: web::Path<(Uuid,)>,
    user: web::ReqData<Arc<models::User>>,
    pg_pool: web::Data<PgPool>,
    server: web::Data<Addr<ChatServer>>,
) -> Result<impl Responder> {
    let conversation_id = path.into_inner().0;
    let user = user.into_inner();

    let service = ConversationService::new(pg_pool.get_ref(), server.get_ref());
    service
        .close(conversation_id, &user)
        .await
        .map_err(|err| err.into_response_error::<String>())?;

    // best-effort: a failed broadcast must not fail the close
    server.do_send(Broadcast {
        conversation_id,
        event: ServerEvent::conversation_closed(&user),
        exclude: None,
    });

    Ok(JsonResponse::<String>::build()
        .set_id(conversation_id)
        .ok("Conversation closed successfully"))
}
