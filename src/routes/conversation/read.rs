use crate::helpers::JsonResponse;
use crate::models;
use crate::services::conversation::ConversationService;
use crate::ws::server::ChatServer;
use actix::Addr;
use actix_web::{post, web, Responder, Result};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// POST /conversations/{id}/read
/// Advances the caller's read marker to now; repeating is harmless.
#[tracing::instrument(name = "Mark messages as read.", skip(pg_pool, server))]
#[post("/{id}/read")]
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
        .mark_read(conversation_id, &user)
        .await
        .map_err(|err| err.into_response_error::<String>())?;

    Ok(JsonResponse::<String>::build()
        .set_id(conversation_id)
        .ok("Messages marked as read"))
}
