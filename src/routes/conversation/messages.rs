use crate::forms;
use crate::helpers::JsonResponse;
use crate::models;
use crate::services::conversation::{ConversationService, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::views;
use crate::ws::event::ServerEvent;
use crate::ws::server::{Broadcast, ChatServer};
use actix::Addr;
use actix_web::{get, post, web, Responder, Result};
use serde::Deserialize;
use serde_valid::Validate;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub before: Option<Uuid>,
    pub page_size: Option<i64>,
}

/// GET /conversations/{id}/messages?before={message_id}&page_size={n}
/// Pages backwards through history; results are returned oldest first.
#[tracing::instrument(name = "Get message history.", skip(pg_pool, server))]
#[get("/{id}/messages")]
pub async fn history(
    path: web::Path<(Uuid,)>,
    query: web::Query<HistoryQuery>,
    user: web::ReqData<Arc<models::User>>,
    pg_pool: web::Data<PgPool>,
    server: web::Data<Addr<ChatServer>>,
) -> Result<impl Responder> {
    let conversation_id = path.into_inner().0;
    let user = user.into_inner();
    let limit = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE);

    let service = ConversationService::new(pg_pool.get_ref(), server.get_ref());
    let messages = service
        .history(conversation_id, &user.id, query.before, limit)
        .await
        .map_err(|err| err.into_response_error::<views::MessageView>())?;

    let mut list: Vec<views::MessageView> = messages.into_iter().map(Into::into).collect();
    list.reverse();

    Ok(JsonResponse::build().set_list(list).ok("OK"))
}

/// POST /conversations/{id}/messages
/// REST fallback for non-streaming clients; same broker operation and the
/// same persist-then-broadcast sequencing as the WebSocket path.
#[tracing::instrument(name = "Send message.", skip(pg_pool, server))]
#[post("/{id}/messages")]
pub async fn send(
    path: web::Path<(Uuid,)>,
    web::Json(body): web::Json<forms::MessageCreate>,
    user: web::ReqData<Arc<models::User>>,
    pg_pool: web::Data<PgPool>,
    server: web::Data<Addr<ChatServer>>,
) -> Result<impl Responder> {
    let conversation_id = path.into_inner().0;
    let user = user.into_inner();

    body.validate()
        .map_err(|err| JsonResponse::<views::MessageView>::build().bad_request(err.to_string()))?;

    let service = ConversationService::new(pg_pool.get_ref(), server.get_ref());
    let message = service
        .send_message(conversation_id, &user, &body.content, body.message_type)
        .await
        .map_err(|err| err.into_response_error::<views::MessageView>())?;

    let view = views::MessageView::from_message(message, &user);
    server.do_send(Broadcast {
        conversation_id,
        event: ServerEvent::message(view.clone()),
        exclude: None,
    });

    Ok(JsonResponse::build()
        .set_id(view.id)
        .set_item(view)
        .created("Message sent"))
}
