use crate::db;
use crate::helpers::JsonResponse;
use crate::models;
use crate::services::AgentAvailability;
use crate::ws::server::ChatServer;
use crate::ws::{AgentNotificationSession, ChatSession, RejectSession};
use actix::Addr;
use actix_web::{get, web, Error, HttpMessage, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// GET /ws/conversations/{id}
/// Streaming entry point. An unresolvable identity closes with 4001 and a
/// non-participant with 4003, in both cases before any directory join.
#[tracing::instrument(name = "Chat WebSocket connection.", skip(req, stream, pg_pool, server))]
#[get("/conversations/{id}")]
pub async fn chat(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<(Uuid,)>,
    pg_pool: web::Data<PgPool>,
    server: web::Data<Addr<ChatServer>>,
) -> Result<HttpResponse, Error> {
    let conversation_id = path.into_inner().0;
    let user = { req.extensions().get::<Arc<models::User>>().cloned() };

    let Some(user) = user else {
        return ws::start(RejectSession::unauthenticated(), &req, stream);
    };

    match db::participant::fetch_active(pg_pool.get_ref(), conversation_id, &user.id).await {
        Ok(Some(_participant)) => {
            let session = ChatSession::new(
                user,
                conversation_id,
                server.get_ref().clone(),
                pg_pool.get_ref().clone(),
            );
            ws::start(session, &req, stream)
        }
        Ok(None) => ws::start(RejectSession::not_participant(), &req, stream),
        Err(err) => {
            tracing::error!("Membership check failed: {:?}", err);
            Err(JsonResponse::<String>::build().internal_server_error(""))
        }
    }
}

/// GET /ws/agent/notifications
/// Personal notification channel; agents only.
#[tracing::instrument(name = "Agent notification WebSocket connection.", skip(req, stream, server, availability))]
#[get("/agent/notifications")]
pub async fn agent_notifications(
    req: HttpRequest,
    stream: web::Payload,
    server: web::Data<Addr<ChatServer>>,
    availability: web::Data<AgentAvailability>,
) -> Result<HttpResponse, Error> {
    let user = { req.extensions().get::<Arc<models::User>>().cloned() };

    match user {
        None => ws::start(RejectSession::unauthenticated(), &req, stream),
        Some(user) if !user.is_agent() => ws::start(RejectSession::not_participant(), &req, stream),
        Some(agent) => {
            let session = AgentNotificationSession::new(
                agent,
                server.get_ref().clone(),
                availability.clone().into_inner(),
            );
            ws::start(session, &req, stream)
        }
    }
}
