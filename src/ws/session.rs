use super::event::{ClientEvent, ServerEvent};
use super::server::{Broadcast, ChatServer, Join, Leave, Outbound};
use super::{CLIENT_TIMEOUT, HEARTBEAT_INTERVAL};
use crate::db;
use crate::models;
use crate::services::conversation::ConversationService;
use crate::views;
use actix::prelude::*;
use actix_web_actors::ws;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// One authenticated connection scoped to exactly one conversation.
/// Created by the route handler only after identity and membership checks
/// have passed.
pub struct ChatSession {
    /// Directory-assigned id; 0 until the Join round-trip completes.
    id: usize,
    user: Arc<models::User>,
    conversation_id: Uuid,
    server: Addr<ChatServer>,
    pg_pool: PgPool,
    hb: Instant,
}

impl ChatSession {
    pub fn new(
        user: Arc<models::User>,
        conversation_id: Uuid,
        server: Addr<ChatServer>,
        pg_pool: PgPool,
    ) -> Self {
        Self {
            id: 0,
            user,
            conversation_id,
            server,
            pg_pool,
            hb: Instant::now(),
        }
    }

    fn hb(&self, ctx: &mut <Self as Actor>::Context) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                tracing::warn!(
                    conversation_id = %act.conversation_id,
                    user_id = %act.user.id,
                    "Chat session heartbeat failed, disconnecting"
                );
                // same cleanup path as a voluntary disconnect
                ctx.stop();
                return;
            }

            ctx.ping(b"");
        });
    }

    fn handle_message(
        &self,
        addr: Addr<ChatSession>,
        content: String,
        message_type: models::MessageType,
    ) {
        let pool = self.pg_pool.clone();
        let server = self.server.clone();
        let user = self.user.clone();
        let conversation_id = self.conversation_id;

        actix::spawn(async move {
            let service = ConversationService::new(&pool, &server);
            match service
                .send_message(conversation_id, &user, &content, message_type)
                .await
            {
                Ok(message) => {
                    let view = views::MessageView::from_message(message, &user);
                    // the sender is included: they need the server-confirmed copy
                    server.do_send(Broadcast {
                        conversation_id,
                        event: ServerEvent::message(view),
                        exclude: None,
                    });
                }
                Err(err) => {
                    tracing::debug!(
                        conversation_id = %conversation_id,
                        user_id = %user.id,
                        "Rejected inbound message: {}",
                        err
                    );
                    addr.do_send(Outbound(ServerEvent::error(err.to_string())));
                }
            }
        });
    }

    fn handle_typing(&self, is_typing: bool) {
        let pool = self.pg_pool.clone();
        let server = self.server.clone();
        let user = self.user.clone();
        let conversation_id = self.conversation_id;
        let session_id = self.id;

        actix::spawn(async move {
            // advisory state; a failed write must not block the fan-out
            if let Err(err) =
                db::typing::upsert(&pool, conversation_id, &user.id, is_typing).await
            {
                tracing::error!("Failed to update typing indicator: {:?}", err);
            }

            server.do_send(Broadcast {
                conversation_id,
                event: ServerEvent::typing(&user, is_typing),
                exclude: Some(session_id),
            });
        });
    }

    fn handle_read(&self, addr: Addr<ChatSession>) {
        let pool = self.pg_pool.clone();
        let server = self.server.clone();
        let user = self.user.clone();
        let conversation_id = self.conversation_id;
        let session_id = self.id;

        actix::spawn(async move {
            let service = ConversationService::new(&pool, &server);
            match service.mark_read(conversation_id, &user).await {
                Ok(()) => {
                    server.do_send(Broadcast {
                        conversation_id,
                        event: ServerEvent::read(&user),
                        exclude: Some(session_id),
                    });
                }
                Err(err) => {
                    addr.do_send(Outbound(ServerEvent::error(err.to_string())));
                }
            }
        });
    }
}

impl Actor for ChatSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(
            conversation_id = %self.conversation_id,
            user_id = %self.user.id,
            "Chat session started"
        );
        self.hb(ctx);

        let addr = ctx.address();
        self.server
            .send(Join {
                conversation_id: self.conversation_id,
                addr: addr.recipient(),
            })
            .into_actor(self)
            .then(|res, act, ctx| {
                match res {
                    Ok(session_id) => {
                        act.id = session_id;

                        let pool = act.pg_pool.clone();
                        let server = act.server.clone();
                        let user = act.user.clone();
                        let conversation_id = act.conversation_id;
                        actix::spawn(async move {
                            if let Err(err) =
                                db::participant::set_online(&pool, conversation_id, &user.id, true)
                                    .await
                            {
                                tracing::error!("Failed to persist online flag: {:?}", err);
                            }
                            server.do_send(Broadcast {
                                conversation_id,
                                event: ServerEvent::presence(&user, true),
                                exclude: Some(session_id),
                            });
                        });
                    }
                    Err(err) => {
                        tracing::error!("Directory join failed: {:?}", err);
                        ctx.stop();
                    }
                }
                fut::ready(())
            })
            .wait(ctx);
    }

    fn stopping(&mut self, _ctx: &mut Self::Context) -> Running {
        // runs on every exit path: voluntary close, transport failure,
        // protocol violation, heartbeat timeout
        self.server.do_send(Leave {
            conversation_id: self.conversation_id,
            session_id: self.id,
        });

        let pool = self.pg_pool.clone();
        let server = self.server.clone();
        let user = self.user.clone();
        let conversation_id = self.conversation_id;
        let session_id = self.id;
        actix::spawn(async move {
            if let Err(err) =
                db::participant::set_online(&pool, conversation_id, &user.id, false).await
            {
                tracing::error!("Failed to persist offline flag: {:?}", err);
            }
            server.do_send(Broadcast {
                conversation_id,
                event: ServerEvent::presence(&user, false),
                exclude: Some(session_id),
            });
        });

        Running::Stop
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            conversation_id = %self.conversation_id,
            user_id = %self.user.id,
            "Chat session closed"
        );
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChatSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => match ClientEvent::parse(&text) {
                Ok(ClientEvent::Message {
                    content,
                    message_type,
                }) => self.handle_message(ctx.address(), content, message_type),
                Ok(ClientEvent::Typing { is_typing }) => self.handle_typing(is_typing),
                Ok(ClientEvent::Read) => self.handle_read(ctx.address()),
                Err(err) => {
                    // the sender always gets a signal; the connection stays open
                    ctx.text(ServerEvent::error(err.to_string()).to_json());
                }
            },
            Ok(ws::Message::Binary(_)) => {
                ctx.text(ServerEvent::error("Binary messages are not supported").to_json());
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(err) => {
                tracing::warn!("WebSocket protocol error: {:?}", err);
                ctx.stop();
            }
            _ => {}
        }
    }
}

impl Handler<Outbound> for ChatSession {
    type Result = ();

    fn handle(&mut self, msg: Outbound, ctx: &mut Self::Context) {
        ctx.text(msg.0.to_json());
    }
}

/// A connection that failed the establishment checks; completes the
/// handshake, emits the distinct close code, and stops.
pub struct RejectSession {
    code: u16,
    reason: &'static str,
}

impl RejectSession {
    pub fn unauthenticated() -> Self {
        Self {
            code: super::CLOSE_UNAUTHENTICATED,
            reason: "Authentication required",
        }
    }

    pub fn not_participant() -> Self {
        Self {
            code: super::CLOSE_NOT_PARTICIPANT,
            reason: "Not a conversation participant",
        }
    }
}

impl Actor for RejectSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        ctx.close(Some(ws::CloseReason {
            code: ws::CloseCode::Other(self.code),
            description: Some(self.reason.to_string()),
        }));
        ctx.stop();
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for RejectSession {
    fn handle(&mut self, _msg: Result<ws::Message, ws::ProtocolError>, _ctx: &mut Self::Context) {}
}
