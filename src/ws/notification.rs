use super::server::{ChatServer, Outbound, RegisterAgent, UnregisterAgent};
use super::{CLIENT_TIMEOUT, HEARTBEAT_INTERVAL};
use crate::models;
use crate::services::AgentAvailability;
use actix::prelude::*;
use actix_web_actors::ws;
use std::sync::Arc;
use std::time::Instant;

/// An agent's personal notification channel, independent of any
/// conversation group. The server only pushes here; inbound frames beyond
/// heartbeats are ignored.
pub struct AgentNotificationSession {
    id: usize,
    agent: Arc<models::User>,
    server: Addr<ChatServer>,
    availability: Arc<AgentAvailability>,
    hb: Instant,
}

impl AgentNotificationSession {
    pub fn new(
        agent: Arc<models::User>,
        server: Addr<ChatServer>,
        availability: Arc<AgentAvailability>,
    ) -> Self {
        Self {
            id: 0,
            agent,
            server,
            availability,
            hb: Instant::now(),
        }
    }

    fn hb(&self, ctx: &mut <Self as Actor>::Context) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                tracing::warn!(
                    agent_id = %act.agent.id,
                    "Agent notification heartbeat failed, disconnecting"
                );
                ctx.stop();
                return;
            }

            ctx.ping(b"");
        });
    }

    fn refresh_availability(&self) {
        let availability = self.availability.clone();
        let agent = self.agent.clone();
        actix::spawn(async move {
            availability.set_available(&agent).await;
        });
    }
}

impl Actor for AgentNotificationSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(agent_id = %self.agent.id, "Agent connected to notification channel");
        self.hb(ctx);

        let addr = ctx.address();
        self.server
            .send(RegisterAgent {
                agent_id: self.agent.id.clone(),
                addr: addr.recipient(),
            })
            .into_actor(self)
            .then(|res, act, ctx| {
                match res {
                    Ok(session_id) => act.id = session_id,
                    Err(err) => {
                        tracing::error!("Agent channel registration failed: {:?}", err);
                        ctx.stop();
                    }
                }
                fut::ready(())
            })
            .wait(ctx);

        self.refresh_availability();
    }

    fn stopping(&mut self, _ctx: &mut Self::Context) -> Running {
        self.server.do_send(UnregisterAgent {
            agent_id: self.agent.id.clone(),
            session_id: self.id,
        });

        let availability = self.availability.clone();
        let agent_id = self.agent.id.clone();
        actix::spawn(async move {
            availability.set_unavailable(&agent_id).await;
        });

        Running::Stop
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(agent_id = %self.agent.id, "Agent disconnected from notification channel");
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for AgentNotificationSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
                // each heartbeat keeps the availability entry fresh
                self.refresh_availability();
            }
            // this channel pushes to agents; client frames carry nothing
            Ok(ws::Message::Text(_)) | Ok(ws::Message::Binary(_)) => {}
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

impl Handler<Outbound> for AgentNotificationSession {
    type Result = ();

    fn handle(&mut self, msg: Outbound, ctx: &mut Self::Context) {
        ctx.text(msg.0.to_json());
    }
}
