use super::event::ServerEvent;
use actix::prelude::*;
use std::collections::HashMap;
use uuid::Uuid;

/// Event pushed to a connected session's transport.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct Outbound(pub ServerEvent);

/// Register a chat session with a conversation's broadcast group.
/// Returns the directory-assigned session id.
#[derive(Message)]
#[rtype(result = "usize")]
pub struct Join {
    pub conversation_id: Uuid,
    pub addr: Recipient<Outbound>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Leave {
    pub conversation_id: Uuid,
    pub session_id: usize,
}

/// Fan an event out to a conversation's broadcast group. `exclude` skips
/// the originating session (presence, typing, read receipts); message
/// events pass `None` so the sender receives the server-confirmed copy.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Broadcast {
    pub conversation_id: Uuid,
    pub event: ServerEvent,
    pub exclude: Option<usize>,
}

/// Register an agent's personal notification channel.
#[derive(Message)]
#[rtype(result = "usize")]
pub struct RegisterAgent {
    pub agent_id: String,
    pub addr: Recipient<Outbound>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct UnregisterAgent {
    pub agent_id: String,
    pub session_id: usize,
}

/// Best-effort delivery to every connection the agent has open on their
/// notification channel. No channel, no error.
#[derive(Message)]
#[rtype(result = "()")]
pub struct NotifyAgent {
    pub agent_id: String,
    pub event: ServerEvent,
}

/// In-memory conversation directory plus the agent notification router.
/// Groups are created lazily on first join and dropped with the last
/// leave; state is rebuilt from reconnects after a restart.
pub struct ChatServer {
    rooms: HashMap<Uuid, HashMap<usize, Recipient<Outbound>>>,
    agent_channels: HashMap<String, HashMap<usize, Recipient<Outbound>>>,
    next_session_id: usize,
}

impl ChatServer {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            agent_channels: HashMap::new(),
            next_session_id: 0,
        }
    }

    fn next_id(&mut self) -> usize {
        self.next_session_id += 1;
        self.next_session_id
    }
}

impl Default for ChatServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for ChatServer {
    type Context = Context<Self>;
}

impl Handler<Join> for ChatServer {
    type Result = usize;

    fn handle(&mut self, msg: Join, _ctx: &mut Self::Context) -> Self::Result {
        let session_id = self.next_id();
        self.rooms
            .entry(msg.conversation_id)
            .or_default()
            .insert(session_id, msg.addr);

        tracing::debug!(
            conversation_id = %msg.conversation_id,
            session_id,
            "Session joined broadcast group"
        );
        session_id
    }
}

impl Handler<Leave> for ChatServer {
    type Result = ();

    fn handle(&mut self, msg: Leave, _ctx: &mut Self::Context) {
        if let Some(members) = self.rooms.get_mut(&msg.conversation_id) {
            members.remove(&msg.session_id);
            if members.is_empty() {
                self.rooms.remove(&msg.conversation_id);
            }
        }

        tracing::debug!(
            conversation_id = %msg.conversation_id,
            session_id = msg.session_id,
            "Session left broadcast group"
        );
    }
}

impl Handler<Broadcast> for ChatServer {
    type Result = ();

    fn handle(&mut self, msg: Broadcast, _ctx: &mut Self::Context) {
        let Some(members) = self.rooms.get(&msg.conversation_id) else {
            return;
        };

        for (session_id, addr) in members {
            if Some(*session_id) == msg.exclude {
                continue;
            }
            // do_send is a mailbox push; a session that died mid-iteration
            // just drops the event (best-effort by contract)
            addr.do_send(Outbound(msg.event.clone()));
        }
    }
}

impl Handler<RegisterAgent> for ChatServer {
    type Result = usize;

    fn handle(&mut self, msg: RegisterAgent, _ctx: &mut Self::Context) -> Self::Result {
        let session_id = self.next_id();
        self.agent_channels
            .entry(msg.agent_id.clone())
            .or_default()
            .insert(session_id, msg.addr);

        tracing::info!(agent_id = %msg.agent_id, session_id, "Agent notification channel opened");
        session_id
    }
}

impl Handler<UnregisterAgent> for ChatServer {
    type Result = ();

    fn handle(&mut self, msg: UnregisterAgent, _ctx: &mut Self::Context) {
        if let Some(channels) = self.agent_channels.get_mut(&msg.agent_id) {
            channels.remove(&msg.session_id);
            if channels.is_empty() {
                self.agent_channels.remove(&msg.agent_id);
            }
        }

        tracing::info!(agent_id = %msg.agent_id, session_id = msg.session_id, "Agent notification channel closed");
    }
}

impl Handler<NotifyAgent> for ChatServer {
    type Result = ();

    fn handle(&mut self, msg: NotifyAgent, _ctx: &mut Self::Context) {
        match self.agent_channels.get(&msg.agent_id) {
            Some(channels) => {
                for addr in channels.values() {
                    addr.do_send(Outbound(msg.event.clone()));
                }
            }
            None => {
                tracing::info!(
                    agent_id = %msg.agent_id,
                    "Agent has no open notification channel, dropping notification"
                );
            }
        }
    }
}
