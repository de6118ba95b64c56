use serde::Deserialize;

/// Body of the create-or-get operation. Both fields are optional: with no
/// `agent_id` the least-loaded agent is assigned, and `message` seeds the
/// conversation with a first user message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationCreate {
    pub agent_id: Option<String>,
    pub message: Option<String>,
}
