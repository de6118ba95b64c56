use crate::models;
use crate::views;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outbound wire envelope. Every variant carries the `type` tag and a
/// server-side timestamp.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Message {
        #[serde(flatten)]
        message: views::MessageView,
        timestamp: DateTime<Utc>,
    },
    Typing {
        user_id: String,
        username: String,
        is_typing: bool,
        timestamp: DateTime<Utc>,
    },
    Read {
        user_id: String,
        username: String,
        timestamp: DateTime<Utc>,
    },
    Presence {
        user_id: String,
        username: String,
        is_online: bool,
        timestamp: DateTime<Utc>,
    },
    Error {
        error: String,
        timestamp: DateTime<Utc>,
    },
    ConversationClosed {
        user_id: String,
        username: String,
        timestamp: DateTime<Utc>,
    },
    NewConversationRequest {
        conversation_id: Uuid,
        user_id: String,
        username: String,
        timestamp: DateTime<Utc>,
    },
    ConversationAssigned {
        conversation_id: Uuid,
        user_id: String,
        username: String,
        timestamp: DateTime<Utc>,
    },
}

impl ServerEvent {
    pub fn message(view: views::MessageView) -> Self {
        ServerEvent::Message {
            message: view,
            timestamp: Utc::now(),
        }
    }

    pub fn typing(user: &models::User, is_typing: bool) -> Self {
        ServerEvent::Typing {
            user_id: user.id.clone(),
            username: user.username.clone(),
            is_typing,
            timestamp: Utc::now(),
        }
    }

    pub fn read(user: &models::User) -> Self {
        ServerEvent::Read {
            user_id: user.id.clone(),
            username: user.username.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn presence(user: &models::User, is_online: bool) -> Self {
        ServerEvent::Presence {
            user_id: user.id.clone(),
            username: user.username.clone(),
            is_online,
            timestamp: Utc::now(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        ServerEvent::Error {
            error: error.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn conversation_closed(user: &models::User) -> Self {
        ServerEvent::ConversationClosed {
            user_id: user.id.clone(),
            username: user.username.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn new_conversation_request(conversation_id: Uuid, user: &models::User) -> Self {
        ServerEvent::NewConversationRequest {
            conversation_id,
            user_id: user.id.clone(),
            username: user.username.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn conversation_assigned(conversation_id: Uuid, user: &models::User) -> Self {
        ServerEvent::ConversationAssigned {
            conversation_id,
            user_id: user.id.clone(),
            username: user.username.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            tracing::error!("Failed to serialize server event: {}", err);
            r#"{"type":"error","error":"serialization failure"}"#.to_string()
        })
    }
}

/// Inbound events, a closed dispatch over the `type` tag.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Message {
        content: String,
        message_type: models::MessageType,
    },
    Typing {
        is_typing: bool,
    },
    Read,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid JSON")]
    InvalidJson,
    #[error("Unknown message type")]
    UnknownType,
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

#[derive(Deserialize)]
struct MessagePayload {
    #[serde(default)]
    content: String,
    #[serde(default)]
    message_type: models::MessageType,
}

#[derive(Deserialize)]
struct TypingPayload {
    #[serde(default)]
    is_typing: bool,
}

impl ClientEvent {
    /// Missing `type` defaults to `message`, matching what clients already
    /// send on the wire.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|_| ParseError::InvalidJson)?;

        let kind = value
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or("message")
            .to_string();

        match kind.as_str() {
            "message" => {
                let payload: MessagePayload = serde_json::from_value(value)
                    .map_err(|err| ParseError::MalformedPayload(err.to_string()))?;
                Ok(ClientEvent::Message {
                    content: payload.content,
                    message_type: payload.message_type,
                })
            }
            "typing" => {
                let payload: TypingPayload = serde_json::from_value(value)
                    .map_err(|err| ParseError::MalformedPayload(err.to_string()))?;
                Ok(ClientEvent::Typing {
                    is_typing: payload.is_typing,
                })
            }
            "read" => Ok(ClientEvent::Read),
            _ => Err(ParseError::UnknownType),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageType, Role, User};

    fn user() -> User {
        User {
            id: "u1".into(),
            username: "kim".into(),
            first_name: "Kim".into(),
            last_name: "Lee".into(),
            role: Role::User,
        }
    }

    #[test]
    fn parses_message_event() {
        let event = ClientEvent::parse(r#"{"type":"message","content":"hi"}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::Message {
                content: "hi".into(),
                message_type: MessageType::Text
            }
        );
    }

    #[test]
    fn missing_type_defaults_to_message() {
        let event = ClientEvent::parse(r#"{"content":"hello"}"#).unwrap();
        assert!(matches!(event, ClientEvent::Message { .. }));
    }

    #[test]
    fn parses_typing_and_read() {
        assert_eq!(
            ClientEvent::parse(r#"{"type":"typing","is_typing":true}"#).unwrap(),
            ClientEvent::Typing { is_typing: true }
        );
        assert_eq!(
            ClientEvent::parse(r#"{"type":"read"}"#).unwrap(),
            ClientEvent::Read
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert_eq!(
            ClientEvent::parse(r#"{"type":"dance"}"#),
            Err(ParseError::UnknownType)
        );
    }

    #[test]
    fn invalid_json_is_rejected() {
        assert_eq!(ClientEvent::parse("{nope"), Err(ParseError::InvalidJson));
    }

    #[test]
    fn presence_envelope_has_type_tag_and_timestamp() {
        let event = ServerEvent::presence(&user(), true);
        let value: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
        assert_eq!(value["type"], "presence");
        assert_eq!(value["is_online"], true);
        assert_eq!(value["user_id"], "u1");
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn typing_envelope_round_trips_flag() {
        let event = ServerEvent::typing(&user(), false);
        let value: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
        assert_eq!(value["type"], "typing");
        assert_eq!(value["is_typing"], false);
    }
}
