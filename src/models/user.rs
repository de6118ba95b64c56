use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role tag shared by the user directory and conversation participants.
/// Open set; unknown tags coming from the auth collaborator degrade to `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
    Bot,
    Moderator,
}

impl Role {
    pub fn is_agent(&self) -> bool {
        matches!(self, Role::Agent)
    }

    /// Roles that may be attached to a conversation as a participant.
    pub fn is_participant_role(&self) -> bool {
        matches!(self, Role::User | Role::Agent | Role::Bot | Role::Moderator)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "agent" => Ok(Role::Agent),
            "bot" => Ok(Role::Bot),
            "moderator" => Ok(Role::Moderator),
            other => Err(format!("unknown role tag: {}", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Role::User => "user",
            Role::Agent => "agent",
            Role::Bot => "bot",
            Role::Moderator => "moderator",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl User {
    pub fn is_agent(&self) -> bool {
        self.role.is_agent()
    }

    /// Display name for system messages; falls back to the username.
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_capability_checks() {
        assert!(Role::Agent.is_agent());
        assert!(!Role::User.is_agent());
        assert!(Role::Bot.is_participant_role());
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("AGENT".parse::<Role>().unwrap(), Role::Agent);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn full_name_falls_back_to_username() {
        let user = User {
            id: "u1".into(),
            username: "kim".into(),
            first_name: "".into(),
            last_name: "".into(),
            role: Role::User,
        };
        assert_eq!(user.full_name(), "kim");
    }
}
