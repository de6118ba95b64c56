use crate::models::user::{Role, User as UserModel};
use serde_derive::{Deserialize, Serialize};

/// Identity document returned by the auth collaborator. Only the fields
/// this service needs; everything else in the upstream payload is ignored.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserForm {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: String,
}

impl TryInto<UserModel> for UserForm {
    type Error = String;

    fn try_into(self) -> Result<UserModel, Self::Error> {
        if self.id.is_empty() {
            return Err("auth service returned a user without an id".to_string());
        }
        if self.username.is_empty() {
            return Err("auth service returned a user without a username".to_string());
        }

        // unknown role tags degrade to plain users rather than failing auth
        let role = self.role.parse::<Role>().unwrap_or_else(|err| {
            tracing::warn!("{}; treating as user", err);
            Role::User
        });

        Ok(UserModel {
            id: self.id,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_user_model() {
        let form = UserForm {
            id: "u1".into(),
            username: "kim".into(),
            first_name: "Kim".into(),
            last_name: "Lee".into(),
            role: "AGENT".into(),
        };
        let user: UserModel = form.try_into().unwrap();
        assert!(user.is_agent());
    }

    #[test]
    fn unknown_role_degrades_to_user() {
        let form = UserForm {
            id: "u1".into(),
            username: "kim".into(),
            role: "wizard".into(),
            ..Default::default()
        };
        let user: UserModel = form.try_into().unwrap();
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn missing_id_is_rejected() {
        let form = UserForm {
            username: "kim".into(),
            ..Default::default()
        };
        let result: Result<UserModel, _> = form.try_into();
        assert!(result.is_err());
    }
}
