use crate::models::MessageType;
use serde::Deserialize;
use serde_valid::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MessageCreate {
    #[validate(min_length = 1)]
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_message_type_is_text() {
        let form: MessageCreate = serde_json::from_str(r#"{"content":"hi"}"#).unwrap();
        assert_eq!(form.message_type, MessageType::Text);
        assert!(form.validate().is_ok());
    }

    #[test]
    fn empty_content_fails_validation() {
        let form: MessageCreate = serde_json::from_str(r#"{"content":""}"#).unwrap();
        assert!(form.validate().is_err());
    }
}
