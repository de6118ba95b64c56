use crate::helpers::JsonResponse;
use actix_web::Error;

/// Failure taxonomy for broker operations. The route layer maps these onto
/// the JSON envelope; the streaming layer maps validation problems to
/// `error` events and the rest to close codes.
#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl ConversationError {
    pub fn not_a_participant() -> Self {
        ConversationError::PermissionDenied(
            "You are not a participant in this conversation.".to_string(),
        )
    }

    pub fn into_response_error<T: serde::Serialize>(self) -> Error {
        match self {
            ConversationError::Unauthenticated => {
                JsonResponse::<T>::build().unauthorized(self.to_string())
            }
            ConversationError::PermissionDenied(msg) => JsonResponse::<T>::build().forbidden(msg),
            ConversationError::Validation(msg) => JsonResponse::<T>::build().bad_request(msg),
            ConversationError::NotFound(msg) => JsonResponse::<T>::build().not_found(msg),
            ConversationError::Database(err) => {
                tracing::error!("Database failure in broker operation: {:?}", err);
                JsonResponse::<T>::build().internal_server_error("")
            }
        }
    }
}
