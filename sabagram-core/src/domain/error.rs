use thiserror::Error;

use super::ids::{PostId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("validation failed for '{field}': {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },

    #[error("gateway unavailable: {0}")]
    Transient(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    Conflict(String),

    #[error("like toggle already in flight for post {post_id} and user {user_id}")]
    ToggleInFlight { post_id: PostId, user_id: UserId },

    #[error("forbidden")]
    Forbidden,

    #[error("unexpected domain error: {0}")]
    Unexpected(String),
}

impl DomainError {
    /// Ошибка вызвана состоянием сети/бэкенда, и повтор действия пользователем
    /// может пройти успешно.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Ошибка отклонена локально, без обращения к бэкенду.
    pub fn is_local_rejection(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::ToggleInFlight { .. })
    }
}
