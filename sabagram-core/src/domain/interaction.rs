use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::ids::{CommentId, PostId, UserId};

/// Лайк однозначно определяется парой `(post_id, user_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Like {
    pub post_id: PostId,
    pub user_id: UserId,
}

/// Результат попытки вставить лайк.
///
/// `AlreadyExisted` - это не ошибка, а сигнал уникального ограничения
/// хранилища: лайк уже есть, поэтому переключатель должен его удалить.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeInsert {
    Created,
    AlreadyExisted,
}

/// Подтверждённое сервером состояние лайка после переключения.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleOutcome {
    pub liked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

pub fn normalize_comment_content(content: &str) -> Result<String, DomainError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(DomainError::Validation {
            field: "content",
            message: "must not be empty",
        });
    }
    Ok(content.to_string())
}

/// Буфер поля ввода комментария.
///
/// При отправке текст забирается из буфера; если отправка не удалась, он
/// возвращается обратно, чтобы пользователь не потерял набранное.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    text: String,
}

impl CommentDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub(crate) fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    pub(crate) fn restore(&mut self, text: String) {
        self.text = text;
    }
}

#[cfg(test)]
mod tests {
    use super::{CommentDraft, DomainError, normalize_comment_content};

    #[test]
    fn normalize_comment_content_trims() {
        let content = normalize_comment_content("  nice shot  ").expect("must validate");
        assert_eq!(content, "nice shot");
    }

    #[test]
    fn normalize_comment_content_rejects_whitespace() {
        let err = normalize_comment_content(" \n\t ").expect_err("blank must be rejected");
        assert!(matches!(
            err,
            DomainError::Validation {
                field: "content",
                ..
            }
        ));
    }

    #[test]
    fn draft_take_then_restore_keeps_text() {
        let mut draft = CommentDraft::new("hello");
        let taken = draft.take();
        assert!(draft.is_blank());
        draft.restore(taken);
        assert_eq!(draft.text(), "hello");
    }
}
