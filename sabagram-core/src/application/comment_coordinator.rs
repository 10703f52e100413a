use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::revalidation;
use crate::data::interaction_gateway::InteractionGateway;
use crate::data::notifier::MutationNotifier;
use crate::domain::error::DomainError;
use crate::domain::ids::PostId;
use crate::domain::interaction::{Comment, CommentDraft, normalize_comment_content};
use crate::domain::session::Session;
use crate::view_model::CollectionHandle;

pub const DEFAULT_PREVIEW_LIMIT: usize = 2;

/// Добавляет комментарий и обновляет превью поста во всех переданных
/// коллекциях. Оптимистичной вставки нет: комментарий появляется только
/// после подтверждения хранилищем.
pub struct CommentAppendCoordinator<G: InteractionGateway> {
    gateway: G,
    notifier: Arc<dyn MutationNotifier>,
    preview_limit: usize,
}

impl<G: InteractionGateway> CommentAppendCoordinator<G> {
    pub fn new(gateway: G, notifier: Arc<dyn MutationNotifier>) -> Self {
        Self {
            gateway,
            notifier,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
        }
    }

    pub fn with_preview_limit(mut self, limit: usize) -> Self {
        self.preview_limit = limit.max(1);
        self
    }

    pub fn preview_limit(&self) -> usize {
        self.preview_limit
    }

    pub async fn add_comment(
        &self,
        session: &Session,
        post_id: PostId,
        content: &str,
        views: &[CollectionHandle],
    ) -> Result<(), DomainError> {
        let content = normalize_comment_content(content)?;
        let user_id = session.user_id();

        let comment_id = self
            .gateway
            .create_comment(post_id, user_id, &content)
            .await?;
        debug!(%post_id, %user_id, %comment_id, "comment stored");

        // комментарий уже сохранён, ошибка превью только логируется
        if let Err(err) = self.refresh_preview(post_id, views).await {
            warn!(%post_id, error = %err, "comment stored but preview refresh failed");
        }

        self.notifier.notify_mutated(&revalidation::after_comment());
        Ok(())
    }

    /// Отправляет текст из поля ввода. Поле очищается сразу, а при ошибке
    /// текст возвращается в него.
    pub async fn submit_draft(
        &self,
        session: &Session,
        post_id: PostId,
        draft: &mut CommentDraft,
        views: &[CollectionHandle],
    ) -> Result<(), DomainError> {
        let text = draft.take();
        let result = self.add_comment(session, post_id, &text, views).await;
        if result.is_err() {
            draft.restore(text);
        }
        result
    }

    /// Перечитывает превью из хранилища и заменяет его целиком, чтобы порядок
    /// и ограничение совпадали со свежей загрузкой.
    pub async fn refresh_preview(
        &self,
        post_id: PostId,
        views: &[CollectionHandle],
    ) -> Result<(), DomainError> {
        let preview = self
            .gateway
            .fetch_comments_preview(post_id, self.preview_limit)
            .await?;
        for view in views {
            view.replace_comments_preview(post_id, preview.clone());
        }
        Ok(())
    }

    /// Вся ветка комментариев поста от старых к новым.
    pub async fn load_thread(&self, post_id: PostId) -> Result<Vec<Comment>, DomainError> {
        self.gateway.fetch_comments(post_id).await
    }
}
