use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::ids::{CommentId, PostId, UserId};
use crate::domain::interaction::{Comment, LikeInsert};

/// Примитивы удалённого хранилища, на которых строятся координаторы лайков
/// и комментариев.
#[async_trait]
pub trait InteractionGateway: Send + Sync {
    /// Пытается вставить лайк. Нарушение уникальности `(post_id, user_id)`
    /// возвращается как `Ok(LikeInsert::AlreadyExisted)`, а не как ошибка.
    async fn create_like(&self, post_id: PostId, user_id: UserId)
    -> Result<LikeInsert, DomainError>;

    async fn delete_like(&self, post_id: PostId, user_id: UserId) -> Result<(), DomainError>;

    async fn create_comment(
        &self,
        post_id: PostId,
        user_id: UserId,
        content: &str,
    ) -> Result<CommentId, DomainError>;

    /// Самые старые `limit` комментариев поста, от старых к новым.
    async fn fetch_comments_preview(
        &self,
        post_id: PostId,
        limit: usize,
    ) -> Result<Vec<Comment>, DomainError>;

    /// Все комментарии поста, от старых к новым.
    async fn fetch_comments(&self, post_id: PostId) -> Result<Vec<Comment>, DomainError>;

    /// Лайки для набора постов. Посты без лайков могут отсутствовать в ответе.
    async fn fetch_likes(
        &self,
        post_ids: &BTreeSet<PostId>,
    ) -> Result<BTreeMap<PostId, BTreeSet<UserId>>, DomainError>;
}
