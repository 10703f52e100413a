use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::ids::{PostId, UserId};
use crate::domain::post::Post;

#[derive(Debug, Clone)]
pub struct NewPost {
    pub image_ref: String,
    pub caption: String,
    pub author_id: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
}

impl Pagination {
    pub fn first_page(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Лента: новые посты первыми.
    async fn list_posts(&self, pagination: Pagination) -> Result<Vec<Post>, DomainError>;
    async fn list_posts_by_author(&self, author_id: UserId) -> Result<Vec<Post>, DomainError>;
    /// Посты, лайкнутые пользователем, новые посты первыми.
    async fn list_liked_posts(&self, user_id: UserId) -> Result<Vec<Post>, DomainError>;
    /// Посты, чья подпись содержит `query` без учёта регистра.
    async fn search_posts(&self, query: &str, limit: usize) -> Result<Vec<Post>, DomainError>;
    async fn get_post(&self, id: PostId) -> Result<Option<Post>, DomainError>;
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError>;
    /// Удаляет пост только если `owner_id` его автор. `false`, если строка не удалена.
    async fn delete_post_owned(&self, id: PostId, owner_id: UserId) -> Result<bool, DomainError>;
    async fn delete_post(&self, id: PostId) -> Result<bool, DomainError>;
}
