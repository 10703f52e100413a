use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::comment_coordinator::DEFAULT_PREVIEW_LIMIT;
use crate::application::revalidation;
use crate::data::interaction_gateway::InteractionGateway;
use crate::data::notifier::MutationNotifier;
use crate::data::post_repository::{NewPost, Pagination, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::ids::{PostId, UserId};
use crate::domain::post::{NewPostRequest, Post};
use crate::domain::session::Session;
use crate::view_model::{CollectionHandle, PostCollection, PostEntry};

/// Сколько постов показывает сетка "Интересное".
pub const DISCOVER_LIMIT: u32 = 100;

pub struct PostService<R: PostRepository, G: InteractionGateway> {
    repo: R,
    gateway: G,
    notifier: Arc<dyn MutationNotifier>,
    preview_limit: usize,
}

impl<R: PostRepository, G: InteractionGateway> PostService<R, G> {
    pub fn new(repo: R, gateway: G, notifier: Arc<dyn MutationNotifier>) -> Self {
        Self {
            repo,
            gateway,
            notifier,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
        }
    }

    pub fn with_preview_limit(mut self, limit: usize) -> Self {
        self.preview_limit = limit.max(1);
        self
    }

    pub async fn get_post(&self, id: PostId) -> Result<Post, DomainError> {
        self.repo
            .get_post(id)
            .await?
            .ok_or(DomainError::NotFound(format!("post id: {id}")))
    }

    /// Первая страница перезагружает ленту целиком, следующие
    /// дописываются в конец.
    pub async fn load_feed(
        &self,
        collection: &PostCollection,
        pagination: Pagination,
    ) -> Result<usize, DomainError> {
        let posts = self.repo.list_posts(pagination).await?;
        self.fill(collection, posts, pagination.offset == 0).await
    }

    pub async fn load_discover(&self, collection: &PostCollection) -> Result<usize, DomainError> {
        let posts = self
            .repo
            .list_posts(Pagination::first_page(DISCOVER_LIMIT))
            .await?;
        self.fill(collection, posts, true).await
    }

    pub async fn load_profile_grid(
        &self,
        collection: &PostCollection,
        author_id: UserId,
    ) -> Result<usize, DomainError> {
        let posts = self.repo.list_posts_by_author(author_id).await?;
        self.fill(collection, posts, true).await
    }

    pub async fn load_liked(
        &self,
        collection: &PostCollection,
        user_id: UserId,
    ) -> Result<usize, DomainError> {
        let posts = self.repo.list_liked_posts(user_id).await?;
        self.fill(collection, posts, true).await
    }

    /// `authoritative`: загрузка описывает коллекцию целиком, и всё, чего
    /// в ней нет, удалено или больше не относится к экрану.
    async fn fill(
        &self,
        collection: &PostCollection,
        posts: Vec<Post>,
        authoritative: bool,
    ) -> Result<usize, DomainError> {
        let entries = self.build_entries(posts).await?;

        if authoritative {
            let live_ids: BTreeSet<PostId> = entries.iter().map(|entry| entry.post.id).collect();
            let vanished = collection.remove_if_absent(&live_ids);
            if !vanished.is_empty() {
                debug!(kind = ?collection.kind(), count = vanished.len(), "posts vanished since last load");
            }
        }

        let loaded = entries.len();
        collection.merge(entries);
        Ok(loaded)
    }

    /// Собирает записи коллекции: лайки одним запросом, превью комментариев
    /// по каждому посту.
    pub async fn build_entries(&self, posts: Vec<Post>) -> Result<Vec<PostEntry>, DomainError> {
        let ids: BTreeSet<PostId> = posts.iter().map(|post| post.id).collect();
        let mut likes = if ids.is_empty() {
            Default::default()
        } else {
            self.gateway.fetch_likes(&ids).await?
        };

        let mut entries = Vec::with_capacity(posts.len());
        for post in posts {
            let comments_preview = self
                .gateway
                .fetch_comments_preview(post.id, self.preview_limit)
                .await?;
            entries.push(PostEntry {
                likes: likes.remove(&post.id).unwrap_or_default(),
                comments_preview,
                post,
            });
        }
        Ok(entries)
    }

    pub async fn create_post(
        &self,
        session: &Session,
        req: NewPostRequest,
        views: &[CollectionHandle],
    ) -> Result<Post, DomainError> {
        let req = req.validate()?;
        let author_id = session.user_id();

        let new_post = NewPost {
            image_ref: req.image_ref,
            caption: req.caption,
            author_id,
        };
        let post = self.repo.create_post(new_post).await?;
        info!(post_id = %post.id, %author_id, "post created");

        for view in views {
            view.upsert(post.clone());
        }
        self.notifier
            .notify_mutated(&revalidation::after_post_created(author_id));
        Ok(post)
    }

    /// Удаляет собственный пост пользователя и убирает его из всех коллекций.
    pub async fn delete_post(
        &self,
        session: &Session,
        post_id: PostId,
        views: &[CollectionHandle],
    ) -> Result<(), DomainError> {
        let owner_id = session.user_id();
        let deleted = self.repo.delete_post_owned(post_id, owner_id).await?;
        if !deleted {
            return Err(DomainError::NotFound(format!(
                "post id: {post_id} (missing or not owned)"
            )));
        }
        info!(%post_id, %owner_id, "post deleted");

        for view in views {
            view.remove(post_id);
        }
        self.notifier
            .notify_mutated(&revalidation::after_post_deleted(owner_id));
        Ok(())
    }
}
