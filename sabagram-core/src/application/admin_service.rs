use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::application::revalidation;
use crate::data::notifier::MutationNotifier;
use crate::data::post_repository::PostRepository;
use crate::data::profile_repository::ProfileRepository;
use crate::domain::error::DomainError;
use crate::domain::ids::{PostId, UserId};
use crate::domain::profile::{AdminStats, BanPatch};
use crate::domain::session::AdminGrant;
use crate::view_model::CollectionHandle;

/// Модерация по единому общему секрету.
pub struct AdminService<R: PostRepository, P: ProfileRepository> {
    posts: R,
    profiles: P,
    notifier: Arc<dyn MutationNotifier>,
    admin_key: Option<String>,
}

impl<R: PostRepository, P: ProfileRepository> AdminService<R, P> {
    pub fn new(
        posts: R,
        profiles: P,
        notifier: Arc<dyn MutationNotifier>,
        admin_key: Option<String>,
    ) -> Self {
        Self {
            posts,
            profiles,
            notifier,
            admin_key: admin_key.filter(|key| !key.is_empty()),
        }
    }

    pub fn verify_admin_key(&self, provided: &str) -> Result<AdminGrant, DomainError> {
        let Some(expected) = self.admin_key.as_deref() else {
            warn!("admin key is not configured, refusing admin access");
            return Err(DomainError::Forbidden);
        };
        if !constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
            warn!("invalid admin key");
            return Err(DomainError::Forbidden);
        }
        Ok(AdminGrant::issue())
    }

    /// Удаляет любой пост и убирает его из всех коллекций.
    pub async fn delete_post(
        &self,
        _grant: &AdminGrant,
        post_id: PostId,
        views: &[CollectionHandle],
    ) -> Result<(), DomainError> {
        let post = self
            .posts
            .get_post(post_id)
            .await?
            .ok_or(DomainError::NotFound(format!("post id: {post_id}")))?;

        if !self.posts.delete_post(post_id).await? {
            return Err(DomainError::NotFound(format!("post id: {post_id}")));
        }
        info!(%post_id, author_id = %post.author_id, "post deleted by admin");

        for view in views {
            view.remove(post_id);
        }
        self.notifier
            .notify_mutated(&revalidation::after_post_deleted(post.author_id));
        Ok(())
    }

    pub async fn ban_user(
        &self,
        _grant: &AdminGrant,
        user_id: UserId,
        reason: Option<String>,
    ) -> Result<(), DomainError> {
        self.apply_ban(user_id, BanPatch::ban(reason, Utc::now()))
            .await?;
        info!(%user_id, "user banned");
        Ok(())
    }

    pub async fn unban_user(&self, _grant: &AdminGrant, user_id: UserId) -> Result<(), DomainError> {
        self.apply_ban(user_id, BanPatch::lift()).await?;
        info!(%user_id, "user unbanned");
        Ok(())
    }

    async fn apply_ban(&self, user_id: UserId, patch: BanPatch) -> Result<(), DomainError> {
        if !self.profiles.set_ban(user_id, patch).await? {
            return Err(DomainError::NotFound(format!("profile id: {user_id}")));
        }
        self.notifier
            .notify_mutated(&revalidation::after_moderation());
        Ok(())
    }

    pub async fn stats(&self, _grant: &AdminGrant) -> Result<AdminStats, DomainError> {
        self.profiles.count_stats().await
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::{AdminService, constant_time_eq};
    use crate::data::interaction_gateway::InteractionGateway;
    use crate::data::profile_repository::ProfileRepository;
    use crate::data::repositories::memory::InMemoryStore;
    use crate::domain::error::DomainError;
    use crate::domain::ids::{PostId, UserId};
    use crate::domain::post::Post;
    use crate::domain::profile::Profile;
    use crate::infrastructure::revalidation::RecordingNotifier;
    use crate::view_model::{CollectionKind, PostCollection};

    fn sample_profile(id: UserId) -> Profile {
        Profile {
            id,
            username: "target".to_string(),
            display_name: None,
            avatar_ref: None,
            bio: None,
            location: None,
            banned: false,
            ban_reason: None,
        }
    }

    fn service(
        store: &InMemoryStore,
        key: Option<&str>,
    ) -> (AdminService<InMemoryStore, InMemoryStore>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let service = AdminService::new(
            store.clone(),
            store.clone(),
            notifier.clone(),
            key.map(str::to_string),
        );
        (service, notifier)
    }

    #[test]
    fn constant_time_eq_compares_bytes() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret2"));
    }

    #[test]
    fn wrong_or_unconfigured_key_is_forbidden() {
        let store = InMemoryStore::new();
        let (configured, _) = service(&store, Some("moderator-key"));
        assert!(configured.verify_admin_key("moderator-key").is_ok());
        assert_eq!(
            configured.verify_admin_key("admin123"),
            Err(DomainError::Forbidden)
        );

        let (unconfigured, _) = service(&store, Some(""));
        assert_eq!(unconfigured.verify_admin_key(""), Err(DomainError::Forbidden));
    }

    #[tokio::test]
    async fn ban_and_unban_update_profile_and_stats() {
        let store = InMemoryStore::new();
        let target = UserId::new_v4();
        store
            .insert_profile(sample_profile(target))
            .expect("insert profile");
        let (service, notifier) = service(&store, Some("key"));
        let grant = service.verify_admin_key("key").expect("grant");

        service
            .ban_user(&grant, target, Some("spam".to_string()))
            .await
            .expect("ban must succeed");
        let banned = store
            .get_profile(target)
            .await
            .expect("get")
            .expect("profile present");
        assert!(banned.banned);
        assert_eq!(banned.ban_reason.as_deref(), Some("spam"));
        assert_eq!(service.stats(&grant).await.expect("stats").banned_users, 1);

        service.unban_user(&grant, target).await.expect("unban");
        let stats = service.stats(&grant).await.expect("stats");
        assert_eq!(stats.banned_users, 0);
        assert_eq!(stats.total_users, 1);
        assert!(notifier.was_notified("/admin"));
    }

    #[tokio::test]
    async fn ban_unknown_user_is_not_found() {
        let store = InMemoryStore::new();
        let (service, _) = service(&store, Some("key"));
        let grant = service.verify_admin_key("key").expect("grant");

        let err = service
            .ban_user(&grant, UserId::new_v4(), None)
            .await
            .expect_err("user is missing");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn admin_delete_removes_foreign_post_everywhere() {
        let store = InMemoryStore::new();
        let author = UserId::new_v4();
        let post = Post::new(PostId::new_v4(), "img", None, author, Utc::now())
            .expect("sample post must be valid");
        store.insert_post(post.clone()).expect("insert post");
        store
            .create_like(post.id, UserId::new_v4())
            .await
            .expect("like");

        let (service, notifier) = service(&store, Some("key"));
        let grant = service.verify_admin_key("key").expect("grant");
        let admin_view = PostCollection::handle(CollectionKind::Admin);
        admin_view.upsert(post.clone());

        service
            .delete_post(&grant, post.id, &[admin_view.clone()])
            .await
            .expect("admin delete must succeed");

        assert!(admin_view.is_empty());
        assert_eq!(service.stats(&grant).await.expect("stats").total_likes, 0);
        assert!(notifier.was_notified(&format!("/profile/{author}")));
    }
}
