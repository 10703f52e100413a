use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::data::interaction_gateway::InteractionGateway;
use crate::data::post_repository::{NewPost, Pagination, PostRepository};
use crate::data::profile_repository::{NewProfile, ProfileRepository};
use crate::domain::error::DomainError;
use crate::domain::ids::{CommentId, PostId, UserId};
use crate::domain::interaction::{Comment, LikeInsert};
use crate::domain::post::Post;
use crate::domain::profile::{AdminStats, BanPatch, Profile, ProfilePatch};

/// Хранилище в памяти процесса с теми же гарантиями, что и удалённое:
/// уникальность лайка по `(post_id, user_id)`, каскадное удаление
/// лайков и комментариев вместе с постом.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    profiles: BTreeMap<UserId, Profile>,
    posts: Vec<Post>,
    likes: BTreeSet<(PostId, UserId)>,
    comments: Vec<Comment>,
}

impl MemoryState {
    fn has_post(&self, id: PostId) -> bool {
        self.posts.iter().any(|post| post.id == id)
    }

    fn remove_post(&mut self, id: PostId) -> bool {
        let before = self.posts.len();
        self.posts.retain(|post| post.id != id);
        if self.posts.len() == before {
            return false;
        }
        self.likes.retain(|(post_id, _)| *post_id != id);
        self.comments.retain(|comment| comment.post_id != id);
        true
    }

    fn comments_of(&self, post_id: PostId) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect();
        // sort_by_key стабилен: при равном created_at сохраняется порядок вставки
        comments.sort_by_key(|comment| comment.created_at);
        comments
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, DomainError> {
        self.state
            .lock()
            .map_err(|_| DomainError::Unexpected("in-memory store mutex poisoned".to_string()))
    }

    pub fn insert_profile(&self, profile: Profile) -> Result<(), DomainError> {
        self.lock()?.profiles.insert(profile.id, profile);
        Ok(())
    }

    pub fn insert_post(&self, post: Post) -> Result<(), DomainError> {
        let mut state = self.lock()?;
        if state.has_post(post.id) {
            return Err(DomainError::Unexpected(format!("post {} already stored", post.id)));
        }
        state.posts.push(post);
        Ok(())
    }

    pub fn insert_comment(&self, comment: Comment) -> Result<(), DomainError> {
        let mut state = self.lock()?;
        if !state.has_post(comment.post_id) {
            return Err(DomainError::NotFound(format!("post id: {}", comment.post_id)));
        }
        state.comments.push(comment);
        Ok(())
    }

    /// Текущее авторитетное множество лайков поста.
    pub fn likes_of(&self, post_id: PostId) -> Result<BTreeSet<UserId>, DomainError> {
        Ok(self
            .lock()?
            .likes
            .iter()
            .filter(|(liked_post, _)| *liked_post == post_id)
            .map(|(_, user_id)| *user_id)
            .collect())
    }
}

#[async_trait]
impl InteractionGateway for InMemoryStore {
    async fn create_like(
        &self,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<LikeInsert, DomainError> {
        let mut state = self.lock()?;
        if !state.has_post(post_id) {
            return Err(DomainError::NotFound(format!("post id: {post_id}")));
        }
        if state.likes.insert((post_id, user_id)) {
            Ok(LikeInsert::Created)
        } else {
            Ok(LikeInsert::AlreadyExisted)
        }
    }

    async fn delete_like(&self, post_id: PostId, user_id: UserId) -> Result<(), DomainError> {
        self.lock()?.likes.remove(&(post_id, user_id));
        Ok(())
    }

    async fn create_comment(
        &self,
        post_id: PostId,
        user_id: UserId,
        content: &str,
    ) -> Result<CommentId, DomainError> {
        let mut state = self.lock()?;
        if !state.has_post(post_id) {
            return Err(DomainError::NotFound(format!("post id: {post_id}")));
        }
        let id = CommentId::new_v4();
        state.comments.push(Comment {
            id,
            post_id,
            author_id: user_id,
            content: content.to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn fetch_comments_preview(
        &self,
        post_id: PostId,
        limit: usize,
    ) -> Result<Vec<Comment>, DomainError> {
        let mut comments = self.lock()?.comments_of(post_id);
        comments.truncate(limit);
        Ok(comments)
    }

    async fn fetch_comments(&self, post_id: PostId) -> Result<Vec<Comment>, DomainError> {
        Ok(self.lock()?.comments_of(post_id))
    }

    async fn fetch_likes(
        &self,
        post_ids: &BTreeSet<PostId>,
    ) -> Result<BTreeMap<PostId, BTreeSet<UserId>>, DomainError> {
        let state = self.lock()?;
        let mut likes: BTreeMap<PostId, BTreeSet<UserId>> = BTreeMap::new();
        for (post_id, user_id) in &state.likes {
            if post_ids.contains(post_id) {
                likes.entry(*post_id).or_default().insert(*user_id);
            }
        }
        Ok(likes)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn list_posts(&self, pagination: Pagination) -> Result<Vec<Post>, DomainError> {
        let mut posts = self.lock()?.posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect())
    }

    async fn list_posts_by_author(&self, author_id: UserId) -> Result<Vec<Post>, DomainError> {
        let mut posts: Vec<Post> = self
            .lock()?
            .posts
            .iter()
            .filter(|post| post.author_id == author_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn list_liked_posts(&self, user_id: UserId) -> Result<Vec<Post>, DomainError> {
        let state = self.lock()?;
        let mut posts: Vec<Post> = state
            .posts
            .iter()
            .filter(|post| state.likes.contains(&(post.id, user_id)))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn search_posts(&self, query: &str, limit: usize) -> Result<Vec<Post>, DomainError> {
        let mut posts: Vec<Post> = self
            .lock()?
            .posts
            .iter()
            .filter(|post| {
                post.caption
                    .as_deref()
                    .is_some_and(|caption| contains_ignore_case(caption, query))
            })
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit);
        Ok(posts)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, DomainError> {
        Ok(self.lock()?.posts.iter().find(|post| post.id == id).cloned())
    }

    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let mut state = self.lock()?;
        if !state.profiles.contains_key(&input.author_id) {
            return Err(DomainError::NotFound(format!("profile id: {}", input.author_id)));
        }
        let post = Post::new(
            PostId::new_v4(),
            input.image_ref,
            Some(input.caption),
            input.author_id,
            Utc::now(),
        )?;
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn delete_post_owned(&self, id: PostId, owner_id: UserId) -> Result<bool, DomainError> {
        let mut state = self.lock()?;
        let owned = state
            .posts
            .iter()
            .any(|post| post.id == id && post.author_id == owner_id);
        if !owned {
            return Ok(false);
        }
        Ok(state.remove_post(id))
    }

    async fn delete_post(&self, id: PostId) -> Result<bool, DomainError> {
        Ok(self.lock()?.remove_post(id))
    }
}

#[async_trait]
impl ProfileRepository for InMemoryStore {
    async fn create_profile(&self, input: NewProfile) -> Result<Profile, DomainError> {
        let mut state = self.lock()?;
        if state.profiles.contains_key(&input.id) {
            return Err(DomainError::Conflict(format!("profile id: {}", input.id)));
        }
        if state
            .profiles
            .values()
            .any(|profile| profile.username == input.username)
        {
            return Err(DomainError::Conflict(format!("username: {}", input.username)));
        }

        let profile = Profile {
            id: input.id,
            username: input.username,
            display_name: input.display_name,
            avatar_ref: None,
            bio: None,
            location: None,
            banned: false,
            ban_reason: None,
        };
        state.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn get_profile(&self, id: UserId) -> Result<Option<Profile>, DomainError> {
        Ok(self.lock()?.profiles.get(&id).cloned())
    }

    async fn search_profiles(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Profile>, DomainError> {
        let mut profiles: Vec<Profile> = self
            .lock()?
            .profiles
            .values()
            .filter(|profile| contains_ignore_case(&profile.username, query))
            .cloned()
            .collect();
        profiles.sort_by(|a, b| a.username.cmp(&b.username));
        profiles.truncate(limit);
        Ok(profiles)
    }

    async fn update_profile(
        &self,
        id: UserId,
        patch: ProfilePatch,
    ) -> Result<Option<Profile>, DomainError> {
        let mut state = self.lock()?;
        let Some(profile) = state.profiles.get_mut(&id) else {
            return Ok(None);
        };

        profile.username = patch.username;
        profile.display_name = patch.display_name;
        profile.bio = patch.bio;
        profile.location = patch.location;
        if let Some(avatar_ref) = patch.avatar_ref {
            profile.avatar_ref = Some(avatar_ref);
        }
        Ok(Some(profile.clone()))
    }

    async fn set_ban(&self, id: UserId, patch: BanPatch) -> Result<bool, DomainError> {
        let mut state = self.lock()?;
        let Some(profile) = state.profiles.get_mut(&id) else {
            return Ok(false);
        };
        profile.banned = patch.banned;
        profile.ban_reason = patch.reason;
        Ok(true)
    }

    async fn count_stats(&self) -> Result<AdminStats, DomainError> {
        let state = self.lock()?;
        Ok(AdminStats {
            total_users: state.profiles.len() as u64,
            total_posts: state.posts.len() as u64,
            total_likes: state.likes.len() as u64,
            total_comments: state.comments.len() as u64,
            banned_users: state.profiles.values().filter(|p| p.banned).count() as u64,
        })
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{Duration, TimeZone, Utc};

    use super::InMemoryStore;
    use crate::data::interaction_gateway::InteractionGateway;
    use crate::data::post_repository::{Pagination, PostRepository};
    use crate::data::profile_repository::{NewProfile, ProfileRepository};
    use crate::domain::error::DomainError;
    use crate::domain::ids::{CommentId, PostId, UserId};
    use crate::domain::interaction::{Comment, LikeInsert};
    use crate::domain::post::Post;

    fn captioned_post(store: &InMemoryStore, caption: &str, minutes: i64) -> Post {
        let created_at = Utc
            .timestamp_opt(1_700_000_000, 0)
            .single()
            .expect("valid ts")
            + Duration::minutes(minutes);
        let post = Post::new(
            PostId::new_v4(),
            "img",
            Some(caption.to_string()),
            UserId::new_v4(),
            created_at,
        )
        .expect("sample post must be valid");
        store.insert_post(post.clone()).expect("insert post");
        post
    }

    fn new_profile(username: &str) -> NewProfile {
        NewProfile {
            id: UserId::new_v4(),
            username: username.to_string(),
            display_name: None,
        }
    }

    fn seeded_post(store: &InMemoryStore, minutes: i64) -> Post {
        let created_at = Utc
            .timestamp_opt(1_700_000_000, 0)
            .single()
            .expect("valid ts")
            + Duration::minutes(minutes);
        let post = Post::new(PostId::new_v4(), "img", None, UserId::new_v4(), created_at)
            .expect("sample post must be valid");
        store.insert_post(post.clone()).expect("insert post");
        post
    }

    #[tokio::test]
    async fn second_like_insert_reports_already_existed() {
        let store = InMemoryStore::new();
        let post = seeded_post(&store, 0);
        let user = UserId::new_v4();

        let first = store.create_like(post.id, user).await.expect("first insert");
        let second = store.create_like(post.id, user).await.expect("second insert");

        assert_eq!(first, LikeInsert::Created);
        assert_eq!(second, LikeInsert::AlreadyExisted);
        assert_eq!(store.likes_of(post.id).expect("likes").len(), 1);
    }

    #[tokio::test]
    async fn like_on_missing_post_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .create_like(PostId::new_v4(), UserId::new_v4())
            .await
            .expect_err("post is missing");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn preview_returns_two_oldest_comments() {
        let store = InMemoryStore::new();
        let post = seeded_post(&store, 0);
        let base = post.created_at;

        // вставляем не по порядку, чтобы проверить сортировку
        for (minutes, text) in [(30, "third"), (10, "first"), (40, "fourth"), (20, "second")] {
            store
                .insert_comment(Comment {
                    id: CommentId::new_v4(),
                    post_id: post.id,
                    author_id: UserId::new_v4(),
                    content: text.to_string(),
                    created_at: base + Duration::minutes(minutes),
                })
                .expect("insert comment");
        }

        let preview = store
            .fetch_comments_preview(post.id, 2)
            .await
            .expect("preview");
        let texts: Vec<&str> = preview.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);

        let thread = store.fetch_comments(post.id).await.expect("thread");
        assert_eq!(thread.len(), 4);
        assert_eq!(thread[3].content, "fourth");
    }

    #[tokio::test]
    async fn list_posts_is_newest_first_and_paginated() {
        let store = InMemoryStore::new();
        let older = seeded_post(&store, 0);
        let newer = seeded_post(&store, 5);

        let first_page = store
            .list_posts(Pagination::first_page(1))
            .await
            .expect("list");
        assert_eq!(first_page.len(), 1);
        assert_eq!(first_page[0].id, newer.id);

        let second_page = store
            .list_posts(Pagination {
                limit: 1,
                offset: 1,
            })
            .await
            .expect("list");
        assert_eq!(second_page[0].id, older.id);
    }

    #[tokio::test]
    async fn delete_post_cascades_likes() {
        let store = InMemoryStore::new();
        let post = seeded_post(&store, 0);
        let user = UserId::new_v4();
        store.create_like(post.id, user).await.expect("like");

        let deleted = store.delete_post(post.id).await.expect("delete");
        assert!(deleted);

        let likes = store
            .fetch_likes(&BTreeSet::from([post.id]))
            .await
            .expect("likes");
        assert!(likes.is_empty());
    }

    #[tokio::test]
    async fn delete_post_owned_refuses_foreign_post() {
        let store = InMemoryStore::new();
        let post = seeded_post(&store, 0);

        let deleted = store
            .delete_post_owned(post.id, UserId::new_v4())
            .await
            .expect("delete");
        assert!(!deleted);
        assert!(store.get_post(post.id).await.expect("get").is_some());
    }

    #[tokio::test]
    async fn liked_posts_are_newest_post_first_regardless_of_like_order() {
        let store = InMemoryStore::new();
        let older = seeded_post(&store, 0);
        let newer = seeded_post(&store, 10);
        let user = UserId::new_v4();

        store.create_like(newer.id, user).await.expect("like newer");
        store.create_like(older.id, user).await.expect("like older");

        let liked = store.list_liked_posts(user).await.expect("liked");
        let ids: Vec<PostId> = liked.iter().map(|post| post.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn create_profile_rejects_taken_username() {
        let store = InMemoryStore::new();
        let created = store
            .create_profile(new_profile("saba"))
            .await
            .expect("first profile");
        assert_eq!(created.username, "saba");
        assert!(!created.banned);

        let err = store
            .create_profile(new_profile("saba"))
            .await
            .expect_err("username is taken");
        assert!(matches!(err, DomainError::Conflict(_)));

        let mut same_id = new_profile("other");
        same_id.id = created.id;
        let err = store
            .create_profile(same_id)
            .await
            .expect_err("id is taken");
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn search_matches_case_insensitively_and_caps_results() {
        let store = InMemoryStore::new();
        for username in ["Sabina", "saba", "nika"] {
            store
                .create_profile(new_profile(username))
                .await
                .expect("profile");
        }
        let sunset = captioned_post(&store, "Sunset over #Tbilisi", 0);
        let later = captioned_post(&store, "another tbilisi evening", 5);
        captioned_post(&store, "mountains", 10);

        let profiles = store.search_profiles("SAB", 5).await.expect("profiles");
        let names: Vec<&str> = profiles.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, vec!["Sabina", "saba"]);

        let posts = store.search_posts("tbilisi", 5).await.expect("posts");
        let ids: Vec<PostId> = posts.iter().map(|post| post.id).collect();
        assert_eq!(ids, vec![later.id, sunset.id]);

        let capped = store.search_posts("tbilisi", 1).await.expect("posts");
        assert_eq!(capped.len(), 1);
    }
}
