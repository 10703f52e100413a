use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use sabagram_core::data::interaction_gateway::InteractionGateway;
use sabagram_core::data::post_repository::{NewPost, Pagination, PostRepository};
use sabagram_core::data::profile_repository::{NewProfile, ProfileRepository};
use sabagram_core::domain::interaction::{Comment, LikeInsert};
use sabagram_core::domain::post::Post;
use sabagram_core::domain::profile::{AdminStats, BanPatch, Profile, ProfilePatch};
use sabagram_core::{CommentId, DomainError, PostId, UserId};
use tracing::{debug, warn};

use crate::error::RestError;
use crate::http_client::{PostgrestClient, Query, eq, ilike_contains, in_list};
use crate::models::{
    BanUpdateRow, COMMENT_COLUMNS, CommentRow, IdRow, LikeRow, LikedPostRow, NewCommentRow,
    NewLikeRow, NewPostRow, NewProfileRow, POST_COLUMNS, PROFILE_COLUMNS, PostRow, ProfileRow,
    ProfileUpdateRow,
};

const POSTS: &str = "posts";
const LIKES: &str = "likes";
const COMMENTS: &str = "comments";
const PROFILES: &str = "profiles";

#[derive(Debug, Clone)]
/// Хранилище Sabagram поверх таблиц `posts`, `likes`, `comments`, `profiles`.
///
/// Удаление поста полагается на каскадные внешние ключи в схеме: лайки и
/// комментарии уходят вместе с ним.
pub struct RestGateway {
    client: PostgrestClient,
}

impl RestGateway {
    /// Оборачивает готовый клиент PostgREST.
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }

    fn posts_from_rows(rows: Vec<PostRow>) -> Result<Vec<Post>, DomainError> {
        rows.into_iter().map(Post::try_from).collect()
    }

    async fn count(&self, table: &str, filters: Query) -> Result<u64, DomainError> {
        Ok(self.client.count(table, &filters).await?)
    }
}

#[async_trait]
impl InteractionGateway for RestGateway {
    async fn create_like(
        &self,
        post_id: PostId,
        user_id: UserId,
    ) -> Result<LikeInsert, DomainError> {
        match self
            .client
            .insert(LIKES, &NewLikeRow { post_id, user_id })
            .await
        {
            Ok(()) => Ok(LikeInsert::Created),
            Err(err) if err.is_unique_violation() => {
                debug!(%post_id, %user_id, "like already exists");
                Ok(LikeInsert::AlreadyExisted)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_like(&self, post_id: PostId, user_id: UserId) -> Result<(), DomainError> {
        let filters = vec![("post_id", eq(post_id)), ("user_id", eq(user_id))];
        Ok(self.client.delete(LIKES, &filters).await?)
    }

    async fn create_comment(
        &self,
        post_id: PostId,
        user_id: UserId,
        content: &str,
    ) -> Result<CommentId, DomainError> {
        let rows: Vec<IdRow<CommentId>> = self
            .client
            .insert_returning(
                COMMENTS,
                &NewCommentRow {
                    post_id,
                    user_id,
                    content,
                },
                "id",
            )
            .await?;

        rows.into_iter()
            .next()
            .map(|row| row.id)
            .ok_or_else(|| DomainError::Unexpected("comment insert returned no rows".to_string()))
    }

    async fn fetch_comments_preview(
        &self,
        post_id: PostId,
        limit: usize,
    ) -> Result<Vec<Comment>, DomainError> {
        let query = vec![
            ("select", COMMENT_COLUMNS.to_string()),
            ("post_id", eq(post_id)),
            ("order", "created_at.asc,id.asc".to_string()),
            ("limit", limit.to_string()),
        ];
        let rows: Vec<CommentRow> = self.client.select(COMMENTS, &query).await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn fetch_comments(&self, post_id: PostId) -> Result<Vec<Comment>, DomainError> {
        let query = vec![
            ("select", COMMENT_COLUMNS.to_string()),
            ("post_id", eq(post_id)),
            ("order", "created_at.asc,id.asc".to_string()),
        ];
        let rows: Vec<CommentRow> = self.client.select(COMMENTS, &query).await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn fetch_likes(
        &self,
        post_ids: &BTreeSet<PostId>,
    ) -> Result<BTreeMap<PostId, BTreeSet<UserId>>, DomainError> {
        if post_ids.is_empty() {
            return Ok(BTreeMap::new());
        }

        let query = vec![
            ("select", "post_id,user_id".to_string()),
            ("post_id", in_list(post_ids)),
        ];
        let rows: Vec<LikeRow> = self.client.select(LIKES, &query).await?;

        let mut likes: BTreeMap<PostId, BTreeSet<UserId>> = BTreeMap::new();
        for row in rows {
            likes.entry(row.post_id).or_default().insert(row.user_id);
        }
        Ok(likes)
    }
}

#[async_trait]
impl PostRepository for RestGateway {
    async fn list_posts(&self, pagination: Pagination) -> Result<Vec<Post>, DomainError> {
        let query = vec![
            ("select", POST_COLUMNS.to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", pagination.limit.to_string()),
            ("offset", pagination.offset.to_string()),
        ];
        let rows: Vec<PostRow> = self.client.select(POSTS, &query).await?;
        Self::posts_from_rows(rows)
    }

    async fn list_posts_by_author(&self, author_id: UserId) -> Result<Vec<Post>, DomainError> {
        let query = vec![
            ("select", POST_COLUMNS.to_string()),
            ("user_id", eq(author_id)),
            ("order", "created_at.desc".to_string()),
        ];
        let rows: Vec<PostRow> = self.client.select(POSTS, &query).await?;
        Self::posts_from_rows(rows)
    }

    async fn list_liked_posts(&self, user_id: UserId) -> Result<Vec<Post>, DomainError> {
        let query = vec![
            ("select", format!("posts({POST_COLUMNS})")),
            ("user_id", eq(user_id)),
        ];
        let rows: Vec<LikedPostRow> = self.client.select(LIKES, &query).await?;

        // встроенный пост нельзя упорядочить на стороне PostgREST
        let mut posts =
            Self::posts_from_rows(rows.into_iter().filter_map(|row| row.posts).collect())?;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn search_posts(&self, query: &str, limit: usize) -> Result<Vec<Post>, DomainError> {
        let query = vec![
            ("select", POST_COLUMNS.to_string()),
            ("caption", ilike_contains(query)),
            ("order", "created_at.desc".to_string()),
            ("limit", limit.to_string()),
        ];
        let rows: Vec<PostRow> = self.client.select(POSTS, &query).await?;
        Self::posts_from_rows(rows)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, DomainError> {
        let query = vec![
            ("select", POST_COLUMNS.to_string()),
            ("id", eq(id)),
            ("limit", "1".to_string()),
        ];
        let rows: Vec<PostRow> = self.client.select(POSTS, &query).await?;
        rows.into_iter().next().map(Post::try_from).transpose()
    }

    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let rows: Vec<PostRow> = self
            .client
            .insert_returning(
                POSTS,
                &NewPostRow {
                    image_url: &input.image_ref,
                    caption: &input.caption,
                    user_id: input.author_id,
                },
                POST_COLUMNS,
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| DomainError::Unexpected("post insert returned no rows".to_string()))
            .and_then(Post::try_from)
    }

    async fn delete_post_owned(&self, id: PostId, owner_id: UserId) -> Result<bool, DomainError> {
        let filters = vec![("id", eq(id)), ("user_id", eq(owner_id))];
        let rows: Vec<IdRow<PostId>> = self.client.delete_returning(POSTS, &filters).await?;
        Ok(!rows.is_empty())
    }

    async fn delete_post(&self, id: PostId) -> Result<bool, DomainError> {
        let filters = vec![("id", eq(id))];
        let rows: Vec<IdRow<PostId>> = self.client.delete_returning(POSTS, &filters).await?;
        Ok(!rows.is_empty())
    }
}

#[async_trait]
impl ProfileRepository for RestGateway {
    async fn create_profile(&self, input: NewProfile) -> Result<Profile, DomainError> {
        let rows: Vec<ProfileRow> = self
            .client
            .insert_returning(
                PROFILES,
                &NewProfileRow {
                    id: input.id,
                    username: &input.username,
                    full_name: input.display_name.as_deref(),
                },
                PROFILE_COLUMNS,
            )
            .await?;

        rows.into_iter()
            .next()
            .map(Profile::from)
            .ok_or_else(|| DomainError::Unexpected("profile insert returned no rows".to_string()))
    }

    async fn search_profiles(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Profile>, DomainError> {
        let query = vec![
            ("select", PROFILE_COLUMNS.to_string()),
            ("username", ilike_contains(query)),
            ("order", "username.asc".to_string()),
            ("limit", limit.to_string()),
        ];
        let rows: Vec<ProfileRow> = self.client.select(PROFILES, &query).await?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }

    async fn get_profile(&self, id: UserId) -> Result<Option<Profile>, DomainError> {
        let query = vec![
            ("select", PROFILE_COLUMNS.to_string()),
            ("id", eq(id)),
            ("limit", "1".to_string()),
        ];
        let rows: Vec<ProfileRow> = self.client.select(PROFILES, &query).await?;
        Ok(rows.into_iter().next().map(Profile::from))
    }

    async fn update_profile(
        &self,
        id: UserId,
        patch: ProfilePatch,
    ) -> Result<Option<Profile>, DomainError> {
        let filters = vec![("id", eq(id))];
        let rows: Vec<ProfileRow> = self
            .client
            .update_returning(
                PROFILES,
                &filters,
                &ProfileUpdateRow::from(&patch),
                PROFILE_COLUMNS,
            )
            .await?;
        Ok(rows.into_iter().next().map(Profile::from))
    }

    async fn set_ban(&self, id: UserId, patch: BanPatch) -> Result<bool, DomainError> {
        let filters = vec![("id", eq(id))];
        let rows: Vec<IdRow<UserId>> = self
            .client
            .update_returning(PROFILES, &filters, &BanUpdateRow::from(&patch), "id")
            .await?;
        Ok(!rows.is_empty())
    }

    async fn count_stats(&self) -> Result<AdminStats, DomainError> {
        let total_users = self.count(PROFILES, Vec::new()).await?;
        let total_posts = self.count(POSTS, Vec::new()).await?;
        let total_comments = self.count(COMMENTS, Vec::new()).await?;

        // счётчики необязательных таблиц и колонок деградируют до нуля
        let total_likes = optional_count(LIKES, self.client.count(LIKES, &Vec::new()).await)?;
        let banned_users = optional_count(
            "profiles.banned",
            self.client
                .count(PROFILES, &vec![("banned", eq(true))])
                .await,
        )?;

        Ok(AdminStats {
            total_users,
            total_posts,
            total_likes,
            total_comments,
            banned_users,
        })
    }
}

fn optional_count(what: &str, result: Result<u64, RestError>) -> Result<u64, DomainError> {
    match result {
        Ok(count) => Ok(count),
        Err(err) if err.is_schema_mismatch() => {
            warn!(what, error = %err, "count unavailable, reporting zero");
            Ok(0)
        }
        Err(err) => Err(err.into()),
    }
}
