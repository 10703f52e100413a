use chrono::{DateTime, Utc};
use sabagram_core::domain::interaction::Comment;
use sabagram_core::domain::post::Post;
use sabagram_core::domain::profile::{BanPatch, Profile, ProfilePatch};
use sabagram_core::{CommentId, DomainError, PostId, UserId};
use serde::{Deserialize, Serialize};

pub(crate) const POST_COLUMNS: &str = "id,image_url,caption,user_id,created_at";
pub(crate) const COMMENT_COLUMNS: &str = "id,post_id,user_id,content,created_at";
pub(crate) const PROFILE_COLUMNS: &str =
    "id,username,full_name,avatar_url,bio,location,banned,ban_reason";

#[derive(Debug, Deserialize)]
pub(crate) struct PostRow {
    id: PostId,
    image_url: String,
    caption: Option<String>,
    user_id: UserId,
    created_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = DomainError;

    fn try_from(value: PostRow) -> Result<Self, Self::Error> {
        Post::new(
            value.id,
            value.image_url,
            value.caption,
            value.user_id,
            value.created_at,
        )
    }
}

/// Строка `likes` со встроенным постом (`select=posts(...)`).
#[derive(Debug, Deserialize)]
pub(crate) struct LikedPostRow {
    pub(crate) posts: Option<PostRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LikeRow {
    pub(crate) post_id: PostId,
    pub(crate) user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentRow {
    id: CommentId,
    post_id: PostId,
    user_id: UserId,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(value: CommentRow) -> Self {
        Self {
            id: value.id,
            post_id: value.post_id,
            author_id: value.user_id,
            content: value.content,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileRow {
    id: UserId,
    username: String,
    full_name: Option<String>,
    avatar_url: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    // колонки модерации могут отсутствовать в старых схемах
    #[serde(default)]
    banned: Option<bool>,
    #[serde(default)]
    ban_reason: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(value: ProfileRow) -> Self {
        Self {
            id: value.id,
            username: value.username,
            display_name: value.full_name,
            avatar_ref: value.avatar_url,
            bio: value.bio,
            location: value.location,
            banned: value.banned.unwrap_or(false),
            ban_reason: value.ban_reason,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct IdRow<T> {
    pub(crate) id: T,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewLikeRow {
    pub(crate) post_id: PostId,
    pub(crate) user_id: UserId,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewCommentRow<'a> {
    pub(crate) post_id: PostId,
    pub(crate) user_id: UserId,
    pub(crate) content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewPostRow<'a> {
    pub(crate) image_url: &'a str,
    pub(crate) caption: &'a str,
    pub(crate) user_id: UserId,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewProfileRow<'a> {
    pub(crate) id: UserId,
    pub(crate) username: &'a str,
    pub(crate) full_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProfileUpdateRow<'a> {
    username: &'a str,
    full_name: Option<&'a str>,
    bio: Option<&'a str>,
    location: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar_url: Option<&'a str>,
}

impl<'a> From<&'a ProfilePatch> for ProfileUpdateRow<'a> {
    fn from(value: &'a ProfilePatch) -> Self {
        Self {
            username: &value.username,
            full_name: value.display_name.as_deref(),
            bio: value.bio.as_deref(),
            location: value.location.as_deref(),
            avatar_url: value.avatar_ref.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct BanUpdateRow<'a> {
    banned: bool,
    ban_reason: Option<&'a str>,
    banned_at: Option<DateTime<Utc>>,
}

impl<'a> From<&'a BanPatch> for BanUpdateRow<'a> {
    fn from(value: &'a BanPatch) -> Self {
        Self {
            banned: value.banned,
            ban_reason: value.reason.as_deref(),
            banned_at: value.banned_at,
        }
    }
}
