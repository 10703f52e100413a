use tracing::debug;

use crate::data::post_repository::PostRepository;
use crate::data::profile_repository::ProfileRepository;
use crate::domain::error::DomainError;
use crate::domain::post::Post;
use crate::domain::profile::Profile;

/// Сколько профилей и сколько постов возвращает один поиск.
pub const SEARCH_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub profiles: Vec<Profile>,
    pub posts: Vec<Post>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty() && self.posts.is_empty()
    }
}

/// Поиск по подстроке: пользователи по `username`, посты по подписи
/// (включая хэштеги).
pub struct SearchService<R: PostRepository, P: ProfileRepository> {
    posts: R,
    profiles: P,
    limit: usize,
}

impl<R: PostRepository, P: ProfileRepository> SearchService<R, P> {
    pub fn new(posts: R, profiles: P) -> Self {
        Self {
            posts,
            profiles,
            limit: SEARCH_LIMIT,
        }
    }

    pub async fn search(&self, query: &str) -> Result<SearchResults, DomainError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchResults::default());
        }

        let profiles = self.profiles.search_profiles(query, self.limit).await?;
        let posts = self.posts.search_posts(query, self.limit).await?;
        debug!(
            query,
            profiles = profiles.len(),
            posts = posts.len(),
            "search finished"
        );
        Ok(SearchResults { profiles, posts })
    }
}
