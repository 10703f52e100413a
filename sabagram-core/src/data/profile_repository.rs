use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::ids::UserId;
use crate::domain::profile::{AdminStats, BanPatch, Profile, ProfilePatch};

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: UserId,
    pub username: String,
    pub display_name: Option<String>,
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// `Conflict`, если профиль с таким `id` или `username` уже есть.
    async fn create_profile(&self, input: NewProfile) -> Result<Profile, DomainError>;
    async fn get_profile(&self, id: UserId) -> Result<Option<Profile>, DomainError>;
    /// Профили, чей `username` содержит `query` без учёта регистра.
    async fn search_profiles(&self, query: &str, limit: usize)
    -> Result<Vec<Profile>, DomainError>;
    async fn update_profile(
        &self,
        id: UserId,
        patch: ProfilePatch,
    ) -> Result<Option<Profile>, DomainError>;
    async fn set_ban(&self, id: UserId, patch: BanPatch) -> Result<bool, DomainError>;
    async fn count_stats(&self) -> Result<AdminStats, DomainError>;
}
