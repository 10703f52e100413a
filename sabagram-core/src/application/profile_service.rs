use std::sync::Arc;

use tracing::info;

use crate::application::revalidation;
use crate::data::notifier::MutationNotifier;
use crate::data::profile_repository::{NewProfile, ProfileRepository};
use crate::domain::error::DomainError;
use crate::domain::ids::UserId;
use crate::domain::profile::{NewProfileRequest, Profile, ProfilePatch, ProfileUpdateRequest};
use crate::domain::session::Session;

pub struct ProfileService<P: ProfileRepository> {
    repo: P,
    notifier: Arc<dyn MutationNotifier>,
}

impl<P: ProfileRepository> ProfileService<P> {
    pub fn new(repo: P, notifier: Arc<dyn MutationNotifier>) -> Self {
        Self { repo, notifier }
    }

    /// Создаёт строку профиля для только что зарегистрированного
    /// пользователя сессии.
    pub async fn create_profile(
        &self,
        session: &Session,
        req: NewProfileRequest,
    ) -> Result<Profile, DomainError> {
        let req = req.validate()?;
        let user_id = session.user_id();

        let profile = self
            .repo
            .create_profile(NewProfile {
                id: user_id,
                username: req.username,
                display_name: req.display_name,
            })
            .await?;
        info!(%user_id, username = %profile.username, "profile created");
        Ok(profile)
    }

    pub async fn get_profile(&self, id: UserId) -> Result<Profile, DomainError> {
        self.repo
            .get_profile(id)
            .await?
            .ok_or(DomainError::NotFound(format!("profile id: {id}")))
    }

    /// Обновляет профиль владельца сессии.
    pub async fn update_profile(
        &self,
        session: &Session,
        req: ProfileUpdateRequest,
    ) -> Result<Profile, DomainError> {
        let req = req.validate()?;
        let user_id = session.user_id();

        let profile = self
            .repo
            .update_profile(user_id, ProfilePatch::from(req))
            .await?
            .ok_or(DomainError::NotFound(format!("profile id: {user_id}")))?;
        info!(%user_id, "profile updated");

        self.notifier
            .notify_mutated(&revalidation::after_profile_updated(user_id));
        Ok(profile)
    }
}
