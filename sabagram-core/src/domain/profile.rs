use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::ids::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_ref: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub banned: bool,
    pub ban_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdateRequest {
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub avatar_ref: Option<String>,
}

/// Данные для строки профиля, создаваемой сразу после регистрации.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProfileRequest {
    pub username: String,
    pub display_name: Option<String>,
}

impl NewProfileRequest {
    pub fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            username: validate_username(&self.username)?,
            display_name: trim_to_none(self.display_name),
        })
    }
}

impl ProfileUpdateRequest {
    pub fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            username: validate_username(&self.username)?,
            display_name: trim_to_none(self.display_name),
            bio: trim_to_none(self.bio),
            location: trim_to_none(self.location),
            avatar_ref: trim_to_none(self.avatar_ref),
        })
    }
}

/// Поля профиля, которые реально уходят в хранилище.
///
/// `avatar_ref = None` означает "не трогать аватар", остальные `None`
/// очищают поле.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePatch {
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub avatar_ref: Option<String>,
}

impl From<ProfileUpdateRequest> for ProfilePatch {
    fn from(value: ProfileUpdateRequest) -> Self {
        Self {
            username: value.username,
            display_name: value.display_name,
            bio: value.bio,
            location: value.location,
            avatar_ref: value.avatar_ref,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanPatch {
    pub banned: bool,
    pub reason: Option<String>,
    pub banned_at: Option<DateTime<Utc>>,
}

impl BanPatch {
    pub fn ban(reason: Option<String>, at: DateTime<Utc>) -> Self {
        Self {
            banned: true,
            reason: trim_to_none(reason),
            banned_at: Some(at),
        }
    }

    pub fn lift() -> Self {
        Self {
            banned: false,
            reason: None,
            banned_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_users: u64,
    pub total_posts: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub banned_users: u64,
}

fn validate_username(raw: &str) -> Result<String, DomainError> {
    let username = raw.trim();
    if username.is_empty() || username.chars().count() > 64 {
        return Err(DomainError::Validation {
            field: "username",
            message: "must be 1..64 chars",
        });
    }
    Ok(username.to_string())
}

fn trim_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{BanPatch, DomainError, NewProfileRequest, ProfileUpdateRequest};

    #[test]
    fn update_request_trims_and_clears_blank_fields() {
        let req = ProfileUpdateRequest {
            username: "  saba  ".to_string(),
            display_name: Some("  Saba Gram ".to_string()),
            bio: Some("   ".to_string()),
            location: None,
            avatar_ref: Some("".to_string()),
        };

        let validated = req.validate().expect("must validate");
        assert_eq!(validated.username, "saba");
        assert_eq!(validated.display_name.as_deref(), Some("Saba Gram"));
        assert!(validated.bio.is_none());
        assert!(validated.location.is_none());
        assert!(validated.avatar_ref.is_none());
    }

    #[test]
    fn update_request_rejects_blank_username() {
        let req = ProfileUpdateRequest {
            username: "   ".to_string(),
            ..Default::default()
        };

        let err = req.validate().expect_err("username must be rejected");
        assert!(matches!(
            err,
            DomainError::Validation {
                field: "username",
                ..
            }
        ));
    }

    #[test]
    fn new_profile_request_trims_username_and_name() {
        let req = NewProfileRequest {
            username: " nika ".to_string(),
            display_name: Some(" ".to_string()),
        };

        let validated = req.validate().expect("must validate");
        assert_eq!(validated.username, "nika");
        assert!(validated.display_name.is_none());

        let err = NewProfileRequest::default()
            .validate()
            .expect_err("blank username must be rejected");
        assert!(matches!(err, DomainError::Validation { field: "username", .. }));
    }

    #[test]
    fn ban_patch_drops_blank_reason() {
        let patch = BanPatch::ban(Some("  ".to_string()), Utc::now());
        assert!(patch.banned);
        assert!(patch.reason.is_none());
        assert!(patch.banned_at.is_some());

        let lifted = BanPatch::lift();
        assert!(!lifted.banned);
        assert!(lifted.banned_at.is_none());
    }
}
