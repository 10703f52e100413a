use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::ids::{PostId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub image_ref: String,
    pub caption: Option<String>,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        id: PostId,
        image_ref: impl Into<String>,
        caption: Option<String>,
        author_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let image_ref = normalize_image_ref(&image_ref.into())?;
        let caption = caption
            .map(|caption| caption.trim().to_string())
            .filter(|caption| !caption.is_empty());

        Ok(Self {
            id,
            image_ref,
            caption,
            author_id,
            created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPostRequest {
    pub image_ref: String,
    pub caption: String,
    pub description: Option<String>,
}

impl NewPostRequest {
    /// Нормализует поля и склеивает подпись с описанием так, как пост
    /// хранится в бэкенде: `caption\n\ndescription`.
    pub fn validate(self) -> Result<Self, DomainError> {
        let image_ref = normalize_image_ref(&self.image_ref)?;
        let caption = self.caption.trim();
        if caption.is_empty() {
            return Err(DomainError::Validation {
                field: "caption",
                message: "must not be empty",
            });
        }

        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|description| !description.is_empty());

        let caption = match description {
            Some(description) => format!("{caption}\n\n{description}"),
            None => caption.to_string(),
        };

        Ok(Self {
            image_ref,
            caption,
            description: None,
        })
    }
}

fn normalize_image_ref(image_ref: &str) -> Result<String, DomainError> {
    let image_ref = image_ref.trim();
    if image_ref.is_empty() {
        return Err(DomainError::Validation {
            field: "image_ref",
            message: "must not be empty",
        });
    }
    Ok(image_ref.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{DomainError, NewPostRequest, Post};
    use crate::domain::ids::{PostId, UserId};

    #[test]
    fn new_post_request_joins_caption_and_description() {
        let req = NewPostRequest {
            image_ref: " https://blob.example/posts/1.jpg ".to_string(),
            caption: "  sunset  ".to_string(),
            description: Some("  at the pier ".to_string()),
        };

        let validated = req.validate().expect("must validate");
        assert_eq!(validated.image_ref, "https://blob.example/posts/1.jpg");
        assert_eq!(validated.caption, "sunset\n\nat the pier");
        assert!(validated.description.is_none());
    }

    #[test]
    fn new_post_request_ignores_blank_description() {
        let req = NewPostRequest {
            image_ref: "img".to_string(),
            caption: "caption".to_string(),
            description: Some("   ".to_string()),
        };

        let validated = req.validate().expect("must validate");
        assert_eq!(validated.caption, "caption");
    }

    #[test]
    fn new_post_request_rejects_blank_caption() {
        let req = NewPostRequest {
            image_ref: "img".to_string(),
            caption: "   ".to_string(),
            description: None,
        };

        let err = req.validate().expect_err("caption must be rejected");
        assert_validation_field(err, "caption");
    }

    #[test]
    fn post_new_drops_blank_caption() {
        let post = Post::new(
            PostId::new_v4(),
            "img",
            Some("  ".to_string()),
            UserId::new_v4(),
            Utc::now(),
        )
        .expect("post should be created");
        assert!(post.caption.is_none());
    }

    #[test]
    fn post_new_rejects_empty_image_ref() {
        let err = Post::new(PostId::new_v4(), " ", None, UserId::new_v4(), Utc::now())
            .expect_err("image_ref must be rejected");
        assert_validation_field(err, "image_ref");
    }

    fn assert_validation_field(err: DomainError, expected_field: &'static str) {
        match err {
            DomainError::Validation { field, .. } => assert_eq!(field, expected_field),
            _ => panic!("expected DomainError::Validation"),
        }
    }
}
