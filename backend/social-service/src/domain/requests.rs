//! Request bodies and their validation rules
//!
//! String fields are trimmed by `normalized()` before `validate()` runs, so a
//! whitespace-only value fails the "Required" check.

use crate::error::{AppError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const MAX_ATTACHMENTS: usize = 5;
pub const MAX_BIO_LENGTH: u64 = 1000;

static USERNAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_-]+$").expect("username pattern is a valid regex")
});

/// Trim, then run the derived rules.
pub trait ValidatedRequest: Validate + Sized {
    fn normalized(self) -> Self;

    fn extra_checks(&self) -> Result<()> {
        Ok(())
    }

    fn into_valid(self) -> Result<Self> {
        let request = self.normalized();
        request.validate()?;
        request.extra_checks()?;
        Ok(request)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "Required"), email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Required"))]
    pub username: String,
    #[validate(length(min = 8, message = "Must be at least 8 characters"))]
    pub password: String,
}

impl ValidatedRequest for SignupRequest {
    fn normalized(self) -> Self {
        Self {
            email: self.email.trim().to_string(),
            username: self.username.trim().to_string(),
            password: self.password.trim().to_string(),
        }
    }

    fn extra_checks(&self) -> Result<()> {
        if !USERNAME_PATTERN.is_match(&self.username) {
            return Err(AppError::validation(
                "Only letters, numbers, - and _ allowed",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Required"))]
    pub password: String,
}

impl ValidatedRequest for LoginRequest {
    fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            password: self.password.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(min = 1, message = "Required"))]
    pub content: String,
    #[serde(default)]
    #[validate(length(max = 5, message = "Cannot have more than 5 attachments"))]
    pub media_ids: Vec<Uuid>,
}

impl ValidatedRequest for CreatePostRequest {
    fn normalized(self) -> Self {
        Self {
            content: self.content.trim().to_string(),
            media_ids: self.media_ids,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, message = "Required"))]
    pub content: String,
}

impl ValidatedRequest for CreateCommentRequest {
    fn normalized(self) -> Self {
        Self {
            content: self.content.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "Required"))]
    pub display_name: String,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Must be at most 1000 characters"))]
    pub bio: Option<String>,
}

impl ValidatedRequest for UpdateProfileRequest {
    fn normalized(self) -> Self {
        Self {
            display_name: self.display_name.trim().to_string(),
            bio: self
                .bio
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty()),
        }
    }
}

/// Attachment uploaded to the file host by the client
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMediaRequest {
    #[validate(length(min = 1, message = "Required"))]
    pub url: String,
    #[validate(length(min = 1, message = "Required"))]
    pub mime_type: String,
}

impl ValidatedRequest for CreateMediaRequest {
    fn normalized(self) -> Self {
        Self {
            url: self.url.trim().to_string(),
            mime_type: self.mime_type.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AvatarRequest {
    #[validate(length(min = 1, message = "Required"))]
    pub url: String,
}

impl ValidatedRequest for AvatarRequest {
    fn normalized(self) -> Self {
        Self {
            url: self.url.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default, deserialize_with = "pagination::blank_cursor_as_none")]
    pub cursor: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(email: &str, username: &str, password: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::Validation(msg) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_signup_accepts_valid_input() {
        let req = signup("  ada@example.com ", "ada_l-1", "correct horse")
            .into_valid()
            .unwrap();
        assert_eq!(req.email, "ada@example.com");
        assert_eq!(req.username, "ada_l-1");
    }

    #[test]
    fn test_signup_rejects_bad_email() {
        let err = signup("not-an-email", "ada", "longenough").into_valid().unwrap_err();
        assert_eq!(message(err), "Invalid email address");
    }

    #[test]
    fn test_signup_rejects_short_password() {
        let err = signup("ada@example.com", "ada", "short").into_valid().unwrap_err();
        assert_eq!(message(err), "Must be at least 8 characters");
    }

    #[test]
    fn test_signup_rejects_username_characters() {
        let err = signup("ada@example.com", "ada lovelace", "longenough")
            .into_valid()
            .unwrap_err();
        assert_eq!(message(err), "Only letters, numbers, - and _ allowed");
    }

    #[test]
    fn test_whitespace_only_is_required() {
        let err = CreateCommentRequest {
            content: "   ".to_string(),
        }
        .into_valid()
        .unwrap_err();
        assert_eq!(message(err), "Required");
    }

    #[test]
    fn test_post_attachment_limit() {
        let ok = CreatePostRequest {
            content: "hello".to_string(),
            media_ids: (0..MAX_ATTACHMENTS).map(|_| Uuid::new_v4()).collect(),
        };
        assert!(ok.into_valid().is_ok());

        let too_many = CreatePostRequest {
            content: "hello".to_string(),
            media_ids: (0..=MAX_ATTACHMENTS).map(|_| Uuid::new_v4()).collect(),
        };
        assert_eq!(
            message(too_many.into_valid().unwrap_err()),
            "Cannot have more than 5 attachments"
        );
    }

    #[test]
    fn test_bio_limit_and_blank_bio() {
        let long = UpdateProfileRequest {
            display_name: "Ada".to_string(),
            bio: Some("x".repeat(MAX_BIO_LENGTH as usize + 1)),
        };
        assert_eq!(
            message(long.into_valid().unwrap_err()),
            "Must be at most 1000 characters"
        );

        let blank = UpdateProfileRequest {
            display_name: "Ada".to_string(),
            bio: Some("   ".to_string()),
        }
        .into_valid()
        .unwrap();
        assert_eq!(blank.bio, None);
    }

    #[test]
    fn test_create_post_camel_case_body() {
        let req: CreatePostRequest =
            serde_json::from_str(r#"{"content": "hi", "mediaIds": []}"#).unwrap();
        assert!(req.media_ids.is_empty());

        let req: CreatePostRequest = serde_json::from_str(r#"{"content": "hi"}"#).unwrap();
        assert!(req.media_ids.is_empty());
    }
}
