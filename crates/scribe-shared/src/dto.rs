//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Flatten validator output into "field: code" messages.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("{}: {}", field, e.code),
            })
        })
        .collect();
    messages.sort();
    messages
}

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, max = 50), custom(function = "not_blank"))]
    pub username: String,
    #[validate(email, length(max = 120))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
}

/// Request to login. Also accepted as an OAuth2 password form, where
/// `username` carries the email.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Partial update of a user profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 50), custom(function = "not_blank"))]
    pub username: Option<String>,
    #[validate(email, length(max = 120))]
    pub email: Option<String>,
}

/// Request to change the caller's password.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub new_password: String,
}

/// A user as seen by anyone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: Uuid,
    pub username: String,
    pub image_file: Option<String>,
    pub image_path: String,
}

/// A user as seen by themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPrivate {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub image_file: Option<String>,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
}

/// Response containing an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Request to create a post, also used for full replacement.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub title: String,
    #[validate(length(min = 1), custom(function = "not_blank"))]
    pub content: String,
}

/// Partial update of a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub title: Option<String>,
    #[validate(length(min = 1), custom(function = "not_blank"))]
    pub content: Option<String>,
}

/// A post together with its author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub date_posted: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: Option<UserPublic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation() {
        let ok = RegisterUserRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "secret123".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterUserRequest {
            username: "   ".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };
        let errors = bad.validate().unwrap_err();
        let messages = validation_messages(&errors);

        assert!(messages.iter().any(|m| m.starts_with("username")));
        assert!(messages.iter().any(|m| m.starts_with("email")));
        assert!(messages.contains(&"password: must be at least 8 characters".to_string()));
    }

    #[test]
    fn test_login_accepts_oauth2_username_field() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"username":"alice@example.com","password":"x"}"#).unwrap();
        assert_eq!(req.email, "alice@example.com");
    }

    #[test]
    fn test_partial_updates_skip_missing_fields() {
        let req: UpdatePostRequest = serde_json::from_str(r#"{"content":"new"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.title.is_none());

        let req: UpdatePostRequest = serde_json::from_str(r#"{"title":""}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
