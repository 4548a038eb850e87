use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public route under which stored profile pictures are served.
pub const PROFILE_PICTURE_ROUTE: &str = "/media/profile_pics";

/// Picture shown for users that never uploaded one.
pub const DEFAULT_PROFILE_PICTURE: &str = "default.png";

/// User entity - a registered blog author.
///
/// Emails are stored lower-cased so lookups are case-insensitive.
/// Usernames keep the casing the user picked but are unique regardless of case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub image_file: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamps.
    pub fn new(username: String, email: &str, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email: normalize_email(email),
            password_hash,
            image_file: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Public URL of the user's profile picture.
    pub fn image_path(&self) -> String {
        let file = self
            .image_file
            .as_deref()
            .unwrap_or(DEFAULT_PROFILE_PICTURE);
        format!("{}/{}", PROFILE_PICTURE_ROUTE, file)
    }

    pub fn set_email(&mut self, email: &str) {
        self.email = normalize_email(email);
        self.touch();
    }

    pub fn set_username(&mut self, username: String) {
        self.username = username;
        self.touch();
    }

    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.touch();
    }

    /// Replace the profile picture, returning the file it replaced.
    pub fn replace_image(&mut self, image_file: String) -> Option<String> {
        self.touch();
        self.image_file.replace(image_file)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Canonical form used for storing and comparing email addresses.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Mask an email for logging to avoid PII in logs.
pub fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = match local.chars().next() {
                Some(first) if local.chars().count() > 1 => format!("{}***", first),
                _ => "***".to_string(),
            };
            format!("{}{}", masked_local, domain)
        }
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_lowercases_email() {
        let user = User::new("Alice".to_string(), " Alice@Example.COM ", "hash".to_string());

        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.username, "Alice");
        assert!(user.image_file.is_none());
    }

    #[test]
    fn test_image_path_defaults() {
        let mut user = User::new("bob".to_string(), "bob@example.com", "hash".to_string());
        assert_eq!(user.image_path(), "/media/profile_pics/default.png");

        let previous = user.replace_image("abc.png".to_string());
        assert!(previous.is_none());
        assert_eq!(user.image_path(), "/media/profile_pics/abc.png");

        let previous = user.replace_image("def.jpg".to_string());
        assert_eq!(previous.as_deref(), Some("abc.png"));
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("alice@example.com"), "a***@example.com");
        assert_eq!(mask_email("a@example.com"), "***@example.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }
}
