//! Authentication and authorization ports.

use chrono::TimeDelta;
use uuid::Uuid;

/// Claims carried by a validated access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Issues and validates signed, time-bound access tokens.
///
/// Validation is pure: every invalid token comes back as an `AuthError`
/// value, never a panic.
pub trait TokenService: Send + Sync {
    /// Issue a token for `user_id` with the configured lifetime.
    fn issue(&self, user_id: Uuid) -> Result<String, AuthError>;

    /// Issue a token with an explicit lifetime.
    fn issue_with_ttl(&self, user_id: Uuid, ttl: TimeDelta) -> Result<String, AuthError>;

    /// Verify signature and expiry, returning the decoded claims.
    fn decode(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Verify a token and return its subject.
    fn validate(&self, token: &str) -> Result<Uuid, AuthError> {
        self.decode(token).map(|claims| claims.user_id)
    }

    /// Lifetime of tokens produced by `issue`, in seconds.
    fn expiration_seconds(&self) -> i64;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password with a fresh random salt.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a stored hash.
    ///
    /// A wrong password is `Ok(false)`. A stored hash that cannot be parsed
    /// is `Err(AuthError::CorruptHash)`.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Stored password hash is corrupt: {0}")]
    CorruptHash(String),

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Token creation failed: {0}")]
    TokenCreation(String),
}

impl AuthError {
    /// True for failures caused by what the client presented.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            Self::CorruptHash(_) | Self::Hashing(_) | Self::TokenCreation(_)
        )
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingAuth)?;
    let (scheme, token) = header.trim().split_once(' ').ok_or(AuthError::MissingAuth)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingAuth);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingAuth);
    }
    Ok(token)
}
