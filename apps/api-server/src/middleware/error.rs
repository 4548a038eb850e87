//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header};
use scribe_core::error::{DomainError, RepoError};
use scribe_core::ports::{AuthError, StorageError};
use scribe_shared::ErrorResponse;
use scribe_shared::dto::validation_messages;
use validator::ValidationErrors;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(AuthError),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation errors: {0:?}")]
    Validation(Vec<String>),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Unauthorized(reason) => {
                return HttpResponse::Unauthorized()
                    .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
                    .json(ErrorResponse::unauthorized().with_detail(unauthorized_detail(reason)));
            }
            AppError::Forbidden(detail) => ErrorResponse::forbidden().with_detail(detail),
            AppError::PayloadTooLarge(detail) => ErrorResponse::payload_too_large(detail),
            AppError::UnsupportedMediaType(detail) => ErrorResponse::unsupported_media_type(detail),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
            AppError::Validation(errors) => ErrorResponse::validation_failed(errors),
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

/// Client-facing text for a rejected credential. Token internals stay in the log.
fn unauthorized_detail(reason: &AuthError) -> &'static str {
    match reason {
        AuthError::InvalidCredentials => "Incorrect email or password.",
        AuthError::Expired => "Your access token has expired. Please log in again.",
        AuthError::MissingAuth => {
            "Please provide a valid Bearer token in the Authorization header."
        }
        _ => "Could not validate credentials.",
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{} with id {} not found", entity_type, id))
            }
            DomainError::Validation(msg) => AppError::Validation(vec![msg]),
            DomainError::Duplicate(msg) => AppError::BadRequest(msg),
            DomainError::Unauthorized => AppError::Unauthorized(AuthError::InvalidCredentials),
            DomainError::Forbidden(entity) => {
                AppError::Forbidden(format!("You may only modify your own {}.", entity))
            }
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::BadRequest(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden => AppError::Forbidden("Insufficient permissions.".to_string()),
            AuthError::Hashing(msg) => AppError::Internal(format!("password hashing: {}", msg)),
            AuthError::TokenCreation(msg) => AppError::Internal(format!("token creation: {}", msg)),
            other => {
                tracing::debug!(reason = %other, "Rejected credentials");
                AppError::Unauthorized(other)
            }
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            StorageError::UnsupportedType(_) => AppError::UnsupportedMediaType(err.to_string()),
            StorageError::Empty => AppError::BadRequest(err.to_string()),
            StorageError::InvalidName(_) => AppError::NotFound("File not found".to_string()),
            StorageError::Io(msg) => AppError::Internal(format!("storage: {}", msg)),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(validation_messages(&errors))
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_unauthorized_carries_challenge() {
        let response = AppError::from(AuthError::Expired).error_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[actix_web::test]
    async fn test_corrupt_hash_is_not_leaked() {
        let response =
            AppError::from(AuthError::CorruptHash("argon2 parse".into())).error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = to_bytes(response.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("argon2"));
    }

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(AppError, StatusCode)> = vec![
            (RepoError::NotFound.into(), StatusCode::NOT_FOUND),
            (
                RepoError::Constraint("email taken".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                RepoError::Query("boom".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                DomainError::Forbidden("post").into(),
                StatusCode::FORBIDDEN,
            ),
            (
                StorageError::TooLarge { limit: 10 }.into(),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                StorageError::UnsupportedType("text/plain".into()).into(),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                AuthError::Hashing("oom".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AuthError::TokenCreation("invalid key".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.status_code(), status, "{}", error);
        }
    }
}
