//! Registration, login and the current user.

use actix_web::{Either, HttpResponse, web};
use validator::Validate;

use scribe_core::domain::User;
use scribe_core::error::DomainError;
use scribe_core::ports::{AuthError, BaseRepository, Email, UserRepository};
use scribe_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest};

use super::views::user_private;
use crate::background::queue_email;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Fail with `Duplicate` if `username` or `email` belongs to someone other than `current`.
pub(super) async fn ensure_unique(
    state: &AppState,
    username: Option<&str>,
    email: Option<&str>,
    current: Option<uuid::Uuid>,
) -> AppResult<()> {
    let taken = |found: Option<User>| found.is_some_and(|u| Some(u.id) != current);

    if let Some(username) = username {
        if taken(state.users.find_by_username(username).await?) {
            return Err(DomainError::Duplicate("Username already taken".to_string()).into());
        }
    }
    if let Some(email) = email {
        if taken(state.users.find_by_email(email).await?) {
            return Err(DomainError::Duplicate("Email already registered".to_string()).into());
        }
    }
    Ok(())
}

/// POST /api/users
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let username = req.username.trim().to_string();
    ensure_unique(&state, Some(&username), Some(&req.email), None).await?;

    let password_hash = state.passwords.hash(&req.password)?;
    let user = state
        .users
        .create(User::new(username, &req.email, password_hash))
        .await?;

    tracing::info!(user_id = %user.id, "User registered");
    queue_email(state.jobs.as_ref(), Email::welcome(&user.email, &user.username)).await;

    Ok(HttpResponse::Created().json(user_private(&user)))
}

/// POST /api/users/token
///
/// Accepts a JSON body or an OAuth2 password form (`username` holds the email).
pub async fn token(
    state: web::Data<AppState>,
    body: Either<web::Json<LoginRequest>, web::Form<LoginRequest>>,
) -> AppResult<HttpResponse> {
    let req = match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    };
    req.validate()?;

    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    match state.passwords.verify(&req.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return Err(AuthError::InvalidCredentials.into()),
        Err(e) => {
            tracing::error!(user_id = %user.id, error = %e, "Stored password hash is unusable");
            return Err(AuthError::InvalidCredentials.into());
        }
    }

    let access_token = state.tokens.issue(user.id)?;
    tracing::debug!(user_id = %user.id, "Access token issued");

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: state.tokens.expiration_seconds().max(0) as u64,
    }))
}

/// GET /api/users/me
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    // A valid token for a deleted account no longer identifies anyone.
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(AppError::Unauthorized(AuthError::InvalidCredentials))?;

    Ok(HttpResponse::Ok().json(user_private(&user)))
}
