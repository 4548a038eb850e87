//! User profile, password and picture handlers.

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use bytes::BytesMut;
use futures::StreamExt;
use uuid::Uuid;
use validator::Validate;

use scribe_core::domain::{ProfilePicture, User};
use scribe_core::error::DomainError;
use scribe_core::ports::{AuthError, BaseRepository, Email, PostRepository, StorageError};
use scribe_shared::dto::{ChangePasswordRequest, UpdateUserRequest};

use super::auth::ensure_unique;
use super::views::{user_private, user_public, with_authors};
use crate::background::queue_email;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

async fn load_user(state: &AppState, id: Uuid) -> AppResult<User> {
    state.users.find_by_id(id).await?.ok_or_else(|| {
        DomainError::NotFound {
            entity_type: "User",
            id,
        }
        .into()
    })
}

/// GET /api/users/{id}
pub async fn get_user(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let user = load_user(&state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user_public(&user)))
}

/// GET /api/users/{id}/posts
pub async fn user_posts(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user = load_user(&state, path.into_inner()).await?;
    let posts = state.posts.find_by_user_id(user.id).await?;
    Ok(HttpResponse::Ok().json(with_authors(&state, posts).await?))
}

/// PATCH /api/users/{id}
pub async fn update_user(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdateUserRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    identity.require_self(id)?;

    let req = body.into_inner();
    req.validate()?;

    let mut user = load_user(&state, id).await?;
    let username = req.username.map(|u| u.trim().to_string());
    ensure_unique(&state, username.as_deref(), req.email.as_deref(), Some(id)).await?;

    if let Some(username) = username {
        user.set_username(username);
    }
    if let Some(email) = req.email.as_deref() {
        user.set_email(email);
    }

    let user = state.users.update(user).await?;
    tracing::info!(user_id = %user.id, "User profile updated");

    Ok(HttpResponse::Ok().json(user_private(&user)))
}

/// DELETE /api/users/{id}
///
/// Removes the account, its posts and its stored picture.
pub async fn delete_user(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    identity.require_self(id)?;

    let user = load_user(&state, id).await?;
    state.users.delete(id).await?;

    if let Some(file) = user.image_file.as_deref() {
        if let Err(e) = state.storage.delete(file).await {
            tracing::warn!(user_id = %id, error = %e, "Failed to remove profile picture");
        }
    }

    tracing::info!(user_id = %id, "User deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// PUT /api/users/{id}/password
pub async fn change_password(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<ChangePasswordRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    identity.require_self(id)?;

    let req = body.into_inner();
    req.validate()?;

    let mut user = load_user(&state, id).await?;
    if !state.passwords.verify(&req.current_password, &user.password_hash)? {
        return Err(AuthError::InvalidCredentials.into());
    }

    user.set_password_hash(state.passwords.hash(&req.new_password)?);
    let user = state.users.update(user).await?;

    tracing::info!(user_id = %user.id, "Password changed");
    queue_email(
        state.jobs.as_ref(),
        Email::password_changed(&user.email, &user.username),
    )
    .await;

    Ok(HttpResponse::NoContent().finish())
}

/// Read the request body, stopping as soon as it exceeds `limit`.
async fn read_limited(mut payload: web::Payload, limit: usize) -> AppResult<bytes::Bytes> {
    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| StorageError::Io(e.to_string()))?;
        if body.len() + chunk.len() > limit {
            return Err(StorageError::TooLarge { limit }.into());
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}

/// PUT /api/users/{id}/picture
///
/// The raw body is the image; `Content-Type` names its format.
pub async fn upload_picture(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    req: HttpRequest,
    payload: web::Payload,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    identity.require_self(id)?;

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let mut user = load_user(&state, id).await?;
    let body = read_limited(payload, state.upload_max_bytes).await?;
    let picture = ProfilePicture::from_upload(&content_type, body, state.upload_max_bytes)?;

    let file_name = picture.file_name.clone();
    state.storage.put(&file_name, picture.body).await?;
    let previous = user.replace_image(picture.file_name);

    let user = match state.users.update(user).await {
        Ok(user) => user,
        Err(e) => {
            if let Err(cleanup) = state.storage.delete(&file_name).await {
                tracing::warn!(file = %file_name, error = %cleanup, "Failed to remove orphaned picture");
            }
            return Err(e.into());
        }
    };

    if let Some(old) = previous {
        if let Err(e) = state.storage.delete(&old).await {
            tracing::warn!(user_id = %id, file = %old, error = %e, "Failed to remove old picture");
        }
    }

    tracing::info!(user_id = %id, file = ?user.image_file, "Profile picture updated");
    Ok(HttpResponse::Ok().json(user_private(&user)))
}
