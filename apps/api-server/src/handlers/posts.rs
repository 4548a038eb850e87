//! Post CRUD handlers. Only the author may change or delete a post.

use actix_web::{HttpResponse, web};
use uuid::Uuid;
use validator::Validate;

use scribe_core::domain::Post;
use scribe_core::error::DomainError;
use scribe_core::ports::{AuthError, BaseRepository, PostRepository};
use scribe_shared::dto::{CreatePostRequest, UpdatePostRequest};

use super::views::{post_response, with_authors};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

async fn load_post(state: &AppState, id: Uuid) -> AppResult<Post> {
    state.posts.find_by_id(id).await?.ok_or_else(|| {
        DomainError::NotFound {
            entity_type: "Post",
            id,
        }
        .into()
    })
}

async fn load_owned_post(state: &AppState, id: Uuid, identity: &Identity) -> AppResult<Post> {
    let post = load_post(state, id).await?;
    if !post.is_owned_by(identity.user_id) {
        tracing::debug!(post_id = %id, user_id = %identity.user_id, "Rejected edit by non-owner");
        return Err(DomainError::Forbidden("posts").into());
    }
    Ok(post)
}

async fn respond_with_author(state: &AppState, post: Post) -> AppResult<HttpResponse> {
    let author = state.users.find_by_id(post.user_id).await?;
    Ok(HttpResponse::Ok().json(post_response(post, author.as_ref())))
}

/// GET /api/posts
pub async fn list_posts(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.find_all().await?;
    Ok(HttpResponse::Ok().json(with_authors(&state, posts).await?))
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    // Tokens outlive deleted accounts.
    let author = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(AppError::Unauthorized(AuthError::InvalidCredentials))?;

    let post = state
        .posts
        .create(Post::new(author.id, req.title, req.content))
        .await?;
    tracing::info!(post_id = %post.id, user_id = %author.id, "Post created");

    Ok(HttpResponse::Created().json(post_response(post, Some(&author))))
}

/// GET /api/posts/{id}
pub async fn get_post(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let post = load_post(&state, path.into_inner()).await?;
    respond_with_author(&state, post).await
}

/// PUT /api/posts/{id}
pub async fn replace_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let mut post = load_owned_post(&state, path.into_inner(), &identity).await?;
    post.edit(Some(req.title), Some(req.content));
    let post = state.posts.update(post).await?;

    respond_with_author(&state, post).await
}

/// PATCH /api/posts/{id}
pub async fn patch_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let mut post = load_owned_post(&state, path.into_inner(), &identity).await?;
    post.edit(req.title, req.content);
    let post = state.posts.update(post).await?;

    respond_with_author(&state, post).await
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = load_owned_post(&state, path.into_inner(), &identity).await?;
    state.posts.delete(post.id).await?;

    tracing::info!(post_id = %post.id, "Post deleted");
    Ok(HttpResponse::NoContent().finish())
}
