//! Domain to response conversions.

use std::collections::HashMap;

use uuid::Uuid;

use scribe_core::domain::{Post, User};
use scribe_core::ports::BaseRepository;
use scribe_shared::dto::{PostResponse, UserPrivate, UserPublic};

use crate::middleware::error::AppResult;
use crate::state::AppState;

pub fn user_public(user: &User) -> UserPublic {
    UserPublic {
        id: user.id,
        username: user.username.clone(),
        image_file: user.image_file.clone(),
        image_path: user.image_path(),
    }
}

pub fn user_private(user: &User) -> UserPrivate {
    UserPrivate {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        image_file: user.image_file.clone(),
        image_path: user.image_path(),
        created_at: user.created_at,
    }
}

pub fn post_response(post: Post, author: Option<&User>) -> PostResponse {
    PostResponse {
        id: post.id,
        user_id: post.user_id,
        title: post.title,
        content: post.content,
        date_posted: post.created_at,
        updated_at: post.updated_at,
        author: author.map(user_public),
    }
}

/// Load the authors of `posts` once each and attach them.
pub async fn with_authors(state: &AppState, posts: Vec<Post>) -> AppResult<Vec<PostResponse>> {
    let mut authors: HashMap<Uuid, Option<User>> = HashMap::new();
    for post in &posts {
        if !authors.contains_key(&post.user_id) {
            let author = state.users.find_by_id(post.user_id).await?;
            authors.insert(post.user_id, author);
        }
    }

    Ok(posts
        .into_iter()
        .map(|post| {
            let author = authors.get(&post.user_id).and_then(Option::as_ref);
            post_response(post, author)
        })
        .collect())
}
