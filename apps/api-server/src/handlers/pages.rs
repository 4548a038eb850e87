//! Server-rendered HTML pages.

use std::fmt::Write;

use actix_web::{HttpResponse, http::StatusCode, web};
use uuid::Uuid;

use scribe_core::ports::{BaseRepository, PostRepository};
use scribe_shared::dto::PostResponse;

use super::views::with_authors;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{} - Scribe</title>\n</head>\n<body>\n\
         <header><a href=\"/\">Scribe</a></header>\n<main>\n{}</main>\n</body>\n</html>\n",
        escape_html(title),
        body
    )
}

fn html(status: StatusCode, title: &str, body: &str) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(layout(title, body))
}

fn render_post(out: &mut String, post: &PostResponse, link_title: bool) {
    let _ = writeln!(out, "<article>");
    if link_title {
        let _ = writeln!(
            out,
            "<h2><a href=\"/posts/{}\">{}</a></h2>",
            post.id,
            escape_html(&post.title)
        );
    } else {
        let _ = writeln!(out, "<h1>{}</h1>", escape_html(&post.title));
    }

    if let Some(author) = &post.author {
        let _ = writeln!(
            out,
            "<p><img src=\"{}\" alt=\"\" width=\"32\" height=\"32\"> \
             <a href=\"/users/{}/posts\">{}</a> on {}</p>",
            escape_html(&author.image_path),
            author.id,
            escape_html(&author.username),
            post.date_posted.format("%Y-%m-%d")
        );
    }
    let _ = writeln!(out, "<p>{}</p>\n</article>", escape_html(&post.content));
}

fn render_list(heading: &str, posts: &[PostResponse]) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape_html(heading));
    if posts.is_empty() {
        body.push_str("<p>No posts yet.</p>\n");
    }
    for post in posts {
        render_post(&mut body, post, true);
    }
    body
}

fn not_found_page(what: &str) -> HttpResponse {
    html(
        StatusCode::NOT_FOUND,
        "Not Found",
        &format!("<h1>Not Found</h1>\n<p>{}</p>\n", escape_html(what)),
    )
}

/// GET / and GET /posts
pub async fn home(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = with_authors(&state, state.posts.find_all().await?).await?;
    Ok(html(StatusCode::OK, "Home", &render_list("Latest posts", &posts)))
}

/// GET /posts/{id}
pub async fn post_page(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let Some(post) = state.posts.find_by_id(path.into_inner()).await? else {
        return Ok(not_found_page("That post does not exist."));
    };

    let rendered = with_authors(&state, vec![post]).await?;
    let mut body = String::new();
    for post in &rendered {
        render_post(&mut body, post, false);
    }

    let title = rendered.first().map(|p| p.title.as_str()).unwrap_or("Post");
    Ok(html(StatusCode::OK, title, &body))
}

/// GET /users/{id}/posts
pub async fn user_posts_page(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let Some(user) = state.users.find_by_id(path.into_inner()).await? else {
        return Ok(not_found_page("That user does not exist."));
    };

    let posts = with_authors(&state, state.posts.find_by_user_id(user.id).await?).await?;
    let heading = format!("Posts by {}", user.username);
    Ok(html(StatusCode::OK, &heading, &render_list(&heading, &posts)))
}
