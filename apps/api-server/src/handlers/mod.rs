//! HTTP handlers and route configuration.

mod auth;
mod health;
mod media;
mod pages;
mod posts;
mod users;
mod views;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use actix_web::web;
use scribe_core::domain::PROFILE_PICTURE_ROUTE;
use scribe_core::ports::RateLimiter;

use crate::middleware::rate_limit::RateLimitMiddleware;

/// Configure all application routes.
///
/// `login_limiter` guards the credential endpoints (register and token).
pub fn configure_routes(cfg: &mut web::ServiceConfig, login_limiter: Arc<dyn RateLimiter>) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/users")
                    .service(
                        web::resource("")
                            .wrap(RateLimitMiddleware::new(login_limiter.clone()))
                            .route(web::post().to(auth::register)),
                    )
                    .service(
                        web::resource("/token")
                            .wrap(RateLimitMiddleware::new(login_limiter))
                            .route(web::post().to(auth::token)),
                    )
                    .route("/me", web::get().to(auth::me))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(users::get_user))
                            .route(web::patch().to(users::update_user))
                            .route(web::delete().to(users::delete_user)),
                    )
                    .route("/{id}/posts", web::get().to(users::user_posts))
                    .route("/{id}/password", web::put().to(users::change_password))
                    .route("/{id}/picture", web::put().to(users::upload_picture)),
            )
            .service(
                web::scope("/posts")
                    .service(
                        web::resource("")
                            .route(web::get().to(posts::list_posts))
                            .route(web::post().to(posts::create_post)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(posts::get_post))
                            .route(web::put().to(posts::replace_post))
                            .route(web::patch().to(posts::patch_post))
                            .route(web::delete().to(posts::delete_post)),
                    ),
            ),
    )
    .route(
        &format!("{}/{{file}}", PROFILE_PICTURE_ROUTE),
        web::get().to(media::profile_picture),
    )
    // HTML pages
    .route("/", web::get().to(pages::home))
    .route("/posts", web::get().to(pages::home))
    .route("/posts/{id}", web::get().to(pages::post_page))
    .route("/users/{id}/posts", web::get().to(pages::user_posts_page));
}
