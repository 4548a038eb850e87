use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::{Value, json};

use scribe_core::ports::PostRepository;

use super::configure_routes;
use crate::state::AppState;
use crate::state::test_support::in_memory_state;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

macro_rules! test_app {
    ($state:expr) => {{
        let state: AppState = $state;
        let limiter = state.login_limiter.clone();
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(move |cfg| configure_routes(cfg, limiter)),
        )
        .await
    }};
}

macro_rules! register {
    ($app:expr, $username:expr, $email:expr) => {{
        let res = test::call_service(&$app, register_req($username, $email).to_request()).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let user: Value = test::read_body_json(res).await;
        user
    }};
}

macro_rules! login {
    ($app:expr, $email:expr, $password:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/users/token")
            .set_json(json!({ "email": $email, "password": $password }))
            .to_request();
        let res = test::call_service(&$app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        body["access_token"].as_str().unwrap().to_string()
    }};
}

fn register_req(username: &str, email: &str) -> test::TestRequest {
    test::TestRequest::post().uri("/api/users").set_json(json!({
        "username": username,
        "email": email,
        "password": "secret123",
    }))
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

fn create_post_req(token: &str, title: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(token))
        .set_json(json!({ "title": title, "content": "Hello from Scribe" }))
}

#[actix_web::test]
async fn test_health() {
    let app = test_app!(in_memory_state().await);

    let res = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_register_login_and_post_flow() {
    let app = test_app!(in_memory_state().await);

    let alice = register!(app, "alice", "alice@example.com");
    assert_eq!(alice["username"], "alice");
    assert_eq!(alice["email"], "alice@example.com");
    assert!(alice.get("password_hash").is_none());

    let token = login!(app, "alice@example.com", "secret123");

    let wrong = test::TestRequest::post()
        .uri("/api/users/token")
        .set_json(json!({ "email": "alice@example.com", "password": "wrong-password" }))
        .to_request();
    let res = test::call_service(&app, wrong).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");

    let res = test::call_service(&app, create_post_req(&token, "First post").to_request()).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let post: Value = test::read_body_json(res).await;
    assert_eq!(post["user_id"], alice["id"]);
    assert_eq!(post["author"]["username"], "alice");

    let uri = format!("/api/posts/{}", post["id"].as_str().unwrap());
    let fetched: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(fetched["title"], "First post");
    assert_eq!(fetched["content"], "Hello from Scribe");

    let anonymous = test::TestRequest::post()
        .uri("/api/posts")
        .set_json(json!({ "title": "Sneaky", "content": "no token" }))
        .to_request();
    let res = test::call_service(&app, anonymous).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_login_unknown_email_matches_wrong_password() {
    let app = test_app!(in_memory_state().await);
    register!(app, "alice", "alice@example.com");

    let unknown = test::TestRequest::post()
        .uri("/api/users/token")
        .set_json(json!({ "email": "bob@example.com", "password": "secret123" }))
        .to_request();
    let res = test::call_service(&app, unknown).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["detail"], "Incorrect email or password.");
}

#[actix_web::test]
async fn test_login_with_password_form() {
    let app = test_app!(in_memory_state().await);
    register!(app, "alice", "alice@example.com");

    let req = test::TestRequest::post()
        .uri("/api/users/token")
        .set_form([("username", "ALICE@example.com"), ("password", "secret123")])
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 30 * 60);
    assert!(body["access_token"].as_str().is_some());
}

#[actix_web::test]
async fn test_duplicate_registration_is_rejected() {
    let app = test_app!(in_memory_state().await);
    register!(app, "alice", "alice@example.com");

    let res = test::call_service(&app, register_req("ALICE", "other@example.com").to_request()).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = test::call_service(&app, register_req("alice2", "Alice@Example.com").to_request()).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_registration_validation() {
    let app = test_app!(in_memory_state().await);

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(json!({ "username": "", "email": "not-an-email", "password": "short" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_me_requires_valid_token() {
    let app = test_app!(in_memory_state().await);
    let alice = register!(app, "alice", "alice@example.com");
    let token = login!(app, "alice@example.com", "secret123");

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(&token))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["id"], alice["id"]);

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer("not.a.token"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = test::call_service(&app, test::TestRequest::get().uri("/api/users/me").to_request()).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_only_owner_can_modify_post() {
    let app = test_app!(in_memory_state().await);
    register!(app, "alice", "alice@example.com");
    register!(app, "bob", "bob@example.com");
    let alice = login!(app, "alice@example.com", "secret123");
    let bob = login!(app, "bob@example.com", "secret123");

    let post: Value =
        test::call_and_read_body_json(&app, create_post_req(&alice, "Mine").to_request()).await;
    let uri = format!("/api/posts/{}", post["id"].as_str().unwrap());

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(bearer(&bob))
        .set_json(json!({ "title": "Stolen" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&bob))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(bearer(&alice))
        .set_json(json!({ "title": "Still mine" }))
        .to_request();
    let patched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(patched["title"], "Still mine");
    assert_eq!(patched["content"], "Hello from Scribe");

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(bearer(&alice))
        .set_json(json!({ "title": "Replaced", "content": "All new" }))
        .to_request();
    let replaced: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(replaced["content"], "All new");

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&alice))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let res = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_posts_are_listed_newest_first() {
    let app = test_app!(in_memory_state().await);
    let alice = register!(app, "alice", "alice@example.com");
    let token = login!(app, "alice@example.com", "secret123");

    for title in ["one", "two", "three"] {
        let res = test::call_service(&app, create_post_req(&token, title).to_request()).await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let all: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/posts").to_request())
            .await;
    let titles: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["three", "two", "one"]);

    let uri = format!("/api/users/{}/posts", alice["id"].as_str().unwrap());
    let mine: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(mine.as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn test_profile_update_and_password_change() {
    let app = test_app!(in_memory_state().await);
    let alice = register!(app, "alice", "alice@example.com");
    let bob = register!(app, "bob", "bob@example.com");
    let token = login!(app, "alice@example.com", "secret123");
    let uri = format!("/api/users/{}", alice["id"].as_str().unwrap());

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(bearer(&token))
        .set_json(json!({ "username": "Bob" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(bearer(&token))
        .set_json(json!({ "username": "alice_w" }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["username"], "alice_w");

    let bob_uri = format!("/api/users/{}", bob["id"].as_str().unwrap());
    let req = test::TestRequest::patch()
        .uri(&bob_uri)
        .insert_header(bearer(&token))
        .set_json(json!({ "username": "hijacked" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let password_uri = format!("{}/password", uri);
    let req = test::TestRequest::put()
        .uri(&password_uri)
        .insert_header(bearer(&token))
        .set_json(json!({ "current_password": "nope-nope", "new_password": "brand-new-secret" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::put()
        .uri(&password_uri)
        .insert_header(bearer(&token))
        .set_json(json!({ "current_password": "secret123", "new_password": "brand-new-secret" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    login!(app, "alice@example.com", "brand-new-secret");
}

#[actix_web::test]
async fn test_profile_picture_upload() {
    let app = test_app!(in_memory_state().await);
    let alice = register!(app, "alice", "alice@example.com");
    let token = login!(app, "alice@example.com", "secret123");
    let uri = format!("/api/users/{}/picture", alice["id"].as_str().unwrap());
    assert_eq!(alice["image_path"], "/media/profile_pics/default.png");

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(bearer(&token))
        .insert_header((header::CONTENT_TYPE, "image/png"))
        .set_payload(PNG)
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    let path = updated["image_path"].as_str().unwrap().to_string();
    assert!(path.starts_with("/media/profile_pics/"));
    assert!(path.ends_with(".png"));

    let res = test::call_service(&app, test::TestRequest::get().uri(&path).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(test::read_body(res).await, PNG);

    // A second upload replaces the stored file.
    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(bearer(&token))
        .insert_header((header::CONTENT_TYPE, "image/png"))
        .set_payload(PNG)
        .to_request();
    let replaced: Value = test::call_and_read_body_json(&app, req).await;
    let new_path = replaced["image_path"].as_str().unwrap().to_string();
    assert_ne!(new_path, path);

    let res = test::call_service(&app, test::TestRequest::get().uri(&path).to_request()).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = test::call_service(&app, test::TestRequest::get().uri(&new_path).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(bearer(&token))
        .insert_header((header::CONTENT_TYPE, "text/plain"))
        .set_payload("hello")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNSUPPORTED_MEDIA_TYPE
    );

    let too_big = [PNG, &[0u8; 2048][..]].concat();
    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(bearer(&token))
        .insert_header((header::CONTENT_TYPE, "image/png"))
        .set_payload(too_big)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[actix_web::test]
async fn test_default_picture_is_served() {
    let app = test_app!(in_memory_state().await);
    let alice = register!(app, "alice", "alice@example.com");

    let uri = alice["image_path"].as_str().unwrap();
    let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
    assert!(test::read_body(res).await.starts_with(b"\x89PNG\r\n\x1a\n"));

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/media/profile_pics/missing.png")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_delete_user_cascades_posts() {
    let state = in_memory_state().await;
    let posts = state.posts.clone();
    let app = test_app!(state);

    let alice = register!(app, "alice", "alice@example.com");
    let token = login!(app, "alice@example.com", "secret123");
    test::call_service(&app, create_post_req(&token, "Doomed").to_request()).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/users/{}", alice["id"].as_str().unwrap()))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    assert!(posts.find_all().await.unwrap().is_empty());

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    // The token still verifies but no longer names an author.
    let res = test::call_service(&app, create_post_req(&token, "Orphan").to_request()).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
    assert!(posts.find_all().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_html_pages_escape_content() {
    let app = test_app!(in_memory_state().await);
    let alice = register!(app, "alice", "alice@example.com");
    let token = login!(app, "alice@example.com", "secret123");

    let post: Value = test::call_and_read_body_json(
        &app,
        create_post_req(&token, "<script>alert(1)</script>").to_request(),
    )
    .await;

    for uri in [
        "/".to_string(),
        format!("/posts/{}", post["id"].as_str().unwrap()),
        format!("/users/{}/posts", alice["id"].as_str().unwrap()),
    ] {
        let res = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK, "{}", uri);

        let body = String::from_utf8(test::read_body(res).await.to_vec()).unwrap();
        assert!(body.contains("&lt;script&gt;alert(1)&lt;/script&gt;"), "{}", uri);
        assert!(!body.contains("<script>"), "{}", uri);
    }

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}", uuid::Uuid::new_v4()))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
