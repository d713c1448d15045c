//! End-to-end tests driving the router against a throwaway SQLite file.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use postboard::api::{SEED_EMAIL, SEED_USERNAME};
use postboard::config::{Config, DEFAULT_AUTHOR_ID};
use postboard::db::Store;
use postboard::entities::user;
use sea_orm::{ActiveModelTrait, Set};
use tower::ServiceExt;

async fn spawn_store() -> Store {
    let db_path =
        std::env::temp_dir().join(format!("postboard-web-test-{}.db", uuid::Uuid::new_v4()));

    let store = Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open database");
    store.migrate().await.expect("failed to migrate database");
    store
}

fn app(store: Store, config: Config) -> Router {
    postboard::api::router(postboard::api::create_app_state(config, store, None))
}

/// Store holding a user under the default author id.
async fn spawn_store_with_default_author(username: &str) -> Store {
    let store = spawn_store().await;
    user::ActiveModel {
        id: Set(DEFAULT_AUTHOR_ID.to_string()),
        username: Set(username.to_string()),
        email: Set(format!("{username}@example.com")),
    }
    .insert(&store.conn)
    .await
    .expect("failed to insert default author");
    store
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

async fn submit_post(app: &Router, form: &'static str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/add-post")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_empty_index() {
    let app = app(spawn_store().await, Config::default());

    let (status, content_type, body) = get(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some(mime::TEXT_HTML_UTF_8.as_ref()));
    assert!(body.contains("No posts yet."));
    assert!(!body.contains("class=\"post\""));
}

#[tokio::test]
async fn test_add_post_form() {
    let app = app(spawn_store().await, Config::default());

    let (status, _, body) = get(&app, "/add-post").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("action=\"/add-post\""));
    assert!(body.contains("name=\"title\""));
    assert!(body.contains("name=\"content\""));
}

#[tokio::test]
async fn test_blog_scenario() {
    let store = spawn_store_with_default_author("editor").await;
    let app = app(store.clone(), Config::default());

    let (_, _, body) = get(&app, "/").await;
    assert!(body.contains("No posts yet."));

    let response = submit_post(&app, "title=Hello&content=World").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

    let (status, _, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.matches("class=\"post\"").count(), 1);
    assert!(body.contains("<h2>Hello</h2>"));
    assert!(body.contains("World"));
    assert!(body.contains("<span class=\"author\">editor</span>"));
    let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
    assert!(body.contains(&today));

    let (status, content_type, body) = get(&app, "/add-user").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some(mime::TEXT_PLAIN_UTF_8.as_ref()));
    assert_eq!(body, format!("User {SEED_USERNAME} added."));

    let (status, _, body) = get(&app, "/add-user").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "User already exists.");

    assert!(store.find_user_by_username(SEED_USERNAME).await.unwrap().is_some());
    assert_eq!(store.count_users().await.unwrap(), 2);
}

#[tokio::test]
async fn test_posts_use_configured_author() {
    let store = spawn_store().await;
    let author = store
        .create_user(SEED_USERNAME, SEED_EMAIL)
        .await
        .unwrap();

    let mut config = Config::default();
    config.posting.author_id = author.id.clone();
    let app = app(store.clone(), config);

    let response = submit_post(&app, "title=Second+thoughts&content=On+reflection").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let posts = store.list_posts_with_authors().await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].post.title, "Second thoughts");
    assert_eq!(posts[0].post.content, "On reflection");
    assert_eq!(posts[0].author, author);
}

#[tokio::test]
async fn test_post_content_is_escaped() {
    let app = app(spawn_store_with_default_author("editor").await, Config::default());

    let response = submit_post(&app, "title=%3Cb%3Ebold%3C%2Fb%3E&content=a+%26+b").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let (_, _, body) = get(&app, "/").await;
    assert!(!body.contains("<b>bold</b>"));
    assert!(!body.contains("a & b"));
    assert!(body.contains("bold"));

    let h2 = body
        .split("<h2>")
        .nth(1)
        .and_then(|rest| rest.split("</h2>").next())
        .expect("post title heading");
    assert!(!h2.contains('<') && !h2.contains('>'), "unescaped title: {h2}");
}

#[tokio::test]
async fn test_missing_field_is_rejected() {
    let store = spawn_store_with_default_author("editor").await;
    let app = app(store.clone(), Config::default());

    let response = submit_post(&app, "title=Only+a+title").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.count_posts().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_author_is_a_server_error() {
    let store = spawn_store().await;
    let app = app(store.clone(), Config::default());

    let response = submit_post(&app, "title=Hello&content=World").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"A database error occurred");
    assert_eq!(store.count_posts().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_route_and_headers() {
    let app = app(spawn_store().await, Config::default());

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    assert_eq!(
        response.headers().get("referrer-policy").unwrap(),
        "strict-origin-when-cross-origin"
    );

    let (status, _, body) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Metrics not enabled"));
}

#[tokio::test]
async fn test_state_from_config_migrates() {
    let db_path =
        std::env::temp_dir().join(format!("postboard-config-test-{}.db", uuid::Uuid::new_v4()));
    let mut config = Config::default();
    config.general.database_url = format!("sqlite:{}", db_path.display());

    let state = postboard::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state");
    let app = postboard::api::router(state.clone());

    let (status, _, body) = get(&app, "/add-user").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, format!("User {SEED_USERNAME} added."));
    assert_eq!(state.store().count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_state_from_config_without_auto_migrate() {
    let db_path =
        std::env::temp_dir().join(format!("postboard-config-test-{}.db", uuid::Uuid::new_v4()));
    let mut config = Config::default();
    config.general.database_url = format!("sqlite:{}", db_path.display());
    config.general.auto_migrate = false;

    let state = postboard::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state");
    assert!(state.store().count_users().await.is_err());

    state.store().migrate().await.unwrap();
    let seeded = state
        .store()
        .find_user_by_username(SEED_USERNAME)
        .await
        .unwrap();
    assert!(seeded.is_none());
}
