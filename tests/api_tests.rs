use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use hearth::config::Config;
use hearth::state::SharedState;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;

static MEDIA_DIR_SEQ: AtomicUsize = AtomicUsize::new(0);

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A single connection so every statement sees the same in-memory database.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.media.media_path = std::env::temp_dir()
        .join(format!(
            "hearth-test-{}-{}",
            std::process::id(),
            MEDIA_DIR_SEQ.fetch_add(1, Ordering::SeqCst)
        ))
        .to_string_lossy()
        .to_string();

    let state = SharedState::new(config)
        .await
        .expect("Failed to create app state");
    hearth::api::router(state).await
}

// ============================================================================
// Request helpers
// ============================================================================

const BOUNDARY: &str = "hearth-test-boundary";

fn json_request(uri: &str, cookie: Option<&str>, payload: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(payload.to_string())).unwrap()
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn delete_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {}\r\n\r\n",
                mime::IMAGE_PNG
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, cookie: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::COOKIE, cookie)
        .body(Body::from(body))
        .unwrap()
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([40, 90, 160, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn session_cookie(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login should set a session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register(
    app: &Router,
    username: &str,
    display_name: &str,
    password: &str,
) -> axum::response::Response {
    app.clone()
        .oneshot(json_request(
            "/api/auth/register",
            None,
            &json!({
                "username": username,
                "display_name": display_name,
                "password": password,
            }),
        ))
        .await
        .unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "/api/auth/login",
            None,
            &json!({ "username": username, "password": password }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response)
}

async fn create_icon(
    app: &Router,
    cookie: &str,
    label: &str,
    target_url: &str,
    sort_order: i32,
) -> Value {
    let sort = sort_order.to_string();
    let body = multipart_body(
        &[
            ("label", label),
            ("target_url", target_url),
            ("width", "64"),
            ("height", "64"),
            ("sort_order", &sort),
        ],
        Some(("image", "tile.png", &png_bytes())),
    );
    let response = app
        .clone()
        .oneshot(multipart_request("/api/profile/icons", cookie, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_home_is_anonymous_without_session() {
    let app = spawn_app().await;

    let response = app.clone().oneshot(get_request("/api/home", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let greeting = body["data"]["greeting"].as_str().unwrap();
    assert!(greeting.ends_with("Stranger!"), "greeting was {greeting}");
    assert!(greeting.starts_with("Good "));

    assert_eq!(body["data"]["icons"].as_array().unwrap().len(), 0);
    assert_eq!(body["data"]["grid"]["columns"], 0);
    assert_eq!(body["data"]["grid"]["rows"], 0);
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = spawn_app().await;

    for request in [
        get_request("/api/profile", None),
        get_request("/api/system/status", None),
        delete_request("/api/profile/icons/1", None),
    ] {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_register_validates_field_lengths() {
    let app = spawn_app().await;

    let response = register(&app, "abc", "Alice", "pass1234").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["field"], "username");

    let response = register(&app, "alice", "", "pass1234").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["field"], "display_name");

    let response = register(&app, "alice", "Alice", "abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["field"], "password");
}

#[tokio::test]
async fn test_duplicate_username_is_rejected() {
    let app = spawn_app().await;

    let response = register(&app, "alice", "Alice", "pass1234").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = register(&app, "alice", "Other", "different").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["field"], "username");

    // The first row is untouched: the original credentials still log in and
    // the display name is the first registration's.
    let cookie = login(&app, "alice", "pass1234").await;
    let response = app
        .clone()
        .oneshot(get_request("/api/profile", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["account"]["display_name"], "Alice");
}

#[tokio::test]
async fn test_wrong_password_gives_plain_unauthorized() {
    let app = spawn_app().await;
    register(&app, "alice", "Alice", "pass1234").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "/api/auth/login",
            None,
            &json!({ "username": "alice", "password": "wrong" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    // Deliberately unattributed: nothing says whether the username or the
    // password was wrong.
    assert!(body["field"].is_null());
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let app = spawn_app().await;
    register(&app, "alice", "Alice", "pass1234").await;
    let cookie = login(&app, "alice", "pass1234").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request("/api/profile", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_icon_lifecycle() {
    let app = spawn_app().await;
    register(&app, "alice", "Alice", "pass1234").await;
    let cookie = login(&app, "alice", "pass1234").await;

    let created = create_icon(&app, &cookie, "Mail", "example.com", 1).await;
    // Bare address gains a scheme exactly once at creation.
    assert_eq!(created["data"]["target_url"], "https://example.com");
    let icon_id = created["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/api/profile", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    let icons = body["data"]["icons"].as_array().unwrap();
    assert_eq!(icons.len(), 1);
    assert_eq!(icons[0]["label"], "Mail");
    assert_eq!(icons[0]["sort_order"], 1);
    assert_eq!(icons[0]["width"], 64);
    assert_eq!(icons[0]["height"], 64);
    assert_eq!(icons[0]["target_url"], "https://example.com");
    assert_eq!(body["data"]["grid"]["columns"], 3);
    assert_eq!(body["data"]["grid"]["rows"], 1);

    let response = app
        .clone()
        .oneshot(get_request("/api/home", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    let greeting = body["data"]["greeting"].as_str().unwrap();
    assert!(greeting.ends_with("Alice!"), "greeting was {greeting}");
    assert_eq!(body["data"]["icons"].as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(delete_request(
            &format!("/api/profile/icons/{icon_id}"),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Item deleted.");

    let response = app
        .clone()
        .oneshot(get_request("/api/profile", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["icons"].as_array().unwrap().len(), 0);
    assert_eq!(body["data"]["grid"]["columns"], 0);
    assert_eq!(body["data"]["grid"]["rows"], 0);
}

#[tokio::test]
async fn test_icon_with_existing_scheme_is_unchanged() {
    let app = spawn_app().await;
    register(&app, "alice", "Alice", "pass1234").await;
    let cookie = login(&app, "alice", "pass1234").await;

    let created = create_icon(&app, &cookie, "Blog", "http://example.com", 1).await;
    assert_eq!(created["data"]["target_url"], "http://example.com");
}

#[tokio::test]
async fn test_icons_keep_insertion_order_on_ties() {
    let app = spawn_app().await;
    register(&app, "alice", "Alice", "pass1234").await;
    let cookie = login(&app, "alice", "pass1234").await;

    create_icon(&app, &cookie, "First", "https://a.example", 2).await;
    create_icon(&app, &cookie, "Second", "https://b.example", 1).await;
    create_icon(&app, &cookie, "Third", "https://c.example", 2).await;

    let response = app
        .clone()
        .oneshot(get_request("/api/profile", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    let labels: Vec<&str> = body["data"]["icons"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["label"].as_str().unwrap())
        .collect();

    assert_eq!(labels, vec!["Second", "First", "Third"]);
}

#[tokio::test]
async fn test_delete_unknown_icon_is_not_found() {
    let app = spawn_app().await;
    register(&app, "alice", "Alice", "pass1234").await;
    let cookie = login(&app, "alice", "pass1234").await;

    let response = app
        .clone()
        .oneshot(delete_request("/api/profile/icons/9999", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_icons_are_private_to_their_owner() {
    let app = spawn_app().await;
    register(&app, "alice", "Alice", "pass1234").await;
    register(&app, "robert", "Bob", "pass1234").await;

    let alice = login(&app, "alice", "pass1234").await;
    let created = create_icon(&app, &alice, "Mail", "https://example.com", 1).await;
    let icon_id = created["data"]["id"].as_i64().unwrap();

    let bob = login(&app, "robert", "pass1234").await;

    // Another account's icon id behaves exactly like a missing one.
    let response = app
        .clone()
        .oneshot(delete_request(
            &format!("/api/profile/icons/{icon_id}"),
            Some(&bob),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(get_request("/api/profile", Some(&bob)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["icons"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_icon_upload_rejects_wrong_extension() {
    let app = spawn_app().await;
    register(&app, "alice", "Alice", "pass1234").await;
    let cookie = login(&app, "alice", "pass1234").await;

    let body = multipart_body(
        &[
            ("label", "Notes"),
            ("target_url", "https://example.com"),
            ("width", "64"),
            ("height", "64"),
            ("sort_order", "1"),
        ],
        Some(("image", "notes.txt", &png_bytes())),
    );
    let response = app
        .clone()
        .oneshot(multipart_request("/api/profile/icons", &cookie, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["field"], "image");
}

#[tokio::test]
async fn test_icon_form_validates_ranges() {
    let app = spawn_app().await;
    register(&app, "alice", "Alice", "pass1234").await;
    let cookie = login(&app, "alice", "pass1234").await;

    // Width below the minimum display size.
    let body = multipart_body(
        &[
            ("label", "Mail"),
            ("target_url", "https://example.com"),
            ("width", "10"),
            ("height", "64"),
            ("sort_order", "1"),
        ],
        Some(("image", "tile.png", &png_bytes())),
    );
    let response = app
        .clone()
        .oneshot(multipart_request("/api/profile/icons", &cookie, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["field"], "width");

    // Sort order above the cap.
    let body = multipart_body(
        &[
            ("label", "Mail"),
            ("target_url", "https://example.com"),
            ("width", "64"),
            ("height", "64"),
            ("sort_order", "21"),
        ],
        Some(("image", "tile.png", &png_bytes())),
    );
    let response = app
        .clone()
        .oneshot(multipart_request("/api/profile/icons", &cookie, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["field"], "sort_order");
}

#[tokio::test]
async fn test_profile_picture_upload_updates_account() {
    let app = spawn_app().await;
    register(&app, "alice", "Alice", "pass1234").await;
    let cookie = login(&app, "alice", "pass1234").await;

    let response = app
        .clone()
        .oneshot(get_request("/api/profile", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    let before = body["data"]["account"]["profile_image"]
        .as_str()
        .unwrap()
        .to_string();

    let body = multipart_body(&[], Some(("image", "me.png", &png_bytes())));
    let response = app
        .clone()
        .oneshot(multipart_request("/api/profile/picture", &cookie, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let after = body["data"]["profile_image"].as_str().unwrap();

    assert_ne!(after, before);
    assert!(after.ends_with("_me.png"));
}

#[tokio::test]
async fn test_status_reports_version() {
    let app = spawn_app().await;
    register(&app, "alice", "Alice", "pass1234").await;
    let cookie = login(&app, "alice", "pass1234").await;

    let response = app
        .clone()
        .oneshot(get_request("/api/system/status", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
}
