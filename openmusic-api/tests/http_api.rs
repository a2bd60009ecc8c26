//! Router-level tests: requests go through the full middleware stack over
//! the in-memory store and cache.

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use openmusic_api::producer::UnavailableProducer;
use openmusic_api::{create_api_router, ApiConfig, AppState, AuthConfig};
use openmusic_storage::{CacheAside, InMemoryCache, InMemoryCatalog};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

/// 2024-01-01 00:00:00 UTC
const NOW: i64 = 1704067200;

fn app(upload_dir: &Path) -> Router {
    let state = AppState::new(
        Arc::new(InMemoryCatalog::new()),
        CacheAside::new(Arc::new(InMemoryCache::new())),
        AuthConfig::for_tests(NOW),
        ApiConfig {
            upload_dir: upload_dir.to_string_lossy().into_owned(),
            ..ApiConfig::default()
        },
        Arc::new(UnavailableProducer::new("no broker in tests")),
    );
    create_api_router(state)
}

/// Router with its own scratch upload directory, removed when the
/// returned `TempDir` drops.
fn test_app() -> (Router, TempDir) {
    let uploads = TempDir::new().unwrap();
    (app(uploads.path()), uploads)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}

/// Register and log in; returns (user id, access token).
async fn signed_up(app: &Router, username: &str) -> (String, String) {
    let (status, _, body) = send(
        app,
        Method::POST,
        "/users",
        None,
        Some(json!({ "username": username, "password": "secret", "fullname": username })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = body["data"]["userId"].as_str().unwrap().to_string();

    let (status, _, body) = send(
        app,
        Method::POST,
        "/authentications",
        None,
        Some(json!({ "username": username, "password": "secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = body["data"]["accessToken"].as_str().unwrap().to_string();
    (user_id, token)
}

#[tokio::test]
async fn collaboration_grants_playlist_access() {
    let (app, _uploads) = test_app();
    let (_, owner) = signed_up(&app, "owner").await;
    let (guest_id, guest) = signed_up(&app, "guest").await;

    let (_, _, body) = send(
        &app,
        Method::POST,
        "/playlists",
        Some(&owner),
        Some(json!({ "name": "Road trip" })),
    )
    .await;
    let playlist_id = body["data"]["playlistId"].as_str().unwrap().to_string();

    let (_, _, body) = send(
        &app,
        Method::POST,
        "/songs",
        None,
        Some(json!({ "title": "Fix You", "year": 2005, "genre": "Rock", "performer": "Coldplay" })),
    )
    .await;
    let song_id = body["data"]["songId"].as_str().unwrap().to_string();

    let songs_uri = format!("/playlists/{}/songs", playlist_id);
    let (status, _, _) = send(
        &app,
        Method::POST,
        &songs_uri,
        Some(&owner),
        Some(json!({ "songId": song_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, body) = send(&app, Method::GET, &songs_uri, Some(&guest), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "fail");

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/collaborations",
        Some(&owner),
        Some(json!({ "playlistId": playlist_id, "userId": guest_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"]["collaborationId"].is_string());

    let (status, _, body) = send(&app, Method::GET, &songs_uri, Some(&guest), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["playlist"]["username"], "owner");
    assert_eq!(body["data"]["playlist"]["songs"][0]["title"], "Fix You");

    let (_, _, body) = send(&app, Method::GET, "/playlists", Some(&guest), None).await;
    assert_eq!(body["data"]["playlists"].as_array().unwrap().len(), 1);

    let (status, _, _) = send(
        &app,
        Method::DELETE,
        &songs_uri,
        Some(&owner),
        Some(json!({ "songId": song_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send(
        &app,
        Method::GET,
        &format!("/playlists/{}/activities", playlist_id),
        Some(&guest),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["playlistId"], playlist_id.as_str());
    let activities = body["data"]["activities"].as_array().unwrap();
    assert_eq!(activities.len(), 2);
    assert_eq!(activities[0]["action"], "add");
    assert_eq!(activities[1]["action"], "delete");

    // Collaborators cannot delete the playlist.
    let (status, _, _) = send(
        &app,
        Method::DELETE,
        &format!("/playlists/{}", playlist_id),
        Some(&guest),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn like_count_reports_cache_source() {
    let (app, _uploads) = test_app();
    let (_, token) = signed_up(&app, "listener").await;

    let (_, _, body) = send(
        &app,
        Method::POST,
        "/albums",
        None,
        Some(json!({ "name": "Viva la Vida", "year": 2008 })),
    )
    .await;
    let album_id = body["data"]["albumId"].as_str().unwrap().to_string();
    let likes_uri = format!("/albums/{}/likes", album_id);

    let (status, _, _) = send(&app, Method::POST, &likes_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _, _) = send(&app, Method::POST, &likes_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, headers, body) = send(&app, Method::GET, &likes_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["likes"], 1);
    assert!(headers.get("x-data-source").is_none());

    let (_, headers, body) = send(&app, Method::GET, &likes_uri, None, None).await;
    assert_eq!(body["data"]["likes"], 1);
    assert_eq!(headers.get("x-data-source").unwrap(), "cache");

    let (status, _, _) = send(&app, Method::DELETE, &likes_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, headers, body) = send(&app, Method::GET, &likes_uri, None, None).await;
    assert_eq!(body["data"]["likes"], 0);
    assert!(headers.get("x-data-source").is_none());
}

#[tokio::test]
async fn album_detail_lists_its_songs() {
    let (app, _uploads) = test_app();

    let (_, _, body) = send(
        &app,
        Method::POST,
        "/albums",
        None,
        Some(json!({ "name": "Parachutes", "year": 2000 })),
    )
    .await;
    let album_id = body["data"]["albumId"].as_str().unwrap().to_string();
    let album_uri = format!("/albums/{}", album_id);

    let (_, _, body) = send(&app, Method::GET, &album_uri, None, None).await;
    assert!(body["data"]["album"]["songs"].as_array().unwrap().is_empty());

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/songs",
        None,
        Some(json!({
            "title": "Yellow",
            "year": 2000,
            "genre": "Rock",
            "performer": "Coldplay",
            "albumId": album_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, _, body) = send(&app, Method::GET, &album_uri, None, None).await;
    assert_eq!(body["data"]["album"]["songs"][0]["title"], "Yellow");
    assert_eq!(body["data"]["album"]["coverUrl"], Value::Null);

    let (status, _, _) = send(&app, Method::DELETE, &album_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, body) = send(&app, Method::GET, &album_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "fail");
}

#[tokio::test]
async fn cover_upload_accepts_images_only() {
    let (app, uploads) = test_app();

    let (_, _, body) = send(
        &app,
        Method::POST,
        "/albums",
        None,
        Some(json!({ "name": "X&Y", "year": 2005 })),
    )
    .await;
    let album_id = body["data"]["albumId"].as_str().unwrap().to_string();
    let covers_uri = format!("/albums/{}/covers", album_id);

    let upload = |content_type: &str| {
        let boundary = "openmusic-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"cover\"; filename=\"cover.png\"\r\nContent-Type: {ct}\r\n\r\nnot really a png\r\n--{b}--\r\n",
            b = boundary,
            ct = content_type
        );
        Request::builder()
            .method(Method::POST)
            .uri(&covers_uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap()
    };

    let response = app.clone().oneshot(upload("text/plain")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.clone().oneshot(upload("image/png")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let (_, _, body) = send(&app, Method::GET, &format!("/albums/{}", album_id), None, None).await;
    let cover_url = body["data"]["album"]["coverUrl"].as_str().unwrap();
    assert!(cover_url.starts_with("http://localhost:5000/upload/images/"));
    assert!(cover_url.ends_with("-cover.png"));

    let file_name = cover_url.rsplit('/').next().unwrap();
    let stored = std::fs::read(uploads.path().join(file_name)).unwrap();
    assert_eq!(stored, b"not really a png");
}

#[tokio::test]
async fn auth_failures_use_error_envelope() {
    let (app, _uploads) = test_app();

    let (status, _, body) = send(&app, Method::GET, "/playlists", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "fail");

    let (status, _, _) = send(&app, Method::GET, "/playlists", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/users",
        None,
        Some(json!({ "username": "dicoding", "fullname": "Dicoding" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("password"));
}

#[tokio::test]
async fn refresh_token_stops_working_after_logout() {
    let (app, _uploads) = test_app();
    send(
        &app,
        Method::POST,
        "/users",
        None,
        Some(json!({ "username": "dicoding", "password": "secret", "fullname": "Dicoding" })),
    )
    .await;
    let (_, _, body) = send(
        &app,
        Method::POST,
        "/authentications",
        None,
        Some(json!({ "username": "dicoding", "password": "secret" })),
    )
    .await;
    let refresh_token = body["data"]["refreshToken"].as_str().unwrap().to_string();
    let payload = json!({ "refreshToken": refresh_token });

    let (status, _, body) = send(
        &app,
        Method::PUT,
        "/authentications",
        None,
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["accessToken"].is_string());

    let (status, _, _) = send(
        &app,
        Method::DELETE,
        "/authentications",
        None,
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, Method::PUT, "/authentications", None, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn export_without_broker_is_unavailable() {
    let (app, _uploads) = test_app();
    let (_, token) = signed_up(&app, "owner").await;
    let (_, _, body) = send(
        &app,
        Method::POST,
        "/playlists",
        Some(&token),
        Some(json!({ "name": "To export" })),
    )
    .await;
    let playlist_id = body["data"]["playlistId"].as_str().unwrap().to_string();

    let (status, _, _) = send(
        &app,
        Method::POST,
        &format!("/export/playlists/{}", playlist_id),
        Some(&token),
        Some(json!({ "targetEmail": "owner@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/export/playlists/playlist-missing",
        Some(&token),
        Some(json!({ "targetEmail": "owner@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_components() {
    let (app, _uploads) = test_app();
    let (status, _, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["details"]["cache"]["backend"], "memory");
    assert_eq!(body["details"]["export_queue"], "unavailable");
}
