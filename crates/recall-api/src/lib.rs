//! JSON REST API for Recall.
//!
//! Exposes an axum [`Router`] backed by any
//! [`recall_core::store::KnowledgeStore`]. TLS and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", recall_api::api_router(state.clone()))
//! ```

pub mod attachments;
pub mod auth;
pub mod categories;
pub mod error;
pub mod notes;
pub mod progress;
pub mod tags;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use recall_core::store::KnowledgeStore;

pub use error::ApiError;

/// Upload size ceiling for attachment bodies.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: KnowledgeStore> {
  pub store:           Arc<S>,
  /// Directory attachment files are written under.
  pub attachments_dir: Arc<PathBuf>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Auth
    .route("/auth/register", post(auth::register::<S>))
    .route("/auth/login", post(auth::login::<S>))
    .route("/auth/refresh", post(auth::refresh::<S>))
    .route("/auth/profile", get(auth::profile::<S>))
    // Categories
    .route(
      "/categories",
      get(categories::list::<S>).post(categories::create::<S>),
    )
    .route(
      "/categories/{id}",
      get(categories::get_one::<S>)
        .patch(categories::update_one::<S>)
        .delete(categories::delete_one::<S>),
    )
    // Tags
    .route("/tags", get(tags::list::<S>).post(tags::create::<S>))
    .route(
      "/tags/{id}",
      get(tags::get_one::<S>)
        .patch(tags::update_one::<S>)
        .delete(tags::delete_one::<S>),
    )
    // Notes
    .route("/notes", get(notes::list::<S>).post(notes::create::<S>))
    .route("/notes/recent", get(notes::recent::<S>))
    .route("/notes/favorites", get(notes::favorites::<S>))
    .route("/notes/search", get(notes::search::<S>))
    .route(
      "/notes/{id}",
      get(notes::get_one::<S>)
        .patch(notes::update_one::<S>)
        .delete(notes::delete_one::<S>),
    )
    .route("/notes/{id}/mark_reviewed", post(notes::mark_reviewed::<S>))
    .route("/notes/{id}/toggle_favorite", post(notes::toggle_favorite::<S>))
    .route("/notes/{id}/toggle_archive", post(notes::toggle_archive::<S>))
    // Attachments
    .route(
      "/attachments",
      get(attachments::list::<S>).post(attachments::create::<S>),
    )
    .route(
      "/attachments/{id}",
      get(attachments::get_one::<S>).delete(attachments::delete_one::<S>),
    )
    // Progress & dashboard
    .route("/progress", get(progress::snapshot::<S>))
    .route("/dashboard", get(progress::dashboard::<S>))
    .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
    .with_state(state)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, Response, StatusCode, header},
  };
  use recall_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;

  async fn state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let dir =
      std::env::temp_dir().join(format!("recall-api-test-{}", Uuid::new_v4()));
    AppState { store: Arc::new(store), attachments_dir: Arc::new(dir) }
  }

  fn request(
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
      builder =
        builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
      Some(json) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    }
  }

  async fn send(
    state: &AppState<SqliteStore>,
    req: Request<Body>,
  ) -> Response<Body> {
    api_router(state.clone()).oneshot(req).await.unwrap()
  }

  async fn body_json(resp: Response<Body>) -> Value {
    let bytes =
      axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn register_body(username: &str) -> Value {
    json!({
      "username": username,
      "email": format!("{username}@example.com"),
      "password": "hunter2hunter2",
      "password_confirm": "hunter2hunter2",
    })
  }

  /// Register `username` and return their access token.
  async fn register(state: &AppState<SqliteStore>, username: &str) -> String {
    let resp = send(
      state,
      request("POST", "/auth/register", None, Some(register_body(username))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = body_json(resp).await;
    json["tokens"]["access"].as_str().unwrap().to_string()
  }

  // ── Auth ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn register_returns_user_and_tokens() {
    let state = state().await;
    let resp = send(
      &state,
      request("POST", "/auth/register", None, Some(register_body("alice"))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let json = body_json(resp).await;
    assert_eq!(json["user"]["username"], "alice");
    assert!(json["user"].get("password_hash").is_none());
    assert!(!json["tokens"]["access"].as_str().unwrap().is_empty());
    assert!(!json["tokens"]["refresh"].as_str().unwrap().is_empty());
  }

  #[tokio::test]
  async fn short_or_mismatched_password_is_rejected() {
    let state = state().await;

    let mut body = register_body("alice");
    body["password"] = json!("short");
    body["password_confirm"] = json!("short");
    let resp =
      send(&state, request("POST", "/auth/register", None, Some(body))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let mut body = register_body("alice");
    body["password_confirm"] = json!("something-else");
    let resp =
      send(&state, request("POST", "/auth/register", None, Some(body))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn duplicate_username_is_a_conflict() {
    let state = state().await;
    register(&state, "alice").await;

    let resp = send(
      &state,
      request("POST", "/auth/register", None, Some(register_body("alice"))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn login_verifies_the_password() {
    let state = state().await;
    register(&state, "alice").await;

    let resp = send(
      &state,
      request(
        "POST",
        "/auth/login",
        None,
        Some(json!({"username": "alice", "password": "hunter2hunter2"})),
      ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(
      &state,
      request(
        "POST",
        "/auth/login",
        None,
        Some(json!({"username": "alice", "password": "wrong-password"})),
      ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn profile_requires_an_access_token() {
    let state = state().await;
    let access = register(&state, "alice").await;

    let resp = send(&state, request("GET", "/auth/profile", None, None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = send(
      &state,
      request("GET", "/auth/profile", Some("bogus-token"), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp =
      send(&state, request("GET", "/auth/profile", Some(&access), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["username"], "alice");
  }

  #[tokio::test]
  async fn refresh_token_grants_access_but_is_not_an_access_token() {
    let state = state().await;
    let resp = send(
      &state,
      request("POST", "/auth/register", None, Some(register_body("alice"))),
    )
    .await;
    let json = body_json(resp).await;
    let refresh = json["tokens"]["refresh"].as_str().unwrap().to_string();

    // A refresh token is not accepted as a bearer credential.
    let resp =
      send(&state, request("GET", "/auth/profile", Some(&refresh), None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // But it can be exchanged for a fresh access token.
    let resp = send(
      &state,
      request("POST", "/auth/refresh", None, Some(json!({"refresh": refresh}))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let access =
      body_json(resp).await["access"].as_str().unwrap().to_string();

    let resp =
      send(&state, request("GET", "/auth/profile", Some(&access), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  // ── Resources ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn category_round_trip_is_owner_scoped() {
    let state = state().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;

    let resp = send(
      &state,
      request(
        "POST",
        "/categories",
        Some(&alice),
        Some(json!({"name": "Rust"})),
      ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let id = body_json(resp).await["id"].as_str().unwrap().to_string();

    let resp =
      send(&state, request("GET", "/categories", Some(&alice), None)).await;
    let listed = body_json(resp).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["name"], "Rust");
    assert_eq!(listed[0]["note_count"], 0);

    // Bob sees nothing, and cannot address Alice's category by id.
    let resp =
      send(&state, request("GET", "/categories", Some(&bob), None)).await;
    assert!(body_json(resp).await.as_array().unwrap().is_empty());

    let resp = send(
      &state,
      request("GET", &format!("/categories/{id}"), Some(&bob), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn note_with_unknown_category_is_a_bad_request() {
    let state = state().await;
    let alice = register(&state, "alice").await;

    let resp = send(
      &state,
      request(
        "POST",
        "/notes",
        Some(&alice),
        Some(json!({
          "title": "orphan",
          "content": "…",
          "category_id": Uuid::new_v4(),
        })),
      ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn note_lifecycle_over_http() {
    let state = state().await;
    let alice = register(&state, "alice").await;

    let resp = send(
      &state,
      request(
        "POST",
        "/categories",
        Some(&alice),
        Some(json!({"name": "Rust"})),
      ),
    )
    .await;
    let category_id =
      body_json(resp).await["id"].as_str().unwrap().to_string();

    let resp = send(
      &state,
      request(
        "POST",
        "/notes",
        Some(&alice),
        Some(json!({
          "title": "Borrow checker",
          "content": "aliasing xor mutation",
          "category_id": category_id,
        })),
      ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let note = body_json(resp).await;
    let id = note["id"].as_str().unwrap().to_string();
    assert_eq!(note["category_name"], "Rust");

    // Toggle returns the new flag value.
    let resp = send(
      &state,
      request(
        "POST",
        &format!("/notes/{id}/toggle_favorite"),
        Some(&alice),
        None,
      ),
    )
    .await;
    assert_eq!(body_json(resp).await["is_favorite"], true);

    // Review stamps the note and advances the streak.
    let resp = send(
      &state,
      request(
        "POST",
        &format!("/notes/{id}/mark_reviewed"),
        Some(&alice),
        None,
      ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["learning_progress"]["current_streak"], 1);

    // Search finds it through the category name.
    let resp = send(
      &state,
      request("GET", "/notes/search?q=rust", Some(&alice), None),
    )
    .await;
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);

    let resp = send(
      &state,
      request("DELETE", &format!("/notes/{id}"), Some(&alice), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(
      &state,
      request("GET", &format!("/notes/{id}"), Some(&alice), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn attachment_upload_writes_the_file_and_records_metadata() {
    let state = state().await;
    let alice = register(&state, "alice").await;

    let resp = send(
      &state,
      request(
        "POST",
        "/categories",
        Some(&alice),
        Some(json!({"name": "Rust"})),
      ),
    )
    .await;
    let category_id =
      body_json(resp).await["id"].as_str().unwrap().to_string();
    let resp = send(
      &state,
      request(
        "POST",
        "/notes",
        Some(&alice),
        Some(json!({
          "title": "n",
          "content": "…",
          "category_id": category_id,
        })),
      ),
    )
    .await;
    let note_id = body_json(resp).await["id"].as_str().unwrap().to_string();

    let boundary = "X-RECALL-BOUNDARY";
    let multipart = format!(
      "--{boundary}\r\n\
       Content-Disposition: form-data; name=\"note_id\"\r\n\r\n\
       {note_id}\r\n\
       --{boundary}\r\n\
       Content-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\n\
       Content-Type: text/plain\r\n\r\n\
       hello attachments\r\n\
       --{boundary}--\r\n"
    );
    let req = Request::builder()
      .method("POST")
      .uri("/attachments")
      .header(header::AUTHORIZATION, format!("Bearer {alice}"))
      .header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={boundary}"),
      )
      .body(Body::from(multipart))
      .unwrap();
    let resp = send(&state, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let json = body_json(resp).await;
    assert_eq!(json["original_name"], "notes.txt");
    assert_eq!(json["file_type"], "document");
    assert_eq!(json["file_size"], 17);
    assert_eq!(json["file_size_display"], "17.0 B");

    let file_ref = json["file_ref"].as_str().unwrap();
    let on_disk =
      tokio::fs::read(state.attachments_dir.join(file_ref)).await.unwrap();
    assert_eq!(on_disk, b"hello attachments");

    let _ = tokio::fs::remove_dir_all(&*state.attachments_dir).await;
  }

  #[tokio::test]
  async fn dashboard_reports_the_callers_numbers() {
    let state = state().await;
    let alice = register(&state, "alice").await;

    let resp = send(
      &state,
      request(
        "POST",
        "/categories",
        Some(&alice),
        Some(json!({"name": "Rust"})),
      ),
    )
    .await;
    let category_id =
      body_json(resp).await["id"].as_str().unwrap().to_string();
    send(
      &state,
      request(
        "POST",
        "/notes",
        Some(&alice),
        Some(json!({
          "title": "one",
          "content": "…",
          "category_id": category_id,
          "is_favorite": true,
        })),
      ),
    )
    .await;

    let resp =
      send(&state, request("GET", "/dashboard", Some(&alice), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["total_notes"], 1);
    assert_eq!(json["total_categories"], 1);
    assert_eq!(json["favorite_notes"], 1);
    assert_eq!(json["recent_notes"], 1);
    assert_eq!(json["learning_progress"]["total_notes"], 1);
  }
}
