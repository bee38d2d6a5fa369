//! Handlers for `/notes` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/notes` | Filters: `category`, `difficulty`, `favorite`, `archived`, `tags`, `limit`, `offset` |
//! | `POST`   | `/notes` | 400 on a category the caller does not own |
//! | `GET`    | `/notes/search` | `?q=&category=&difficulty=&tags=` — archived notes included |
//! | `GET`    | `/notes/recent` | Ten most recently updated, non-archived |
//! | `GET`    | `/notes/favorites` | Non-archived favorites |
//! | `GET`    | `/notes/{id}` | Full detail: tags and attachments resolved |
//! | `PATCH`  | `/notes/{id}` | Partial update; `tags` replaces the whole set |
//! | `DELETE` | `/notes/{id}` | Cascades to attachments |
//! | `POST`   | `/notes/{id}/mark_reviewed` | Also advances the owner's streak |
//! | `POST`   | `/notes/{id}/toggle_favorite` | Returns the new flag |
//! | `POST`   | `/notes/{id}/toggle_archive` | Returns the new flag |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use recall_core::{
  note::{Difficulty, NewNote, NoteDetail, NoteSummary, NoteUpdate},
  store::{KnowledgeStore, NoteQuery},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

// ─── List & search ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub q:          Option<String>,
  pub category:   Option<Uuid>,
  pub difficulty: Option<Difficulty>,
  pub favorite:   Option<bool>,
  pub archived:   Option<bool>,
  /// Comma-separated tag ids.
  pub tags:       Option<String>,
  pub limit:      Option<usize>,
  pub offset:     Option<usize>,
}

impl ListParams {
  fn into_query(self) -> Result<NoteQuery, ApiError> {
    let mut tag_ids = Vec::new();
    if let Some(raw) = &self.tags {
      for part in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let id = part
          .trim()
          .parse::<Uuid>()
          .map_err(|_| ApiError::Validation(format!("invalid tag id {part:?}")))?;
        tag_ids.push(id);
      }
    }
    Ok(NoteQuery {
      text: self.q,
      category_id: self.category,
      difficulty: self.difficulty,
      is_favorite: self.favorite,
      is_archived: self.archived,
      tag_ids,
      limit: self.limit,
      offset: self.offset,
    })
  }
}

/// `GET /notes`
pub async fn list<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<NoteSummary>>, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let query = params.into_query()?;
  let notes = state
    .store
    .list_notes(user.id, &query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(notes))
}

/// `GET /notes/search` — same filters as the listing; kept as its own route
/// for callers that treat search as a distinct operation. Does not exclude
/// archived notes.
pub async fn search<S>(
  current: CurrentUser,
  state: State<AppState<S>>,
  params: Query<ListParams>,
) -> Result<Json<Vec<NoteSummary>>, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  list(current, state, params).await
}

/// `GET /notes/recent`
pub async fn recent<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<NoteSummary>>, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let notes =
    state.store.recent_notes(user.id).await.map_err(ApiError::store)?;
  Ok(Json(notes))
}

/// `GET /notes/favorites`
pub async fn favorites<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<NoteSummary>>, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let notes =
    state.store.favorite_notes(user.id).await.map_err(ApiError::store)?;
  Ok(Json(notes))
}

// ─── CRUD ─────────────────────────────────────────────────────────────────────

/// `POST /notes`
pub async fn create<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  Json(body): Json<NewNote>,
) -> Result<impl IntoResponse, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  if body.title.trim().is_empty() {
    return Err(ApiError::Validation("title must not be empty".into()));
  }
  let note = state
    .store
    .create_note(user.id, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(note)))
}

/// `GET /notes/{id}`
pub async fn get_one<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<NoteDetail>, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let note = state
    .store
    .get_note(user.id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("note {id} not found")))?;
  Ok(Json(note))
}

/// `PATCH /notes/{id}`
pub async fn update_one<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NoteUpdate>,
) -> Result<Json<NoteDetail>, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let note = state
    .store
    .update_note(user.id, id, body)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("note {id} not found")))?;
  Ok(Json(note))
}

/// `DELETE /notes/{id}`
pub async fn delete_one<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let deleted =
    state.store.delete_note(user.id, id).await.map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("note {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── Review & toggles ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
  pub last_reviewed_at: chrono::DateTime<Utc>,
  pub learning_progress: recall_core::progress::LearningProgress,
}

/// `POST /notes/{id}/mark_reviewed` — stamps the note, then runs the streak
/// update for today.
pub async fn mark_reviewed<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ReviewResponse>, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let now = Utc::now();
  let reviewed = state
    .store
    .mark_reviewed(user.id, id, now)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("note {id} not found")))?;

  let progress = state
    .store
    .record_review(user.id, now.date_naive())
    .await
    .map_err(ApiError::store)?;

  Ok(Json(ReviewResponse {
    last_reviewed_at:  reviewed,
    learning_progress: progress,
  }))
}

/// `POST /notes/{id}/toggle_favorite`
pub async fn toggle_favorite<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let is_favorite = state
    .store
    .toggle_favorite(user.id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("note {id} not found")))?;
  Ok(Json(json!({ "is_favorite": is_favorite })))
}

/// `POST /notes/{id}/toggle_archive`
pub async fn toggle_archive<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let is_archived = state
    .store
    .toggle_archive(user.id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("note {id} not found")))?;
  Ok(Json(json!({ "is_archived": is_archived })))
}
