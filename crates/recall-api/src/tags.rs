//! Handlers for `/tags` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/tags` | Ordered by name, with non-archived note counts |
//! | `POST`   | `/tags` | 409 on a duplicate name |
//! | `GET`    | `/tags/{id}` | 404 if not found or not the caller's |
//! | `PATCH`  | `/tags/{id}` | Body: `{"name":"…"}` |
//! | `DELETE` | `/tags/{id}` | Unlinks from notes via cascade |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use recall_core::{
  store::KnowledgeStore,
  tag::{NewTag, Tag, TagWithCount},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// `GET /tags`
pub async fn list<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<TagWithCount>>, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let tags = state.store.list_tags(user.id).await.map_err(ApiError::store)?;
  Ok(Json(tags))
}

/// `POST /tags`
pub async fn create<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  Json(body): Json<NewTag>,
) -> Result<impl IntoResponse, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::Validation("name must not be empty".into()));
  }
  let tag = state
    .store
    .create_tag(user.id, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(tag)))
}

/// `GET /tags/{id}`
pub async fn get_one<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<TagWithCount>, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let tag = state
    .store
    .get_tag(user.id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("tag {id} not found")))?;
  Ok(Json(tag))
}

#[derive(Debug, Deserialize)]
pub struct RenameBody {
  pub name: String,
}

/// `PATCH /tags/{id}`
pub async fn update_one<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RenameBody>,
) -> Result<Json<Tag>, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::Validation("name must not be empty".into()));
  }
  let tag = state
    .store
    .update_tag(user.id, id, body.name)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("tag {id} not found")))?;
  Ok(Json(tag))
}

/// `DELETE /tags/{id}`
pub async fn delete_one<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let deleted =
    state.store.delete_tag(user.id, id).await.map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("tag {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}
