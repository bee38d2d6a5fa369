//! Handlers for `/categories` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/categories` | Ordered by name, with non-archived note counts |
//! | `POST`   | `/categories` | 409 on a duplicate name |
//! | `GET`    | `/categories/{id}` | 404 if not found or not the caller's |
//! | `PATCH`  | `/categories/{id}` | Partial update |
//! | `DELETE` | `/categories/{id}` | Cascades to notes and their attachments |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use recall_core::{
  category::{Category, CategoryUpdate, CategoryWithCount, NewCategory},
  store::KnowledgeStore,
};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// `GET /categories`
pub async fn list<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<CategoryWithCount>>, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let categories = state
    .store
    .list_categories(user.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(categories))
}

/// `POST /categories`
pub async fn create<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  Json(body): Json<NewCategory>,
) -> Result<impl IntoResponse, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::Validation("name must not be empty".into()));
  }
  let category = state
    .store
    .create_category(user.id, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(category)))
}

/// `GET /categories/{id}`
pub async fn get_one<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<CategoryWithCount>, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let category = state
    .store
    .get_category(user.id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("category {id} not found")))?;
  Ok(Json(category))
}

/// `PATCH /categories/{id}`
pub async fn update_one<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<CategoryUpdate>,
) -> Result<Json<Category>, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let category = state
    .store
    .update_category(user.id, id, body)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("category {id} not found")))?;
  Ok(Json(category))
}

/// `DELETE /categories/{id}`
pub async fn delete_one<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let deleted = state
    .store
    .delete_category(user.id, id)
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("category {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}
