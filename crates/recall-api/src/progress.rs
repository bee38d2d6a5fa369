//! Handlers for `/progress` and `/dashboard`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/progress` | Live snapshot, `total_notes` refreshed |
//! | `GET`  | `/dashboard` | One-pass aggregation over the caller's data |

use axum::{Json, extract::State};
use recall_core::{
  dashboard::DashboardStats, progress::LearningProgress, store::KnowledgeStore,
};

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// `GET /progress`
pub async fn snapshot<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
) -> Result<Json<LearningProgress>, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let progress = state
    .store
    .progress_snapshot(user.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(progress))
}

/// `GET /dashboard`
pub async fn dashboard<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
) -> Result<Json<DashboardStats>, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let stats = state
    .store
    .dashboard_stats(user.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(stats))
}
