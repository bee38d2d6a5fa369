//! Handlers for `/attachments` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/attachments` | All attachments on the caller's notes |
//! | `POST`   | `/attachments` | `multipart/form-data`: `note_id`, `file`, optional `description` |
//! | `GET`    | `/attachments/{id}` | Metadata only |
//! | `DELETE` | `/attachments/{id}` | Also removes the stored file |
//!
//! Upload writes the file under the configured attachments directory first,
//! then records the metadata row; if the row is rejected (foreign note), the
//! file is removed again.

use axum::{
  Json,
  extract::{Multipart, Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use recall_core::{
  attachment::{Attachment, NewAttachment},
  store::KnowledgeStore,
};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// `GET /attachments`
pub async fn list<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Attachment>>, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let attachments = state
    .store
    .list_attachments(user.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(attachments))
}

/// `POST /attachments`
pub async fn create<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let mut note_id = None;
  let mut description = String::new();
  let mut file: Option<(String, Vec<u8>)> = None;

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::Validation(e.to_string()))?
  {
    let name = field.name().map(str::to_owned);
    match name.as_deref() {
      Some("note_id") => {
        let raw = field
          .text()
          .await
          .map_err(|e| ApiError::Validation(e.to_string()))?;
        let id = raw
          .trim()
          .parse::<Uuid>()
          .map_err(|_| ApiError::Validation(format!("invalid note id {raw:?}")))?;
        note_id = Some(id);
      }
      Some("description") => {
        description = field
          .text()
          .await
          .map_err(|e| ApiError::Validation(e.to_string()))?;
      }
      Some("file") => {
        let name = field
          .file_name()
          .map(sanitize_filename)
          .filter(|n| !n.is_empty())
          .ok_or_else(|| {
            ApiError::Validation("file part must carry a filename".into())
          })?;
        let bytes = field
          .bytes()
          .await
          .map_err(|e| ApiError::Validation(e.to_string()))?;
        file = Some((name, bytes.to_vec()));
      }
      _ => {}
    }
  }

  let note_id = note_id
    .ok_or_else(|| ApiError::Validation("note_id part is required".into()))?;
  let (original_name, bytes) = file
    .ok_or_else(|| ApiError::Validation("file part is required".into()))?;

  // Write the bytes under a collision-free name before touching the store.
  let file_ref = format!("{}-{original_name}", Uuid::new_v4());
  let dest = state.attachments_dir.join(&file_ref);
  tokio::fs::create_dir_all(&*state.attachments_dir)
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;
  tokio::fs::write(&dest, &bytes)
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;

  let result = state
    .store
    .create_attachment(user.id, NewAttachment {
      note_id,
      file_ref,
      original_name,
      file_size: bytes.len() as u64,
      description,
    })
    .await;

  match result {
    Ok(attachment) => Ok((StatusCode::CREATED, Json(attachment))),
    Err(e) => {
      let _ = tokio::fs::remove_file(&dest).await;
      Err(ApiError::store(e))
    }
  }
}

/// `GET /attachments/{id}`
pub async fn get_one<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Attachment>, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let attachment = state
    .store
    .get_attachment(user.id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("attachment {id} not found")))?;
  Ok(Json(attachment))
}

/// `DELETE /attachments/{id}`
pub async fn delete_one<S>(
  CurrentUser(user): CurrentUser,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  let attachment = state
    .store
    .delete_attachment(user.id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("attachment {id} not found")))?;

  // The row is gone; a failure removing the file only leaves an orphan.
  let _ = tokio::fs::remove_file(state.attachments_dir.join(&attachment.file_ref))
    .await;

  Ok(StatusCode::NO_CONTENT)
}

/// Strip any path components an uploader smuggled into the filename.
fn sanitize_filename(name: &str) -> String {
  name
    .rsplit(['/', '\\'])
    .next()
    .unwrap_or(name)
    .chars()
    .filter(|c| !c.is_control())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sanitize_strips_path_components() {
    assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
    assert_eq!(sanitize_filename(r"C:\temp\notes.pdf"), "notes.pdf");
    assert_eq!(sanitize_filename("plain.txt"), "plain.txt");
  }
}
