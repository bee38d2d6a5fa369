//! Error type for `recall-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored discriminant string did not match any known variant.
  #[error("decode error: {0}")]
  Decode(String),

  /// Violation of a per-owner `(owner_id, name)` unique index.
  #[error("{entity} named {name:?} already exists")]
  DuplicateName {
    entity: &'static str,
    name:   String,
  },

  /// A note write referenced a category the owner does not have.
  #[error("category {0} does not belong to the current user")]
  ForeignCategory(Uuid),

  /// The addressed entity is absent or owned by someone else; the two cases
  /// are not distinguished.
  #[error("{entity} not found")]
  NotFound { entity: &'static str },
}

impl From<Error> for recall_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::DuplicateName { entity, name } => {
        recall_core::Error::DuplicateName { entity, name }
      }
      Error::ForeignCategory(id) => recall_core::Error::ForeignCategory(id),
      Error::NotFound { entity } => recall_core::Error::NotFound { entity },
      other => recall_core::Error::Storage(other.to_string()),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
