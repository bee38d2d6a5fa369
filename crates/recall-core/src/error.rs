//! Error types for `recall-core`.
//!
//! Storage backends convert their own errors into this enum (the
//! [`KnowledgeStore`](crate::store::KnowledgeStore) trait requires
//! `Error: Into<Error>`), so the HTTP layer can map domain failures to
//! status codes without knowing which backend is behind the trait.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// The addressed entity does not exist, or is not owned by the caller.
  /// The two cases are not distinguished.
  #[error("{entity} not found")]
  NotFound { entity: &'static str },

  /// A per-owner `(name, owner)` uniqueness constraint was violated.
  #[error("{entity} named {name:?} already exists")]
  DuplicateName {
    entity: &'static str,
    name:   String,
  },

  /// A note referenced a category that the acting user does not own.
  #[error("category {0} does not belong to the current user")]
  ForeignCategory(Uuid),

  /// Backend-specific failure (I/O, SQL, connection pool, …).
  #[error("storage error: {0}")]
  Storage(String),
}

impl Error {
  pub fn not_found(entity: &'static str) -> Self {
    Error::NotFound { entity }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
