//! Tag — free-form per-owner labels attached to notes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
  pub id:         Uuid,
  pub owner_id:   Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// A tag plus the number of non-archived notes carrying it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagWithCount {
  #[serde(flatten)]
  pub tag:        Tag,
  pub note_count: u32,
}

/// Input to [`crate::store::KnowledgeStore::create_tag`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewTag {
  pub name: String,
}
