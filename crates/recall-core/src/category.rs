//! Category — the single mandatory grouping for notes.
//!
//! Categories are scoped per owner and unique by `(owner, name)`. Deleting a
//! category cascades to its notes (and through them, their attachments).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hex color assigned to categories created without an explicit one.
pub const DEFAULT_COLOR: &str = "#3B82F6";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
  pub id:          Uuid,
  pub owner_id:    Uuid,
  pub name:        String,
  pub description: String,
  /// Hex color code, e.g. `#3B82F6`.
  pub color:       String,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// A category plus the number of non-archived notes filed under it, as
/// returned by list/detail reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWithCount {
  #[serde(flatten)]
  pub category:   Category,
  pub note_count: u32,
}

/// Input to [`crate::store::KnowledgeStore::create_category`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
  pub name:        String,
  #[serde(default)]
  pub description: String,
  #[serde(default = "default_color")]
  pub color:       String,
}

fn default_color() -> String {
  DEFAULT_COLOR.to_string()
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryUpdate {
  pub name:        Option<String>,
  pub description: Option<String>,
  pub color:       Option<String>,
}
