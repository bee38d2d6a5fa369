//! Note types — the central entity of the store.
//!
//! Notes come in two output shapes, selected by call site rather than by
//! inheritance: [`NoteSummary`] for list-style reads (list, search, recent,
//! favorites) and [`NoteDetail`] for single-note reads and writes, which
//! carries the full tag objects and attachment metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{attachment::Attachment, tag::Tag};

// ─── Difficulty ──────────────────────────────────────────────────────────────

/// Self-assessed difficulty of the material.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  #[default]
  Beginner,
  Intermediate,
  Advanced,
}

impl Difficulty {
  /// The discriminant string stored in the `difficulty` column.
  /// Must match the `rename_all = "lowercase"` serde tags above.
  pub fn as_str(self) -> &'static str {
    match self {
      Difficulty::Beginner => "beginner",
      Difficulty::Intermediate => "intermediate",
      Difficulty::Advanced => "advanced",
    }
  }
}

// ─── Note ────────────────────────────────────────────────────────────────────

/// A persisted note. Tag membership and attachments live in their own tables
/// and are joined in on read (see [`NoteDetail`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
  pub id:               Uuid,
  pub owner_id:         Uuid,
  pub category_id:      Uuid,
  pub title:            String,
  pub content:          String,
  pub summary:          String,
  pub difficulty:       Difficulty,
  pub is_favorite:      bool,
  pub is_archived:      bool,
  pub source_url:       Option<String>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
  pub last_reviewed_at: Option<DateTime<Utc>>,
}

/// Full representation: the note plus its category name, resolved tags, and
/// attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteDetail {
  #[serde(flatten)]
  pub note:          Note,
  pub category_name: String,
  pub tags:          Vec<Tag>,
  pub attachments:   Vec<Attachment>,
}

/// Lightweight representation for list-style reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteSummary {
  pub id:            Uuid,
  pub title:         String,
  pub summary:       String,
  pub category_id:   Uuid,
  pub category_name: String,
  pub difficulty:    Difficulty,
  pub is_favorite:   bool,
  pub is_archived:   bool,
  pub tag_count:     u32,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::KnowledgeStore::create_note`].
///
/// `tag_ids` may reference tags the caller does not own; those are silently
/// dropped on assignment. A foreign `category_id`, by contrast, is rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct NewNote {
  pub title:       String,
  pub content:     String,
  #[serde(default)]
  pub summary:     String,
  pub category_id: Uuid,
  #[serde(default)]
  pub tag_ids:     Vec<Uuid>,
  #[serde(default)]
  pub difficulty:  Difficulty,
  #[serde(default)]
  pub is_favorite: bool,
  pub source_url:  Option<String>,
}

/// Partial update; `None` fields are left untouched. `tag_ids: Some(…)`
/// replaces the whole tag set (filtered to owned tags), `None` keeps it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteUpdate {
  pub title:       Option<String>,
  pub content:     Option<String>,
  pub summary:     Option<String>,
  pub category_id: Option<Uuid>,
  pub tag_ids:     Option<Vec<Uuid>>,
  pub difficulty:  Option<Difficulty>,
  pub is_favorite: Option<bool>,
  pub is_archived: Option<bool>,
  pub source_url:  Option<Option<String>>,
}
