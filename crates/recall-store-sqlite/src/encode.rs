//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as `YYYY-MM-DD`,
//! UUIDs as hyphenated lowercase strings, enums as their lowercase
//! discriminants. Booleans and integers use native SQLite storage.

use chrono::{DateTime, NaiveDate, Utc};
use recall_core::{
  attachment::{Attachment, FileType},
  category::Category,
  note::{Difficulty, Note, NoteSummary},
  progress::LearningProgress,
  tag::Tag,
  user::{AuthToken, TokenKind, User},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  s.parse().map_err(|_| Error::DateParse(format!("bad date: {s:?}")))
}

// ─── Difficulty ──────────────────────────────────────────────────────────────

pub fn decode_difficulty(s: &str) -> Result<Difficulty> {
  match s {
    "beginner" => Ok(Difficulty::Beginner),
    "intermediate" => Ok(Difficulty::Intermediate),
    "advanced" => Ok(Difficulty::Advanced),
    other => Err(Error::Decode(format!("unknown difficulty: {other:?}"))),
  }
}

// ─── FileType ────────────────────────────────────────────────────────────────

pub fn decode_file_type(s: &str) -> Result<FileType> {
  match s {
    "image" => Ok(FileType::Image),
    "document" => Ok(FileType::Document),
    "video" => Ok(FileType::Video),
    "audio" => Ok(FileType::Audio),
    "other" => Ok(FileType::Other),
    other => Err(Error::Decode(format!("unknown file type: {other:?}"))),
  }
}

// ─── TokenKind ───────────────────────────────────────────────────────────────

pub fn decode_token_kind(s: &str) -> Result<TokenKind> {
  match s {
    "access" => Ok(TokenKind::Access),
    "refresh" => Ok(TokenKind::Refresh),
    other => Err(Error::Decode(format!("unknown token kind: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub id:          String,
  pub username:    String,
  pub email:       String,
  pub first_name:  String,
  pub last_name:   String,
  pub date_joined: String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:          decode_uuid(&self.id)?,
      username:    self.username,
      email:       self.email,
      first_name:  self.first_name,
      last_name:   self.last_name,
      date_joined: decode_dt(&self.date_joined)?,
    })
  }
}

/// Raw strings read directly from an `auth_tokens` row.
pub struct RawToken {
  pub token_hash: String,
  pub user_id:    String,
  pub kind:       String,
  pub expires_at: String,
}

impl RawToken {
  pub fn into_token(self) -> Result<AuthToken> {
    Ok(AuthToken {
      token_hash: self.token_hash,
      user_id:    decode_uuid(&self.user_id)?,
      kind:       decode_token_kind(&self.kind)?,
      expires_at: decode_dt(&self.expires_at)?,
    })
  }
}

/// Raw strings read directly from a `categories` row.
pub struct RawCategory {
  pub id:          String,
  pub owner_id:    String,
  pub name:        String,
  pub description: String,
  pub color:       String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawCategory {
  pub fn into_category(self) -> Result<Category> {
    Ok(Category {
      id:          decode_uuid(&self.id)?,
      owner_id:    decode_uuid(&self.owner_id)?,
      name:        self.name,
      description: self.description,
      color:       self.color,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `tags` row.
pub struct RawTag {
  pub id:         String,
  pub owner_id:   String,
  pub name:       String,
  pub created_at: String,
}

impl RawTag {
  pub fn into_tag(self) -> Result<Tag> {
    Ok(Tag {
      id:         decode_uuid(&self.id)?,
      owner_id:   decode_uuid(&self.owner_id)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `notes` row.
pub struct RawNote {
  pub id:               String,
  pub owner_id:         String,
  pub category_id:      String,
  pub title:            String,
  pub content:          String,
  pub summary:          String,
  pub difficulty:       String,
  pub is_favorite:      bool,
  pub is_archived:      bool,
  pub source_url:       Option<String>,
  pub created_at:       String,
  pub updated_at:       String,
  pub last_reviewed_at: Option<String>,
}

impl RawNote {
  pub fn into_note(self) -> Result<Note> {
    Ok(Note {
      id:               decode_uuid(&self.id)?,
      owner_id:         decode_uuid(&self.owner_id)?,
      category_id:      decode_uuid(&self.category_id)?,
      title:            self.title,
      content:          self.content,
      summary:          self.summary,
      difficulty:       decode_difficulty(&self.difficulty)?,
      is_favorite:      self.is_favorite,
      is_archived:      self.is_archived,
      source_url:       self.source_url,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
      last_reviewed_at: self
        .last_reviewed_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
    })
  }
}

/// Raw values for the lightweight note listing shape.
pub struct RawNoteSummary {
  pub id:            String,
  pub title:         String,
  pub summary:       String,
  pub category_id:   String,
  pub category_name: String,
  pub difficulty:    String,
  pub is_favorite:   bool,
  pub is_archived:   bool,
  pub tag_count:     u32,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawNoteSummary {
  pub fn into_summary(self) -> Result<NoteSummary> {
    Ok(NoteSummary {
      id:            decode_uuid(&self.id)?,
      title:         self.title,
      summary:       self.summary,
      category_id:   decode_uuid(&self.category_id)?,
      category_name: self.category_name,
      difficulty:    decode_difficulty(&self.difficulty)?,
      is_favorite:   self.is_favorite,
      is_archived:   self.is_archived,
      tag_count:     self.tag_count,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from an `attachments` row.
pub struct RawAttachment {
  pub id:            String,
  pub note_id:       String,
  pub file_ref:      String,
  pub original_name: String,
  pub file_type:     String,
  pub file_size:     u64,
  pub description:   String,
  pub uploaded_at:   String,
}

impl RawAttachment {
  pub fn into_attachment(self) -> Result<Attachment> {
    Ok(Attachment {
      id:            decode_uuid(&self.id)?,
      note_id:       decode_uuid(&self.note_id)?,
      file_ref:      self.file_ref,
      original_name: self.original_name,
      file_type:     decode_file_type(&self.file_type)?,
      file_size:     self.file_size,
      description:   self.description,
      uploaded_at:   decode_dt(&self.uploaded_at)?,
    })
  }
}

/// Raw values read directly from a `learning_progress` row.
pub struct RawProgress {
  pub owner_id:             String,
  pub total_notes:          u32,
  pub notes_reviewed_today: u32,
  pub current_streak:       u32,
  pub longest_streak:       u32,
  pub last_activity_date:   Option<String>,
  pub created_at:           String,
  pub updated_at:           String,
}

impl RawProgress {
  pub fn into_progress(self) -> Result<LearningProgress> {
    Ok(LearningProgress {
      owner_id:             decode_uuid(&self.owner_id)?,
      total_notes:          self.total_notes,
      notes_reviewed_today: self.notes_reviewed_today,
      current_streak:       self.current_streak,
      longest_streak:       self.longest_streak,
      last_activity_date:   self
        .last_activity_date
        .as_deref()
        .map(decode_date)
        .transpose()?,
      created_at:           decode_dt(&self.created_at)?,
      updated_at:           decode_dt(&self.updated_at)?,
    })
  }
}
