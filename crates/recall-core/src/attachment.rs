//! Attachment types and file-kind derivation.
//!
//! Binary data never lives in the database: `file_ref` is a path relative to
//! the configured attachments directory. The kind is derived from the
//! original filename's extension via a fixed mapping; anything unmapped is
//! [`FileType::Other`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── File type ───────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
  Image,
  Document,
  Video,
  Audio,
  #[default]
  Other,
}

impl FileType {
  /// Derive the kind from a filename's extension (case-insensitive).
  /// Filenames without an extension map to [`FileType::Other`].
  pub fn from_filename(name: &str) -> Self {
    let Some((_, ext)) = name.rsplit_once('.') else {
      return FileType::Other;
    };
    match ext.to_ascii_lowercase().as_str() {
      "jpg" | "jpeg" | "png" | "gif" | "svg" => FileType::Image,
      "pdf" | "doc" | "docx" | "txt" => FileType::Document,
      "mp4" | "avi" | "mov" | "wmv" => FileType::Video,
      "mp3" | "wav" | "flac" => FileType::Audio,
      _ => FileType::Other,
    }
  }

  /// The discriminant string stored in the `file_type` column.
  pub fn as_str(self) -> &'static str {
    match self {
      FileType::Image => "image",
      FileType::Document => "document",
      FileType::Video => "video",
      FileType::Audio => "audio",
      FileType::Other => "other",
    }
  }
}

// ─── Attachment ──────────────────────────────────────────────────────────────

/// File metadata attached to a note. Ownership is transitive through the
/// note; attachments are deleted when their note is.
///
/// Serialization adds a computed `file_size_display` field, hence the manual
/// [`Serialize`] impl below.
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
  pub id:            Uuid,
  pub note_id:       Uuid,
  /// Path relative to the configured attachments directory.
  pub file_ref:      String,
  pub original_name: String,
  pub file_type:     FileType,
  pub file_size:     u64,
  pub description:   String,
  pub uploaded_at:   DateTime<Utc>,
}

impl Attachment {
  /// Human-readable size, e.g. `3.4 MB`.
  pub fn file_size_display(&self) -> String {
    format_file_size(self.file_size)
  }
}

impl Serialize for Attachment {
  fn serialize<S: serde::Serializer>(
    &self,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeStruct;

    let mut s = serializer.serialize_struct("Attachment", 9)?;
    s.serialize_field("id", &self.id)?;
    s.serialize_field("note_id", &self.note_id)?;
    s.serialize_field("file_ref", &self.file_ref)?;
    s.serialize_field("original_name", &self.original_name)?;
    s.serialize_field("file_type", &self.file_type)?;
    s.serialize_field("file_size", &self.file_size)?;
    s.serialize_field("file_size_display", &self.file_size_display())?;
    s.serialize_field("description", &self.description)?;
    s.serialize_field("uploaded_at", &self.uploaded_at)?;
    s.end()
  }
}

/// Input to [`crate::store::KnowledgeStore::create_attachment`]. The file
/// bytes have already been written to `file_ref` by the caller.
#[derive(Debug, Clone)]
pub struct NewAttachment {
  pub note_id:       Uuid,
  pub file_ref:      String,
  pub original_name: String,
  pub file_size:     u64,
  pub description:   String,
}

// ─── Display helpers ─────────────────────────────────────────────────────────

/// Render a byte count with one decimal and the largest fitting unit.
pub fn format_file_size(bytes: u64) -> String {
  let mut size = bytes as f64;
  for unit in ["B", "KB", "MB", "GB"] {
    if size < 1024.0 {
      return format!("{size:.1} {unit}");
    }
    size /= 1024.0;
  }
  format!("{size:.1} TB")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn derives_kind_from_extension_case_insensitively() {
    assert_eq!(FileType::from_filename("report.PDF"), FileType::Document);
    assert_eq!(FileType::from_filename("photo.jpeg"), FileType::Image);
    assert_eq!(FileType::from_filename("talk.mp4"), FileType::Video);
    assert_eq!(FileType::from_filename("song.FLAC"), FileType::Audio);
  }

  #[test]
  fn unmapped_or_missing_extension_is_other() {
    assert_eq!(FileType::from_filename("clip.mkv"), FileType::Other);
    assert_eq!(FileType::from_filename("README"), FileType::Other);
    assert_eq!(FileType::from_filename("archive.tar.gz"), FileType::Other);
  }

  #[test]
  fn formats_sizes_with_one_decimal() {
    assert_eq!(format_file_size(512), "512.0 B");
    assert_eq!(format_file_size(2048), "2.0 KB");
    assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
  }
}
