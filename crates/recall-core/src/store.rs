//! The `KnowledgeStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `recall-store-sqlite`). The HTTP layer depends on this abstraction, not
//! on any concrete backend.
//!
//! Ownership scoping is structural: every method that touches owner-scoped
//! data takes the owner as a mandatory argument, so there is no code path
//! that can read or write across tenants by omission.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  attachment::{Attachment, NewAttachment},
  category::{Category, CategoryUpdate, CategoryWithCount, NewCategory},
  dashboard::DashboardStats,
  note::{Difficulty, NewNote, NoteDetail, NoteSummary, NoteUpdate},
  progress::LearningProgress,
  tag::{NewTag, Tag, TagWithCount},
  user::{AuthToken, NewUser, User, UserCredentials},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`KnowledgeStore::list_notes`].
///
/// All filters are conjunctive; `text` alone fans out disjunctively over
/// title, content, summary, tag names, and category name (case-insensitive
/// substring, deduplicated). Archived notes are included unless
/// `is_archived` asks otherwise.
#[derive(Debug, Clone, Default)]
pub struct NoteQuery {
  /// Free-text filter; case-insensitive substring match.
  pub text:        Option<String>,
  pub category_id: Option<Uuid>,
  pub difficulty:  Option<Difficulty>,
  pub is_favorite: Option<bool>,
  pub is_archived: Option<bool>,
  /// Notes carrying at least one of these tags (foreign ids match nothing).
  pub tag_ids:     Vec<Uuid>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Recall storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`). Backend errors
/// must convert into [`crate::Error`] so the API layer can map them to
/// status codes.
pub trait KnowledgeStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Users & tokens ────────────────────────────────────────────────────

  /// Create an account (and its zeroed learning-progress row).
  /// Fails with a duplicate-name error if the username is taken.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Look up a user plus stored password hash for login verification.
  fn find_credentials<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<UserCredentials>, Self::Error>> + Send + 'a;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Persist a minted token (stored pre-hashed).
  fn store_token(
    &self,
    token: AuthToken,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Look up a token by its SHA-256 hex digest.
  fn find_token<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<Option<AuthToken>, Self::Error>> + Send + 'a;

  // ── Categories ────────────────────────────────────────────────────────

  /// Fails with a duplicate-name error if the owner already has a category
  /// of that name (composite unique index, not an application-level scan).
  fn create_category(
    &self,
    owner: Uuid,
    input: NewCategory,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  /// All of the owner's categories, ordered by name, with non-archived
  /// note counts.
  fn list_categories(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<Vec<CategoryWithCount>, Self::Error>> + Send + '_;

  fn get_category(
    &self,
    owner: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<CategoryWithCount>, Self::Error>> + Send + '_;

  fn update_category(
    &self,
    owner: Uuid,
    id: Uuid,
    update: CategoryUpdate,
  ) -> impl Future<Output = Result<Option<Category>, Self::Error>> + Send + '_;

  /// Delete a category and, by cascade, its notes and their attachments.
  /// Returns `false` if the owner has no such category.
  fn delete_category(
    &self,
    owner: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Tags ──────────────────────────────────────────────────────────────

  fn create_tag(
    &self,
    owner: Uuid,
    input: NewTag,
  ) -> impl Future<Output = Result<Tag, Self::Error>> + Send + '_;

  fn list_tags(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<Vec<TagWithCount>, Self::Error>> + Send + '_;

  fn get_tag(
    &self,
    owner: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<TagWithCount>, Self::Error>> + Send + '_;

  fn update_tag(
    &self,
    owner: Uuid,
    id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<Option<Tag>, Self::Error>> + Send + '_;

  fn delete_tag(
    &self,
    owner: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Notes ─────────────────────────────────────────────────────────────

  /// Create a note. The category must exist and belong to `owner`
  /// (otherwise a foreign-category error); tag ids not owned by `owner`
  /// are silently dropped.
  fn create_note(
    &self,
    owner: Uuid,
    input: NewNote,
  ) -> impl Future<Output = Result<NoteDetail, Self::Error>> + Send + '_;

  fn get_note(
    &self,
    owner: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<NoteDetail>, Self::Error>> + Send + '_;

  /// Filtered, paginated listing; default order `updated_at` descending.
  fn list_notes<'a>(
    &'a self,
    owner: Uuid,
    query: &'a NoteQuery,
  ) -> impl Future<Output = Result<Vec<NoteSummary>, Self::Error>> + Send + 'a;

  /// Apply a partial update; bumps `updated_at`. Same category/tag
  /// ownership rules as [`KnowledgeStore::create_note`].
  fn update_note(
    &self,
    owner: Uuid,
    id: Uuid,
    update: NoteUpdate,
  ) -> impl Future<Output = Result<Option<NoteDetail>, Self::Error>> + Send + '_;

  /// Delete a note and, by cascade, its attachments and tag links.
  fn delete_note(
    &self,
    owner: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Set `last_reviewed_at` to `now` and return it. The caller is expected
  /// to follow up with [`KnowledgeStore::record_review`].
  fn mark_reviewed(
    &self,
    owner: Uuid,
    id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<DateTime<Utc>>, Self::Error>> + Send + '_;

  /// Flip the favorite flag; returns the new value.
  fn toggle_favorite(
    &self,
    owner: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<bool>, Self::Error>> + Send + '_;

  /// Flip the archived flag; returns the new value.
  fn toggle_archive(
    &self,
    owner: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<bool>, Self::Error>> + Send + '_;

  /// The ten most recently updated non-archived notes.
  fn recent_notes(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<Vec<NoteSummary>, Self::Error>> + Send + '_;

  /// Non-archived favorites, `updated_at` descending.
  fn favorite_notes(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<Vec<NoteSummary>, Self::Error>> + Send + '_;

  // ── Attachments ───────────────────────────────────────────────────────

  /// Record attachment metadata. Fails with not-found if the note does not
  /// exist or is not owned by `owner`; the two cases are not distinguished.
  fn create_attachment(
    &self,
    owner: Uuid,
    input: NewAttachment,
  ) -> impl Future<Output = Result<Attachment, Self::Error>> + Send + '_;

  /// All attachments on the owner's notes, `uploaded_at` descending.
  fn list_attachments(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<Vec<Attachment>, Self::Error>> + Send + '_;

  fn get_attachment(
    &self,
    owner: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Attachment>, Self::Error>> + Send + '_;

  /// Delete an attachment record, returning it so the caller can remove
  /// the underlying file.
  fn delete_attachment(
    &self,
    owner: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Attachment>, Self::Error>> + Send + '_;

  // ── Progress & dashboard ──────────────────────────────────────────────

  /// Get-or-create the owner's progress row (race-tolerant), with
  /// `total_notes` refreshed to the live count before return.
  fn progress_snapshot(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<LearningProgress, Self::Error>> + Send + '_;

  /// Apply the daily streak algorithm for one review on `today` and
  /// persist the result.
  fn record_review(
    &self,
    owner: Uuid,
    today: NaiveDate,
  ) -> impl Future<Output = Result<LearningProgress, Self::Error>> + Send + '_;

  /// Compute the dashboard aggregation snapshot in one pass.
  fn dashboard_stats(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<DashboardStats, Self::Error>> + Send + '_;
}
