//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Days, Duration, Utc};
use recall_core::{
  attachment::{FileType, NewAttachment},
  category::{CategoryUpdate, NewCategory},
  note::{Difficulty, NewNote, NoteUpdate},
  store::{KnowledgeStore, NoteQuery},
  tag::NewTag,
  user::{AuthToken, NewUser, TokenKind, User},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, username: &str) -> User {
  s.create_user(NewUser {
    username:      username.into(),
    email:         format!("{username}@example.com"),
    first_name:    "Test".into(),
    last_name:     "User".into(),
    password_hash: "$argon2id$fake".into(),
  })
  .await
  .expect("create user")
}

async fn category(s: &SqliteStore, owner: Uuid, name: &str) -> Uuid {
  s.create_category(
    owner,
    NewCategory {
      name:        name.into(),
      description: String::new(),
      color:       "#3B82F6".into(),
    },
  )
  .await
  .expect("create category")
  .id
}

fn new_note(category_id: Uuid, title: &str) -> NewNote {
  NewNote {
    title:       title.into(),
    content:     "content".into(),
    summary:     String::new(),
    category_id,
    tag_ids:     vec![],
    difficulty:  Difficulty::Beginner,
    is_favorite: false,
    source_url:  None,
  }
}

// ─── Users & uniqueness ──────────────────────────────────────────────────────

#[tokio::test]
async fn create_user_provisions_progress_row() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let progress = s.progress_snapshot(alice.id).await.unwrap();
  assert_eq!(progress.owner_id, alice.id);
  assert_eq!(progress.total_notes, 0);
  assert_eq!(progress.current_streak, 0);
  assert!(progress.last_activity_date.is_none());
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
  let s = store().await;
  user(&s, "alice").await;

  let err = s
    .create_user(NewUser {
      username:      "alice".into(),
      email:         "other@example.com".into(),
      first_name:    String::new(),
      last_name:     String::new(),
      password_hash: "$argon2id$fake".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateName { entity: "user", .. }));
}

#[tokio::test]
async fn storing_a_token_sweeps_expired_rows() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let now = Utc::now();

  s.store_token(AuthToken {
    token_hash: "stale".into(),
    user_id:    alice.id,
    kind:       TokenKind::Access,
    expires_at: now - Duration::hours(2),
  })
  .await
  .unwrap();
  s.store_token(AuthToken {
    token_hash: "live".into(),
    user_id:    alice.id,
    kind:       TokenKind::Access,
    expires_at: now + Duration::hours(1),
  })
  .await
  .unwrap();

  assert!(s.find_token("stale").await.unwrap().is_none());
  assert!(s.find_token("live").await.unwrap().is_some());
}

// ─── Categories ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_category_name_per_owner_is_a_conflict() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  category(&s, alice.id, "Rust").await;

  let err = s
    .create_category(
      alice.id,
      NewCategory {
        name:        "Rust".into(),
        description: String::new(),
        color:       "#000000".into(),
      },
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateName { entity: "category", .. }));
}

#[tokio::test]
async fn same_category_name_under_different_owners_is_fine() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  category(&s, alice.id, "Rust").await;
  category(&s, bob.id, "Rust").await;

  assert_eq!(s.list_categories(alice.id).await.unwrap().len(), 1);
  assert_eq!(s.list_categories(bob.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn category_listing_counts_only_non_archived_notes() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let cat = category(&s, alice.id, "Rust").await;

  let kept = s.create_note(alice.id, new_note(cat, "kept")).await.unwrap();
  let archived = s
    .create_note(alice.id, new_note(cat, "archived"))
    .await
    .unwrap();
  s.toggle_archive(alice.id, archived.note.id).await.unwrap();
  let _ = kept;

  let listed = s.list_categories(alice.id).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].note_count, 1);
}

#[tokio::test]
async fn update_category_is_owner_scoped() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let cat = category(&s, alice.id, "Rust").await;

  let update = CategoryUpdate { name: Some("Python".into()), ..Default::default() };
  let stolen = s.update_category(bob.id, cat, update.clone()).await.unwrap();
  assert!(stolen.is_none());

  let renamed = s
    .update_category(alice.id, cat, update)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(renamed.name, "Python");
}

// ─── Note ownership & tags ───────────────────────────────────────────────────

#[tokio::test]
async fn foreign_category_on_note_create_is_rejected() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let bobs_cat = category(&s, bob.id, "Secrets").await;

  let err = s
    .create_note(alice.id, new_note(bobs_cat, "sneaky"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ForeignCategory(id) if id == bobs_cat));
}

#[tokio::test]
async fn updating_a_missing_note_is_not_found_before_category_checks() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let bobs_cat = category(&s, bob.id, "Secrets").await;

  // The note id doesn't exist for Alice, so the answer is "not found" even
  // though the payload also names a category she doesn't own.
  let update = NoteUpdate { category_id: Some(bobs_cat), ..Default::default() };
  assert!(s
    .update_note(alice.id, Uuid::new_v4(), update)
    .await
    .unwrap()
    .is_none());
}

#[tokio::test]
async fn foreign_tags_are_silently_dropped_on_assignment() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let cat = category(&s, alice.id, "Rust").await;

  let owned = s
    .create_tag(alice.id, NewTag { name: "async".into() })
    .await
    .unwrap();
  let foreign = s
    .create_tag(bob.id, NewTag { name: "private".into() })
    .await
    .unwrap();

  let mut input = new_note(cat, "ownership");
  input.tag_ids = vec![owned.id, foreign.id, Uuid::new_v4()];
  let detail = s.create_note(alice.id, input).await.unwrap();

  let tag_ids: Vec<Uuid> = detail.tags.iter().map(|t| t.id).collect();
  assert_eq!(tag_ids, vec![owned.id]);
}

#[tokio::test]
async fn update_replaces_the_whole_tag_set() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let cat = category(&s, alice.id, "Rust").await;
  let t1 = s.create_tag(alice.id, NewTag { name: "a".into() }).await.unwrap();
  let t2 = s.create_tag(alice.id, NewTag { name: "b".into() }).await.unwrap();

  let mut input = new_note(cat, "tagged");
  input.tag_ids = vec![t1.id];
  let note = s.create_note(alice.id, input).await.unwrap().note;

  let update = NoteUpdate { tag_ids: Some(vec![t2.id]), ..Default::default() };
  let detail = s
    .update_note(alice.id, note.id, update)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(detail.tags.len(), 1);
  assert_eq!(detail.tags[0].id, t2.id);
}

#[tokio::test]
async fn notes_are_invisible_across_owners() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let cat = category(&s, alice.id, "Rust").await;
  let note = s.create_note(alice.id, new_note(cat, "mine")).await.unwrap().note;

  assert!(s.get_note(bob.id, note.id).await.unwrap().is_none());
  assert!(!s.delete_note(bob.id, note.id).await.unwrap());
  assert!(s.toggle_favorite(bob.id, note.id).await.unwrap().is_none());
  assert!(s.list_notes(bob.id, &NoteQuery::default()).await.unwrap().is_empty());

  // Still there for its owner.
  assert!(s.get_note(alice.id, note.id).await.unwrap().is_some());
}

// ─── Listing, search, and the archive asymmetry ──────────────────────────────

#[tokio::test]
async fn list_notes_filters_by_difficulty_and_favorite() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let cat = category(&s, alice.id, "Rust").await;

  let mut advanced = new_note(cat, "hard");
  advanced.difficulty = Difficulty::Advanced;
  advanced.is_favorite = true;
  s.create_note(alice.id, advanced).await.unwrap();
  s.create_note(alice.id, new_note(cat, "easy")).await.unwrap();

  let query = NoteQuery {
    difficulty: Some(Difficulty::Advanced),
    ..Default::default()
  };
  let found = s.list_notes(alice.id, &query).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].title, "hard");

  let query = NoteQuery { is_favorite: Some(true), ..Default::default() };
  let found = s.list_notes(alice.id, &query).await.unwrap();
  assert_eq!(found.len(), 1);
  assert!(found[0].is_favorite);
}

#[tokio::test]
async fn tag_id_filter_matches_owned_tags_only() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let cat = category(&s, alice.id, "Rust").await;
  let tag = s
    .create_tag(alice.id, NewTag { name: "async".into() })
    .await
    .unwrap();

  let mut tagged = new_note(cat, "tagged");
  tagged.tag_ids = vec![tag.id];
  s.create_note(alice.id, tagged).await.unwrap();
  s.create_note(alice.id, new_note(cat, "plain")).await.unwrap();

  let query = NoteQuery { tag_ids: vec![tag.id], ..Default::default() };
  let found = s.list_notes(alice.id, &query).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].title, "tagged");

  // Bob's tag id — even one attached to one of Bob's notes — matches nothing.
  let bobs_cat = category(&s, bob.id, "Secrets").await;
  let bobs_tag = s
    .create_tag(bob.id, NewTag { name: "private".into() })
    .await
    .unwrap();
  let mut bobs_note = new_note(bobs_cat, "bobs");
  bobs_note.tag_ids = vec![bobs_tag.id];
  s.create_note(bob.id, bobs_note).await.unwrap();

  let query = NoteQuery { tag_ids: vec![bobs_tag.id], ..Default::default() };
  assert!(s.list_notes(alice.id, &query).await.unwrap().is_empty());
}

#[tokio::test]
async fn search_spans_title_content_summary_tag_and_category_names() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let python_cat = category(&s, alice.id, "Python").await;
  let other_cat = category(&s, alice.id, "Cooking").await;
  let tag = s
    .create_tag(alice.id, NewTag { name: "python-tips".into() })
    .await
    .unwrap();

  // Matches via category name AND tag name — must appear exactly once.
  let mut both = new_note(python_cat, "decorators");
  both.tag_ids = vec![tag.id];
  s.create_note(alice.id, both).await.unwrap();

  // Matches via title, case-insensitively.
  s.create_note(alice.id, new_note(other_cat, "Python for chefs"))
    .await
    .unwrap();

  // No match.
  s.create_note(alice.id, new_note(other_cat, "sourdough"))
    .await
    .unwrap();

  let query = NoteQuery { text: Some("PYTHON".into()), ..Default::default() };
  let found = s.list_notes(alice.id, &query).await.unwrap();
  assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn search_includes_archived_but_recent_and_favorites_do_not() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let cat = category(&s, alice.id, "Rust").await;

  let mut fav = new_note(cat, "archived borrow checker");
  fav.is_favorite = true;
  let note = s.create_note(alice.id, fav).await.unwrap().note;
  s.toggle_archive(alice.id, note.id).await.unwrap();

  let query = NoteQuery { text: Some("borrow".into()), ..Default::default() };
  assert_eq!(s.list_notes(alice.id, &query).await.unwrap().len(), 1);

  assert!(s.recent_notes(alice.id).await.unwrap().is_empty());
  assert!(s.favorite_notes(alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn recent_notes_caps_at_ten() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let cat = category(&s, alice.id, "Rust").await;

  for i in 0..12 {
    s.create_note(alice.id, new_note(cat, &format!("note {i}")))
      .await
      .unwrap();
  }

  assert_eq!(s.recent_notes(alice.id).await.unwrap().len(), 10);
}

// ─── Toggles & review ────────────────────────────────────────────────────────

#[tokio::test]
async fn toggles_flip_and_report_the_new_value() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let cat = category(&s, alice.id, "Rust").await;
  let note = s.create_note(alice.id, new_note(cat, "n")).await.unwrap().note;

  assert_eq!(s.toggle_favorite(alice.id, note.id).await.unwrap(), Some(true));
  assert_eq!(s.toggle_favorite(alice.id, note.id).await.unwrap(), Some(false));
  assert_eq!(s.toggle_archive(alice.id, note.id).await.unwrap(), Some(true));
}

#[tokio::test]
async fn mark_reviewed_sets_timestamp_and_streak_advances() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let cat = category(&s, alice.id, "Rust").await;
  let note = s.create_note(alice.id, new_note(cat, "n")).await.unwrap().note;

  let now = Utc::now();
  let reviewed = s.mark_reviewed(alice.id, note.id, now).await.unwrap();
  assert_eq!(reviewed, Some(now));

  let progress = s.record_review(alice.id, now.date_naive()).await.unwrap();
  assert_eq!(progress.current_streak, 1);
  assert_eq!(progress.longest_streak, 1);
  assert_eq!(progress.notes_reviewed_today, 1);
  assert_eq!(progress.last_activity_date, Some(now.date_naive()));

  // Second review the same day only bumps the daily counter.
  let progress = s.record_review(alice.id, now.date_naive()).await.unwrap();
  assert_eq!(progress.current_streak, 1);
  assert_eq!(progress.notes_reviewed_today, 2);

  // Next-day review extends the streak; persisted across reads.
  let tomorrow = now.date_naive().checked_add_days(Days::new(1)).unwrap();
  let progress = s.record_review(alice.id, tomorrow).await.unwrap();
  assert_eq!(progress.current_streak, 2);
  assert_eq!(progress.notes_reviewed_today, 1);
}

// ─── Attachments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn attachment_on_foreign_note_reads_as_not_found() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let cat = category(&s, bob.id, "Secrets").await;
  let note = s.create_note(bob.id, new_note(cat, "bobs")).await.unwrap().note;

  let err = s
    .create_attachment(
      alice.id,
      NewAttachment {
        note_id:       note.id,
        file_ref:      "x".into(),
        original_name: "x.pdf".into(),
        file_size:     1,
        description:   String::new(),
      },
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound { entity: "note" }));
}

#[tokio::test]
async fn attachment_kind_derives_from_the_original_filename() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let cat = category(&s, alice.id, "Rust").await;
  let note = s.create_note(alice.id, new_note(cat, "n")).await.unwrap().note;

  let pdf = s
    .create_attachment(
      alice.id,
      NewAttachment {
        note_id:       note.id,
        file_ref:      "a".into(),
        original_name: "report.PDF".into(),
        file_size:     2048,
        description:   String::new(),
      },
    )
    .await
    .unwrap();
  assert_eq!(pdf.file_type, FileType::Document);
  assert_eq!(pdf.file_size_display(), "2.0 KB");

  let mkv = s
    .create_attachment(
      alice.id,
      NewAttachment {
        note_id:       note.id,
        file_ref:      "b".into(),
        original_name: "clip.mkv".into(),
        file_size:     1,
        description:   String::new(),
      },
    )
    .await
    .unwrap();
  assert_eq!(mkv.file_type, FileType::Other);
}

// ─── Cascades ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn deleting_a_category_cascades_to_notes_and_attachments() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let cat = category(&s, alice.id, "Rust").await;
  let note = s.create_note(alice.id, new_note(cat, "n")).await.unwrap().note;
  s.create_attachment(
    alice.id,
    NewAttachment {
      note_id:       note.id,
      file_ref:      "f".into(),
      original_name: "f.txt".into(),
      file_size:     1,
      description:   String::new(),
    },
  )
  .await
  .unwrap();

  assert!(s.delete_category(alice.id, cat).await.unwrap());

  assert!(s.get_note(alice.id, note.id).await.unwrap().is_none());
  assert!(s.list_attachments(alice.id).await.unwrap().is_empty());
}

// ─── Progress & dashboard ────────────────────────────────────────────────────

#[tokio::test]
async fn progress_snapshot_refreshes_total_notes() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let cat = category(&s, alice.id, "Rust").await;

  s.create_note(alice.id, new_note(cat, "one")).await.unwrap();
  s.create_note(alice.id, new_note(cat, "two")).await.unwrap();

  let progress = s.progress_snapshot(alice.id).await.unwrap();
  assert_eq!(progress.total_notes, 2);
}

#[tokio::test]
async fn dashboard_counts_are_owner_scoped() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let rust = category(&s, alice.id, "Rust").await;
  let python = category(&s, alice.id, "Python").await;
  s.create_tag(alice.id, NewTag { name: "t".into() }).await.unwrap();

  let mut fav = new_note(rust, "fav");
  fav.is_favorite = true;
  fav.difficulty = Difficulty::Advanced;
  s.create_note(alice.id, fav).await.unwrap();
  s.create_note(alice.id, new_note(python, "plain")).await.unwrap();

  // Bob's data must not leak into Alice's numbers.
  let bobs = category(&s, bob.id, "Bobs").await;
  s.create_note(bob.id, new_note(bobs, "noise")).await.unwrap();

  let stats = s.dashboard_stats(alice.id).await.unwrap();
  assert_eq!(stats.total_notes, 2);
  assert_eq!(stats.total_categories, 2);
  assert_eq!(stats.total_tags, 1);
  assert_eq!(stats.favorite_notes, 1);
  assert_eq!(stats.recent_notes, 2);
  assert_eq!(stats.learning_progress.total_notes, 2);

  let advanced = stats
    .difficulty_distribution
    .iter()
    .find(|d| d.difficulty == Difficulty::Advanced)
    .expect("advanced bucket");
  assert_eq!(advanced.count, 1);

  assert_eq!(stats.category_distribution.len(), 2);
  let rust_bucket = stats
    .category_distribution
    .iter()
    .find(|c| c.category_id == rust)
    .expect("rust bucket");
  assert_eq!(rust_bucket.count, 1);
}
