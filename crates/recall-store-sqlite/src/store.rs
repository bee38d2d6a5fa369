//! [`SqliteStore`] — the SQLite implementation of [`KnowledgeStore`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{OptionalExtension as _, params, params_from_iter, types::Value};
use uuid::Uuid;

use recall_core::{
  attachment::{Attachment, FileType, NewAttachment},
  category::{Category, CategoryUpdate, CategoryWithCount, NewCategory},
  dashboard::{CategoryCount, DashboardStats, DifficultyCount},
  note::{NewNote, NoteDetail, NoteSummary, NoteUpdate},
  progress::LearningProgress,
  store::{KnowledgeStore, NoteQuery},
  tag::{NewTag, Tag, TagWithCount},
  user::{AuthToken, NewUser, User, UserCredentials},
};

use crate::{
  Error, Result,
  encode::{
    RawAttachment, RawCategory, RawNote, RawNoteSummary, RawProgress, RawTag,
    RawToken, RawUser, decode_difficulty, decode_uuid, encode_date, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Recall knowledge store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Whether `category` exists and belongs to `owner`.
  async fn category_owned(&self, owner: Uuid, category: Uuid) -> Result<bool> {
    let owner_str = encode_uuid(owner);
    let cat_str = encode_uuid(category);

    let owned: bool = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM categories WHERE id = ?1 AND owner_id = ?2",
              params![cat_str, owner_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    Ok(owned)
  }

  /// Whether `note` exists and belongs to `owner`.
  async fn note_owned(&self, owner: Uuid, note: Uuid) -> Result<bool> {
    let owner_str = encode_uuid(owner);
    let note_str = encode_uuid(note);

    let owned: bool = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM notes WHERE id = ?1 AND owner_id = ?2",
              params![note_str, owner_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    Ok(owned)
  }

  /// Get-or-create the progress row for `owner` (insert-or-ignore, so a
  /// concurrent first access cannot produce duplicates).
  async fn get_or_create_progress(
    &self,
    owner: Uuid,
  ) -> Result<LearningProgress> {
    let owner_str = encode_uuid(owner);
    let now_str = encode_dt(Utc::now());

    let raw: RawProgress = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO learning_progress (owner_id, created_at, updated_at)
           VALUES (?1, ?2, ?2)",
          params![owner_str, now_str],
        )?;
        Ok(conn.query_row(
          "SELECT owner_id, total_notes, notes_reviewed_today, current_streak,
                  longest_streak, last_activity_date, created_at, updated_at
           FROM learning_progress WHERE owner_id = ?1",
          params![owner_str],
          |row| {
            Ok(RawProgress {
              owner_id:             row.get(0)?,
              total_notes:          row.get(1)?,
              notes_reviewed_today: row.get(2)?,
              current_streak:       row.get(3)?,
              longest_streak:       row.get(4)?,
              last_activity_date:   row.get(5)?,
              created_at:           row.get(6)?,
              updated_at:           row.get(7)?,
            })
          },
        )?)
      })
      .await?;

    raw.into_progress()
  }

  async fn persist_progress(&self, progress: &LearningProgress) -> Result<()> {
    let owner_str = encode_uuid(progress.owner_id);
    let last_str = progress.last_activity_date.map(encode_date);
    let updated_str = encode_dt(progress.updated_at);
    let (total, today, current, longest) = (
      progress.total_notes,
      progress.notes_reviewed_today,
      progress.current_streak,
      progress.longest_streak,
    );

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE learning_progress
           SET total_notes = ?2, notes_reviewed_today = ?3, current_streak = ?4,
               longest_streak = ?5, last_activity_date = ?6, updated_at = ?7
           WHERE owner_id = ?1",
          params![owner_str, total, today, current, longest, last_str, updated_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Closure-side helpers ───────────────────────────────────────────────────

/// Map a constraint violation from an insert/update into a per-owner
/// duplicate-name error; pass everything else through.
fn map_unique(
  err: tokio_rusqlite::Error,
  entity: &'static str,
  name: &str,
) -> Error {
  if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _)) =
    &err
    && e.code == rusqlite::ErrorCode::ConstraintViolation
  {
    return Error::DuplicateName { entity, name: name.to_owned() };
  }
  Error::Database(err)
}

/// Read the full-detail shape for one note, scoped to `owner_str`.
/// Runs inside a `conn.call` closure.
fn read_note_detail(
  conn: &rusqlite::Connection,
  owner_str: &str,
  id_str: &str,
) -> rusqlite::Result<Option<(RawNote, String, Vec<RawTag>, Vec<RawAttachment>)>>
{
  let head: Option<(RawNote, String)> = conn
    .query_row(
      "SELECT n.id, n.owner_id, n.category_id, n.title, n.content, n.summary,
              n.difficulty, n.is_favorite, n.is_archived, n.source_url,
              n.created_at, n.updated_at, n.last_reviewed_at, c.name
       FROM notes n
       JOIN categories c ON c.id = n.category_id
       WHERE n.id = ?1 AND n.owner_id = ?2",
      params![id_str, owner_str],
      |row| {
        Ok((
          RawNote {
            id:               row.get(0)?,
            owner_id:         row.get(1)?,
            category_id:      row.get(2)?,
            title:            row.get(3)?,
            content:          row.get(4)?,
            summary:          row.get(5)?,
            difficulty:       row.get(6)?,
            is_favorite:      row.get(7)?,
            is_archived:      row.get(8)?,
            source_url:       row.get(9)?,
            created_at:       row.get(10)?,
            updated_at:       row.get(11)?,
            last_reviewed_at: row.get(12)?,
          },
          row.get(13)?,
        ))
      },
    )
    .optional()?;

  let Some((raw_note, category_name)) = head else {
    return Ok(None);
  };

  let mut stmt = conn.prepare(
    "SELECT t.id, t.owner_id, t.name, t.created_at
     FROM tags t
     JOIN note_tags nt ON nt.tag_id = t.id
     WHERE nt.note_id = ?1
     ORDER BY t.name",
  )?;
  let tags = stmt
    .query_map(params![id_str], |row| {
      Ok(RawTag {
        id:         row.get(0)?,
        owner_id:   row.get(1)?,
        name:       row.get(2)?,
        created_at: row.get(3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut stmt = conn.prepare(
    "SELECT id, note_id, file_ref, original_name, file_type, file_size,
            description, uploaded_at
     FROM attachments WHERE note_id = ?1
     ORDER BY uploaded_at DESC",
  )?;
  let attachments = stmt
    .query_map(params![id_str], |row| {
      Ok(RawAttachment {
        id:            row.get(0)?,
        note_id:       row.get(1)?,
        file_ref:      row.get(2)?,
        original_name: row.get(3)?,
        file_type:     row.get(4)?,
        file_size:     row.get(5)?,
        description:   row.get(6)?,
        uploaded_at:   row.get(7)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Some((raw_note, category_name, tags, attachments)))
}

fn detail_from_raw(
  raw: (RawNote, String, Vec<RawTag>, Vec<RawAttachment>),
) -> Result<NoteDetail> {
  let (raw_note, category_name, raw_tags, raw_attachments) = raw;
  Ok(NoteDetail {
    note:          raw_note.into_note()?,
    category_name,
    tags:          raw_tags
      .into_iter()
      .map(RawTag::into_tag)
      .collect::<Result<_>>()?,
    attachments:   raw_attachments
      .into_iter()
      .map(RawAttachment::into_attachment)
      .collect::<Result<_>>()?,
  })
}

/// Link filtered `tag_ids` to a note: the ownership predicate in the
/// `INSERT … SELECT` silently drops tags that are not the owner's.
fn link_owned_tags(
  conn: &rusqlite::Connection,
  note_str: &str,
  owner_str: &str,
  tag_id_strs: &[String],
) -> rusqlite::Result<()> {
  for tag_str in tag_id_strs {
    conn.execute(
      "INSERT OR IGNORE INTO note_tags (note_id, tag_id)
       SELECT ?1, id FROM tags WHERE id = ?2 AND owner_id = ?3",
      params![note_str, tag_str, owner_str],
    )?;
  }
  Ok(())
}

// ─── KnowledgeStore impl ─────────────────────────────────────────────────────

impl KnowledgeStore for SqliteStore {
  type Error = Error;

  // ── Users & tokens ────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      id:          Uuid::new_v4(),
      username:    input.username,
      email:       input.email,
      first_name:  input.first_name,
      last_name:   input.last_name,
      date_joined: Utc::now(),
    };

    let id_str = encode_uuid(user.id);
    let joined_str = encode_dt(user.date_joined);
    let username = user.username.clone();
    let email = user.email.clone();
    let first = user.first_name.clone();
    let last = user.last_name.clone();
    let hash = input.password_hash;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO users (id, username, email, first_name, last_name,
                              password_hash, date_joined)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          params![id_str, username, email, first, last, hash, joined_str],
        )?;
        // Registration provisions the progress row eagerly.
        tx.execute(
          "INSERT INTO learning_progress (owner_id, created_at, updated_at)
           VALUES (?1, ?2, ?2)",
          params![id_str, joined_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(|e| map_unique(e, "user", &user.username))?;

    Ok(user)
  }

  async fn find_credentials(
    &self,
    username: &str,
  ) -> Result<Option<UserCredentials>> {
    let username = username.to_owned();

    let raw: Option<(RawUser, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, username, email, first_name, last_name, date_joined,
                      password_hash
               FROM users WHERE username = ?1",
              params![username],
              |row| {
                Ok((
                  RawUser {
                    id:          row.get(0)?,
                    username:    row.get(1)?,
                    email:       row.get(2)?,
                    first_name:  row.get(3)?,
                    last_name:   row.get(4)?,
                    date_joined: row.get(5)?,
                  },
                  row.get(6)?,
                ))
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(raw_user, password_hash)| {
        Ok(UserCredentials { user: raw_user.into_user()?, password_hash })
      })
      .transpose()
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, username, email, first_name, last_name, date_joined
               FROM users WHERE id = ?1",
              params![id_str],
              |row| {
                Ok(RawUser {
                  id:          row.get(0)?,
                  username:    row.get(1)?,
                  email:       row.get(2)?,
                  first_name:  row.get(3)?,
                  last_name:   row.get(4)?,
                  date_joined: row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn store_token(&self, token: AuthToken) -> Result<()> {
    let hash = token.token_hash;
    let user_str = encode_uuid(token.user_id);
    let kind = token.kind.as_str();
    let expires_str = encode_dt(token.expires_at);
    let now_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        // Every insert sweeps out expired rows, so the table stays bounded by
        // the number of live sessions. RFC 3339 strings order correctly.
        conn.execute(
          "DELETE FROM auth_tokens WHERE expires_at <= ?1",
          params![now_str],
        )?;
        conn.execute(
          "INSERT OR REPLACE INTO auth_tokens (token_hash, user_id, kind, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![hash, user_str, kind, expires_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_token(&self, token_hash: &str) -> Result<Option<AuthToken>> {
    let hash = token_hash.to_owned();

    let raw: Option<RawToken> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT token_hash, user_id, kind, expires_at
               FROM auth_tokens WHERE token_hash = ?1",
              params![hash],
              |row| {
                Ok(RawToken {
                  token_hash: row.get(0)?,
                  user_id:    row.get(1)?,
                  kind:       row.get(2)?,
                  expires_at: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawToken::into_token).transpose()
  }

  // ── Categories ────────────────────────────────────────────────────────────

  async fn create_category(
    &self,
    owner: Uuid,
    input: NewCategory,
  ) -> Result<Category> {
    let now = Utc::now();
    let category = Category {
      id: Uuid::new_v4(),
      owner_id: owner,
      name: input.name,
      description: input.description,
      color: input.color,
      created_at: now,
      updated_at: now,
    };

    let id_str = encode_uuid(category.id);
    let owner_str = encode_uuid(owner);
    let now_str = encode_dt(now);
    let name = category.name.clone();
    let description = category.description.clone();
    let color = category.color.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO categories (id, owner_id, name, description, color,
                                   created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          params![id_str, owner_str, name, description, color, now_str],
        )?;
        Ok(())
      })
      .await
      .map_err(|e| map_unique(e, "category", &category.name))?;

    Ok(category)
  }

  async fn list_categories(&self, owner: Uuid) -> Result<Vec<CategoryWithCount>> {
    let owner_str = encode_uuid(owner);

    let raws: Vec<(RawCategory, u32)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT c.id, c.owner_id, c.name, c.description, c.color,
                  c.created_at, c.updated_at,
                  (SELECT COUNT(*) FROM notes n
                   WHERE n.category_id = c.id AND n.is_archived = 0)
           FROM categories c
           WHERE c.owner_id = ?1
           ORDER BY c.name",
        )?;
        let rows = stmt
          .query_map(params![owner_str], |row| {
            Ok((
              RawCategory {
                id:          row.get(0)?,
                owner_id:    row.get(1)?,
                name:        row.get(2)?,
                description: row.get(3)?,
                color:       row.get(4)?,
                created_at:  row.get(5)?,
                updated_at:  row.get(6)?,
              },
              row.get(7)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(raw, note_count)| {
        Ok(CategoryWithCount { category: raw.into_category()?, note_count })
      })
      .collect()
  }

  async fn get_category(
    &self,
    owner: Uuid,
    id: Uuid,
  ) -> Result<Option<CategoryWithCount>> {
    let owner_str = encode_uuid(owner);
    let id_str = encode_uuid(id);

    let raw: Option<(RawCategory, u32)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT c.id, c.owner_id, c.name, c.description, c.color,
                      c.created_at, c.updated_at,
                      (SELECT COUNT(*) FROM notes n
                       WHERE n.category_id = c.id AND n.is_archived = 0)
               FROM categories c
               WHERE c.id = ?1 AND c.owner_id = ?2",
              params![id_str, owner_str],
              |row| {
                Ok((
                  RawCategory {
                    id:          row.get(0)?,
                    owner_id:    row.get(1)?,
                    name:        row.get(2)?,
                    description: row.get(3)?,
                    color:       row.get(4)?,
                    created_at:  row.get(5)?,
                    updated_at:  row.get(6)?,
                  },
                  row.get(7)?,
                ))
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(raw, note_count)| {
        Ok(CategoryWithCount { category: raw.into_category()?, note_count })
      })
      .transpose()
  }

  async fn update_category(
    &self,
    owner: Uuid,
    id: Uuid,
    update: CategoryUpdate,
  ) -> Result<Option<Category>> {
    let owner_str = encode_uuid(owner);
    let id_str = encode_uuid(id);
    let now_str = encode_dt(Utc::now());
    let conflict_name = update.name.clone().unwrap_or_default();

    let raw: Option<RawCategory> = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE categories
           SET name        = COALESCE(?3, name),
               description = COALESCE(?4, description),
               color       = COALESCE(?5, color),
               updated_at  = ?6
           WHERE id = ?1 AND owner_id = ?2",
          params![
            id_str,
            owner_str,
            update.name,
            update.description,
            update.color,
            now_str
          ],
        )?;
        if n == 0 {
          return Ok(None);
        }
        Ok(
          conn
            .query_row(
              "SELECT id, owner_id, name, description, color, created_at, updated_at
               FROM categories WHERE id = ?1",
              params![id_str],
              |row| {
                Ok(RawCategory {
                  id:          row.get(0)?,
                  owner_id:    row.get(1)?,
                  name:        row.get(2)?,
                  description: row.get(3)?,
                  color:       row.get(4)?,
                  created_at:  row.get(5)?,
                  updated_at:  row.get(6)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(|e| map_unique(e, "category", &conflict_name))?;

    raw.map(RawCategory::into_category).transpose()
  }

  async fn delete_category(&self, owner: Uuid, id: Uuid) -> Result<bool> {
    let owner_str = encode_uuid(owner);
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM categories WHERE id = ?1 AND owner_id = ?2",
          params![id_str, owner_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  // ── Tags ──────────────────────────────────────────────────────────────────

  async fn create_tag(&self, owner: Uuid, input: NewTag) -> Result<Tag> {
    let tag = Tag {
      id:         Uuid::new_v4(),
      owner_id:   owner,
      name:       input.name,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(tag.id);
    let owner_str = encode_uuid(owner);
    let at_str = encode_dt(tag.created_at);
    let name = tag.name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tags (id, owner_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
          params![id_str, owner_str, name, at_str],
        )?;
        Ok(())
      })
      .await
      .map_err(|e| map_unique(e, "tag", &tag.name))?;

    Ok(tag)
  }

  async fn list_tags(&self, owner: Uuid) -> Result<Vec<TagWithCount>> {
    let owner_str = encode_uuid(owner);

    let raws: Vec<(RawTag, u32)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT t.id, t.owner_id, t.name, t.created_at,
                  (SELECT COUNT(*) FROM note_tags nt
                   JOIN notes n ON n.id = nt.note_id
                   WHERE nt.tag_id = t.id AND n.is_archived = 0)
           FROM tags t
           WHERE t.owner_id = ?1
           ORDER BY t.name",
        )?;
        let rows = stmt
          .query_map(params![owner_str], |row| {
            Ok((
              RawTag {
                id:         row.get(0)?,
                owner_id:   row.get(1)?,
                name:       row.get(2)?,
                created_at: row.get(3)?,
              },
              row.get(4)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(raw, note_count)| Ok(TagWithCount { tag: raw.into_tag()?, note_count }))
      .collect()
  }

  async fn get_tag(&self, owner: Uuid, id: Uuid) -> Result<Option<TagWithCount>> {
    let owner_str = encode_uuid(owner);
    let id_str = encode_uuid(id);

    let raw: Option<(RawTag, u32)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT t.id, t.owner_id, t.name, t.created_at,
                      (SELECT COUNT(*) FROM note_tags nt
                       JOIN notes n ON n.id = nt.note_id
                       WHERE nt.tag_id = t.id AND n.is_archived = 0)
               FROM tags t
               WHERE t.id = ?1 AND t.owner_id = ?2",
              params![id_str, owner_str],
              |row| {
                Ok((
                  RawTag {
                    id:         row.get(0)?,
                    owner_id:   row.get(1)?,
                    name:       row.get(2)?,
                    created_at: row.get(3)?,
                  },
                  row.get(4)?,
                ))
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(raw, note_count)| Ok(TagWithCount { tag: raw.into_tag()?, note_count }))
      .transpose()
  }

  async fn update_tag(
    &self,
    owner: Uuid,
    id: Uuid,
    name: String,
  ) -> Result<Option<Tag>> {
    let owner_str = encode_uuid(owner);
    let id_str = encode_uuid(id);
    let conflict_name = name.clone();

    let raw: Option<RawTag> = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE tags SET name = ?3 WHERE id = ?1 AND owner_id = ?2",
          params![id_str, owner_str, name],
        )?;
        if n == 0 {
          return Ok(None);
        }
        Ok(
          conn
            .query_row(
              "SELECT id, owner_id, name, created_at FROM tags WHERE id = ?1",
              params![id_str],
              |row| {
                Ok(RawTag {
                  id:         row.get(0)?,
                  owner_id:   row.get(1)?,
                  name:       row.get(2)?,
                  created_at: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(|e| map_unique(e, "tag", &conflict_name))?;

    raw.map(RawTag::into_tag).transpose()
  }

  async fn delete_tag(&self, owner: Uuid, id: Uuid) -> Result<bool> {
    let owner_str = encode_uuid(owner);
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM tags WHERE id = ?1 AND owner_id = ?2",
          params![id_str, owner_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  // ── Notes ─────────────────────────────────────────────────────────────────

  async fn create_note(&self, owner: Uuid, input: NewNote) -> Result<NoteDetail> {
    // Foreign or missing categories are rejected; the two cases are not
    // distinguished to avoid leaking other users' category ids.
    if !self.category_owned(owner, input.category_id).await? {
      return Err(Error::ForeignCategory(input.category_id));
    }

    let note_id = Uuid::new_v4();
    let now = Utc::now();

    let id_str = encode_uuid(note_id);
    let owner_str = encode_uuid(owner);
    let cat_str = encode_uuid(input.category_id);
    let now_str = encode_dt(now);
    let difficulty = input.difficulty.as_str();
    let tag_id_strs: Vec<String> =
      input.tag_ids.iter().copied().map(encode_uuid).collect();
    let (title, content, summary) = (input.title, input.content, input.summary);
    let (is_favorite, source_url) = (input.is_favorite, input.source_url);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO notes (id, owner_id, category_id, title, content, summary,
                              difficulty, is_favorite, is_archived, source_url,
                              created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?10, ?10)",
          params![
            id_str, owner_str, cat_str, title, content, summary, difficulty,
            is_favorite, source_url, now_str
          ],
        )?;
        link_owned_tags(&tx, &id_str, &owner_str, &tag_id_strs)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    match self.get_note(owner, note_id).await? {
      Some(detail) => Ok(detail),
      None => Err(Error::NotFound { entity: "note" }),
    }
  }

  async fn get_note(&self, owner: Uuid, id: Uuid) -> Result<Option<NoteDetail>> {
    let owner_str = encode_uuid(owner);
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| Ok(read_note_detail(conn, &owner_str, &id_str)?))
      .await?;

    raw.map(detail_from_raw).transpose()
  }

  async fn list_notes(
    &self,
    owner: Uuid,
    query: &NoteQuery,
  ) -> Result<Vec<NoteSummary>> {
    let mut conds: Vec<String> = vec!["n.owner_id = ?".into()];
    let mut bind: Vec<Value> = vec![Value::Text(encode_uuid(owner))];

    if let Some(category_id) = query.category_id {
      conds.push("n.category_id = ?".into());
      bind.push(Value::Text(encode_uuid(category_id)));
    }
    if let Some(difficulty) = query.difficulty {
      conds.push("n.difficulty = ?".into());
      bind.push(Value::Text(difficulty.as_str().to_owned()));
    }
    if let Some(fav) = query.is_favorite {
      conds.push("n.is_favorite = ?".into());
      bind.push(Value::Integer(fav as i64));
    }
    if let Some(arch) = query.is_archived {
      conds.push("n.is_archived = ?".into());
      bind.push(Value::Integer(arch as i64));
    }
    if let Some(text) = query.text.as_deref().filter(|t| !t.is_empty()) {
      // OR-combined substring match over title, content, summary, tag names,
      // and category name; DISTINCT below absorbs multi-tag matches.
      conds.push(
        "(instr(lower(n.title), ?) > 0
          OR instr(lower(n.content), ?) > 0
          OR instr(lower(n.summary), ?) > 0
          OR instr(lower(c.name), ?) > 0
          OR instr(lower(ifnull(t.name, '')), ?) > 0)"
          .into(),
      );
      let needle = text.to_lowercase();
      for _ in 0..5 {
        bind.push(Value::Text(needle.clone()));
      }
    }

    // A tag filter matches notes carrying any of the requested tags; ids
    // pointing at foreign tags simply match nothing.
    if !query.tag_ids.is_empty() {
      let placeholders = vec!["?"; query.tag_ids.len()].join(", ");
      conds.push(format!(
        "n.id IN (SELECT note_id FROM note_tags WHERE tag_id IN ({placeholders}))"
      ));
      for tag_id in &query.tag_ids {
        bind.push(Value::Text(encode_uuid(*tag_id)));
      }
    }

    bind.push(Value::Integer(query.limit.unwrap_or(100) as i64));
    bind.push(Value::Integer(query.offset.unwrap_or(0) as i64));

    let sql = format!(
      "SELECT DISTINCT n.id, n.title, n.summary, n.category_id, c.name,
              n.difficulty, n.is_favorite, n.is_archived,
              (SELECT COUNT(*) FROM note_tags nt2 WHERE nt2.note_id = n.id),
              n.created_at, n.updated_at
       FROM notes n
       JOIN categories c ON c.id = n.category_id
       LEFT JOIN note_tags nt ON nt.note_id = n.id
       LEFT JOIN tags t ON t.id = nt.tag_id
       WHERE {}
       ORDER BY n.updated_at DESC
       LIMIT ? OFFSET ?",
      conds.join(" AND ")
    );

    let raws: Vec<RawNoteSummary> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(bind), |row| {
            Ok(RawNoteSummary {
              id:            row.get(0)?,
              title:         row.get(1)?,
              summary:       row.get(2)?,
              category_id:   row.get(3)?,
              category_name: row.get(4)?,
              difficulty:    row.get(5)?,
              is_favorite:   row.get(6)?,
              is_archived:   row.get(7)?,
              tag_count:     row.get(8)?,
              created_at:    row.get(9)?,
              updated_at:    row.get(10)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNoteSummary::into_summary).collect()
  }

  async fn update_note(
    &self,
    owner: Uuid,
    id: Uuid,
    update: NoteUpdate,
  ) -> Result<Option<NoteDetail>> {
    // A missing (or foreign) note is "not found" before anything else, even
    // when the payload also carries a bad category id.
    if !self.note_owned(owner, id).await? {
      return Ok(None);
    }
    if let Some(category_id) = update.category_id
      && !self.category_owned(owner, category_id).await?
    {
      return Err(Error::ForeignCategory(category_id));
    }

    let owner_str = encode_uuid(owner);
    let id_str = encode_uuid(id);
    let now_str = encode_dt(Utc::now());
    let cat_str = update.category_id.map(encode_uuid);
    let difficulty = update.difficulty.map(|d| d.as_str().to_owned());
    let tag_id_strs: Option<Vec<String>> = update
      .tag_ids
      .map(|ids| ids.into_iter().map(encode_uuid).collect());
    let (title, content, summary) = (update.title, update.content, update.summary);
    let (is_favorite, is_archived) = (update.is_favorite, update.is_archived);
    let source_url = update.source_url;

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
          "UPDATE notes
           SET title       = COALESCE(?3, title),
               content     = COALESCE(?4, content),
               summary     = COALESCE(?5, summary),
               category_id = COALESCE(?6, category_id),
               difficulty  = COALESCE(?7, difficulty),
               is_favorite = COALESCE(?8, is_favorite),
               is_archived = COALESCE(?9, is_archived),
               updated_at  = ?10
           WHERE id = ?1 AND owner_id = ?2",
          params![
            id_str, owner_str, title, content, summary, cat_str, difficulty,
            is_favorite, is_archived, now_str
          ],
        )?;
        if n == 0 {
          return Ok(false);
        }
        // `Some(None)` clears the source URL; plain `None` leaves it alone,
        // which COALESCE cannot express.
        if let Some(source_url) = source_url {
          tx.execute(
            "UPDATE notes SET source_url = ?2 WHERE id = ?1",
            params![id_str, source_url],
          )?;
        }
        if let Some(tag_id_strs) = tag_id_strs {
          tx.execute(
            "DELETE FROM note_tags WHERE note_id = ?1",
            params![id_str],
          )?;
          link_owned_tags(&tx, &id_str, &owner_str, &tag_id_strs)?;
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !found {
      return Ok(None);
    }
    self.get_note(owner, id).await
  }

  async fn delete_note(&self, owner: Uuid, id: Uuid) -> Result<bool> {
    let owner_str = encode_uuid(owner);
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM notes WHERE id = ?1 AND owner_id = ?2",
          params![id_str, owner_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  async fn mark_reviewed(
    &self,
    owner: Uuid,
    id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<Option<DateTime<Utc>>> {
    let owner_str = encode_uuid(owner);
    let id_str = encode_uuid(id);
    let now_str = encode_dt(now);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notes SET last_reviewed_at = ?3, updated_at = ?3
           WHERE id = ?1 AND owner_id = ?2",
          params![id_str, owner_str, now_str],
        )?)
      })
      .await?;

    Ok((updated > 0).then_some(now))
  }

  async fn toggle_favorite(&self, owner: Uuid, id: Uuid) -> Result<Option<bool>> {
    self.toggle_flag(owner, id, "is_favorite").await
  }

  async fn toggle_archive(&self, owner: Uuid, id: Uuid) -> Result<Option<bool>> {
    self.toggle_flag(owner, id, "is_archived").await
  }

  async fn recent_notes(&self, owner: Uuid) -> Result<Vec<NoteSummary>> {
    let query = NoteQuery {
      is_archived: Some(false),
      limit: Some(10),
      ..NoteQuery::default()
    };
    self.list_notes(owner, &query).await
  }

  async fn favorite_notes(&self, owner: Uuid) -> Result<Vec<NoteSummary>> {
    let query = NoteQuery {
      is_favorite: Some(true),
      is_archived: Some(false),
      ..NoteQuery::default()
    };
    self.list_notes(owner, &query).await
  }

  // ── Attachments ───────────────────────────────────────────────────────────

  async fn create_attachment(
    &self,
    owner: Uuid,
    input: NewAttachment,
  ) -> Result<Attachment> {
    let file_type = FileType::from_filename(&input.original_name);
    let attachment = Attachment {
      id:            Uuid::new_v4(),
      note_id:       input.note_id,
      file_ref:      input.file_ref,
      original_name: input.original_name,
      file_type,
      file_size:     input.file_size,
      description:   input.description,
      uploaded_at:   Utc::now(),
    };

    let id_str = encode_uuid(attachment.id);
    let note_str = encode_uuid(attachment.note_id);
    let owner_str = encode_uuid(owner);
    let at_str = encode_dt(attachment.uploaded_at);
    let file_type = attachment.file_type.as_str();
    let (file_ref, original_name, file_size, description) = (
      attachment.file_ref.clone(),
      attachment.original_name.clone(),
      attachment.file_size,
      attachment.description.clone(),
    );

    let inserted = self
      .conn
      .call(move |conn| {
        // Ownership gate: the insert only happens when the note row is the
        // owner's, so a foreign note id behaves exactly like a missing one.
        Ok(conn.execute(
          "INSERT INTO attachments (id, note_id, file_ref, original_name,
                                    file_type, file_size, description, uploaded_at)
           SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
           WHERE EXISTS (SELECT 1 FROM notes WHERE id = ?2 AND owner_id = ?9)",
          params![
            id_str, note_str, file_ref, original_name, file_type, file_size,
            description, at_str, owner_str
          ],
        )?)
      })
      .await?;

    if inserted == 0 {
      return Err(Error::NotFound { entity: "note" });
    }
    Ok(attachment)
  }

  async fn list_attachments(&self, owner: Uuid) -> Result<Vec<Attachment>> {
    let owner_str = encode_uuid(owner);

    let raws: Vec<RawAttachment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT a.id, a.note_id, a.file_ref, a.original_name, a.file_type,
                  a.file_size, a.description, a.uploaded_at
           FROM attachments a
           JOIN notes n ON n.id = a.note_id
           WHERE n.owner_id = ?1
           ORDER BY a.uploaded_at DESC",
        )?;
        let rows = stmt
          .query_map(params![owner_str], |row| {
            Ok(RawAttachment {
              id:            row.get(0)?,
              note_id:       row.get(1)?,
              file_ref:      row.get(2)?,
              original_name: row.get(3)?,
              file_type:     row.get(4)?,
              file_size:     row.get(5)?,
              description:   row.get(6)?,
              uploaded_at:   row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAttachment::into_attachment).collect()
  }

  async fn get_attachment(
    &self,
    owner: Uuid,
    id: Uuid,
  ) -> Result<Option<Attachment>> {
    let owner_str = encode_uuid(owner);
    let id_str = encode_uuid(id);

    let raw: Option<RawAttachment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT a.id, a.note_id, a.file_ref, a.original_name, a.file_type,
                      a.file_size, a.description, a.uploaded_at
               FROM attachments a
               JOIN notes n ON n.id = a.note_id
               WHERE a.id = ?1 AND n.owner_id = ?2",
              params![id_str, owner_str],
              |row| {
                Ok(RawAttachment {
                  id:            row.get(0)?,
                  note_id:       row.get(1)?,
                  file_ref:      row.get(2)?,
                  original_name: row.get(3)?,
                  file_type:     row.get(4)?,
                  file_size:     row.get(5)?,
                  description:   row.get(6)?,
                  uploaded_at:   row.get(7)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAttachment::into_attachment).transpose()
  }

  async fn delete_attachment(
    &self,
    owner: Uuid,
    id: Uuid,
  ) -> Result<Option<Attachment>> {
    let Some(attachment) = self.get_attachment(owner, id).await? else {
      return Ok(None);
    };

    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM attachments WHERE id = ?1", params![id_str])?;
        Ok(())
      })
      .await?;

    Ok(Some(attachment))
  }

  // ── Progress & dashboard ──────────────────────────────────────────────────

  async fn progress_snapshot(&self, owner: Uuid) -> Result<LearningProgress> {
    let mut progress = self.get_or_create_progress(owner).await?;

    let owner_str = encode_uuid(owner);
    let live_count: u32 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM notes WHERE owner_id = ?1",
          params![owner_str],
          |row| row.get(0),
        )?)
      })
      .await?;

    progress.total_notes = live_count;
    progress.updated_at = Utc::now();
    self.persist_progress(&progress).await?;
    Ok(progress)
  }

  async fn record_review(
    &self,
    owner: Uuid,
    today: NaiveDate,
  ) -> Result<LearningProgress> {
    let mut progress = self.get_or_create_progress(owner).await?;
    progress.record_review(today);
    progress.updated_at = Utc::now();
    self.persist_progress(&progress).await?;
    Ok(progress)
  }

  async fn dashboard_stats(&self, owner: Uuid) -> Result<DashboardStats> {
    let learning_progress = self.progress_snapshot(owner).await?;

    let owner_str = encode_uuid(owner);
    let week_ago_str = encode_dt(Utc::now() - chrono::Duration::days(7));

    type Totals = (u32, u32, u32, u32, u32);
    let (totals, diff_rows, cat_rows): (
      Totals,
      Vec<(String, u32)>,
      Vec<(String, String, String, u32)>,
    ) = self
      .conn
      .call(move |conn| {
        let count = |sql: &str| -> rusqlite::Result<u32> {
          conn.query_row(sql, params![owner_str], |row| row.get(0))
        };

        let total_notes =
          count("SELECT COUNT(*) FROM notes WHERE owner_id = ?1")?;
        let total_categories =
          count("SELECT COUNT(*) FROM categories WHERE owner_id = ?1")?;
        let total_tags = count("SELECT COUNT(*) FROM tags WHERE owner_id = ?1")?;
        let favorite_notes = count(
          "SELECT COUNT(*) FROM notes WHERE owner_id = ?1 AND is_favorite = 1",
        )?;
        let recent_notes: u32 = conn.query_row(
          "SELECT COUNT(*) FROM notes WHERE owner_id = ?1 AND created_at >= ?2",
          params![owner_str, week_ago_str],
          |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
          "SELECT difficulty, COUNT(*) FROM notes
           WHERE owner_id = ?1 GROUP BY difficulty",
        )?;
        let diff_rows = stmt
          .query_map(params![owner_str], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT c.id, c.name, c.color, COUNT(n.id)
           FROM categories c
           JOIN notes n ON n.category_id = c.id
           WHERE c.owner_id = ?1
           GROUP BY c.id
           ORDER BY c.name",
        )?;
        let cat_rows = stmt
          .query_map(params![owner_str], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((
          (total_notes, total_categories, total_tags, favorite_notes, recent_notes),
          diff_rows,
          cat_rows,
        ))
      })
      .await?;

    let difficulty_distribution = diff_rows
      .into_iter()
      .map(|(difficulty, count)| {
        Ok(DifficultyCount { difficulty: decode_difficulty(&difficulty)?, count })
      })
      .collect::<Result<Vec<_>>>()?;

    let category_distribution = cat_rows
      .into_iter()
      .map(|(id, name, color, count)| {
        Ok(CategoryCount {
          category_id:   decode_uuid(&id)?,
          category_name: name,
          color,
          count,
        })
      })
      .collect::<Result<Vec<_>>>()?;

    let (total_notes, total_categories, total_tags, favorite_notes, recent_notes) =
      totals;

    Ok(DashboardStats {
      total_notes,
      total_categories,
      total_tags,
      favorite_notes,
      recent_notes,
      difficulty_distribution,
      category_distribution,
      learning_progress,
    })
  }
}

impl SqliteStore {
  /// Shared body of the two note-flag toggles. `column` is one of the two
  /// fixed flag names, never caller input.
  async fn toggle_flag(
    &self,
    owner: Uuid,
    id: Uuid,
    column: &'static str,
  ) -> Result<Option<bool>> {
    let owner_str = encode_uuid(owner);
    let id_str = encode_uuid(id);
    let now_str = encode_dt(Utc::now());

    let new_value: Option<bool> = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          &format!(
            "UPDATE notes SET {column} = 1 - {column}, updated_at = ?3
             WHERE id = ?1 AND owner_id = ?2"
          ),
          params![id_str, owner_str, now_str],
        )?;
        if n == 0 {
          return Ok(None);
        }
        Ok(
          conn
            .query_row(
              &format!("SELECT {column} FROM notes WHERE id = ?1"),
              params![id_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(new_value)
  }
}
