//! SQL schema for the Recall SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Ownership cascades are enforced here rather than in application code:
/// deleting a user removes everything they own, deleting a category removes
/// its notes, deleting a note removes its tag links and attachments.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL,
    first_name    TEXT NOT NULL DEFAULT '',
    last_name     TEXT NOT NULL DEFAULT '',
    password_hash TEXT NOT NULL,    -- argon2 PHC string
    date_joined   TEXT NOT NULL     -- ISO 8601 UTC
);

-- Opaque bearer tokens, stored as SHA-256 hex digests only.
CREATE TABLE IF NOT EXISTS auth_tokens (
    token_hash TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    kind       TEXT NOT NULL,       -- 'access' | 'refresh'
    expires_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id          TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    color       TEXT NOT NULL DEFAULT '#3B82F6',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE (owner_id, name)
);

CREATE TABLE IF NOT EXISTS tags (
    id         TEXT PRIMARY KEY,
    owner_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name       TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (owner_id, name)
);

CREATE TABLE IF NOT EXISTS notes (
    id               TEXT PRIMARY KEY,
    owner_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    category_id      TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    title            TEXT NOT NULL,
    content          TEXT NOT NULL,
    summary          TEXT NOT NULL DEFAULT '',
    difficulty       TEXT NOT NULL DEFAULT 'beginner',
    is_favorite      INTEGER NOT NULL DEFAULT 0,
    is_archived      INTEGER NOT NULL DEFAULT 0,
    source_url       TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,
    last_reviewed_at TEXT
);

CREATE TABLE IF NOT EXISTS note_tags (
    note_id TEXT NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
    tag_id  TEXT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (note_id, tag_id)
);

CREATE TABLE IF NOT EXISTS attachments (
    id            TEXT PRIMARY KEY,
    note_id       TEXT NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
    file_ref      TEXT NOT NULL,   -- path relative to the attachments dir
    original_name TEXT NOT NULL,
    file_type     TEXT NOT NULL DEFAULT 'other',
    file_size     INTEGER NOT NULL,
    description   TEXT NOT NULL DEFAULT '',
    uploaded_at   TEXT NOT NULL
);

-- One row per user; the UNIQUE primary key makes concurrent first-time
-- creation collapse into insert-or-ignore.
CREATE TABLE IF NOT EXISTS learning_progress (
    owner_id             TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    total_notes          INTEGER NOT NULL DEFAULT 0,
    notes_reviewed_today INTEGER NOT NULL DEFAULT 0,
    current_streak       INTEGER NOT NULL DEFAULT 0,
    longest_streak       INTEGER NOT NULL DEFAULT 0,
    last_activity_date   TEXT,            -- ISO 8601 date or NULL
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS notes_owner_idx       ON notes(owner_id);
CREATE INDEX IF NOT EXISTS notes_category_idx    ON notes(category_id);
CREATE INDEX IF NOT EXISTS notes_updated_idx     ON notes(updated_at);
CREATE INDEX IF NOT EXISTS note_tags_tag_idx     ON note_tags(tag_id);
CREATE INDEX IF NOT EXISTS attachments_note_idx  ON attachments(note_id);
CREATE INDEX IF NOT EXISTS tokens_user_idx       ON auth_tokens(user_id);

PRAGMA user_version = 1;
";
