//! User identity and bearer-token types.
//!
//! Password hashing and token minting are the API layer's business; the
//! store only ever sees the argon2 PHC string and the SHA-256 hex digest of
//! a token. Raw token material never touches the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── User ────────────────────────────────────────────────────────────────────

/// Public representation of an account. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:          Uuid,
  pub username:    String,
  pub email:       String,
  pub first_name:  String,
  pub last_name:   String,
  pub date_joined: DateTime<Utc>,
}

/// Input to [`crate::store::KnowledgeStore::create_user`]. The password has
/// already been hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub email:         String,
  pub first_name:    String,
  pub last_name:     String,
  pub password_hash: String,
}

/// A user together with their stored password hash — returned only by the
/// login lookup, never serialised.
#[derive(Debug, Clone)]
pub struct UserCredentials {
  pub user:          User,
  pub password_hash: String,
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// Whether a token grants API access or only the right to mint new access
/// tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
  Access,
  Refresh,
}

impl TokenKind {
  /// The discriminant string stored in the `kind` column.
  pub fn as_str(self) -> &'static str {
    match self {
      TokenKind::Access => "access",
      TokenKind::Refresh => "refresh",
    }
  }
}

/// A stored bearer token: the SHA-256 hex digest of the opaque token string,
/// plus who it belongs to and when it stops working.
#[derive(Debug, Clone)]
pub struct AuthToken {
  pub token_hash: String,
  pub user_id:    Uuid,
  pub kind:       TokenKind,
  pub expires_at: DateTime<Utc>,
}

impl AuthToken {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    self.expires_at <= now
  }
}
