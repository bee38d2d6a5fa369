//! Bearer-token auth: registration, login, refresh, and the [`CurrentUser`]
//! extractor.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | 400 on short/mismatched password, 409 on taken username |
//! | `POST` | `/auth/login` | 401 on bad credentials |
//! | `POST` | `/auth/refresh` | Body: `{"refresh":"…"}`, returns a new access token |
//! | `GET`  | `/auth/profile` | Requires `Authorization: Bearer <access>` |
//!
//! Tokens are opaque: 32 random bytes, base64url-encoded. The store only
//! ever sees their SHA-256 hex digest.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  Json,
  extract::{FromRequestParts, State},
  http::{StatusCode, request::Parts},
  response::IntoResponse,
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::{Duration, Utc};
use rand_core::{OsRng, RngCore};
use recall_core::{
  store::KnowledgeStore,
  user::{AuthToken, NewUser, TokenKind, User},
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

const MIN_PASSWORD_LEN: usize = 8;

// ─── Token plumbing ───────────────────────────────────────────────────────────

fn digest(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

/// Mint an opaque token of `kind` for `user_id` and persist its digest.
async fn issue<S>(
  store: &S,
  user_id: Uuid,
  kind: TokenKind,
) -> Result<String, ApiError>
where
  S: KnowledgeStore,
{
  let mut raw = [0u8; 32];
  OsRng.fill_bytes(&mut raw);
  let token = B64.encode(raw);

  let ttl = match kind {
    TokenKind::Access => Duration::hours(1),
    TokenKind::Refresh => Duration::days(30),
  };
  store
    .store_token(AuthToken {
      token_hash: digest(&token),
      user_id,
      kind,
      expires_at: Utc::now() + ttl,
    })
    .await
    .map_err(ApiError::store)?;
  Ok(token)
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
  pub access:  String,
  pub refresh: String,
}

async fn issue_pair<S>(store: &S, user_id: Uuid) -> Result<TokenPair, ApiError>
where
  S: KnowledgeStore,
{
  Ok(TokenPair {
    access:  issue(store, user_id, TokenKind::Access).await?,
    refresh: issue(store, user_id, TokenKind::Refresh).await?,
  })
}

// ─── Password hashing ─────────────────────────────────────────────────────────

/// Hash a password into an argon2 PHC string, e.g. `$argon2id$v=19$…`
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(e.to_string()))
}

fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .and_then(|parsed| {
      Argon2::default().verify_password(password.as_bytes(), &parsed)
    })
    .is_ok()
}

// ─── Extractor ────────────────────────────────────────────────────────────────

/// The authenticated caller, resolved from `Authorization: Bearer <access>`.
/// Present in a handler's signature means the request was authenticated.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let header = parts
      .headers
      .get(axum::http::header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthorized)?;
    let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;

    let stored = state
      .store
      .find_token(&digest(token))
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized)?;
    if stored.kind != TokenKind::Access || stored.is_expired(Utc::now()) {
      return Err(ApiError::Unauthorized);
    }

    let user = state
      .store
      .get_user(stored.user_id)
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized)?;
    Ok(CurrentUser(user))
  }
}

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username:         String,
  pub email:            String,
  #[serde(default)]
  pub first_name:       String,
  #[serde(default)]
  pub last_name:        String,
  pub password:         String,
  pub password_confirm: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
  pub user:   User,
  pub tokens: TokenPair,
}

/// `POST /auth/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: KnowledgeStore,
{
  if body.username.trim().is_empty() {
    return Err(ApiError::Validation("username must not be empty".into()));
  }
  if body.password.len() < MIN_PASSWORD_LEN {
    return Err(ApiError::Validation(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }
  if body.password != body.password_confirm {
    return Err(ApiError::Validation("passwords do not match".into()));
  }

  let user = state
    .store
    .create_user(NewUser {
      username:      body.username,
      email:         body.email,
      first_name:    body.first_name,
      last_name:     body.last_name,
      password_hash: hash_password(&body.password)?,
    })
    .await
    .map_err(ApiError::store)?;

  let tokens = issue_pair(&*state.store, user.id).await?;
  Ok((StatusCode::CREATED, Json(AuthResponse { user, tokens })))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub username: String,
  pub password: String,
}

/// `POST /auth/login` — 401 on unknown username or wrong password, with
/// no distinction between the two.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<AuthResponse>, ApiError>
where
  S: KnowledgeStore,
{
  let creds = state
    .store
    .find_credentials(&body.username)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::Unauthorized)?;

  if !verify_password(&body.password, &creds.password_hash) {
    return Err(ApiError::Unauthorized);
  }

  let tokens = issue_pair(&*state.store, creds.user.id).await?;
  Ok(Json(AuthResponse { user: creds.user, tokens }))
}

// ─── Refresh ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RefreshBody {
  pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
  pub access: String,
}

/// `POST /auth/refresh` — exchanges a live refresh token for a new access
/// token. The refresh token itself is not rotated.
pub async fn refresh<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RefreshBody>,
) -> Result<Json<RefreshResponse>, ApiError>
where
  S: KnowledgeStore,
{
  let stored = state
    .store
    .find_token(&digest(&body.refresh))
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::Unauthorized)?;
  if stored.kind != TokenKind::Refresh || stored.is_expired(Utc::now()) {
    return Err(ApiError::Unauthorized);
  }

  let access = issue(&*state.store, stored.user_id, TokenKind::Access).await?;
  Ok(Json(RefreshResponse { access }))
}

// ─── Profile ──────────────────────────────────────────────────────────────────

/// `GET /auth/profile`
pub async fn profile<S>(
  CurrentUser(user): CurrentUser,
) -> Result<Json<User>, ApiError>
where
  S: KnowledgeStore + Clone + Send + Sync + 'static,
{
  Ok(Json(user))
}
