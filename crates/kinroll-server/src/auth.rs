//! Bearer-token issuing, verification and the principal extractors.
//!
//! Two capability levels exist. The single admin operator logs in with
//! credentials from config and receives a one-hour token carrying
//! `role: "admin"`. Members log in with email and password and receive a
//! thirty-day token naming their record id. Tokens are HS256 JWTs with no
//! server-side revocation; expiry is the only way one becomes invalid.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use kinroll_core::{
  media::PhotoStore,
  member::{MemberRecord, normalize_email},
  store::MemberStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  error::{Error, Result},
  password::verify_password,
};

pub const ADMIN_ROLE: &str = "admin";

fn admin_ttl() -> Duration { Duration::hours(1) }

fn member_ttl() -> Duration { Duration::days(30) }

// ─── Claims ──────────────────────────────────────────────────────────────────

/// Payload of an admin token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
  pub username: String,
  pub role:     String,
  pub iat:      i64,
  pub exp:      i64,
}

/// Payload of a member token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberClaims {
  pub id:  Uuid,
  pub iat: i64,
  pub exp: i64,
}

/// What an admin route reads out of any validly signed token. Both fields
/// are optional so a member token decodes too and is then refused by role.
#[derive(Debug, Deserialize)]
struct RoleClaims {
  username: Option<String>,
  role:     Option<String>,
}

// ─── Config ──────────────────────────────────────────────────────────────────

/// Admin credentials and token keys for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub admin_username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub admin_password_hash: String,
  encoding:                EncodingKey,
  decoding:                DecodingKey,
}

impl AuthConfig {
  pub fn new(
    admin_username: impl Into<String>,
    admin_password_hash: impl Into<String>,
    jwt_secret: &str,
  ) -> Self {
    Self {
      admin_username:      admin_username.into(),
      admin_password_hash: admin_password_hash.into(),
      encoding:            EncodingKey::from_secret(jwt_secret.as_bytes()),
      decoding:            DecodingKey::from_secret(jwt_secret.as_bytes()),
    }
  }

  fn sign<T: Serialize>(&self, claims: &T) -> Result<String> {
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
      .map_err(|e| Error::Internal(format!("token signing failed: {e}")))
  }

  fn decode<T: serde::de::DeserializeOwned>(&self, token: &str) -> Option<T> {
    let validation = Validation::new(Algorithm::HS256);
    jsonwebtoken::decode::<T>(token, &self.decoding, &validation)
      .map(|data| data.claims)
      .ok()
  }

  // ── Admin ──────────────────────────────────────────────────────────────

  /// Check the operator credentials and issue a one-hour admin token.
  ///
  /// The password hash is verified even when the username is wrong, and the
  /// error does not say which of the two failed.
  pub fn authenticate_admin(&self, username: &str, password: &str) -> Result<String> {
    let password_ok = verify_password(password, &self.admin_password_hash);
    let username_ok = username == self.admin_username;
    if !(username_ok && password_ok) {
      tracing::warn!("rejected admin login");
      return Err(Error::Unauthorized("Invalid credentials".into()));
    }
    self.issue_admin_token(username)
  }

  pub fn issue_admin_token(&self, username: &str) -> Result<String> {
    let now = Utc::now();
    self.sign(&AdminClaims {
      username: username.to_owned(),
      role:     ADMIN_ROLE.to_owned(),
      iat:      now.timestamp(),
      exp:      (now + admin_ttl()).timestamp(),
    })
  }

  /// Signature and expiry must hold (`Unauthorized`), then the role must be
  /// `admin` (`Forbidden`).
  pub fn verify_admin_token(&self, token: &str) -> Result<AdminPrincipal> {
    let claims: RoleClaims = self.decode(token).ok_or_else(|| {
      Error::Unauthorized("Not authorized, token is invalid or expired".into())
    })?;

    match (claims.role.as_deref(), claims.username) {
      (Some(ADMIN_ROLE), Some(username)) => Ok(AdminPrincipal { username }),
      (role, _) => {
        tracing::warn!(role = ?role, "token without admin role refused");
        Err(Error::Forbidden("Forbidden: Requires admin privileges".into()))
      }
    }
  }

  // ── Member ─────────────────────────────────────────────────────────────

  pub fn issue_member_token(&self, id: Uuid) -> Result<String> {
    let now = Utc::now();
    self.sign(&MemberClaims {
      id,
      iat: now.timestamp(),
      exp: (now + member_ttl()).timestamp(),
    })
  }

  /// Signature and expiry only; the caller resolves the id.
  pub fn decode_member_token(&self, token: &str) -> Result<MemberClaims> {
    self
      .decode(token)
      .ok_or_else(|| Error::Unauthorized("Not authorized, token failed".into()))
  }
}

// ─── Member login ────────────────────────────────────────────────────────────

/// Look the member up by email, verify the password and issue a token.
pub async fn authenticate_member<S: MemberStore>(
  store: &S,
  auth: &AuthConfig,
  email: &str,
  password: &str,
) -> Result<(String, MemberRecord)> {
  let email = normalize_email(email);
  let account = store
    .find_account(&email)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("User not found.".into()))?;

  if !verify_password(password, &account.password_hash) {
    tracing::warn!(member = %account.record.id, "rejected member login");
    return Err(Error::Unauthorized("Invalid credentials.".into()));
  }

  let token = auth.issue_member_token(account.record.id)?;
  Ok((token, account.record))
}

/// Decode a member token and resolve it to a live record.
pub async fn verify_member_token<S: MemberStore>(
  store: &S,
  auth: &AuthConfig,
  token: &str,
) -> Result<MemberRecord> {
  let claims = auth.decode_member_token(token)?;
  store
    .get_member(claims.id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::Unauthorized("Not authorized, token failed".into()))
}

// ─── Extraction ──────────────────────────────────────────────────────────────

/// The token from an `Authorization: Bearer <token>` header. The scheme is
/// matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
  let mut parts = value.splitn(2, ' ');

  let scheme = parts.next()?;
  let token = parts.next()?.trim();

  if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
    return None;
  }

  Some(token)
}

/// Present in a handler means the request carried a valid admin token.
#[derive(Debug, Clone, Serialize)]
pub struct AdminPrincipal {
  pub username: String,
}

/// Present in a handler means the request carried a valid member token
/// whose record still exists.
#[derive(Debug, Clone)]
pub struct MemberPrincipal(pub MemberRecord);

impl<S, P> FromRequestParts<AppState<S, P>> for AdminPrincipal
where
  S: MemberStore + 'static,
  P: PhotoStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, P>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or_else(|| {
      Error::Unauthorized("Not authorized, no token provided".into())
    })?;
    state.auth.verify_admin_token(token)
  }
}

impl<S, P> FromRequestParts<AppState<S, P>> for MemberPrincipal
where
  S: MemberStore + 'static,
  P: PhotoStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, P>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)
      .ok_or_else(|| Error::Unauthorized("Not authorized, no token".into()))?;
    let record = verify_member_token(state.store.as_ref(), &state.auth, token).await?;
    Ok(MemberPrincipal(record))
  }
}
