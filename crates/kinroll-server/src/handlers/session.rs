//! Login endpoints for both capability levels, and the admin profile probe.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/login` | Admin: `{"username", "password"}` |
//! | `GET`  | `/api/profile` | Admin token; any failure is a 403 |
//! | `POST` | `/api/user/login` | Member: `{"email", "password"}` |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use kinroll_core::{media::PhotoStore, store::MemberStore};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState,
  auth::{ADMIN_ROLE, AdminPrincipal, authenticate_member},
  error::{Error, Result},
};

fn present(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

// ─── Admin ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AdminLogin {
  pub username: Option<String>,
  pub password: Option<String>,
}

/// `POST /api/login`
pub async fn admin_login<S, P>(
  State(state): State<AppState<S, P>>,
  body: Result<Json<AdminLogin>, JsonRejection>,
) -> Result<Json<Value>>
where
  S: MemberStore + 'static,
  P: PhotoStore + 'static,
{
  let Json(body) = body?;
  let (Some(username), Some(password)) = (present(body.username), present(body.password)) else {
    return Err(Error::BadRequest("Username and password are required.".into()));
  };

  let token = state.auth.authenticate_admin(&username, &password)?;
  tracing::info!(%username, "admin logged in");

  Ok(Json(json!({
    "success": true,
    "message": "Authentication successful.",
    "token":   token,
  })))
}

/// `GET /api/profile`
pub async fn admin_profile(
  admin: Result<AdminPrincipal, Error>,
) -> Result<Json<Value>> {
  let admin = admin.map_err(|e| match e {
    Error::Unauthorized(m) | Error::Forbidden(m) => Error::Forbidden(m),
    other => other,
  })?;

  Ok(Json(json!({
    "success": true,
    "user":    { "username": admin.username, "role": ADMIN_ROLE },
  })))
}

// ─── Member ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MemberLogin {
  pub email:    Option<String>,
  pub password: Option<String>,
}

/// `POST /api/user/login`
pub async fn member_login<S, P>(
  State(state): State<AppState<S, P>>,
  body: Result<Json<MemberLogin>, JsonRejection>,
) -> Result<Json<Value>>
where
  S: MemberStore + 'static,
  P: PhotoStore + 'static,
{
  let Json(body) = body?;
  let (Some(email), Some(password)) = (present(body.email), present(body.password)) else {
    return Err(Error::BadRequest("Email and password are required.".into()));
  };

  let (token, record) =
    authenticate_member(state.store.as_ref(), &state.auth, &email, &password).await?;
  tracing::info!(member = %record.id, "member logged in");

  Ok(Json(json!({
    "success":  true,
    "message":  "Login successful!",
    "token":    token,
    "userData": record,
  })))
}
