//! Admin views over submitted member records.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/api/submissions` | Optional `?filter=all\|married\|unmarried\|adults\|minors\|old` |
//! | `DELETE` | `/api/delete/{id}` | 400 unless `id` is a UUID |
//! | `PUT`    | `/api/reset` | `{"email", "password"}` |
//! | `GET`    | `/api/stats` | Dashboard counts |
//! | `GET`    | `/api/families` | Records grouped by family name |

use axum::{
  Json,
  extract::{Path, Query, State, rejection::{JsonRejection, QueryRejection}},
};
use kinroll_core::{census::SubmissionFilter, media::PhotoStore, store::MemberStore};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState,
  admin,
  auth::AdminPrincipal,
  enrollment,
  error::{Error, Result},
};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub filter: Option<String>,
}

/// `GET /api/submissions[?filter=<filter>]`
pub async fn list<S, P>(
  State(state): State<AppState<S, P>>,
  _admin: AdminPrincipal,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Value>>
where
  S: MemberStore + 'static,
  P: PhotoStore + 'static,
{
  let Query(params) = params?;
  let filter = match params.filter.as_deref().map(str::trim) {
    None | Some("") => SubmissionFilter::All,
    Some(raw) => raw
      .to_ascii_lowercase()
      .parse::<SubmissionFilter>()
      .map_err(|_| Error::invalid("filter", format!("unknown filter: {raw:?}")))?,
  };

  let data = admin::list_all(state.store.as_ref(), filter).await?;
  Ok(Json(json!({
    "success": true,
    "count":   data.len(),
    "data":    data,
  })))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /api/delete/{id}`
pub async fn delete<S, P>(
  State(state): State<AppState<S, P>>,
  _admin: AdminPrincipal,
  Path(id): Path<String>,
) -> Result<Json<Value>>
where
  S: MemberStore + 'static,
  P: PhotoStore + 'static,
{
  admin::delete_by_id(state.store.as_ref(), state.photos.as_ref(), &id).await?;
  Ok(Json(json!({
    "success": true,
    "message": "Submission deleted successfully",
  })))
}

// ─── Password reset ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResetBody {
  pub email:    Option<String>,
  pub password: Option<String>,
}

/// `PUT /api/reset`
pub async fn reset_password<S, P>(
  State(state): State<AppState<S, P>>,
  _admin: AdminPrincipal,
  body: Result<Json<ResetBody>, JsonRejection>,
) -> Result<Json<Value>>
where
  S: MemberStore + 'static,
  P: PhotoStore + 'static,
{
  let Json(body) = body?;
  enrollment::update_password(
    state.store.as_ref(),
    body.email.as_deref().unwrap_or_default(),
    body.password.as_deref().unwrap_or_default(),
  )
  .await?;

  Ok(Json(json!({
    "success": true,
    "message": "Password updated successfully.",
  })))
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// `GET /api/stats`
pub async fn stats<S, P>(
  State(state): State<AppState<S, P>>,
  _admin: AdminPrincipal,
) -> Result<Json<Value>>
where
  S: MemberStore + 'static,
  P: PhotoStore + 'static,
{
  let stats = admin::census(state.store.as_ref()).await?;
  Ok(Json(json!({ "success": true, "stats": stats })))
}

/// `GET /api/families`
pub async fn families<S, P>(
  State(state): State<AppState<S, P>>,
  _admin: AdminPrincipal,
) -> Result<Json<Value>>
where
  S: MemberStore + 'static,
  P: PhotoStore + 'static,
{
  let data = admin::families(state.store.as_ref()).await?;
  Ok(Json(json!({
    "success": true,
    "count":   data.len(),
    "data":    data,
  })))
}
