//! The global feature toggle. Admins write it; members read it.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use kinroll_core::{media::PhotoStore, store::MemberStore};
use serde_json::{Value, json};

use crate::{
  AppState,
  admin,
  auth::{AdminPrincipal, MemberPrincipal},
  error::{Error, Result},
};

/// `PUT /api/toggle-feature` with body `{"enableFeature": true}`
pub async fn set<S, P>(
  State(state): State<AppState<S, P>>,
  _admin: AdminPrincipal,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>>
where
  S: MemberStore + 'static,
  P: PhotoStore + 'static,
{
  let Json(body) = body?;
  let enabled = body.get("enableFeature").and_then(Value::as_bool).ok_or_else(|| {
    Error::invalid("enableFeature", "Invalid input: enableFeature must be a boolean.")
  })?;

  let new_state = admin::set_toggle(state.store.as_ref(), enabled).await?;
  let action = if new_state { "activated" } else { "deactivated" };

  Ok(Json(json!({
    "success":  true,
    "message":  format!("Toggle feature successfully {action}."),
    "newState": new_state,
  })))
}

/// `GET /api/toggle-feature`
pub async fn get<S, P>(
  State(state): State<AppState<S, P>>,
  _member: MemberPrincipal,
) -> Result<Json<Value>>
where
  S: MemberStore + 'static,
  P: PhotoStore + 'static,
{
  let current = admin::get_toggle(state.store.as_ref()).await?;
  Ok(Json(json!({
    "success":            true,
    "currentToggleState": current,
  })))
}
