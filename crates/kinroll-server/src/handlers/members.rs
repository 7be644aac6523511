//! Member sign-up and self-service profile edits.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/user/signup`, `/api/signup` | JSON or multipart; 201 on success |
//! | `PUT`  | `/api/user/update` | Member token; partial profile as JSON |
//!
//! A JSON sign-up carries the photo as base64 (optionally as a `data:` URI)
//! in `photo`. A multipart sign-up carries it as a file part named `photo`;
//! every other part is read as a text field.

use axum::{
  Json,
  extract::{FromRequest, Multipart, Request, State, rejection::JsonRejection},
  http::{StatusCode, header::CONTENT_TYPE},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bytes::Bytes;
use kinroll_core::{media::PhotoStore, store::MemberStore, validation::SignupForm};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::{
  AppState,
  auth::MemberPrincipal,
  enrollment,
  error::{Error, Result},
};

// ─── Sign-up ─────────────────────────────────────────────────────────────────

/// JSON sign-up body: the form fields plus an encoded photo.
#[derive(Debug, Deserialize)]
pub struct JsonSignup {
  #[serde(flatten)]
  pub form:  SignupForm,
  pub photo: Option<String>,
}

/// Decode a base64 photo, with or without a `data:<type>;base64,` prefix.
pub fn decode_photo(encoded: &str) -> Result<Option<Bytes>> {
  let encoded = encoded.trim();
  let payload = match encoded.strip_prefix("data:") {
    Some(uri) => uri.split_once(',').map(|(_, data)| data).unwrap_or_default(),
    None => encoded,
  };
  if payload.is_empty() {
    return Ok(None);
  }

  BASE64
    .decode(payload)
    .map(|raw| Some(Bytes::from(raw)))
    .map_err(|_| Error::invalid("photo", "Photo must be base64 encoded"))
}

async fn read_multipart(mut multipart: Multipart) -> Result<(SignupForm, Option<Bytes>)> {
  let mut fields = Map::new();
  let mut photo = None;

  while let Some(field) = multipart.next_field().await? {
    let Some(name) = field.name().map(str::to_owned) else {
      continue;
    };
    if name == "photo" {
      photo = Some(field.bytes().await?);
    } else {
      fields.insert(name, Value::String(field.text().await?));
    }
  }

  let form = serde_json::from_value(Value::Object(fields)).map_err(kinroll_core::Error::from)?;
  Ok((form, photo))
}

fn is_multipart(req: &Request) -> bool {
  req
    .headers()
    .get(CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
}

/// `POST /api/user/signup` and `POST /api/signup`
pub async fn signup<S, P>(
  State(state): State<AppState<S, P>>,
  req: Request,
) -> Result<(StatusCode, Json<Value>)>
where
  S: MemberStore + 'static,
  P: PhotoStore + 'static,
{
  let (form, photo) = if is_multipart(&req) {
    let multipart = Multipart::from_request(req, &state).await?;
    read_multipart(multipart).await?
  } else {
    let Json(body) = Json::<JsonSignup>::from_request(req, &state).await?;
    let photo = match body.photo.as_deref() {
      Some(encoded) => decode_photo(encoded)?,
      None => None,
    };
    (body.form, photo)
  };

  let enrolled = enrollment::enroll(
    state.store.as_ref(),
    state.photos.as_ref(),
    &state.auth,
    &form,
    photo,
  )
  .await?;

  Ok((
    StatusCode::CREATED,
    Json(json!({
      "success":  true,
      "message":  "Account created and enrollment submitted successfully.",
      "token":    enrolled.token,
      "userData": enrolled.record,
    })),
  ))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /api/user/update`
pub async fn update<S, P>(
  State(state): State<AppState<S, P>>,
  MemberPrincipal(member): MemberPrincipal,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>>
where
  S: MemberStore + 'static,
  P: PhotoStore + 'static,
{
  let Json(body) = body?;
  let Value::Object(patch) = body else {
    return Err(Error::BadRequest("Request body must be a JSON object.".into()));
  };

  let user = enrollment::update_profile(
    state.store.as_ref(),
    state.config.enforce_profile_toggle,
    &member,
    &patch,
  )
  .await?;

  Ok(Json(json!({
    "success": true,
    "message": "Profile updated successfully.",
    "user":    user,
  })))
}
