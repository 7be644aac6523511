//! Test doubles and request helpers shared by the router tests.

use std::{
  collections::HashMap,
  path::PathBuf,
  sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bytes::Bytes;
use kinroll_core::{
  media::{PhotoStore, PhotoUpload},
  member::{Insertion, MemberAccount, MemberProfile, MemberRecord, NewMember, StoredPhoto},
  store::MemberStore,
  toggle::FeatureToggle,
};
use kinroll_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{AppState, PhotoConfig, ServerConfig, password::hash_password, router};

pub const ADMIN_PASSWORD: &str = "correct horse";

/// Smallest byte string that sniffs as a PNG.
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

// ─── Photo store double ──────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("photo host unavailable")]
pub struct PhotoHostDown;

/// Keeps uploads in memory; either operation can be made to fail.
#[derive(Default)]
pub struct MemoryPhotoStore {
  photos:           Mutex<HashMap<String, Bytes>>,
  next_id:          AtomicUsize,
  pub fail_uploads: AtomicBool,
  pub fail_deletes: AtomicBool,
}

impl MemoryPhotoStore {
  pub fn count(&self) -> usize { self.photos.lock().unwrap().len() }

  pub fn contains(&self, storage_id: &str) -> bool {
    self.photos.lock().unwrap().contains_key(storage_id)
  }
}

impl PhotoStore for MemoryPhotoStore {
  type Error = PhotoHostDown;

  async fn upload(&self, photo: PhotoUpload) -> Result<StoredPhoto, PhotoHostDown> {
    if self.fail_uploads.load(Ordering::SeqCst) {
      return Err(PhotoHostDown);
    }
    let n = self.next_id.fetch_add(1, Ordering::SeqCst);
    let storage_id = format!("user-profile-photos/{n}");
    self.photos.lock().unwrap().insert(storage_id.clone(), photo.bytes);
    Ok(StoredPhoto {
      url:        format!("https://img.test/{storage_id}.png"),
      storage_id: Some(storage_id),
    })
  }

  async fn delete(&self, storage_id: &str) -> Result<(), PhotoHostDown> {
    if self.fail_deletes.load(Ordering::SeqCst) {
      return Err(PhotoHostDown);
    }
    self.photos.lock().unwrap().remove(storage_id);
    Ok(())
  }
}

// ─── Store double ────────────────────────────────────────────────────────────

/// A SQLite store whose email lookup never finds anything, so the only
/// thing standing between two sign-ups with one email is the unique index.
#[derive(Clone)]
pub struct BlindStore(pub SqliteStore);

impl MemberStore for BlindStore {
  type Error = kinroll_store_sqlite::Error;

  async fn insert_member(&self, input: NewMember) -> Result<Insertion, Self::Error> {
    self.0.insert_member(input).await
  }

  async fn get_member(&self, id: Uuid) -> Result<Option<MemberRecord>, Self::Error> {
    self.0.get_member(id).await
  }

  async fn find_account(&self, _: &str) -> Result<Option<MemberAccount>, Self::Error> {
    Ok(None)
  }

  async fn list_members(&self) -> Result<Vec<MemberRecord>, Self::Error> {
    self.0.list_members().await
  }

  async fn update_profile(
    &self,
    id: Uuid,
    profile: MemberProfile,
  ) -> Result<Option<MemberRecord>, Self::Error> {
    self.0.update_profile(id, profile).await
  }

  async fn set_password_hash(&self, email: &str, hash: String) -> Result<bool, Self::Error> {
    self.0.set_password_hash(email, hash).await
  }

  async fn delete_member(&self, id: Uuid) -> Result<Option<MemberRecord>, Self::Error> {
    self.0.delete_member(id).await
  }

  async fn get_toggle(&self, name: &str) -> Result<Option<FeatureToggle>, Self::Error> {
    self.0.get_toggle(name).await
  }

  async fn set_toggle(&self, name: &str, enabled: bool) -> Result<FeatureToggle, Self::Error> {
    self.0.set_toggle(name, enabled).await
  }
}

// ─── State ───────────────────────────────────────────────────────────────────

pub fn test_config() -> ServerConfig {
  ServerConfig {
    host:                   "127.0.0.1".to_string(),
    port:                   5000,
    store_path:             PathBuf::from(":memory:"),
    admin_username:         "admin".to_string(),
    admin_password_hash:    hash_password(ADMIN_PASSWORD).unwrap(),
    jwt_secret:             "test-secret".to_string(),
    enforce_profile_toggle: false,
    max_body_bytes:         10 * 1024 * 1024,
    photos:                 PhotoConfig {
      cloud_name: "test".to_string(),
      api_key:    "key".to_string(),
      api_secret: "secret".to_string(),
      folder:     "user-profile-photos".to_string(),
      api_base:   "http://127.0.0.1:9".to_string(),
    },
  }
}

pub async fn make_state_with(config: ServerConfig) -> AppState<SqliteStore, MemoryPhotoStore> {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  AppState::new(store, MemoryPhotoStore::default(), config)
}

pub async fn make_state() -> AppState<SqliteStore, MemoryPhotoStore> {
  make_state_with(test_config()).await
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// A complete, valid JSON sign-up body.
pub fn signup_body(email: &str) -> Value {
  json!({
    "name":             "Anna",
    "surname":          "Joseph",
    "familyName":       "smith ",
    "email":            email,
    "password":         "pa55word",
    "dob":              "1990-05-17",
    "baptismDate":      "1990-06-24",
    "confirmationDate": "2002-04-07",
    "occupation":       "Nurse",
    "maritalStatus":    "married",
    "phone":            "+91 90000 00000",
    "fatherName":       "Joseph",
    "rite":             "syro-malabar",
    "role":             "wife",
    "photo":            BASE64.encode(PNG),
  })
}

/// Send one request through a fresh router and decode the JSON reply.
pub async fn send(
  state:  &AppState<SqliteStore, MemoryPhotoStore>,
  method: &str,
  uri:    &str,
  token:  Option<&str>,
  body:   Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let body = match body {
    Some(json) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };

  let resp = router(state.clone())
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap_or_else(|_| {
      Value::String(String::from_utf8_lossy(&bytes).into_owned())
    })
  };
  (status, json)
}

pub async fn admin_token(state: &AppState<SqliteStore, MemoryPhotoStore>) -> String {
  let (status, json) = send(
    state,
    "POST",
    "/api/login",
    None,
    Some(json!({ "username": "admin", "password": ADMIN_PASSWORD })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{json}");
  json["token"].as_str().unwrap().to_string()
}

/// Sign up `email` and return the issued token and the record id.
pub async fn enroll(
  state: &AppState<SqliteStore, MemoryPhotoStore>,
  email: &str,
) -> (String, String) {
  let (status, json) =
    send(state, "POST", "/api/user/signup", None, Some(signup_body(email))).await;
  assert_eq!(status, StatusCode::CREATED, "{json}");
  (
    json["token"].as_str().unwrap().to_string(),
    json["userData"]["id"].as_str().unwrap().to_string(),
  )
}
