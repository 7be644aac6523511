//! HTTP/JSON backend for family-registry enrollment.
//!
//! Exposes an axum [`Router`] backed by any [`MemberStore`] for records and
//! any [`PhotoStore`] for member photos. All API routes live under `/api`.

pub mod admin;
pub mod auth;
pub mod cloudinary;
pub mod enrollment;
pub mod error;
pub mod handlers;
pub mod password;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{delete, get, post, put},
};
use kinroll_core::{media::PhotoStore, store::MemberStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::AuthConfig;
use handlers::{members, session, submissions, toggle};

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_max_body_bytes() -> usize { 10 * 1024 * 1024 }

fn default_photo_folder() -> String { "user-profile-photos".into() }

fn default_photo_api_base() -> String { "https://api.cloudinary.com/v1_1".into() }

/// Runtime server configuration, deserialised from `config.toml` and
/// `KINROLL__*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                   String,
  pub port:                   u16,
  pub store_path:             PathBuf,
  pub admin_username:         String,
  /// argon2 PHC string; generate one with `kinroll --hash-password`.
  pub admin_password_hash:    String,
  pub jwt_secret:             String,
  /// Refuse self-service profile edits while the feature toggle is off.
  #[serde(default)]
  pub enforce_profile_toggle: bool,
  #[serde(default = "default_max_body_bytes")]
  pub max_body_bytes:         usize,
  pub photos:                 PhotoConfig,
}

/// Cloudinary account used for member photos.
#[derive(Debug, Deserialize, Clone)]
pub struct PhotoConfig {
  pub cloud_name: String,
  pub api_key:    String,
  pub api_secret: String,
  #[serde(default = "default_photo_folder")]
  pub folder:     String,
  #[serde(default = "default_photo_api_base")]
  pub api_base:   String,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, P> {
  pub store:  Arc<S>,
  pub photos: Arc<P>,
  pub config: Arc<ServerConfig>,
  pub auth:   Arc<AuthConfig>,
}

impl<S, P> Clone for AppState<S, P> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      photos: Arc::clone(&self.photos),
      config: Arc::clone(&self.config),
      auth:   Arc::clone(&self.auth),
    }
  }
}

impl<S, P> AppState<S, P> {
  pub fn new(store: S, photos: P, config: ServerConfig) -> Self {
    let auth = AuthConfig::new(
      config.admin_username.clone(),
      config.admin_password_hash.clone(),
      &config.jwt_secret,
    );
    Self {
      store:  Arc::new(store),
      photos: Arc::new(photos),
      config: Arc::new(config),
      auth:   Arc::new(auth),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the enrollment API.
pub fn router<S, P>(state: AppState<S, P>) -> Router
where
  S: MemberStore + 'static,
  P: PhotoStore + 'static,
{
  let body_limit = state.config.max_body_bytes;

  let api = Router::new()
    // Sessions
    .route("/login",          post(session::admin_login::<S, P>))
    .route("/profile",        get(session::admin_profile))
    .route("/user/login",     post(session::member_login::<S, P>))
    // Members
    .route("/signup",         post(members::signup::<S, P>))
    .route("/user/signup",    post(members::signup::<S, P>))
    .route("/user/update",    put(members::update::<S, P>))
    // Admin
    .route("/submissions",    get(submissions::list::<S, P>))
    .route("/delete/{id}",    delete(submissions::delete::<S, P>))
    .route("/reset",          put(submissions::reset_password::<S, P>))
    .route("/stats",          get(submissions::stats::<S, P>))
    .route("/families",       get(submissions::families::<S, P>))
    // Toggle
    .route("/toggle-feature", get(toggle::get::<S, P>).put(toggle::set::<S, P>));

  Router::new()
    .route("/", get(|| async { "API is running" }))
    .nest("/api", api)
    .layer(DefaultBodyLimit::max(body_limit))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
