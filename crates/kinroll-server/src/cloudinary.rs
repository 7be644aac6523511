//! Cloudinary client for member photos.
//!
//! Uploads and deletions are signed form posts against the Cloudinary
//! upload API. The signature is the SHA-256 of the alphabetically sorted
//! `key=value` pairs joined with `&`, followed by the API secret.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use kinroll_core::{
  media::{PhotoStore, PhotoUpload},
  member::StoredPhoto,
};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::PhotoConfig;

/// Bound to 500×500 and let the host choose the compression quality.
pub const UPLOAD_TRANSFORMATION: &str = "c_limit,h_500,w_500/q_auto:good";

/// HTTP client for the Cloudinary upload API.
#[derive(Debug, Clone)]
pub struct CloudinaryClient {
  config: PhotoConfig,
  http:   Client,
}

impl CloudinaryClient {
  pub fn new(config: PhotoConfig) -> Self {
    Self { config, http: Client::new() }
  }

  fn endpoint(&self, action: &str) -> String {
    format!(
      "{}/{}/image/{action}",
      self.config.api_base.trim_end_matches('/'),
      self.config.cloud_name
    )
  }

  /// Append `api_key`, `signature` and `signature_algorithm` to `params`.
  fn signed(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
    let signature = sign(&params, &self.config.api_secret);
    params.push(("api_key", self.config.api_key.clone()));
    params.push(("signature", signature));
    params.push(("signature_algorithm", "sha256".into()));
    params
  }

  async fn post<T: serde::de::DeserializeOwned>(
    &self,
    action: &str,
    form: &[(&'static str, String)],
  ) -> Result<T, CloudinaryError> {
    let response = self.http.post(self.endpoint(action)).form(form).send().await?;

    if !response.status().is_success() {
      let status = response.status();
      let text = response.text().await.unwrap_or_default();

      return Err(CloudinaryError::UnexpectedResponse(format!(
        "{action} request failed with status {status}: {text}"
      )));
    }

    Ok(response.json().await?)
  }
}

/// Cloudinary's request signature over `params`.
pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
  let mut sorted: Vec<&(&str, String)> = params.iter().collect();
  sorted.sort_by(|a, b| a.0.cmp(b.0));

  let to_sign = sorted
    .iter()
    .map(|(k, v)| format!("{k}={v}"))
    .collect::<Vec<_>>()
    .join("&");

  let mut hasher = Sha256::new();
  hasher.update(to_sign.as_bytes());
  hasher.update(api_secret.as_bytes());
  hex::encode(hasher.finalize())
}

impl PhotoStore for CloudinaryClient {
  type Error = CloudinaryError;

  async fn upload(&self, photo: PhotoUpload) -> Result<StoredPhoto, CloudinaryError> {
    let params = vec![
      ("folder", self.config.folder.clone()),
      ("timestamp", Utc::now().timestamp().to_string()),
      ("transformation", UPLOAD_TRANSFORMATION.to_string()),
    ];
    let mut form = self.signed(params);
    form.push((
      "file",
      format!("data:{};base64,{}", photo.format.media_type(), BASE64.encode(&photo.bytes)),
    ));

    let uploaded: UploadResponse = self.post("upload", &form).await?;
    tracing::debug!(public_id = %uploaded.public_id, "photo uploaded");

    Ok(StoredPhoto {
      url:        uploaded.secure_url,
      storage_id: Some(uploaded.public_id),
    })
  }

  async fn delete(&self, storage_id: &str) -> Result<(), CloudinaryError> {
    let params = vec![
      ("public_id", storage_id.to_owned()),
      ("timestamp", Utc::now().timestamp().to_string()),
    ];
    let form = self.signed(params);

    let destroyed: DestroyResponse = self.post("destroy", &form).await?;
    match destroyed.result.as_str() {
      "ok" | "not found" => Ok(()),
      other => Err(CloudinaryError::UnexpectedResponse(format!(
        "destroy of {storage_id} returned {other:?}"
      ))),
    }
  }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
  secure_url: String,
  public_id:  String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
  result: String,
}

/// Errors that can occur when talking to Cloudinary.
#[derive(Debug, Error)]
pub enum CloudinaryError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("unexpected response: {0}")]
  UnexpectedResponse(String),
}
