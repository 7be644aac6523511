//! Error types and axum `IntoResponse` implementation.
//!
//! Every failure leaves the server as `{"success": false, "message": …}`,
//! with a field-by-field `errors` list for validation failures.

use axum::{
  Json,
  extract::{
    multipart::{MultipartError, MultipartRejection},
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
  response::{IntoResponse, Response},
};
use kinroll_core::error::FieldViolation;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{message}")]
  Validation {
    message: String,
    errors:  Vec<FieldViolation>,
  },
  #[error("{0}")]
  BadRequest(String),
  #[error("{0}")]
  Unauthorized(String),
  #[error("{0}")]
  Forbidden(String),
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  Conflict(String),
  #[error("photo upload failed: {0}")]
  Upload(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("internal error: {0}")]
  Internal(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub fn upload(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Upload(Box::new(e))
  }

  /// A single-field validation failure.
  pub fn invalid(field: &str, message: impl Into<String>) -> Self {
    let message = message.into();
    Self::Validation {
      errors: vec![FieldViolation { field: field.into(), message: message.clone() }],
      message,
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Validation { .. } | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::Upload(_) | Self::Store(_) | Self::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl From<kinroll_core::Error> for Error {
  fn from(e: kinroll_core::Error) -> Self {
    use kinroll_core::Error as Core;

    let message = e.to_string();
    match e {
      Core::MissingFields(fields) => Self::Validation {
        errors: fields
          .iter()
          .map(|f| FieldViolation { field: (*f).into(), message: format!("{f} is required") })
          .collect(),
        message,
      },
      Core::Invalid(violations) => Self::Validation {
        errors: violations.iter().cloned().collect(),
        message,
      },
      Core::EmptyPatch => Self::Validation { message, errors: Vec::new() },
      Core::Serialization(e) => Self::BadRequest(e.to_string()),
    }
  }
}

impl From<JsonRejection> for Error {
  fn from(e: JsonRejection) -> Self { Self::BadRequest(e.body_text()) }
}

impl From<QueryRejection> for Error {
  fn from(e: QueryRejection) -> Self { Self::BadRequest(e.body_text()) }
}

impl From<MultipartRejection> for Error {
  fn from(e: MultipartRejection) -> Self { Self::BadRequest(e.body_text()) }
}

impl From<MultipartError> for Error {
  fn from(e: MultipartError) -> Self { Self::BadRequest(e.body_text()) }
}

#[derive(Serialize)]
struct Envelope {
  success: bool,
  message: String,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  errors:  Vec<FieldViolation>,
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    let (message, errors) = match self {
      Error::Validation { message, errors } => (message, errors),
      Error::Upload(e) => {
        tracing::error!(error = %e, "photo upload failed");
        ("Photo upload failed.".to_string(), Vec::new())
      }
      Error::Store(e) => {
        tracing::error!(error = %e, "store error");
        ("Internal server error.".to_string(), Vec::new())
      }
      Error::Internal(e) => {
        tracing::error!(error = %e, "internal error");
        ("Internal server error.".to_string(), Vec::new())
      }
      other => (other.to_string(), Vec::new()),
    };

    (status, Json(Envelope { success: false, message, errors })).into_response()
  }
}
