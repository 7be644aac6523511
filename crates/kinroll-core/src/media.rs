//! The `PhotoStore` trait: an abstraction over the external image host.
//!
//! Member photos never touch the record store; only the URL and deletion
//! handle returned here are persisted.

use std::future::Future;

use bytes::Bytes;

use crate::member::StoredPhoto;

/// Image formats accepted for member photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
  Jpeg,
  Png,
}

impl ImageFormat {
  /// Identify the format from the leading magic bytes.
  pub fn sniff(bytes: &[u8]) -> Option<Self> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
      Some(Self::Jpeg)
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
      Some(Self::Png)
    } else {
      None
    }
  }

  pub fn media_type(self) -> &'static str {
    match self {
      Self::Jpeg => "image/jpeg",
      Self::Png => "image/png",
    }
  }
}

/// A photo ready to be sent to the image host.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
  pub bytes:  Bytes,
  pub format: ImageFormat,
}

/// Abstraction over a hosted image store.
///
/// Implementations bound uploads to 500×500 and let the host pick the
/// compression quality.
pub trait PhotoStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Upload a photo and return where it lives.
  fn upload(
    &self,
    photo: PhotoUpload,
  ) -> impl Future<Output = Result<StoredPhoto, Self::Error>> + Send + '_;

  /// Delete a previously uploaded photo by its storage handle.
  fn delete<'a>(
    &'a self,
    storage_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
