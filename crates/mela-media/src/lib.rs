//! Media reference resolution for gathering images.
//!
//! The service never moves image bytes itself: an external ingestion
//! collaborator stores the asset and hands back an object key. This
//! crate turns that key into the stable public URL persisted on the
//! gathering record.
//!
//! Callers are expected to treat resolution failure as "no image" —
//! gathering creation proceeds with an absent reference rather than
//! failing the whole request. Callers that cannot tolerate a dropped
//! image should resolve the reference up front.

use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ─── Input ───────────────────────────────────────────────────────────────────

/// An asset already stored by the external ingestion collaborator.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
  /// Flat object key under the public media base URL.
  pub key:          String,
  /// MIME type reported by the collaborator, if known.
  #[serde(default)]
  pub content_type: Option<String>,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum IngestionError {
  #[error("empty asset key")]
  EmptyKey,

  /// Keys must be flat object names; path segments would escape the
  /// configured base URL.
  #[error("asset key {0:?} must be a flat object key")]
  KeyNotFlat(String),

  #[error("asset key {0:?} does not form a valid URL: {1}")]
  BadKey(String, url::ParseError),

  #[error("unsupported media type {0:?}")]
  UnsupportedType(String),
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Resolves uploaded assets to stable public reference URLs.
#[derive(Debug, Clone)]
pub struct MediaResolver {
  base_url: Url,
}

impl MediaResolver {
  /// `base_url` should end with a trailing slash so keys join as path
  /// segments under it.
  pub fn new(base_url: Url) -> Self {
    Self { base_url }
  }

  /// The stable reference URL for `asset`, stored verbatim on the
  /// gathering record.
  pub fn resolve(&self, asset: &UploadedAsset) -> Result<String, IngestionError> {
    let key = asset.key.trim();
    if key.is_empty() {
      return Err(IngestionError::EmptyKey);
    }
    if key.contains('/') || key.contains("..") {
      return Err(IngestionError::KeyNotFlat(key.to_owned()));
    }
    if let Some(content_type) = asset.content_type.as_deref()
      && !content_type.starts_with("image/")
    {
      return Err(IngestionError::UnsupportedType(content_type.to_owned()));
    }

    let url = self
      .base_url
      .join(key)
      .map_err(|e| IngestionError::BadKey(key.to_owned(), e))?;
    Ok(url.to_string())
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn resolver() -> MediaResolver {
    MediaResolver::new(Url::parse("https://media.example.com/assets/").unwrap())
  }

  fn asset(key: &str) -> UploadedAsset {
    UploadedAsset {
      key:          key.to_owned(),
      content_type: Some("image/jpeg".to_owned()),
    }
  }

  #[test]
  fn resolves_under_the_base_url() {
    let url = resolver().resolve(&asset("pic.jpg")).unwrap();
    assert_eq!(url, "https://media.example.com/assets/pic.jpg");
  }

  #[test]
  fn missing_content_type_is_accepted() {
    let mut a = asset("pic.jpg");
    a.content_type = None;
    assert!(resolver().resolve(&a).is_ok());
  }

  #[test]
  fn empty_key_is_rejected() {
    assert!(matches!(
      resolver().resolve(&asset("  ")),
      Err(IngestionError::EmptyKey)
    ));
  }

  #[test]
  fn path_segments_in_keys_are_rejected() {
    assert!(matches!(
      resolver().resolve(&asset("../secrets.txt")),
      Err(IngestionError::KeyNotFlat(_))
    ));
    assert!(matches!(
      resolver().resolve(&asset("a/b.jpg")),
      Err(IngestionError::KeyNotFlat(_))
    ));
  }

  #[test]
  fn non_image_content_type_is_rejected() {
    let mut a = asset("clip.mp4");
    a.content_type = Some("video/mp4".to_owned());
    assert!(matches!(
      resolver().resolve(&a),
      Err(IngestionError::UnsupportedType(_))
    ));
  }
}
