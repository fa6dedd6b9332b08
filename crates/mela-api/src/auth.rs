//! Bearer-token identity gate.
//!
//! Token verification is the service's stand-in for the external
//! identity subsystem: a token carries the principal id, an expiry, and
//! a digest over both keyed with a shared secret. Verification is
//! stateless — every request is checked on its own, and no session
//! object outlives the request.
//!
//! Token layout (before base64): `<principal-uuid>:<expiry-rfc3339>:<hex digest>`.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{DateTime, Utc};
use sha2::{Digest as _, Sha256};
use uuid::Uuid;

use crate::{AppState, error::ApiError};
use mela_core::store::GatheringStore;

/// Secret material shared with the identity collaborator.
#[derive(Clone)]
pub struct AuthConfig {
  pub token_secret: String,
}

/// The authenticated principal, extracted before any handler body runs.
pub struct Identity(pub Uuid);

// ─── Token primitives ────────────────────────────────────────────────────────

fn signature(secret: &str, principal: Uuid, expiry: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(secret.as_bytes());
  hasher.update(b":");
  hasher.update(principal.as_bytes());
  hasher.update(b":");
  hasher.update(expiry.as_bytes());
  hex::encode(hasher.finalize())
}

// Length check first; the fold never short-circuits.
fn digest_eq(a: &[u8], b: &[u8]) -> bool {
  a.len() == b.len()
    && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Mint a signed bearer token for `principal`, valid until
/// `expires_at`. Used by the server's token helper mode and by tests.
pub fn issue_token(secret: &str, principal: Uuid, expires_at: DateTime<Utc>) -> String {
  let expiry = expires_at.to_rfc3339();
  let sig = signature(secret, principal, &expiry);
  B64.encode(format!("{principal}:{expiry}:{sig}"))
}

/// Verify the `Authorization: Bearer` credential and resolve it to a
/// principal id. Any malformed, tampered, or expired token maps to
/// [`ApiError::Unauthenticated`] — callers learn nothing more.
pub fn verify_token(headers: &HeaderMap, config: &AuthConfig) -> Result<Uuid, ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthenticated)?;

  let encoded = header_val
    .strip_prefix("Bearer ")
    .ok_or(ApiError::Unauthenticated)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthenticated)?;
  let token = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthenticated)?;

  // The expiry is RFC 3339 and contains `:`; the digest is the part
  // after the last separator.
  let (head, sig) = token.rsplit_once(':').ok_or(ApiError::Unauthenticated)?;
  let (principal_str, expiry) = head.split_once(':').ok_or(ApiError::Unauthenticated)?;

  let principal =
    Uuid::parse_str(principal_str).map_err(|_| ApiError::Unauthenticated)?;

  let expected = signature(&config.token_secret, principal, expiry);
  if !digest_eq(sig.as_bytes(), expected.as_bytes()) {
    return Err(ApiError::Unauthenticated);
  }

  let expires_at =
    DateTime::parse_from_rfc3339(expiry).map_err(|_| ApiError::Unauthenticated)?;
  if expires_at < Utc::now() {
    return Err(ApiError::Unauthenticated);
  }

  Ok(principal)
}

impl<S> FromRequestParts<AppState<S>> for Identity
where
  S: GatheringStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let principal = verify_token(&parts.headers, &state.auth)?;
    Ok(Identity(principal))
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  const SECRET: &str = "test-secret";

  fn config() -> AuthConfig {
    AuthConfig { token_secret: SECRET.to_owned() }
  }

  fn headers_with(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, value.parse().unwrap());
    headers
  }

  #[test]
  fn valid_token_resolves_the_principal() {
    let principal = Uuid::new_v4();
    let token = issue_token(SECRET, principal, Utc::now() + Duration::hours(1));
    let resolved = verify_token(&headers_with(&format!("Bearer {token}")), &config());
    assert_eq!(resolved.unwrap(), principal);
  }

  #[test]
  fn missing_header_is_rejected() {
    let result = verify_token(&HeaderMap::new(), &config());
    assert!(matches!(result, Err(ApiError::Unauthenticated)));
  }

  #[test]
  fn non_bearer_scheme_is_rejected() {
    let result = verify_token(&headers_with("Basic dXNlcjpwYXNz"), &config());
    assert!(matches!(result, Err(ApiError::Unauthenticated)));
  }

  #[test]
  fn expired_token_is_rejected() {
    let principal = Uuid::new_v4();
    let token = issue_token(SECRET, principal, Utc::now() - Duration::minutes(1));
    let result = verify_token(&headers_with(&format!("Bearer {token}")), &config());
    assert!(matches!(result, Err(ApiError::Unauthenticated)));
  }

  #[test]
  fn token_signed_with_another_secret_is_rejected() {
    let principal = Uuid::new_v4();
    let token = issue_token("other-secret", principal, Utc::now() + Duration::hours(1));
    let result = verify_token(&headers_with(&format!("Bearer {token}")), &config());
    assert!(matches!(result, Err(ApiError::Unauthenticated)));
  }

  #[test]
  fn tampered_payload_is_rejected() {
    let principal = Uuid::new_v4();
    let token = issue_token(SECRET, principal, Utc::now() + Duration::hours(1));
    let decoded = B64.decode(&token).unwrap();
    let mut forged = String::from_utf8(decoded).unwrap();
    // Swap the principal for a different one, keeping the signature.
    forged.replace_range(..36, &Uuid::new_v4().to_string());
    let reencoded = B64.encode(forged);
    let result = verify_token(&headers_with(&format!("Bearer {reencoded}")), &config());
    assert!(matches!(result, Err(ApiError::Unauthenticated)));
  }

  #[test]
  fn garbage_base64_is_rejected() {
    let result = verify_token(&headers_with("Bearer !!!not-base64!!!"), &config());
    assert!(matches!(result, Err(ApiError::Unauthenticated)));
  }
}
