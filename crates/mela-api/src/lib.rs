//! JSON discovery API for Mela.
//!
//! Exposes an axum [`Router`] backed by any
//! [`GatheringStore`](mela_core::store::GatheringStore). Every route
//! passes the bearer-token identity gate before its handler body runs;
//! unauthenticated calls short-circuit with 401 before any store
//! access.

pub mod auth;
pub mod error;
pub mod gatherings;

pub use error::ApiError;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use mela_core::store::GatheringStore;
use mela_media::MediaResolver;

use auth::AuthConfig;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Proximity-search tuning shared by handlers.
#[derive(Debug, Clone)]
pub struct SearchConfig {
  /// Radius in meters applied when a nearby query passes no
  /// `maxDistance`.
  pub default_radius_m: f64,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: GatheringStore> {
  pub store:  Arc<S>,
  pub auth:   Arc<AuthConfig>,
  pub media:  Arc<MediaResolver>,
  pub config: Arc<SearchConfig>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the discovery API router for `state`.
pub fn api_router<S>(state: AppState<S>) -> Router
where
  S: GatheringStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route(
      "/gatherings",
      get(gatherings::list::<S>).post(gatherings::create::<S>),
    )
    .route("/gatherings/nearby", get(gatherings::nearby::<S>))
    .route("/gatherings/{id}", get(gatherings::get_one::<S>))
    .route("/gatherings/{id}/attend", post(gatherings::attend::<S>))
    .with_state(state)
}
