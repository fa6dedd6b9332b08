//! The `GatheringStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `mela-store-sqlite`). Higher layers (`mela-api`, `mela-server`)
//! depend on this abstraction, not on any concrete backend.
//!
//! All methods return `Send` futures so the trait can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use uuid::Uuid;

use crate::{
  gathering::{AttendanceChange, Gathering, NewGathering},
  geo::GeoPoint,
};

/// Abstraction over a gathering store backend.
///
/// Gatherings are write-once: after [`create_gathering`] the only
/// mutation path is [`toggle_attendance`], which operates on the
/// attendee relation. Implementations must make both operations atomic
/// units — a failed or interrupted call leaves no partial state — and
/// must serialize toggles on the same gathering id.
///
/// [`create_gathering`]: GatheringStore::create_gathering
/// [`toggle_attendance`]: GatheringStore::toggle_attendance
pub trait GatheringStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Validate and persist a new gathering.
  ///
  /// Assigns the id and audit stamps. A validation failure reports the
  /// offending field and persists nothing.
  fn create_gathering(
    &self,
    input: NewGathering,
  ) -> impl Future<Output = Result<Gathering, Self::Error>> + Send + '_;

  /// Retrieve a gathering by id, attendees hydrated. `None` if not
  /// found.
  fn get_gathering(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Gathering>, Self::Error>> + Send + '_;

  /// List all gatherings in insertion order.
  fn list_gatherings(
    &self,
  ) -> impl Future<Output = Result<Vec<Gathering>, Self::Error>> + Send + '_;

  /// Gatherings within `max_distance_m` meters of `origin`, ordered by
  /// ascending great-circle distance. Empty when nothing is in range.
  fn nearby(
    &self,
    origin: GeoPoint,
    max_distance_m: f64,
  ) -> impl Future<Output = Result<Vec<Gathering>, Self::Error>> + Send + '_;

  /// Flip `principal`'s membership in the gathering's attendee set and
  /// return the post-toggle state. `None` when the gathering does not
  /// exist.
  fn toggle_attendance(
    &self,
    id: Uuid,
    principal: Uuid,
  ) -> impl Future<Output = Result<Option<AttendanceChange>, Self::Error>> + Send + '_;
}
