//! Handlers for `/gatherings` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/gatherings` | 201 with the created record |
//! | `GET`  | `/gatherings` | all gatherings, insertion order |
//! | `GET`  | `/gatherings/nearby` | `?lng&lat[&maxDistance]`, ordered by distance |
//! | `GET`  | `/gatherings/:id` | 404 if not found |
//! | `POST` | `/gatherings/:id/attend` | toggles the caller's attendance |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use mela_core::{
  gathering::{AttendanceChange, Gathering, NewGathering},
  geo::GeoPoint,
  store::GatheringStore,
};
use mela_media::UploadedAsset;
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::Identity, error::ApiError};

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub title:              String,
  pub description:        String,
  pub location:           GeoPoint,
  pub start_time:         DateTime<Utc>,
  pub end_time:           DateTime<Utc>,
  #[serde(default)]
  pub additional_details: Option<String>,
  /// Asset already stored by the ingestion collaborator, if the
  /// gathering has an image.
  #[serde(default)]
  pub image_asset:        Option<UploadedAsset>,
}

/// `POST /gatherings`
///
/// A failed media resolution is not a request failure: the gathering is
/// created without an image and the failure is logged.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Identity(principal): Identity,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GatheringStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let image_ref = body.image_asset.as_ref().and_then(|asset| {
    match state.media.resolve(asset) {
      Ok(url) => Some(url),
      Err(e) => {
        tracing::warn!(error = %e, "media resolution failed; creating gathering without image");
        None
      }
    }
  });

  let input = NewGathering {
    title:              body.title,
    description:        body.description,
    additional_details: body.additional_details,
    location:           body.location,
    start_time:         body.start_time,
    end_time:           body.end_time,
    image_ref,
    created_by:         principal,
  };
  input.validate()?;

  let gathering = state
    .store
    .create_gathering(input)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(gathering)))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /gatherings`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Identity(_principal): Identity,
) -> Result<Json<Vec<Gathering>>, ApiError>
where
  S: GatheringStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let gatherings = state
    .store
    .list_gatherings()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(gatherings))
}

// ─── Nearby ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyParams {
  pub lng:          f64,
  pub lat:          f64,
  /// Radius override in meters; the configured default applies when
  /// absent.
  pub max_distance: Option<f64>,
}

/// `GET /gatherings/nearby?lng=<deg>&lat=<deg>[&maxDistance=<m>]`
pub async fn nearby<S>(
  State(state): State<AppState<S>>,
  Identity(_principal): Identity,
  Query(params): Query<NearbyParams>,
) -> Result<Json<Vec<Gathering>>, ApiError>
where
  S: GatheringStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let origin = GeoPoint::new(params.lng, params.lat);
  origin.validate()?;

  let radius = params
    .max_distance
    .unwrap_or(state.config.default_radius_m);
  if !radius.is_finite() || radius <= 0.0 {
    return Err(
      mela_core::ValidationError::new(
        "maxDistance",
        format!("{radius} is not a positive distance in meters"),
      )
      .into(),
    );
  }

  let gatherings = state
    .store
    .nearby(origin, radius)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(gatherings))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /gatherings/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Identity(_principal): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Gathering>, ApiError>
where
  S: GatheringStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let gathering = state
    .store
    .get_gathering(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("gathering {id} not found")))?;
  Ok(Json(gathering))
}

// ─── Attend ──────────────────────────────────────────────────────────────────

/// `POST /gatherings/:id/attend` — flips the caller's attendance.
pub async fn attend<S>(
  State(state): State<AppState<S>>,
  Identity(principal): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<AttendanceChange>, ApiError>
where
  S: GatheringStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let change = state
    .store
    .toggle_attendance(id, principal)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("gathering {id} not found")))?;
  Ok(Json(change))
}
