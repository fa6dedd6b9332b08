//! WGS-84 coordinates and spherical-earth distance math.
//!
//! Proximity search works in two steps: an axis-aligned bounding box
//! derived from the radius probes the store's spatial index, then the
//! exact great-circle distance filters and orders the candidates. Both
//! halves live here so they can be tested without a database.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Mean earth radius in meters (IUGG spherical approximation).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// ─── GeoPoint ────────────────────────────────────────────────────────────────

/// A WGS-84 point in degrees; longitude first, matching GeoJSON order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
  pub lng: f64,
  pub lat: f64,
}

impl GeoPoint {
  pub fn new(lng: f64, lat: f64) -> Self {
    Self { lng, lat }
  }

  /// Reject non-finite or out-of-range coordinates.
  pub fn validate(&self) -> Result<(), ValidationError> {
    if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
      return Err(ValidationError::new(
        "location.lng",
        format!("{} is outside [-180, 180]", self.lng),
      ));
    }
    if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
      return Err(ValidationError::new(
        "location.lat",
        format!("{} is outside [-90, 90]", self.lat),
      ));
    }
    Ok(())
  }
}

// ─── Distance ────────────────────────────────────────────────────────────────

/// Great-circle distance between two points in meters (haversine).
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
  let phi_a = a.lat.to_radians();
  let phi_b = b.lat.to_radians();
  let d_phi = (b.lat - a.lat).to_radians();
  let d_lambda = (b.lng - a.lng).to_radians();

  let h = (d_phi / 2.0).sin().powi(2)
    + phi_a.cos() * phi_b.cos() * (d_lambda / 2.0).sin().powi(2);

  2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

// ─── Bounding box ────────────────────────────────────────────────────────────

/// An axis-aligned box in degrees, used to probe the spatial index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
  pub min_lng: f64,
  pub max_lng: f64,
  pub min_lat: f64,
  pub max_lat: f64,
}

/// The smallest axis-aligned box containing every point within
/// `radius_m` meters of `origin`.
///
/// Longitude degrees shrink with the cosine of latitude, so the span is
/// computed at the widest-reaching latitude the box touches. Boxes that
/// would cross a pole or the antimeridian widen to the full longitude
/// range; the exact distance filter discards the excess candidates.
pub fn bounding_box(origin: GeoPoint, radius_m: f64) -> BoundingBox {
  let d_lat = (radius_m / EARTH_RADIUS_M).to_degrees();
  let min_lat = (origin.lat - d_lat).max(-90.0);
  let max_lat = (origin.lat + d_lat).min(90.0);

  let full_lng = BoundingBox {
    min_lng: -180.0,
    max_lng: 180.0,
    min_lat,
    max_lat,
  };

  let lat_extreme = min_lat.abs().max(max_lat.abs());
  let cos_lat = lat_extreme.to_radians().cos();
  if cos_lat <= f64::EPSILON {
    return full_lng;
  }

  let d_lng = d_lat / cos_lat;
  let min_lng = origin.lng - d_lng;
  let max_lng = origin.lng + d_lng;
  if min_lng < -180.0 || max_lng > 180.0 {
    return full_lng;
  }

  BoundingBox { min_lng, max_lng, min_lat, max_lat }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn coincident_points_have_zero_distance() {
    let p = GeoPoint::new(77.0, 28.0);
    assert_eq!(haversine_m(p, p), 0.0);
  }

  #[test]
  fn one_degree_of_latitude_is_about_111_km() {
    let a = GeoPoint::new(0.0, 0.0);
    let b = GeoPoint::new(0.0, 1.0);
    let d = haversine_m(a, b);
    assert!((d - 111_195.0).abs() < 100.0, "got {d}");
  }

  #[test]
  fn short_diagonal_hop_near_delhi() {
    // ~55.6 m north and ~49.1 m east: the hypotenuse is ~74 m.
    let a = GeoPoint::new(77.0, 28.0);
    let b = GeoPoint::new(77.0005, 28.0005);
    let d = haversine_m(a, b);
    assert!((70.0..80.0).contains(&d), "got {d}");
  }

  #[test]
  fn antipodal_points_are_half_the_circumference() {
    let a = GeoPoint::new(0.0, 0.0);
    let b = GeoPoint::new(180.0, 0.0);
    let d = haversine_m(a, b);
    let half = std::f64::consts::PI * EARTH_RADIUS_M;
    assert!((d - half).abs() < 1.0, "got {d}, expected {half}");
  }

  #[test]
  fn validate_accepts_range_limits() {
    assert!(GeoPoint::new(-180.0, -90.0).validate().is_ok());
    assert!(GeoPoint::new(180.0, 90.0).validate().is_ok());
  }

  #[test]
  fn validate_rejects_out_of_range_longitude() {
    let err = GeoPoint::new(180.5, 0.0).validate().unwrap_err();
    assert_eq!(err.field, "location.lng");
  }

  #[test]
  fn validate_rejects_out_of_range_latitude() {
    let err = GeoPoint::new(0.0, -91.0).validate().unwrap_err();
    assert_eq!(err.field, "location.lat");
  }

  #[test]
  fn validate_rejects_non_finite_coordinates() {
    assert!(GeoPoint::new(f64::NAN, 0.0).validate().is_err());
    assert!(GeoPoint::new(0.0, f64::INFINITY).validate().is_err());
  }

  #[test]
  fn bounding_box_contains_points_within_radius() {
    let origin = GeoPoint::new(77.0, 28.0);
    let radius = 2000.0;
    let bbox = bounding_box(origin, radius);

    // Walk the circle of exactly `radius` meters; every point must fall
    // inside the box.
    for step in 0..36 {
      let bearing = f64::from(step) * 10.0_f64.to_radians();
      let d_lat = (radius / EARTH_RADIUS_M).to_degrees() * bearing.cos();
      let d_lng = (radius / EARTH_RADIUS_M).to_degrees() * bearing.sin()
        / origin.lat.to_radians().cos();
      let p = GeoPoint::new(origin.lng + d_lng, origin.lat + d_lat);
      assert!(
        p.lng >= bbox.min_lng
          && p.lng <= bbox.max_lng
          && p.lat >= bbox.min_lat
          && p.lat <= bbox.max_lat,
        "point {p:?} escaped {bbox:?}"
      );
    }
  }

  #[test]
  fn bounding_box_near_pole_covers_full_longitude_range() {
    let bbox = bounding_box(GeoPoint::new(10.0, 89.999), 5000.0);
    assert_eq!(bbox.min_lng, -180.0);
    assert_eq!(bbox.max_lng, 180.0);
    assert_eq!(bbox.max_lat, 90.0);
  }

  #[test]
  fn bounding_box_near_antimeridian_covers_full_longitude_range() {
    let bbox = bounding_box(GeoPoint::new(179.999, 0.0), 2000.0);
    assert_eq!(bbox.min_lng, -180.0);
    assert_eq!(bbox.max_lng, 180.0);
  }
}
