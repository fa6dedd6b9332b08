//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings; UUIDs as hyphenated
//! lowercase strings; coordinates as REAL columns read back verbatim.

use chrono::{DateTime, Utc};
use mela_core::{gathering::Gathering, geo::GeoPoint};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `gatherings` row, attendees hydrated
/// separately from the attendance relation.
pub struct RawGathering {
  pub gathering_id:       String,
  pub title:              String,
  pub description:        String,
  pub additional_details: Option<String>,
  pub lng:                f64,
  pub lat:                f64,
  pub start_time:         String,
  pub end_time:           String,
  pub image_ref:          Option<String>,
  pub created_by:         String,
  pub created_at:         String,
  pub updated_at:         String,
  pub attendees:          Vec<String>,
}

impl RawGathering {
  pub fn into_gathering(self) -> Result<Gathering> {
    let attendees = self
      .attendees
      .iter()
      .map(|s| decode_uuid(s))
      .collect::<Result<Vec<_>>>()?;

    Ok(Gathering {
      id:                 decode_uuid(&self.gathering_id)?,
      title:              self.title,
      description:        self.description,
      additional_details: self.additional_details,
      location:           GeoPoint::new(self.lng, self.lat),
      start_time:         decode_dt(&self.start_time)?,
      end_time:           decode_dt(&self.end_time)?,
      image_ref:          self.image_ref,
      created_by:         decode_uuid(&self.created_by)?,
      attendees,
      created_at:         decode_dt(&self.created_at)?,
      updated_at:         decode_dt(&self.updated_at)?,
    })
  }
}
