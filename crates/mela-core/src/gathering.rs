//! Gathering — a published, geolocated, time-bounded community event.
//!
//! A gathering is write-once: there is no edit or delete operation in
//! the contract. The only mutation after creation is the attendance
//! toggle, which operates on the attendee relation, never on the record
//! fields themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ValidationError, geo::GeoPoint};

/// A published gathering record.
///
/// `attendees` is hydrated from the attendance relation on read and is
/// mutated only through
/// [`GatheringStore::toggle_attendance`](crate::store::GatheringStore::toggle_attendance);
/// it never contains a principal twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gathering {
  pub id:                 Uuid,
  pub title:              String,
  pub description:        String,
  pub additional_details: Option<String>,
  pub location:           GeoPoint,
  pub start_time:         DateTime<Utc>,
  pub end_time:           DateTime<Utc>,
  /// Stable reference URL produced by the media resolver; `None` means
  /// the gathering has no image.
  pub image_ref:          Option<String>,
  pub created_by:         Uuid,
  pub attendees:          Vec<Uuid>,
  /// Server-assigned audit stamps; `updated_at` moves when attendance
  /// changes.
  pub created_at:         DateTime<Utc>,
  pub updated_at:         DateTime<Utc>,
}

// ─── NewGathering ────────────────────────────────────────────────────────────

/// Input to [`GatheringStore::create_gathering`](crate::store::GatheringStore::create_gathering).
/// The id and audit stamps are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewGathering {
  pub title:              String,
  pub description:        String,
  pub additional_details: Option<String>,
  pub location:           GeoPoint,
  pub start_time:         DateTime<Utc>,
  pub end_time:           DateTime<Utc>,
  pub image_ref:          Option<String>,
  pub created_by:         Uuid,
}

impl NewGathering {
  /// Check every creation invariant, reporting the first violated field.
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.title.trim().is_empty() {
      return Err(ValidationError::new("title", "must not be empty"));
    }
    if self.description.trim().is_empty() {
      return Err(ValidationError::new("description", "must not be empty"));
    }
    self.location.validate()?;
    if self.start_time >= self.end_time {
      return Err(ValidationError::new(
        "startTime",
        format!(
          "startTime ({}) must be strictly before endTime ({})",
          self.start_time, self.end_time
        ),
      ));
    }
    Ok(())
  }
}

// ─── AttendanceChange ────────────────────────────────────────────────────────

/// Result of an attendance toggle: the principal's state after the
/// flip and the post-toggle attendee count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceChange {
  pub attending:       bool,
  pub attendees_count: u64,
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn input() -> NewGathering {
    NewGathering {
      title:              "Community lunch".into(),
      description:        "Free meal for everyone".into(),
      additional_details: None,
      location:           GeoPoint::new(77.0, 28.0),
      start_time:         Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
      end_time:           Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
      image_ref:          None,
      created_by:         Uuid::new_v4(),
    }
  }

  #[test]
  fn valid_input_passes() {
    assert!(input().validate().is_ok());
  }

  #[test]
  fn blank_title_is_rejected() {
    let mut g = input();
    g.title = "   ".into();
    assert_eq!(g.validate().unwrap_err().field, "title");
  }

  #[test]
  fn blank_description_is_rejected() {
    let mut g = input();
    g.description = String::new();
    assert_eq!(g.validate().unwrap_err().field, "description");
  }

  #[test]
  fn equal_start_and_end_are_rejected() {
    let mut g = input();
    g.end_time = g.start_time;
    assert_eq!(g.validate().unwrap_err().field, "startTime");
  }

  #[test]
  fn reversed_times_are_rejected() {
    let mut g = input();
    std::mem::swap(&mut g.start_time, &mut g.end_time);
    assert_eq!(g.validate().unwrap_err().field, "startTime");
  }

  #[test]
  fn out_of_range_coordinates_are_rejected() {
    let mut g = input();
    g.location = GeoPoint::new(200.0, 28.0);
    assert_eq!(g.validate().unwrap_err().field, "location.lng");
  }

  #[test]
  fn gathering_serialises_with_camel_case_wire_names() {
    let g = Gathering {
      id:                 Uuid::new_v4(),
      title:              "t".into(),
      description:        "d".into(),
      additional_details: None,
      location:           GeoPoint::new(1.0, 2.0),
      start_time:         Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
      end_time:           Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
      image_ref:          None,
      created_by:         Uuid::new_v4(),
      attendees:          vec![],
      created_at:         Utc::now(),
      updated_at:         Utc::now(),
    };
    let json = serde_json::to_value(&g).unwrap();
    assert!(json.get("startTime").is_some());
    assert!(json.get("additionalDetails").is_some());
    assert!(json.get("imageRef").is_some());
    assert!(json.get("createdBy").is_some());
  }
}
