//! [`SqliteStore`] — the SQLite implementation of [`GatheringStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use mela_core::{
  gathering::{AttendanceChange, Gathering, NewGathering},
  geo::{self, GeoPoint},
  store::GatheringStore,
};

use crate::{
  encode::{encode_dt, encode_uuid, RawGathering},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A gathering store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// calls are executed on the connection's dedicated thread, so write
/// transactions never interleave.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

const GATHERING_COLUMNS: &str = "g.gathering_id, g.title, g.description, \
   g.additional_details, g.lng, g.lat, g.start_time, g.end_time, \
   g.image_ref, g.created_by, g.created_at, g.updated_at";

fn read_gathering_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawGathering> {
  Ok(RawGathering {
    gathering_id:       row.get(0)?,
    title:              row.get(1)?,
    description:        row.get(2)?,
    additional_details: row.get(3)?,
    lng:                row.get(4)?,
    lat:                row.get(5)?,
    start_time:         row.get(6)?,
    end_time:           row.get(7)?,
    image_ref:          row.get(8)?,
    created_by:         row.get(9)?,
    created_at:         row.get(10)?,
    updated_at:         row.get(11)?,
    attendees:          Vec::new(),
  })
}

/// Attendee ids for one gathering, oldest first.
fn attendees_for(
  conn: &rusqlite::Connection,
  gathering_id: &str,
) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(
    "SELECT principal_id FROM attendance
     WHERE gathering_id = ?1
     ORDER BY recorded_at, rowid",
  )?;
  stmt
    .query_map(rusqlite::params![gathering_id], |row| row.get(0))?
    .collect()
}

// ─── GatheringStore impl ─────────────────────────────────────────────────────

impl GatheringStore for SqliteStore {
  type Error = Error;

  async fn create_gathering(&self, input: NewGathering) -> Result<Gathering> {
    input.validate()?;

    let now = Utc::now();
    let gathering = Gathering {
      id:                 Uuid::new_v4(),
      title:              input.title,
      description:        input.description,
      additional_details: input.additional_details,
      location:           input.location,
      start_time:         input.start_time,
      end_time:           input.end_time,
      image_ref:          input.image_ref,
      created_by:         input.created_by,
      attendees:          Vec::new(),
      created_at:         now,
      updated_at:         now,
    };

    let id_str         = encode_uuid(gathering.id);
    let title          = gathering.title.clone();
    let description    = gathering.description.clone();
    let details        = gathering.additional_details.clone();
    let lng            = gathering.location.lng;
    let lat            = gathering.location.lat;
    let start_str      = encode_dt(gathering.start_time);
    let end_str        = encode_dt(gathering.end_time);
    let image_ref      = gathering.image_ref.clone();
    let created_by_str = encode_uuid(gathering.created_by);
    let at_str         = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        // Row and index entry land together or not at all.
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO gatherings (
             gathering_id, title, description, additional_details,
             lng, lat, start_time, end_time,
             image_ref, created_by, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
          rusqlite::params![
            id_str,
            title,
            description,
            details,
            lng,
            lat,
            start_str,
            end_str,
            image_ref,
            created_by_str,
            at_str,
          ],
        )?;
        let rowid = tx.last_insert_rowid();
        tx.execute(
          "INSERT INTO gatherings_rtree (id, min_lng, max_lng, min_lat, max_lat)
           VALUES (?1, ?2, ?2, ?3, ?3)",
          rusqlite::params![rowid, lng, lat],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(gathering)
  }

  async fn get_gathering(&self, id: Uuid) -> Result<Option<Gathering>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawGathering> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            &format!(
              "SELECT {GATHERING_COLUMNS} FROM gatherings g
               WHERE g.gathering_id = ?1"
            ),
            rusqlite::params![id_str],
            read_gathering_row,
          )
          .optional()?;

        let Some(mut raw) = row else { return Ok(None) };
        raw.attendees = attendees_for(conn, &raw.gathering_id)?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawGathering::into_gathering).transpose()
  }

  async fn list_gatherings(&self) -> Result<Vec<Gathering>> {
    let raws: Vec<RawGathering> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {GATHERING_COLUMNS} FROM gatherings g ORDER BY g.rowid"
        ))?;
        let mut rows = stmt
          .query_map([], read_gathering_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        for raw in &mut rows {
          raw.attendees = attendees_for(conn, &raw.gathering_id)?;
        }
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGathering::into_gathering).collect()
  }

  async fn nearby(
    &self,
    origin: GeoPoint,
    max_distance_m: f64,
  ) -> Result<Vec<Gathering>> {
    let bbox = geo::bounding_box(origin, max_distance_m);

    let raws: Vec<RawGathering> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {GATHERING_COLUMNS}
           FROM gatherings_rtree r
           JOIN gatherings g ON g.rowid = r.id
           WHERE r.min_lng >= ?1 AND r.max_lng <= ?2
             AND r.min_lat >= ?3 AND r.max_lat <= ?4"
        ))?;
        let mut rows = stmt
          .query_map(
            rusqlite::params![bbox.min_lng, bbox.max_lng, bbox.min_lat, bbox.max_lat],
            read_gathering_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        for raw in &mut rows {
          raw.attendees = attendees_for(conn, &raw.gathering_id)?;
        }
        Ok(rows)
      })
      .await?;

    // The box over-approximates; keep only true hits and order them.
    let mut hits: Vec<(Gathering, f64)> = Vec::with_capacity(raws.len());
    for raw in raws {
      let gathering = raw.into_gathering()?;
      let distance = geo::haversine_m(origin, gathering.location);
      if distance <= max_distance_m {
        hits.push((gathering, distance));
      }
    }
    hits.sort_by(|a, b| a.1.total_cmp(&b.1));

    Ok(hits.into_iter().map(|(g, _)| g).collect())
  }

  async fn toggle_attendance(
    &self,
    id: Uuid,
    principal: Uuid,
  ) -> Result<Option<AttendanceChange>> {
    let id_str        = encode_uuid(id);
    let principal_str = encode_uuid(principal);
    let now_str       = encode_dt(Utc::now());

    let change = self
      .conn
      .call(move |conn| {
        // One transaction on the store's single connection thread: the
        // read-modify-write cannot interleave with another toggle.
        let tx = conn.transaction()?;

        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM gatherings WHERE gathering_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(None);
        }

        let attending_before: bool = tx
          .query_row(
            "SELECT 1 FROM attendance
             WHERE gathering_id = ?1 AND principal_id = ?2",
            rusqlite::params![id_str, principal_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if attending_before {
          tx.execute(
            "DELETE FROM attendance
             WHERE gathering_id = ?1 AND principal_id = ?2",
            rusqlite::params![id_str, principal_str],
          )?;
        } else {
          tx.execute(
            "INSERT INTO attendance (gathering_id, principal_id, recorded_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![id_str, principal_str, now_str],
          )?;
        }

        let count: i64 = tx.query_row(
          "SELECT COUNT(*) FROM attendance WHERE gathering_id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?;

        tx.execute(
          "UPDATE gatherings SET updated_at = ?2 WHERE gathering_id = ?1",
          rusqlite::params![id_str, now_str],
        )?;

        tx.commit()?;
        Ok(Some(AttendanceChange {
          attending:       !attending_before,
          attendees_count: count as u64,
        }))
      })
      .await?;

    Ok(change)
  }
}
