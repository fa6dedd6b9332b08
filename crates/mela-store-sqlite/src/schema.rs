//! SQL schema for the Mela SQLite store.
//!
//! Executed once at connection startup. Future migrations will be
//! gated on the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS gatherings (
    gathering_id       TEXT PRIMARY KEY,
    title              TEXT NOT NULL,
    description        TEXT NOT NULL,
    additional_details TEXT,
    lng                REAL NOT NULL,
    lat                REAL NOT NULL,
    start_time         TEXT NOT NULL,   -- ISO 8601 UTC
    end_time           TEXT NOT NULL,   -- ISO 8601 UTC; start < end checked before insert
    image_ref          TEXT,            -- public media URL or NULL
    created_by         TEXT NOT NULL,
    created_at         TEXT NOT NULL,   -- server-assigned
    updated_at         TEXT NOT NULL    -- moves on attendance changes
);

-- Geospatial index over the gatherings' locations. Each entry is a
-- degenerate [v, v] interval per axis, keyed by the rowid of the
-- gatherings row. Proximity queries probe it with a bounding box and
-- refine with the exact great-circle distance.
CREATE VIRTUAL TABLE IF NOT EXISTS gatherings_rtree USING rtree(
    id,
    min_lng, max_lng,
    min_lat, max_lat
);

-- Attendance relation. The composite primary key makes duplicate
-- attendees unrepresentable; a toggle is an INSERT or DELETE plus the
-- count, all inside one transaction.
CREATE TABLE IF NOT EXISTS attendance (
    gathering_id TEXT NOT NULL REFERENCES gatherings(gathering_id),
    principal_id TEXT NOT NULL,
    recorded_at  TEXT NOT NULL,
    PRIMARY KEY (gathering_id, principal_id)
);

PRAGMA user_version = 1;
";
