//! SQL schema for the EduMap SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for future migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per state. Rows are merged in place and never deleted.
-- Insertion order (rowid) is the canonical listing order.
CREATE TABLE IF NOT EXISTS regions (
    region_id       TEXT PRIMARY KEY,
    code            TEXT NOT NULL DEFAULT '',
    name            TEXT NOT NULL DEFAULT '',
    score           INTEGER NOT NULL DEFAULT 0,
    literacy_pct    REAL,
    enrolment_pct   REAL,
    infra_index_pct REAL,
    districts       TEXT NOT NULL DEFAULT '[]',   -- JSON array of districts
    created_at      TEXT NOT NULL,                -- ISO 8601 UTC
    updated_at      TEXT NOT NULL,
    CHECK (code <> '' OR name <> ''),
    CHECK (score BETWEEN 0 AND 2)
);

CREATE INDEX IF NOT EXISTS regions_code_idx ON regions(code);
CREATE INDEX IF NOT EXISTS regions_name_idx ON regions(name);

PRAGMA user_version = 1;
";
