//! [`SqliteStore`] — the SQLite implementation of [`RegionStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use edumap_core::{
  region::{District, Identity, RegionPatch, RegionRecord, UpsertOutcome},
  store::RegionStore,
};

use crate::{
  encode::{REGION_COLUMNS, RawRegion, encode_districts, encode_dt, encode_uuid},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A region store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// run on one connection thread, so each call is serialised with respect to
/// the others.
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

  /// Open an in-memory store, useful for testing.
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

// ─── Connection-thread helpers ───────────────────────────────────────────────

/// Errors raised inside a `call` closure that are not `rusqlite` errors.
fn other<E>(e: E) -> tokio_rusqlite::Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  tokio_rusqlite::Error::Other(Box::new(e))
}

/// OR-match on the non-empty half of an identity. A code hit ranks above a
/// name hit; otherwise the oldest row wins.
fn find_raw(
  conn: &rusqlite::Connection,
  code: Option<&str>,
  name: Option<&str>,
) -> rusqlite::Result<Option<RawRegion>> {
  conn
    .query_row(
      &format!(
        "SELECT {REGION_COLUMNS} FROM regions
         WHERE (?1 IS NOT NULL AND code = ?1)
            OR (?2 IS NOT NULL AND name = ?2)
         ORDER BY (?1 IS NOT NULL AND code = ?1) DESC, rowid
         LIMIT 1"
      ),
      rusqlite::params![code, name],
      RawRegion::from_row,
    )
    .optional()
}

fn write_region(
  conn: &rusqlite::Connection,
  record: &RegionRecord,
  insert: bool,
) -> Result<(), tokio_rusqlite::Error> {
  let districts = encode_districts(&record.districts).map_err(other)?;
  let sql = if insert {
    "INSERT INTO regions (
       region_id, code, name, score, literacy_pct, enrolment_pct,
       infra_index_pct, districts, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
  } else {
    "UPDATE regions SET
       code = ?2, name = ?3, score = ?4, literacy_pct = ?5, enrolment_pct = ?6,
       infra_index_pct = ?7, districts = ?8, created_at = ?9, updated_at = ?10
     WHERE region_id = ?1"
  };
  conn.execute(
    sql,
    rusqlite::params![
      encode_uuid(record.region_id),
      record.code,
      record.name,
      record.score,
      record.literacy_pct,
      record.enrolment_pct,
      record.infra_index_pct,
      districts,
      encode_dt(record.created_at),
      encode_dt(record.updated_at),
    ],
  )?;
  Ok(())
}

// ─── RegionStore impl ────────────────────────────────────────────────────────

impl RegionStore for SqliteStore {
  type Error = Error;

  async fn list_regions(&self) -> Result<Vec<RegionRecord>> {
    let raws: Vec<RawRegion> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {REGION_COLUMNS} FROM regions ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], RawRegion::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRegion::into_record).collect()
  }

  async fn find_region(&self, identity: &Identity) -> Result<Option<RegionRecord>> {
    if identity.is_empty() {
      return Ok(None);
    }
    let code = identity.code.clone();
    let name = identity.name.clone();

    let raw: Option<RawRegion> = self
      .conn
      .call(move |conn| Ok(find_raw(conn, code.as_deref(), name.as_deref())?))
      .await?;

    raw.map(RawRegion::into_record).transpose()
  }

  async fn upsert_region(&self, patch: RegionPatch) -> Result<UpsertOutcome> {
    if patch.identity.is_empty() {
      return Err(edumap_core::Error::MissingIdentity.into());
    }

    let outcome = self
      .conn
      .call(move |conn| {
        let now = Utc::now();
        let tx = conn.transaction()?;

        let existing = find_raw(
          &tx,
          patch.identity.code.as_deref(),
          patch.identity.name.as_deref(),
        )?;

        let outcome = match existing {
          Some(raw) => {
            let mut record = raw.into_record().map_err(other)?;
            record.apply(&patch, now);
            write_region(&tx, &record, false)?;
            UpsertOutcome::Updated(record)
          }
          None => {
            let record = RegionRecord::from_patch(&patch, now).map_err(other)?;
            write_region(&tx, &record, true)?;
            UpsertOutcome::Inserted(record)
          }
        };

        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    let record = outcome.record();
    tracing::debug!(
      region_id = %record.region_id,
      code = %record.code,
      inserted = outcome.is_insert(),
      "upserted region"
    );
    Ok(outcome)
  }

  async fn set_districts(
    &self,
    code: String,
    districts: Vec<District>,
  ) -> Result<Option<RegionRecord>> {
    if code.trim().is_empty() {
      return Ok(None);
    }
    let districts_json = encode_districts(&districts)?;
    let at_str = encode_dt(Utc::now());

    let raw: Option<RawRegion> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let target: Option<i64> = tx
          .query_row(
            "SELECT rowid FROM regions WHERE code = ?1 ORDER BY rowid LIMIT 1",
            rusqlite::params![code],
            |r| r.get(0),
          )
          .optional()?;

        let Some(rowid) = target else {
          return Ok(None);
        };

        tx.execute(
          "UPDATE regions SET districts = ?1, updated_at = ?2 WHERE rowid = ?3",
          rusqlite::params![districts_json, at_str, rowid],
        )?;
        let raw = tx.query_row(
          &format!("SELECT {REGION_COLUMNS} FROM regions WHERE rowid = ?1"),
          rusqlite::params![rowid],
          RawRegion::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawRegion::into_record).transpose()
  }
}
