//! Ingestion Upserter: decoded CSV rows into merged region records.

use std::sync::Arc;

use edumap_codec::Record;
use edumap_core::{
  aliases::{AliasSet, CSV_CODE, CSV_ENROLMENT, CSV_INFRA, CSV_LITERACY, CSV_NAME, CSV_SCORE},
  region::{Identity, RegionPatch, coerce_pct, coerce_score},
  store::RegionStore,
};
use serde::{Deserialize, Serialize};

/// Counts reported for one ingested batch. Skipped rows are included in
/// `rows` but not in `upserts`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
  pub rows:    usize,
  pub upserts: usize,
}

/// Writes tabular rows into a [`RegionStore`], one upsert per usable row.
pub struct Upserter<S> {
  store: Arc<S>,
}

impl<S> Clone for Upserter<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: RegionStore> Upserter<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Upsert every row in order. Rows without a code or a name are skipped.
  ///
  /// The first store failure aborts the batch; rows before it stay written.
  pub async fn ingest_csv(&self, records: &[Record]) -> Result<IngestSummary, S::Error> {
    let mut summary = IngestSummary { rows: records.len(), upserts: 0 };
    for (i, record) in records.iter().enumerate() {
      let Some(patch) = patch_from_record(record) else {
        tracing::debug!(row = i + 1, "skipping row without code or name");
        continue;
      };
      self.store.upsert_region(patch).await?;
      summary.upserts += 1;
    }
    tracing::info!(rows = summary.rows, upserts = summary.upserts, "ingested CSV batch");
    Ok(summary)
  }
}

/// Derive the partial update for one row, or `None` when it carries no
/// identity.
pub fn patch_from_record(record: &Record) -> Option<RegionPatch> {
  let cell = |set: &AliasSet| set.first_non_empty(|k| record.get(k).map(String::as_str));

  let identity = Identity::new(
    cell(&CSV_CODE),
    cell(&CSV_NAME),
  );
  if identity.is_empty() {
    return None;
  }

  let pct = |set: &AliasSet| cell(set).and_then(coerce_pct);
  Some(RegionPatch {
    identity,
    score: Some(cell(&CSV_SCORE).map_or(0, coerce_score)),
    literacy_pct: pct(&CSV_LITERACY),
    enrolment_pct: pct(&CSV_ENROLMENT),
    infra_index_pct: pct(&CSV_INFRA),
  })
}
