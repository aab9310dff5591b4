//! Store doubles shared by the unit tests.

use std::{
  future::Future,
  sync::atomic::{AtomicUsize, Ordering},
};

use chrono::Utc;
use edumap_core::{
  region::{District, Identity, RegionPatch, RegionRecord, UpsertOutcome},
  store::RegionStore,
};

#[derive(Debug, thiserror::Error)]
#[error("store is down")]
pub struct Down;

/// A store that is unreachable for reads and accepts only the first
/// `healthy_upserts` writes before failing every later one.
#[derive(Default)]
pub struct DownStore {
  healthy_upserts: usize,
  upsert_calls:    AtomicUsize,
}

impl DownStore {
  pub fn failing_after(healthy_upserts: usize) -> Self {
    Self { healthy_upserts, ..Self::default() }
  }

  /// Number of upserts attempted so far, including failed ones.
  pub fn upsert_calls(&self) -> usize { self.upsert_calls.load(Ordering::SeqCst) }
}

impl RegionStore for DownStore {
  type Error = Down;

  fn list_regions(&self) -> impl Future<Output = Result<Vec<RegionRecord>, Down>> + Send + '_ {
    async { Err(Down) }
  }

  fn find_region<'a>(
    &'a self,
    _: &'a Identity,
  ) -> impl Future<Output = Result<Option<RegionRecord>, Down>> + Send + 'a {
    async { Err(Down) }
  }

  fn upsert_region(
    &self,
    patch: RegionPatch,
  ) -> impl Future<Output = Result<UpsertOutcome, Down>> + Send + '_ {
    let call = self.upsert_calls.fetch_add(1, Ordering::SeqCst);
    async move {
      if call >= self.healthy_upserts {
        return Err(Down);
      }
      RegionRecord::from_patch(&patch, Utc::now())
        .map(UpsertOutcome::Inserted)
        .map_err(|_| Down)
    }
  }

  fn set_districts(
    &self,
    _: String,
    _: Vec<District>,
  ) -> impl Future<Output = Result<Option<RegionRecord>, Down>> + Send + '_ {
    async { Err(Down) }
  }
}
