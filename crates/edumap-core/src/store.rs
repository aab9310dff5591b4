//! The `RegionStore` trait.
//!
//! Implemented by storage backends (e.g. `edumap-store-sqlite`). The ingestion
//! and aggregation layers depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use crate::region::{District, Identity, RegionPatch, RegionRecord, UpsertOutcome};

/// Abstraction over a persistent region record store.
///
/// Records are created or merged, never deleted. Concurrent upserts that
/// target the same identity are last-write-wins; the trait offers no
/// cross-call locking.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RegionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All records, in insertion order.
  fn list_regions(
    &self,
  ) -> impl Future<Output = Result<Vec<RegionRecord>, Self::Error>> + Send + '_;

  /// Find the record matching either half of `identity`.
  ///
  /// Only non-empty fields take part in the match. A code match is preferred
  /// over a name match; ties fall back to insertion order. Returns `None`
  /// when nothing matches or `identity` is empty.
  fn find_region<'a>(
    &'a self,
    identity: &'a Identity,
  ) -> impl Future<Output = Result<Option<RegionRecord>, Self::Error>> + Send + 'a;

  /// Look up the record matching `patch.identity` and merge into it, or
  /// insert a new record when there is none. The lookup and the write happen
  /// in a single store call.
  ///
  /// Returns an error if the patch carries no identity.
  fn upsert_region(
    &self,
    patch: RegionPatch,
  ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send + '_;

  /// Replace the district list of the state whose code is `code`.
  /// Returns `None` if no such state exists.
  fn set_districts(
    &self,
    code: String,
    districts: Vec<District>,
  ) -> impl Future<Output = Result<Option<RegionRecord>, Self::Error>> + Send + '_;
}
