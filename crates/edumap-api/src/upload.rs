//! Handler for `POST /upload` and the upload service behind it.
//!
//! | `file_type` | Action | Report |
//! |-------------|--------|--------|
//! | `csv`       | decode, ingest into the store | `{"kind":"csv","rows":N,"upserts":M}` |
//! | `geojson`   | validate, save verbatim | `{"kind":"geojson","saved":"<file>"}` |
//! | `topojson`  | convert, save as `<stem>.geojson` | `{"kind":"topojson","converted":"<file>"}` |
//! | other       | save verbatim | `{"kind":"raw","saved":"<file>"}` |
//!
//! The file comes from the request body, or from `local_path` on the server
//! when the body is empty.

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{
  Json,
  extract::{Query, State},
};
use bytes::Bytes;
use edumap_codec::{GeometryKind, decode_csv_bytes, decode_geometry};
use edumap_core::store::RegionStore;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, ingest::Upserter};

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
  Csv,
  GeoJson,
  TopoJson,
  Raw,
}

impl FileKind {
  /// Parse a declared kind. Unrecognised values yield `None`.
  pub fn parse(declared: &str) -> Option<Self> {
    match declared.trim().to_ascii_lowercase().as_str() {
      "csv" => Some(Self::Csv),
      "geojson" => Some(Self::GeoJson),
      "topojson" => Some(Self::TopoJson),
      "raw" => Some(Self::Raw),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
  /// Declared kind as sent by the client; `None` means raw.
  pub kind:       Option<String>,
  pub file_name:  Option<String>,
  pub body:       Bytes,
  pub local_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum UploadReport {
  Csv { rows: usize, upserts: usize },
  GeoJson { saved: String },
  TopoJson { converted: String },
  Raw { saved: String },
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct Uploader<S> {
  upserter:    Upserter<S>,
  uploads_dir: PathBuf,
}

impl<S: RegionStore> Uploader<S> {
  pub fn new(store: Arc<S>, uploads_dir: PathBuf) -> Self {
    Self { upserter: Upserter::new(store), uploads_dir }
  }

  pub async fn upload(&self, req: UploadRequest) -> Result<UploadReport, ApiError> {
    let kind = match req.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
      None => FileKind::Raw,
      Some(declared) => FileKind::parse(declared).unwrap_or_else(|| {
        tracing::warn!(declared, "unknown upload kind, saving as raw");
        FileKind::Raw
      }),
    };

    let (bytes, file_name) = load(req.body, req.file_name, req.local_path).await?;

    let report = match kind {
      FileKind::Csv => {
        let records = decode_csv_bytes(&bytes)?;
        let summary = self
          .upserter
          .ingest_csv(&records)
          .await
          .map_err(|e| ApiError::Store(Box::new(e)))?;
        UploadReport::Csv { rows: summary.rows, upserts: summary.upserts }
      }
      FileKind::GeoJson => {
        decode_geometry(&bytes, GeometryKind::GeoJson)?;
        let name = file_name.unwrap_or_else(|| "upload.geojson".into());
        self.save(&name, &bytes).await?;
        UploadReport::GeoJson { saved: name }
      }
      FileKind::TopoJson => {
        let collection = decode_geometry(&bytes, GeometryKind::TopoJson)?;
        let stem = file_name
          .as_deref()
          .and_then(|n| Path::new(n).file_stem())
          .map(|s| s.to_string_lossy().into_owned())
          .unwrap_or_else(|| "upload".into());
        let name = format!("{stem}.geojson");
        let json = serde_json::to_vec(&collection).map_err(edumap_codec::Error::Json)?;
        self.save(&name, &json).await?;
        UploadReport::TopoJson { converted: name }
      }
      FileKind::Raw => {
        let name = file_name.unwrap_or_else(|| "upload.bin".into());
        self.save(&name, &bytes).await?;
        UploadReport::Raw { saved: name }
      }
    };

    tracing::info!(?report, "upload processed");
    Ok(report)
  }

  async fn save(&self, name: &str, bytes: &[u8]) -> Result<(), ApiError> {
    tokio::fs::create_dir_all(&self.uploads_dir).await?;
    let path = self.uploads_dir.join(name);
    tokio::fs::write(&path, bytes).await?;
    tracing::debug!(path = %path.display(), len = bytes.len(), "saved upload");
    Ok(())
  }
}

/// Pick the upload source: the body if non-empty, else the local path.
/// Returns the bytes and the sanitised file name, if any.
async fn load(
  body: Bytes,
  file_name: Option<String>,
  local_path: Option<PathBuf>,
) -> Result<(Bytes, Option<String>), ApiError> {
  let file_name = file_name.as_deref().and_then(sanitize_file_name);
  if !body.is_empty() {
    return Ok((body, file_name));
  }

  let Some(path) = local_path.filter(|p| !p.as_os_str().is_empty()) else {
    return Err(ApiError::Upload("no file uploaded and no local path given".into()));
  };
  let bytes = match tokio::fs::read(&path).await {
    Ok(b) => Bytes::from(b),
    Err(e) if e.kind() == ErrorKind::NotFound => {
      return Err(ApiError::Upload(format!("local path not found: {}", path.display())));
    }
    Err(e) => return Err(e.into()),
  };
  let file_name = file_name.or_else(|| sanitize_file_name(&path.to_string_lossy()));
  Ok((bytes, file_name))
}

/// Reduce a client-supplied name to a bare file name with whitespace
/// replaced by `_`. Returns `None` when nothing usable is left.
pub fn sanitize_file_name(name: &str) -> Option<String> {
  let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default().trim();
  if base.is_empty() || base == "." || base == ".." {
    return None;
  }
  Some(
    base
      .chars()
      .map(|c| if c.is_whitespace() { '_' } else { c })
      .collect(),
  )
}

// ─── Handler ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
  pub file_type:  Option<String>,
  pub file_name:  Option<String>,
  pub local_path: Option<PathBuf>,
}

/// `POST /upload?file_type=<kind>[&file_name=<name>][&local_path=<path>]`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<UploadParams>,
  body: Bytes,
) -> Result<Json<UploadReport>, ApiError>
where
  S: RegionStore,
{
  let report = state
    .uploader
    .upload(UploadRequest {
      kind: params.file_type,
      file_name: params.file_name,
      body,
      local_path: params.local_path,
    })
    .await?;
  Ok(Json(report))
}
