//! HTTP host for the EduMap API.
//!
//! Composes the JSON API from `edumap-api` with the health route and static
//! asset directories, and owns the runtime configuration shape.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use axum::{Router, extract::DefaultBodyLimit, routing::get};
use edumap_api::{ApiSettings, AppState, api_router};
use edumap_core::store::RegionStore;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

/// Body of `GET /`.
pub const HEALTH_TEXT: &str = "EduMap Backend OK";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `edumap.toml` and
/// `EDUMAP_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  #[serde(default = "default_uploads_dir")]
  pub uploads_dir:      PathBuf,
  /// Payload served when the store is empty.
  #[serde(default)]
  pub snapshot_path:    Option<PathBuf>,
  /// Root holding the `data/` and `geo/` asset directories.
  #[serde(default)]
  pub static_dir:       Option<PathBuf>,
  #[serde(default)]
  pub ml_service_url:   Option<String>,
  #[serde(default = "default_ml_timeout_secs")]
  pub ml_timeout_secs:  u64,
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes: usize,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 5000 }
fn default_store_path() -> PathBuf { "edumap.db".into() }
fn default_uploads_dir() -> PathBuf { "uploads".into() }
fn default_ml_timeout_secs() -> u64 { 10 }
fn default_max_upload_bytes() -> usize { 50 * 1024 * 1024 }

impl ServerConfig {
  /// Expand a leading `~/` in every configured path against `home`.
  pub fn expand_paths(&mut self, home: Option<&Path>) {
    let Some(home) = home else { return };
    for path in [&mut self.store_path, &mut self.uploads_dir]
      .into_iter()
      .chain(self.snapshot_path.as_mut())
      .chain(self.static_dir.as_mut())
    {
      *path = expand_tilde(path, home);
    }
  }

  pub fn api_settings(&self) -> ApiSettings {
    ApiSettings {
      uploads_dir:    self.uploads_dir.clone(),
      snapshot_path:  self.snapshot_path.clone(),
      ml_service_url: self.ml_service_url.clone(),
      ml_timeout:     Duration::from_secs(self.ml_timeout_secs),
    }
  }
}

fn expand_tilde(path: &Path, home: &Path) -> PathBuf {
  match path.strip_prefix("~") {
    Ok(rest) => home.join(rest),
    Err(_) => path.to_path_buf(),
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application router.
pub fn app<S>(state: AppState<S>, config: &ServerConfig) -> Router
where
  S: RegionStore + 'static,
{
  let mut router = Router::new()
    .route("/", get(|| async { HEALTH_TEXT }))
    .nest("/api", api_router(state));

  if let Some(dir) = &config.static_dir {
    router = router
      .nest_service("/data", ServeDir::new(dir.join("data")))
      .nest_service("/geo", ServeDir::new(dir.join("geo")));
  }

  router
    .layer(DefaultBodyLimit::max(config.max_upload_bytes))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::very_permissive())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
  };
  use edumap_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn config(dir: &tempfile::TempDir) -> ServerConfig {
    ServerConfig {
      host:             "127.0.0.1".into(),
      port:             0,
      store_path:       PathBuf::from(":memory:"),
      uploads_dir:      dir.path().join("uploads"),
      snapshot_path:    None,
      static_dir:       Some(dir.path().join("public")),
      ml_service_url:   None,
      ml_timeout_secs:  1,
      max_upload_bytes: 64,
    }
  }

  async fn make_app(cfg: &ServerConfig) -> Router {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let state = AppState::new(store, &cfg.api_settings()).unwrap();
    app(state, cfg)
  }

  async fn oneshot(app: Router, method: &str, uri: &str, body: Vec<u8>) -> Response {
    let req = Request::builder()
      .method(method)
      .uri(uri)
      .body(Body::from(body))
      .unwrap();
    app.oneshot(req).await.unwrap()
  }

  async fn text(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  #[tokio::test]
  async fn health_route() {
    let dir = tempfile::tempdir().unwrap();
    let resp = oneshot(make_app(&config(&dir)).await, "GET", "/", vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(text(resp).await, HEALTH_TEXT);
  }

  #[tokio::test]
  async fn api_is_nested() {
    let dir = tempfile::tempdir().unwrap();
    let resp = oneshot(make_app(&config(&dir)).await, "GET", "/api/data", vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(text(resp).await, r#"{"states":{},"districts":{}}"#);
  }

  #[tokio::test]
  async fn static_directories_are_served() {
    let dir = tempfile::tempdir().unwrap();
    let public = dir.path().join("public");
    std::fs::create_dir_all(public.join("data")).unwrap();
    std::fs::create_dir_all(public.join("geo")).unwrap();
    std::fs::write(public.join("data/data.json"), "{}").unwrap();
    std::fs::write(public.join("geo/india.topojson"), r#"{"type":"Topology"}"#).unwrap();

    let cfg = config(&dir);
    let resp = oneshot(make_app(&cfg).await, "GET", "/data/data.json", vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(text(resp).await, "{}");

    let resp = oneshot(make_app(&cfg).await, "GET", "/geo/india.topojson", vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = oneshot(make_app(&cfg).await, "GET", "/geo/missing.json", vec![]).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn oversized_upload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let resp = oneshot(
      make_app(&config(&dir)).await,
      "POST",
      "/api/upload?file_type=raw",
      vec![b'x'; 65],
    )
    .await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
  }

  #[test]
  fn every_configured_path_expands_tilde() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&dir);
    cfg.store_path = "~/edumap/edumap.db".into();
    cfg.uploads_dir = "~/edumap/uploads".into();
    cfg.snapshot_path = Some("~/edumap/data.json".into());
    cfg.static_dir = Some("~/edumap/public".into());

    cfg.expand_paths(Some(Path::new("/home/op")));
    assert_eq!(cfg.store_path, PathBuf::from("/home/op/edumap/edumap.db"));
    assert_eq!(cfg.uploads_dir, PathBuf::from("/home/op/edumap/uploads"));
    assert_eq!(cfg.snapshot_path, Some(PathBuf::from("/home/op/edumap/data.json")));
    assert_eq!(cfg.static_dir, Some(PathBuf::from("/home/op/edumap/public")));
  }

  #[test]
  fn paths_without_tilde_are_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&dir);
    cfg.store_path = "data/~edumap.db".into();
    let before = cfg.clone();

    cfg.expand_paths(Some(Path::new("/home/op")));
    assert_eq!(cfg.store_path, before.store_path);
    assert_eq!(cfg.uploads_dir, before.uploads_dir);
    assert_eq!(cfg.static_dir, before.static_dir);
  }

  #[test]
  fn config_defaults_fill_missing_keys() {
    let cfg: ServerConfig = config::Config::builder()
      .add_source(config::File::from_str(
        "port = 8080\nml_service_url = \"http://localhost:8000/predict\"",
        config::FileFormat::Toml,
      ))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();

    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.uploads_dir, PathBuf::from("uploads"));
    assert_eq!(cfg.max_upload_bytes, 50 * 1024 * 1024);
    assert!(cfg.static_dir.is_none());
    assert_eq!(cfg.api_settings().ml_timeout, Duration::from_secs(10));
  }
}
