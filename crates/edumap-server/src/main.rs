//! edumap-server binary.
//!
//! Reads `edumap.toml` (or the path specified with `--config`) layered under
//! `EDUMAP_*` environment variables, opens the SQLite region store, and
//! serves the dashboard API over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use edumap_api::AppState;
use edumap_server::ServerConfig;
use edumap_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "EduMap dashboard backend")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "edumap.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("EDUMAP"))
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let home = std::env::var_os("HOME").map(PathBuf::from);
  server_cfg.expand_paths(home.as_deref());

  if let Some(parent) = server_cfg.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;

  let state = AppState::new(Arc::new(store), &server_cfg.api_settings())
    .context("failed to build application state")?;
  if state.predictor.is_none() {
    tracing::info!("no ml_service_url configured, prediction endpoint disabled");
  }

  let app = edumap_server::app(state, &server_cfg);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
