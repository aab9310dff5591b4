//! `edumap` — operator CLI for the EduMap backend.
//!
//! # Usage
//!
//! ```text
//! edumap upload scores.csv
//! edumap upload india.json --kind topojson
//! edumap upload --local-path /srv/data/scores.csv --kind csv
//! edumap payload
//! edumap match india.geojson --kind geojson
//! edumap predict --population-lakhs 12 --literacy-rate 74 \
//!   --pupil-teacher-ratio 31 --teacher-difference -4
//! ```

mod client;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use client::ApiClient;
use edumap_api::PredictionRequest;
use serde_json::json;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "edumap", about = "Operator CLI for the EduMap backend")]
struct Args {
  /// Base URL of the edumap server.
  #[arg(long, env = "EDUMAP_URL", default_value = "http://localhost:5000")]
  url: String,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Upload a CSV, GeoJSON, TopoJSON or raw file.
  Upload {
    /// File to send. Omit when using `--local-path`.
    file:       Option<PathBuf>,
    /// Declared kind; inferred from the file extension when omitted.
    #[arg(long)]
    kind:       Option<String>,
    /// Have the server read this path from its own filesystem instead.
    #[arg(long, conflicts_with = "file")]
    local_path: Option<PathBuf>,
  },
  /// Print the aggregated dashboard payload.
  Payload,
  /// Match a geometry file's features against the current payload.
  Match {
    file: PathBuf,
    #[arg(long, default_value = "geojson")]
    kind: String,
  },
  /// Ask the ML service for a district inequality index.
  Predict {
    #[arg(long, allow_negative_numbers = true)]
    population_lakhs:    f64,
    #[arg(long, allow_negative_numbers = true)]
    literacy_rate:       f64,
    #[arg(long, allow_negative_numbers = true)]
    pupil_teacher_ratio: f64,
    #[arg(long, allow_negative_numbers = true)]
    teacher_difference:  f64,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let client = ApiClient::new(args.url)?;

  let output = match args.command {
    Command::Upload { file: Some(file), kind, .. } => {
      let kind = kind.or_else(|| infer_kind(&file).map(str::to_owned));
      let bytes = tokio::fs::read(&file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
      let name = file.file_name().map(|n| n.to_string_lossy().into_owned());
      tracing::info!(file = %file.display(), ?kind, "uploading");
      let report = client.upload(kind.as_deref(), name.as_deref(), bytes).await?;
      serde_json::to_value(report)?
    }
    Command::Upload { file: None, kind, local_path: Some(path) } => {
      let kind = kind.or_else(|| infer_kind(&path).map(str::to_owned));
      let report = client.upload_local(kind.as_deref(), &path).await?;
      serde_json::to_value(report)?
    }
    Command::Upload { file: None, local_path: None, .. } => {
      bail!("either a file or --local-path is required");
    }
    Command::Payload => serde_json::to_value(client.payload().await?)?,
    Command::Match { file, kind } => {
      let bytes = tokio::fs::read(&file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
      let matches = client.match_features(&kind, bytes).await?;
      let matched = matches.iter().filter(|m| m.code.is_some()).count();
      json!({ "matched": matched, "total": matches.len(), "features": matches })
    }
    Command::Predict {
      population_lakhs,
      literacy_rate,
      pupil_teacher_ratio,
      teacher_difference,
    } => {
      let req = PredictionRequest {
        population_lakhs,
        literacy_rate,
        pupil_teacher_ratio,
        teacher_difference,
      };
      serde_json::to_value(client.predict(&req).await?)?
    }
  };

  println!("{}", serde_json::to_string_pretty(&output)?);
  Ok(())
}

/// Guess the upload kind from a file extension.
fn infer_kind(path: &Path) -> Option<&'static str> {
  let ext = path.extension()?.to_str()?.to_ascii_lowercase();
  match ext.as_str() {
    "csv" => Some("csv"),
    "geojson" => Some("geojson"),
    "topojson" => Some("topojson"),
    _ => None,
  }
}
