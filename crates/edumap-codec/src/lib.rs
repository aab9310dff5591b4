//! Decoders for uploaded dashboard data.
//!
//! Two pure, synchronous decoders with no I/O of their own:
//!
//! - [`decode_geometry`] turns GeoJSON or TopoJSON bytes into a
//!   [`FeatureCollection`].
//! - [`decode_csv`] turns CSV text into header-keyed [`Record`]s.
//!
//! # Quick start
//!
//! ```no_run
//! use edumap_codec::{GeometryKind, decode_geometry};
//!
//! let bytes = std::fs::read("india.topojson").unwrap();
//! let fc = decode_geometry(&bytes, GeometryKind::TopoJson).unwrap();
//! println!("{} features", fc.features.len());
//! ```

pub mod error;
pub mod geometry;
mod tabular;
mod topojson;

pub use error::{Error, Result};
pub use geometry::{
  Feature, FeatureCollection, Geometry, GeometryKind, Position, decode as decode_geometry,
};
pub use tabular::{Record, decode_csv, decode_csv_bytes};
