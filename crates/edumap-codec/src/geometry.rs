//! GeoJSON feature types and the geometry decoder entry point.
//!
//! GeoJSON input is validated against the FeatureCollection shape and taken
//! as-is, foreign members such as `bbox`, `crs` or `name` included; TopoJSON
//! input is converted into the same shape by [`crate::topojson`].

use edumap_core::reconcile::PropertyBag;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{
  error::{Error, Result},
  topojson,
};

/// A coordinate tuple: `[x, y]` plus any extra dimensions carried through.
pub type Position = Vec<f64>;

/// Declared encoding of an uploaded geometry payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
  GeoJson,
  TopoJson,
}

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
  Point { coordinates: Position },
  MultiPoint { coordinates: Vec<Position> },
  LineString { coordinates: Vec<Position> },
  MultiLineString { coordinates: Vec<Vec<Position>> },
  Polygon { coordinates: Vec<Vec<Position>> },
  MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
  GeometryCollection { geometries: Vec<Geometry> },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum FeatureType {
  #[default]
  Feature,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum CollectionType {
  #[default]
  FeatureCollection,
}

/// One labelled geometry with its free-form property bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
  #[serde(rename = "type", default, deserialize_with = "ignore_as_default")]
  pub kind:       FeatureType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:         Option<Value>,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub properties: PropertyBag,
  #[serde(default)]
  pub geometry:   Option<Geometry>,
  /// Members outside the GeoJSON feature schema, kept verbatim.
  #[serde(flatten)]
  pub foreign:    Map<String, Value>,
}

impl Feature {
  pub fn new(id: Option<Value>, properties: PropertyBag, geometry: Option<Geometry>) -> Self {
    Self { kind: FeatureType::Feature, id, properties, geometry, foreign: Map::new() }
  }

  /// First non-blank string among the given property keys.
  pub fn label(&self, keys: &[&str]) -> Option<&str> {
    keys
      .iter()
      .filter_map(|k| self.properties.get(*k).and_then(Value::as_str))
      .map(str::trim)
      .find(|s| !s.is_empty())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
  #[serde(rename = "type", default, deserialize_with = "ignore_as_default")]
  pub kind:     CollectionType,
  pub features: Vec<Feature>,
  #[serde(flatten)]
  pub foreign:  Map<String, Value>,
}

impl FeatureCollection {
  pub fn new(features: Vec<Feature>) -> Self {
    Self { kind: CollectionType::FeatureCollection, features, foreign: Map::new() }
  }
}

/// Accept any declared `type` and normalise it to the canonical one.
fn ignore_as_default<'de, D, T>(d: D) -> std::result::Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default,
{
  serde::de::IgnoredAny::deserialize(d)?;
  Ok(T::default())
}

/// Property bags are sometimes serialised as `null`; read that as empty.
pub(crate) fn null_as_empty<'de, D>(d: D) -> std::result::Result<PropertyBag, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<PropertyBag>::deserialize(d)?.unwrap_or_default())
}

// ─── Decoding ────────────────────────────────────────────────────────────────

/// Decode `input` as the declared geometry `kind`.
///
/// Fails when the bytes are not JSON or lack the expected top-level member
/// (`features` for GeoJSON, `objects` for TopoJSON).
pub fn decode(input: &[u8], kind: GeometryKind) -> Result<FeatureCollection> {
  let doc: Value = serde_json::from_slice(input)?;
  match kind {
    GeometryKind::GeoJson => decode_geojson(doc),
    GeometryKind::TopoJson => topojson::to_feature_collection(doc),
  }
}

fn decode_geojson(doc: Value) -> Result<FeatureCollection> {
  if !doc.get("features").is_some_and(Value::is_array) {
    return Err(Error::MissingFeatures);
  }
  Ok(serde_json::from_value(doc)?)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn geojson_round_trips_features_and_properties() {
    let doc = json!({
      "type": "FeatureCollection",
      "features": [{
        "type": "Feature",
        "properties": { "ST_NM": "Kerala", "STATE_CODE": "KL" },
        "geometry": { "type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]] }
      }]
    });
    let fc = decode(doc.to_string().as_bytes(), GeometryKind::GeoJson).unwrap();
    assert_eq!(fc.features.len(), 1);
    assert_eq!(fc.features[0].properties["STATE_CODE"], "KL");
    assert_eq!(serde_json::to_value(&fc).unwrap(), doc);
  }

  #[test]
  fn foreign_members_pass_through() {
    let doc = json!({
      "type": "FeatureCollection",
      "name": "india_states",
      "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:OGC:1.3:CRS84" } },
      "bbox": [68.1, 6.7, 97.4, 35.5],
      "features": [{
        "type": "Feature",
        "bbox": [74.0, 11.5, 78.6, 18.5],
        "properties": { "ST_NM": "Karnataka" },
        "geometry": null
      }]
    });
    let fc = decode(doc.to_string().as_bytes(), GeometryKind::GeoJson).unwrap();
    assert_eq!(fc.foreign["name"], "india_states");
    assert!(!fc.foreign.contains_key("type"));
    assert_eq!(serde_json::to_value(&fc).unwrap(), doc);
  }

  #[test]
  fn null_properties_and_geometry_are_tolerated() {
    let doc = r#"{"features":[{"type":"Feature","properties":null,"geometry":null}]}"#;
    let fc = decode(doc.as_bytes(), GeometryKind::GeoJson).unwrap();
    assert!(fc.features[0].properties.is_empty());
    assert!(fc.features[0].geometry.is_none());
  }

  #[test]
  fn geojson_without_features_is_rejected() {
    let r = decode(br#"{"type":"Feature","properties":{}}"#, GeometryKind::GeoJson);
    assert!(matches!(r, Err(Error::MissingFeatures)));
  }

  #[test]
  fn malformed_json_is_rejected() {
    let r = decode(b"{not json", GeometryKind::GeoJson);
    assert!(matches!(r, Err(Error::Json(_))));
  }

  #[test]
  fn label_picks_first_non_blank_string() {
    let f: Feature = serde_json::from_value(json!({
      "properties": { "NAME": " ", "ST_NM": "Goa" },
      "geometry": null
    }))
    .unwrap();
    assert_eq!(f.label(&["NAME", "ST_NM"]), Some("Goa"));
  }
}
