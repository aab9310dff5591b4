//! TopoJSON → GeoJSON conversion.
//!
//! Pipeline:
//!   JSON document
//!     └─ first key of `objects`      → TopoObject
//!          └─ Converter::geometry()   → stitch arcs into rings / lines
//!               └─ feature()          → Feature per geometry
//!
//! Only the first object (in document order) is converted. Topologies with
//! several named objects have no way to select another one.

use edumap_core::reconcile::PropertyBag;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
  error::{Error, Result},
  geometry::{Feature, FeatureCollection, Geometry, Position, null_as_empty},
};

// ─── Document representation ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct Topology {
  #[serde(default)]
  arcs:      Vec<Vec<Vec<f64>>>,
  #[serde(default)]
  transform: Option<Transform>,
  objects:   serde_json::Map<String, Value>,
}

/// Quantisation transform: `position = quantised * scale + translate`.
#[derive(Deserialize)]
struct Transform {
  scale:     [f64; 2],
  translate: [f64; 2],
}

#[derive(Deserialize)]
struct TopoObject {
  #[serde(rename = "type", default)]
  kind:        Option<String>,
  #[serde(default)]
  id:          Option<Value>,
  #[serde(default, deserialize_with = "null_as_empty")]
  properties:  PropertyBag,
  #[serde(default)]
  arcs:        Option<Value>,
  #[serde(default)]
  coordinates: Option<Value>,
  #[serde(default)]
  geometries:  Vec<TopoObject>,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Convert a parsed TopoJSON document into a feature collection.
///
/// A `GeometryCollection` object yields one feature per member geometry; any
/// other object yields a collection holding a single feature.
pub(crate) fn to_feature_collection(doc: Value) -> Result<FeatureCollection> {
  if !doc.get("objects").is_some_and(Value::is_object) {
    return Err(Error::MissingObjects);
  }
  let topology: Topology = serde_json::from_value(doc)?;

  let (_, first) = topology.objects.iter().next().ok_or(Error::EmptyTopology)?;
  let object: TopoObject = serde_json::from_value(first.clone())?;

  let converter = Converter {
    arcs:      &topology.arcs,
    transform: topology.transform.as_ref(),
  };

  let features = if object.kind.as_deref() == Some("GeometryCollection") {
    object
      .geometries
      .iter()
      .map(|g| converter.feature(g))
      .collect::<Result<Vec<_>>>()?
  } else {
    vec![converter.feature(&object)?]
  };

  Ok(FeatureCollection::new(features))
}

// ─── Conversion ──────────────────────────────────────────────────────────────

struct Converter<'a> {
  arcs:      &'a [Vec<Vec<f64>>],
  transform: Option<&'a Transform>,
}

impl Converter<'_> {
  fn feature(&self, object: &TopoObject) -> Result<Feature> {
    Ok(Feature::new(
      object.id.clone(),
      object.properties.clone(),
      self.geometry(object)?,
    ))
  }

  fn geometry(&self, o: &TopoObject) -> Result<Option<Geometry>> {
    let Some(kind) = o.kind.as_deref() else {
      return Ok(None);
    };
    let geometry = match kind {
      "Point" => {
        let p: Vec<f64> = field(&o.coordinates, "coordinates", kind)?;
        Geometry::Point { coordinates: self.point(&p)? }
      }
      "MultiPoint" => {
        let ps: Vec<Vec<f64>> = field(&o.coordinates, "coordinates", kind)?;
        Geometry::MultiPoint {
          coordinates: ps.iter().map(|p| self.point(p)).collect::<Result<_>>()?,
        }
      }
      "LineString" => {
        let arcs: Vec<i64> = field(&o.arcs, "arcs", kind)?;
        Geometry::LineString { coordinates: self.line(&arcs)? }
      }
      "MultiLineString" => {
        let arcs: Vec<Vec<i64>> = field(&o.arcs, "arcs", kind)?;
        Geometry::MultiLineString {
          coordinates: arcs.iter().map(|a| self.line(a)).collect::<Result<_>>()?,
        }
      }
      "Polygon" => {
        let arcs: Vec<Vec<i64>> = field(&o.arcs, "arcs", kind)?;
        Geometry::Polygon { coordinates: self.polygon(&arcs)? }
      }
      "MultiPolygon" => {
        let arcs: Vec<Vec<Vec<i64>>> = field(&o.arcs, "arcs", kind)?;
        Geometry::MultiPolygon {
          coordinates: arcs.iter().map(|p| self.polygon(p)).collect::<Result<_>>()?,
        }
      }
      "GeometryCollection" => {
        let mut geometries = Vec::with_capacity(o.geometries.len());
        for member in &o.geometries {
          if let Some(g) = self.geometry(member)? {
            geometries.push(g);
          }
        }
        Geometry::GeometryCollection { geometries }
      }
      other => {
        return Err(Error::InvalidTopology(format!("unknown geometry type {other:?}")));
      }
    };
    Ok(Some(geometry))
  }

  /// Transform an absolute (non delta-encoded) position.
  fn point(&self, p: &[f64]) -> Result<Position> {
    if p.len() < 2 {
      return Err(Error::InvalidTopology(format!("position with {} values", p.len())));
    }
    let mut out = p.to_vec();
    if let Some(t) = self.transform {
      out[0] = p[0] * t.scale[0] + t.translate[0];
      out[1] = p[1] * t.scale[1] + t.translate[1];
    }
    Ok(out)
  }

  /// Append arc `index` to `points`, sharing the junction point with the
  /// previous arc. Negative indices (`!i`) walk arc `i` backwards.
  fn push_arc(&self, index: i64, points: &mut Vec<Position>) -> Result<()> {
    let (i, reversed) = if index < 0 { (!index, true) } else { (index, false) };
    let arc = usize::try_from(i)
      .ok()
      .and_then(|i| self.arcs.get(i))
      .ok_or_else(|| Error::InvalidTopology(format!("arc index {index} out of range")))?;

    points.pop();
    let start = points.len();
    let (mut x, mut y) = (0.0, 0.0);
    for p in arc {
      if p.len() < 2 {
        return Err(Error::InvalidTopology(format!("arc {i} has a short position")));
      }
      let mut pos = p.clone();
      if let Some(t) = self.transform {
        x += p[0];
        y += p[1];
        pos[0] = x * t.scale[0] + t.translate[0];
        pos[1] = y * t.scale[1] + t.translate[1];
      }
      points.push(pos);
    }
    if reversed {
      points[start..].reverse();
    }
    Ok(())
  }

  fn line(&self, arcs: &[i64]) -> Result<Vec<Position>> {
    let mut points = Vec::new();
    for &a in arcs {
      self.push_arc(a, &mut points)?;
    }
    if points.len() < 2
      && let Some(first) = points.first().cloned()
    {
      points.push(first);
    }
    Ok(points)
  }

  fn ring(&self, arcs: &[i64]) -> Result<Vec<Position>> {
    let mut points = self.line(arcs)?;
    if let Some(first) = points.first().cloned() {
      while points.len() < 4 {
        points.push(first.clone());
      }
    }
    Ok(points)
  }

  fn polygon(&self, rings: &[Vec<i64>]) -> Result<Vec<Vec<Position>>> {
    rings.iter().map(|r| self.ring(r)).collect()
  }
}

fn field<T: DeserializeOwned>(value: &Option<Value>, name: &str, kind: &str) -> Result<T> {
  let v = value
    .clone()
    .ok_or_else(|| Error::InvalidTopology(format!("{kind} without `{name}`")))?;
  serde_json::from_value(v).map_err(|e| Error::InvalidTopology(format!("{kind} `{name}`: {e}")))
}
