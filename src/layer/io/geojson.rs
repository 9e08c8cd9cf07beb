use ahash::AHashSet;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use polars::prelude::*;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::{error::{Error, Result}, layer::Layer};

impl Layer {
    /// Read a layer from GeoJSON FeatureCollection bytes.
    pub fn from_geojson_bytes(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_geojson_value(&value)
    }

    /// Read a layer from a parsed GeoJSON FeatureCollection.
    /// The EPSG code is taken from the legacy `crs` member when present.
    pub fn from_geojson_value(value: &Value) -> Result<Self> {
        let features = value["features"].as_array()
            .ok_or_else(|| Error::invalid("GeoJSON has no \"features\" array"))?;
        Self::from_geojson_features(features, parse_crs(value))
    }

    /// Build a layer from GeoJSON Feature objects.
    /// Polygon and MultiPolygon features are kept (a null geometry becomes an empty one);
    /// features of any other geometry type are skipped.
    pub fn from_geojson_features(features: &[Value], epsg: Option<u32>) -> Result<Self> {
        let mut geoms = Vec::with_capacity(features.len());
        let mut rows: Vec<&Map<String, Value>> = Vec::with_capacity(features.len());
        let empty = Map::new();

        for (idx, feature) in features.iter().enumerate() {
            let geometry = &feature["geometry"];
            let mp = match geometry["type"].as_str() {
                None if geometry.is_null() => MultiPolygon(Vec::new()),
                Some("Polygon") => MultiPolygon(vec![parse_polygon(&geometry["coordinates"])?]),
                Some("MultiPolygon") => parse_multipolygon(&geometry["coordinates"])?,
                other => {
                    warn!(feature = idx, geometry_type = ?other, "skipping non-polygonal feature");
                    continue;
                }
            };
            geoms.push(mp);
            rows.push(feature["properties"].as_object().unwrap_or(&empty));
        }

        // Column order follows first appearance across features.
        let mut names: Vec<&str> = Vec::new();
        let mut seen: AHashSet<&str> = AHashSet::new();
        for row in &rows {
            for key in row.keys() {
                if seen.insert(key.as_str()) { names.push(key.as_str()) }
            }
        }

        let columns = names.iter()
            .map(|&name| {
                let values = rows.iter().map(|row| row.get(name).unwrap_or(&Value::Null)).collect::<Vec<_>>();
                property_column(name, &values)
            })
            .collect::<Vec<_>>();

        let data = if columns.is_empty() { DataFrame::empty() } else { DataFrame::new(columns)? };
        Layer::new(geoms, data, epsg)
    }

    /// Export the layer as a GeoJSON FeatureCollection with every attribute as a property.
    pub fn to_geojson(&self) -> Result<Value> {
        let columns = self.data().get_columns();
        let mut features = Vec::with_capacity(self.len());

        for (idx, mp) in self.geoms().iter().enumerate() {
            let mut properties = Map::new();
            for column in columns {
                properties.insert(column.name().to_string(), any_value_to_json(column.get(idx)?));
            }
            features.push(json!({
                "type": "Feature",
                "geometry": multipolygon_to_geojson(mp),
                "properties": properties,
            }));
        }

        let mut collection = json!({
            "type": "FeatureCollection",
            "features": features,
        });
        if let Some(code) = self.epsg() {
            collection["crs"] = json!({
                "type": "name",
                "properties": { "name": format!("urn:ogc:def:crs:EPSG::{code}") },
            });
        }
        Ok(collection)
    }

    /// Export the layer as GeoJSON bytes.
    pub fn to_geojson_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.to_geojson()?)?)
    }
}

/// Parse the EPSG code from a legacy GeoJSON `crs` member.
/// Accepts `urn:ogc:def:crs:EPSG::31983`, `urn:ogc:def:crs:EPSG:6.6:4326`, and `EPSG:4326`;
/// `urn:ogc:def:crs:OGC:1.3:CRS84` maps to 4326.
pub(crate) fn parse_crs(value: &Value) -> Option<u32> {
    let name = value["crs"]["properties"]["name"].as_str()?;
    if name.ends_with("CRS84") { return Some(4326) }
    if !name.to_ascii_uppercase().contains("EPSG") { return None }
    name.rsplit(':').next()?.parse().ok()
}

/// Build a typed column from JSON property values.
/// Integers → Int64, other numbers → Float64, booleans → Boolean, anything mixed → String.
fn property_column(name: &str, values: &[&Value]) -> Column {
    let present = values.iter().filter(|v| !v.is_null()).collect::<Vec<_>>();

    if !present.is_empty() && present.iter().all(|v| v.is_boolean()) {
        let data = values.iter().map(|v| v.as_bool()).collect::<Vec<_>>();
        return Column::new(name.into(), data);
    }
    if !present.is_empty() && present.iter().all(|v| v.is_i64()) {
        let data = values.iter().map(|v| v.as_i64()).collect::<Vec<_>>();
        return Column::new(name.into(), data);
    }
    if !present.is_empty() && present.iter().all(|v| v.is_number()) {
        let data = values.iter().map(|v| v.as_f64()).collect::<Vec<_>>();
        return Column::new(name.into(), data);
    }

    let data = values.iter()
        .map(|v| match v {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .collect::<Vec<_>>();
    Column::new(name.into(), data)
}

fn any_value_to_json(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(v) => json!(v),
        AnyValue::String(v) => json!(v),
        AnyValue::StringOwned(v) => json!(v.as_str()),
        AnyValue::Int8(v) => json!(v),
        AnyValue::Int16(v) => json!(v),
        AnyValue::Int32(v) => json!(v),
        AnyValue::Int64(v) => json!(v),
        AnyValue::UInt8(v) => json!(v),
        AnyValue::UInt16(v) => json!(v),
        AnyValue::UInt32(v) => json!(v),
        AnyValue::UInt64(v) => json!(v),
        AnyValue::Float32(v) => json!(v),
        AnyValue::Float64(v) => json!(v),
        other => json!(other.to_string()),
    }
}

/// Convert a MultiPolygon to a GeoJSON MultiPolygon geometry.
fn multipolygon_to_geojson(mp: &MultiPolygon<f64>) -> Value {
    let polygons = mp.0.iter()
        .map(|polygon| {
            std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(|ring| ring.coords().map(|c| vec![c.x, c.y]).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    json!({
        "type": "MultiPolygon",
        "coordinates": polygons,
    })
}

/// Parse MultiPolygon coordinates: `[[ring, ring, ...], ...]`.
fn parse_multipolygon(coords: &Value) -> Result<MultiPolygon<f64>> {
    let polygons = coords.as_array()
        .ok_or_else(|| Error::invalid("invalid MultiPolygon: coordinates must be an array"))?;
    Ok(MultiPolygon(polygons.iter().map(parse_polygon).collect::<Result<Vec<_>>>()?))
}

/// Parse Polygon coordinates: `[exterior, hole, hole, ...]`.
fn parse_polygon(coords: &Value) -> Result<Polygon<f64>> {
    let rings = coords.as_array()
        .ok_or_else(|| Error::invalid("invalid Polygon: coordinates must be an array"))?;
    let mut rings = rings.iter().map(parse_ring);
    let exterior = rings.next()
        .ok_or_else(|| Error::invalid("invalid Polygon: missing exterior ring"))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Parse a ring: `[[x, y], [x, y], ...]`, ignoring any third ordinate.
fn parse_ring(coords: &Value) -> Result<LineString<f64>> {
    let positions = coords.as_array()
        .ok_or_else(|| Error::invalid("invalid ring: coordinates must be an array"))?;

    let mut points = Vec::with_capacity(positions.len());
    for position in positions {
        let (Some(x), Some(y)) = (position[0].as_f64(), position[1].as_f64()) else {
            return Err(Error::invalid(format!("invalid position: {position}")));
        };
        points.push(Coord { x, y });
    }

    // Ensure ring is closed (first point == last point)
    if !points.is_empty() && points[0] != points[points.len() - 1] {
        points.push(points[0]);
    }
    Ok(LineString(points))
}
