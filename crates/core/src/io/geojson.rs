//! GeoJSON vector reading
//!
//! Lightweight serde models for RFC 7946 FeatureCollections, covering the
//! geometry types the rasterizer consumes. Properties become
//! [`AttributeValue`]s; nested arrays/objects are dropped as `Null`.

use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};
use geo_types::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    geometry: Option<RawGeometry>,
    #[serde(default)]
    properties: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
    #[serde(default)]
    geometries: Vec<RawGeometry>,
}

/// Read a GeoJSON FeatureCollection from a file
pub fn read_geojson<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let text = std::fs::read_to_string(path.as_ref())?;
    read_geojson_from_str(&text)
}

/// Read a GeoJSON FeatureCollection from a string
pub fn read_geojson_from_str(text: &str) -> Result<FeatureCollection> {
    let raw: RawCollection = serde_json::from_str(text)
        .map_err(|e| Error::Other(format!("GeoJSON parse error: {}", e)))?;

    let mut collection = FeatureCollection::new();
    for rf in raw.features {
        let mut feature = match rf.geometry {
            Some(g) => Feature::new(to_geometry(&g)?),
            None => Feature::empty(),
        };
        if let Some(props) = rf.properties {
            for (key, value) in props {
                feature.set_attribute(key, to_attribute(value));
            }
        }
        collection.push(feature);
    }

    Ok(collection)
}

fn to_attribute(value: Value) -> AttributeValue {
    match value {
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                AttributeValue::Int(i)
            } else {
                AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => AttributeValue::String(s),
        _ => AttributeValue::Null,
    }
}

fn to_geometry(raw: &RawGeometry) -> Result<Geometry<f64>> {
    match raw.kind.as_str() {
        "Point" => Ok(Point::from(position(&raw.coordinates)?).into()),
        "MultiPoint" => {
            let points: Vec<Point<f64>> = positions(&raw.coordinates)?
                .into_iter()
                .map(Point::from)
                .collect();
            Ok(MultiPoint::new(points).into())
        }
        "LineString" => Ok(LineString::new(positions(&raw.coordinates)?).into()),
        "MultiLineString" => {
            let lines = elements(&raw.coordinates)?
                .iter()
                .map(|v| Ok(LineString::new(positions(v)?)))
                .collect::<Result<Vec<_>>>()?;
            Ok(MultiLineString::new(lines).into())
        }
        "Polygon" => Ok(polygon(&raw.coordinates)?.into()),
        "MultiPolygon" => {
            let polygons = elements(&raw.coordinates)?
                .iter()
                .map(polygon)
                .collect::<Result<Vec<_>>>()?;
            Ok(MultiPolygon::new(polygons).into())
        }
        "GeometryCollection" => {
            let members = raw
                .geometries
                .iter()
                .map(to_geometry)
                .collect::<Result<Vec<_>>>()?;
            Ok(Geometry::GeometryCollection(GeometryCollection::from(
                members,
            )))
        }
        other => Err(Error::UnsupportedDataType(format!(
            "GeoJSON geometry type {}",
            other
        ))),
    }
}

fn polygon(coordinates: &Value) -> Result<Polygon<f64>> {
    let rings = elements(coordinates)?;
    if rings.is_empty() {
        return Err(Error::Other("polygon without rings".into()));
    }

    let exterior = LineString::new(positions(&rings[0])?);
    let interiors = rings[1..]
        .iter()
        .map(|v| Ok(LineString::new(positions(v)?)))
        .collect::<Result<Vec<_>>>()?;

    Ok(Polygon::new(exterior, interiors))
}

fn elements(value: &Value) -> Result<&Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| Error::Other("expected coordinate array".into()))
}

fn positions(value: &Value) -> Result<Vec<Coord<f64>>> {
    elements(value)?.iter().map(position).collect()
}

fn position(value: &Value) -> Result<Coord<f64>> {
    let parts = elements(value)?;
    if parts.len() < 2 {
        return Err(Error::Other("position needs at least two numbers".into()));
    }
    let x = parts[0]
        .as_f64()
        .ok_or_else(|| Error::Other("non-numeric coordinate".into()))?;
    let y = parts[1]
        .as_f64()
        .ok_or_else(|| Error::Other("non-numeric coordinate".into()))?;
    Ok(Coord { x, y })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0, 0], [100, 0], [100, 100], [0, 100], [0, 0]]]
                },
                "properties": {"Vrednost": 4, "opis": "iglavci"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [50, 50]},
                "properties": {"Vrednost": 2.5}
            }
        ]
    }"#;

    #[test]
    fn parses_features_and_attributes() {
        let fc = read_geojson_from_str(SAMPLE).unwrap();
        assert_eq!(fc.len(), 2);

        assert_eq!(fc.features[0].numeric_attribute("Vrednost"), Some(4.0));
        assert_eq!(
            fc.features[0].attribute("opis"),
            Some(&AttributeValue::String("iglavci".into()))
        );
        assert_eq!(fc.features[1].numeric_attribute("Vrednost"), Some(2.5));

        assert!(matches!(
            fc.features[0].geometry,
            Some(Geometry::Polygon(_))
        ));
        assert!(matches!(fc.features[1].geometry, Some(Geometry::Point(_))));
    }

    #[test]
    fn collection_bounds_from_parsed_features() {
        let fc = read_geojson_from_str(SAMPLE).unwrap();
        let b = fc.bounds().unwrap();
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn rejects_malformed_document() {
        assert!(read_geojson_from_str("{not json").is_err());
        assert!(read_geojson_from_str(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","geometry":{"type":"Volume","coordinates":[]},"properties":{}}
            ]}"#
        )
        .is_err());
    }

    #[test]
    fn feature_without_geometry_is_kept() {
        let fc = read_geojson_from_str(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","geometry":null,"properties":{"Vrednost":1}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(fc.len(), 1);
        assert!(fc.features[0].geometry.is_none());
    }
}
