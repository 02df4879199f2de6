//! Vector features and attributes

use crate::raster::Extent;
use geo::BoundingRect;
use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Attribute value types, mirroring what GeoJSON properties can carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Numeric coercion; `Null`, `Bool` and `String` do not coerce
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// A geographic feature: a geometry plus named attributes
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature geometry (absent for attribute-only records)
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    pub attributes: HashMap<String, AttributeValue>,
}

impl Feature {
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            attributes: HashMap::new(),
        }
    }

    /// Feature with no geometry
    pub fn empty() -> Self {
        Self {
            geometry: None,
            attributes: HashMap::new(),
        }
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.attributes.insert(key.into(), value);
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Numeric value of an attribute, if present and coercible
    pub fn numeric_attribute(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).and_then(AttributeValue::as_f64)
    }
}

/// An ordered collection of features
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self {
            features: Vec::new(),
        }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Union of all member geometry bounding boxes.
    ///
    /// `None` when no feature carries a geometry.
    pub fn bounds(&self) -> Option<Extent> {
        let mut acc: Option<Extent> = None;

        for feature in &self.features {
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            let Some(rect) = geometry.bounding_rect() else {
                continue;
            };
            let e = Extent::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y);
            acc = Some(match acc {
                Some(prev) => prev.union(&e),
                None => e,
            });
        }

        acc
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, Point};

    #[test]
    fn numeric_attribute_coercion() {
        let mut f = Feature::new(Point::new(0.0, 0.0).into());
        f.set_attribute("Vrednost", AttributeValue::Int(4));
        f.set_attribute("name", AttributeValue::String("gozd".into()));

        assert_eq!(f.numeric_attribute("Vrednost"), Some(4.0));
        assert_eq!(f.numeric_attribute("name"), None);
        assert_eq!(f.numeric_attribute("missing"), None);
    }

    #[test]
    fn collection_bounds_union() {
        let mut fc = FeatureCollection::new();
        fc.push(Feature::new(
            polygon![(x: 0.0, y: 0.0), (x: 50.0, y: 0.0), (x: 50.0, y: 50.0), (x: 0.0, y: 50.0)]
                .into(),
        ));
        fc.push(Feature::new(Point::new(75.0, 100.0).into()));

        let b = fc.bounds().unwrap();
        assert_eq!(b, Extent::new(0.0, 0.0, 75.0, 100.0));
    }

    #[test]
    fn empty_collection_has_no_bounds() {
        let fc = FeatureCollection::new();
        assert!(fc.bounds().is_none());

        let mut fc = FeatureCollection::new();
        fc.push(Feature::empty());
        assert!(fc.bounds().is_none());
    }
}
