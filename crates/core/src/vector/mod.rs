//! Vector data structures
//!
//! - [`Feature`] / [`FeatureCollection`]: geometry plus attributes, the
//!   output of band vectorization
//! - [`Roi`]: region of interest polygon used to mask and clip rasters

mod roi;

pub use roi::{PixelWindow, Roi};

use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Numeric view of the attribute, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes, ordered by key
    pub properties: BTreeMap<String, AttributeValue>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: BTreeMap::new(),
        }
    }

    /// Create a feature with no geometry
    pub fn empty() -> Self {
        Self {
            geometry: None,
            properties: BTreeMap::new(),
        }
    }

    /// Set an attribute, builder style
    pub fn with_property(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.set_property(key, value);
        self
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    /// Numeric attribute, `None` if missing or non-numeric
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get_property(key).and_then(AttributeValue::as_f64)
    }
}

/// Collection of features
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self { features: Vec::new() }
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
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
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
    use geo_types::Point;

    #[test]
    fn test_numeric_property() {
        let f = Feature::new(Geometry::Point(Point::new(0.0, 0.0)))
            .with_property("elevation", AttributeValue::Float(120.0))
            .with_property("count", AttributeValue::Int(4))
            .with_property("name", AttributeValue::String("a".into()));

        assert_eq!(f.get_f64("elevation"), Some(120.0));
        assert_eq!(f.get_f64("count"), Some(4.0));
        assert_eq!(f.get_f64("name"), None);
        assert_eq!(f.get_f64("missing"), None);
    }

    #[test]
    fn test_collect_features() {
        let fc: FeatureCollection = (0..3).map(|_| Feature::empty()).collect();
        assert_eq!(fc.len(), 3);
        assert!(!fc.is_empty());
    }
}
