//! Min/max reduction over feature attributes

use crate::vector::ELEVATION_ATTRIBUTE;
use contorno_core::vector::FeatureCollection;
use contorno_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Lowest and highest elevation present in a region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationRange {
    pub min: f64,
    pub max: f64,
}

impl ElevationRange {
    fn include(self, value: f64) -> Self {
        Self {
            min: self.min.min(value),
            max: self.max.max(value),
        }
    }
}

/// Min/max of the `elevation` attribute over all features.
///
/// # Errors
/// [`Error::EmptyRegion`] when no feature carries a finite elevation. An
/// empty region is never reported as a zero or NaN range.
pub fn elevation_range(features: &FeatureCollection) -> Result<ElevationRange> {
    attribute_range(features, ELEVATION_ATTRIBUTE)
}

/// Min/max of a numeric attribute. Features without a finite numeric value
/// for `attribute` are skipped.
pub fn attribute_range(features: &FeatureCollection, attribute: &str) -> Result<ElevationRange> {
    features
        .iter()
        .filter_map(|f| f.get_f64(attribute))
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<ElevationRange>, v| {
            Some(match acc {
                Some(range) => range.include(v),
                None => ElevationRange { min: v, max: v },
            })
        })
        .ok_or(Error::EmptyRegion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contorno_core::vector::{AttributeValue, Feature};

    fn with_elevation(v: AttributeValue) -> Feature {
        Feature::empty().with_property(ELEVATION_ATTRIBUTE, v)
    }

    #[test]
    fn test_range() {
        let fc: FeatureCollection = [300.0, -20.0, 150.0]
            .into_iter()
            .map(|v| with_elevation(AttributeValue::Float(v)))
            .collect();
        let range = elevation_range(&fc).unwrap();
        assert_eq!(range, ElevationRange { min: -20.0, max: 300.0 });
    }

    #[test]
    fn test_single_feature() {
        let fc: FeatureCollection = std::iter::once(with_elevation(AttributeValue::Int(100))).collect();
        assert_eq!(elevation_range(&fc).unwrap(), ElevationRange { min: 100.0, max: 100.0 });
    }

    #[test]
    fn test_empty_is_reported() {
        let fc = FeatureCollection::new();
        assert!(matches!(elevation_range(&fc), Err(Error::EmptyRegion)));
    }

    #[test]
    fn test_features_without_value_are_skipped() {
        let fc: FeatureCollection = vec![
            Feature::empty(),
            with_elevation(AttributeValue::Float(f64::NAN)),
            with_elevation(AttributeValue::String("high".into())),
        ]
        .into_iter()
        .collect();
        assert!(matches!(elevation_range(&fc), Err(Error::EmptyRegion)));

        let mut fc = fc;
        fc.push(with_elevation(AttributeValue::Float(7.0)));
        assert_eq!(elevation_range(&fc).unwrap(), ElevationRange { min: 7.0, max: 7.0 });
    }

    #[test]
    fn test_other_attribute() {
        let fc: FeatureCollection = std::iter::once(Feature::empty().with_property("count", AttributeValue::Int(3))).collect();
        assert_eq!(attribute_range(&fc, "count").unwrap().max, 3.0);
    }
}
