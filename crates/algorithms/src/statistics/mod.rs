//! Statistical reductions
//!
//! - Attribute range: min/max of a numeric feature attribute

mod range;

pub use range::{attribute_range, elevation_range, ElevationRange};
