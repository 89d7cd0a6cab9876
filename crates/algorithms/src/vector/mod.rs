//! Vector operations on elevation rasters
//!
//! - Vectorize: group equal-band cells into labeled polygons
//! - Simplify: Douglas-Peucker with ring-preserving fallbacks

mod simplify;
mod vectorize;

pub use simplify::{simplify_dp, simplify_polygon_dp};
pub use vectorize::{
    vectorize_bands, BandVectors, VectorizeParams, BAND_ATTRIBUTE, COUNT_ATTRIBUTE,
    DEFAULT_MAX_CELLS, DEFAULT_SIMPLIFY_TOLERANCE, ELEVATION_ATTRIBUTE,
};
