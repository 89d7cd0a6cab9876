//! # Contorno Algorithms
//!
//! Contour extraction for digital elevation models.
//!
//! ## Modules
//!
//! - **contour**: level sequences, zero-crossing extraction, mosaicking and
//!   the end-to-end pipeline
//! - **terrain**: Gaussian smoothing
//! - **vector**: band vectorization and Douglas-Peucker simplification
//! - **statistics**: attribute range reduction

pub(crate) mod maybe_rayon;

pub mod contour;
pub mod statistics;
pub mod terrain;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::contour::{
        clip_to_roi, composite, extract_level, extract_level_from_smoothed, generate_contours,
        generate_contours_with_cancel, level_sequence, mosaic_last_valid, ContourGenerator,
        ContourParams, ContourResult,
    };
    pub use crate::statistics::{elevation_range, ElevationRange};
    pub use crate::terrain::{gaussian_smooth, GaussianParams};
    pub use crate::vector::{simplify_dp, vectorize_bands, BandVectors, VectorizeParams};
    pub use contorno_core::prelude::*;
}
