//! Contour generation
//!
//! - Levels: evenly spaced contour elevations over a range
//! - Extract: zero-crossing cells of a smoothed surface per level
//! - Mosaic: last-valid-wins compositing and ROI clipping
//! - Pipeline: the full DEM → contour raster chain

mod extract;
mod levels;
mod mosaic;
mod pipeline;

pub use extract::{extract_level, extract_level_from_smoothed, CROSSING_CONNECTIVITY};
pub use levels::{level_sequence, MAX_LEVELS};
pub use mosaic::{clip_to_roi, composite, mosaic_last_valid};
pub use pipeline::{
    generate_contours, generate_contours_with_cancel, ContourGenerator, ContourParams, ContourResult,
};
