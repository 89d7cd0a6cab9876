//! End-to-end contour pipeline
//!
//! vectorize bands → elevation range → level sequence → smooth once →
//! per-level crossing extraction (fan-out) → last-valid mosaic → ROI clip.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::contour::extract::extract_level_from_smoothed;
use crate::contour::levels::level_sequence;
use crate::contour::mosaic::composite;
use crate::maybe_rayon::*;
use crate::statistics::elevation_range;
use crate::terrain::{gaussian_smooth, GaussianParams};
use crate::vector::{vectorize_bands, VectorizeParams, DEFAULT_MAX_CELLS, DEFAULT_SIMPLIFY_TOLERANCE};
use contorno_core::raster::Raster;
use contorno_core::vector::Roi;
use contorno_core::{Algorithm, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Parameters for [`generate_contours`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourParams {
    /// Spacing between contour levels, also the band width used to find the
    /// elevation range
    pub interval: f64,
    /// Gaussian smoothing size in cells (σ = size / 2)
    pub kernel_size: f64,
    /// Douglas-Peucker tolerance for the band polygons, in map units
    pub simplify_tolerance: f64,
    /// Cell budget for band vectorization
    pub max_cells: usize,
    /// Sampling scale for band vectorization in map units; native when `None`
    pub vector_scale: Option<f64>,
    /// Worker threads for the per-level fan-out; rayon's global pool when `None`
    pub threads: Option<usize>,
}

impl Default for ContourParams {
    fn default() -> Self {
        Self {
            interval: 100.0,
            kernel_size: 5.0,
            simplify_tolerance: DEFAULT_SIMPLIFY_TOLERANCE,
            max_cells: DEFAULT_MAX_CELLS,
            vector_scale: None,
            threads: None,
        }
    }
}

impl ContourParams {
    pub fn new(interval: f64, kernel_size: f64) -> Self {
        Self {
            interval,
            kernel_size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.vectorize_params().validate()?;
        self.smoothing_params().validate()?;
        if self.threads == Some(0) {
            return Err(Error::invalid_parameter("threads", 0, "must be at least 1"));
        }
        Ok(())
    }

    pub fn vectorize_params(&self) -> VectorizeParams {
        VectorizeParams {
            interval: self.interval,
            simplify_tolerance: self.simplify_tolerance,
            max_cells: self.max_cells,
            scale: self.vector_scale,
        }
    }

    pub fn smoothing_params(&self) -> GaussianParams {
        GaussianParams::new(self.kernel_size)
    }
}

/// Output of [`generate_contours`]
#[derive(Debug, Clone)]
pub struct ContourResult {
    /// Composite contour raster on the DEM's grid; NaN off contours and
    /// outside the ROI
    pub contours: Raster<f64>,
    /// Lowest band elevation found inside the ROI
    pub min_elevation: f64,
    /// Highest band elevation found inside the ROI
    pub max_elevation: f64,
    /// Contour levels, ascending
    pub levels: Vec<f64>,
    /// Cell size the bands were vectorized at
    pub effective_scale: f64,
    /// Number of band polygons
    pub feature_count: usize,
}

/// Generate a contour raster for `dem` inside `roi`.
///
/// # Errors
/// - [`Error::InvalidParameter`] for a non-positive interval or kernel size
/// - [`Error::EmptyRegion`] when the ROI holds no valid cells
/// - [`Error::ResourceBudgetExceeded`] for a zero cell budget
/// - [`Error::ExtractionFailed`] when any level fails; no partial result is
///   returned
pub fn generate_contours(dem: &Raster<f64>, roi: &Roi, params: &ContourParams) -> Result<ContourResult> {
    let cancel = AtomicBool::new(false);
    generate_contours_with_cancel(dem, roi, params, &cancel)
}

/// [`generate_contours`] that stops with [`Error::Cancelled`] once `cancel`
/// is set.
pub fn generate_contours_with_cancel(
    dem: &Raster<f64>,
    roi: &Roi,
    params: &ContourParams,
    cancel: &AtomicBool,
) -> Result<ContourResult> {
    params.validate()?;
    check_cancel(cancel)?;

    let bands = vectorize_bands(dem, roi, &params.vectorize_params())?;
    let feature_count = bands.features.len();
    debug!(
        features = feature_count,
        stride = bands.stride,
        effective_scale = bands.effective_scale,
        "bands vectorized"
    );

    let range = elevation_range(&bands.features)?;
    let levels = level_sequence(range.min, range.max, params.interval)?;
    debug!(min = range.min, max = range.max, levels = levels.len(), "levels generated");
    check_cancel(cancel)?;

    let first_level = levels.first().copied().unwrap_or(range.min);
    let smoothed = gaussian_smooth(dem, params.smoothing_params()).map_err(|e| match e {
        Error::Algorithm(reason) => Error::ExtractionFailed {
            level: first_level,
            reason,
        },
        other => other,
    })?;

    let layers = extract_all(&smoothed, &levels, params.threads, cancel)?;
    let contours = composite(&layers, roi)?;

    info!(
        min_elevation = range.min,
        max_elevation = range.max,
        levels = levels.len(),
        contour_cells = contours.valid_count(),
        "contours generated"
    );

    Ok(ContourResult {
        contours,
        min_elevation: range.min,
        max_elevation: range.max,
        levels,
        effective_scale: bands.effective_scale,
        feature_count,
    })
}

fn check_cancel(cancel: &AtomicBool) -> Result<()> {
    if cancel.load(Ordering::Relaxed) {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}

/// One crossing raster per level, in level order
fn extract_all(
    smoothed: &Raster<f64>,
    levels: &[f64],
    threads: Option<usize>,
    cancel: &AtomicBool,
) -> Result<Vec<Raster<f64>>> {
    let run = || {
        levels
            .par_iter()
            .map(|&level| {
                check_cancel(cancel)?;
                extract_level_from_smoothed(smoothed, level)
            })
            .collect::<Result<Vec<_>>>()
    };

    #[cfg(feature = "parallel")]
    if let Some(threads) = threads {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| Error::Other(format!("failed to build thread pool: {}", e)))?;
        return pool.install(run);
    }

    #[cfg(not(feature = "parallel"))]
    let _ = threads;

    run()
}

/// Contour generation as an [`Algorithm`] over a DEM and its region of
/// interest
#[derive(Debug, Clone, Default)]
pub struct ContourGenerator;

impl Algorithm for ContourGenerator {
    type Input = (Raster<f64>, Roi);
    type Output = ContourResult;
    type Params = ContourParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Contours"
    }

    fn description(&self) -> &'static str {
        "Contour lines at regular intervals from a smoothed DEM, clipped to a region of interest"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (dem, roi) = input;
        generate_contours(&dem, &roi, &params)
    }
}
