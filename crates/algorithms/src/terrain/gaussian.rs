//! Separable Gaussian smoothing of elevation rasters
//!
//! The kernel radius is the requested kernel size rounded up (so the kernel
//! spans `2·ceil(size) + 1` cells) and σ = size / 2. Taps beyond the grid
//! never contribute, so the radius is capped at the larger grid dimension.
//! Invalid cells are skipped and the remaining weights renormalized, so
//! edges and nodata holes do not drag the surface toward zero.
//!
//! Each output is accumulated as the weighted mean of offsets from the center
//! value rather than of raw values. A constant surface therefore smooths to
//! itself bit for bit, which keeps zero-crossing detection from picking up
//! rounding noise on flat terrain.

use crate::maybe_rayon::*;
use ndarray::Array2;
use contorno_core::raster::Raster;
use contorno_core::{Error, Result};

/// Parameters for Gaussian smoothing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianParams {
    /// Kernel size in cells; the radius is its ceiling and σ is half of it.
    pub kernel_size: f64,
}

impl Default for GaussianParams {
    fn default() -> Self {
        Self { kernel_size: 5.0 }
    }
}

impl GaussianParams {
    pub fn new(kernel_size: f64) -> Self {
        Self { kernel_size }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.kernel_size.is_finite() || self.kernel_size <= 0.0 {
            return Err(Error::invalid_parameter(
                "kernel_size",
                self.kernel_size,
                "must be a finite value > 0",
            ));
        }
        Ok(())
    }

    pub fn sigma(&self) -> f64 {
        self.kernel_size / 2.0
    }

    pub fn radius(&self) -> usize {
        self.kernel_size.ceil() as usize
    }
}

/// Smooth a DEM with a normalized, separable Gaussian kernel.
///
/// Cells that are invalid in `dem` stay invalid (NaN) in the output; the
/// output shares the DEM's grid.
///
/// # Errors
/// - [`Error::InvalidParameter`] for a non-positive kernel size
/// - [`Error::Algorithm`] when a finite input cell smooths to a non-finite
///   value (overflow on extreme elevations)
pub fn gaussian_smooth(dem: &Raster<f64>, params: GaussianParams) -> Result<Raster<f64>> {
    params.validate()?;

    let (rows, cols) = dem.shape();
    let radius = params.radius().min(rows.max(cols));
    let kernel = gaussian_kernel(radius, params.sigma());

    let source = dem.data().mapv(|v| if dem.is_nodata(v) { f64::NAN } else { v });
    let horizontal = convolve_pass(&source, &kernel, Axis::Row)?;
    let smoothed = convolve_pass(&horizontal, &kernel, Axis::Col)?;

    debug_assert_eq!(smoothed.dim(), (rows, cols));
    dem.derive(smoothed, Some(f64::NAN))
}

/// Normalized 1D Gaussian weights, `2·radius + 1` long.
///
/// A σ so small that σ² underflows yields a unit impulse at the center.
pub fn gaussian_kernel(radius: usize, sigma: f64) -> Vec<f64> {
    let denom = 2.0 * sigma * sigma;
    if denom == 0.0 {
        let mut kernel = vec![0.0; 2 * radius + 1];
        kernel[radius] = 1.0;
        return kernel;
    }

    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-x * x / denom).exp()
        })
        .collect();

    let sum: f64 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

#[derive(Clone, Copy)]
enum Axis {
    Row,
    Col,
}

fn convolve_pass(data: &Array2<f64>, kernel: &[f64], axis: Axis) -> Result<Array2<f64>> {
    let (rows, cols) = data.dim();
    let half = (kernel.len() / 2) as isize;

    let out: Vec<Vec<f64>> = (0..rows)
        .into_par_iter()
        .map(|row| {
            let mut out = vec![f64::NAN; cols];
            for (col, slot) in out.iter_mut().enumerate() {
                let center = data[[row, col]];
                if center.is_nan() {
                    continue;
                }

                let mut offset_sum = 0.0;
                let mut wsum = 0.0;
                for (k, &w) in kernel.iter().enumerate() {
                    let d = k as isize - half;
                    let (r, c) = match axis {
                        Axis::Row => (row as isize, col as isize + d),
                        Axis::Col => (row as isize + d, col as isize),
                    };
                    if r < 0 || c < 0 || r >= rows as isize || c >= cols as isize {
                        continue;
                    }
                    let v = data[[r as usize, c as usize]];
                    if !v.is_nan() {
                        offset_sum += w * (v - center);
                        wsum += w;
                    }
                }

                let value = center + offset_sum / wsum;
                if !value.is_finite() {
                    return Err(Error::Algorithm(format!(
                        "smoothing produced a non-finite value at ({}, {}) from {}",
                        row, col, center
                    )));
                }
                *slot = value;
            }
            Ok(out)
        })
        .collect::<Result<Vec<_>>>()?;

    let flat: Vec<f64> = out.into_iter().flatten().collect();
    Array2::from_shape_vec((rows, cols), flat).map_err(|e| Error::Other(e.to_string()))
}
