//! Per-level contour extraction by zero-crossing detection
//!
//! For a level `L`, the smoothed surface minus `L` is positive above the
//! contour and negative below it. Cells whose sign differs from that of an
//! 8-neighbor straddle the contour and are marked with `L`; all other cells
//! are NaN.
//!
//! Signs are three-valued (−1, 0, +1): a cell exactly on the level next to a
//! cell off it counts as a crossing, while a uniformly flat field at the
//! level has no crossings.

use crate::maybe_rayon::*;
use crate::terrain::{gaussian_smooth, GaussianParams};
use contorno_core::raster::{Connectivity, Raster};
use contorno_core::{Error, Result};
use ndarray::Array2;

/// Connectivity used to decide whether a cell straddles a level
pub const CROSSING_CONNECTIVITY: Connectivity = Connectivity::Eight;

const INVALID: i8 = i8::MIN;

/// Smooth `dem` and extract the crossing cells for one `level`.
///
/// # Errors
/// - [`Error::InvalidParameter`] for a non-positive kernel size
/// - [`Error::ExtractionFailed`] if smoothing or differencing overflows
pub fn extract_level(dem: &Raster<f64>, kernel_size: f64, level: f64) -> Result<Raster<f64>> {
    let smoothed = gaussian_smooth(dem, GaussianParams::new(kernel_size)).map_err(|e| match e {
        Error::Algorithm(reason) => Error::ExtractionFailed { level, reason },
        other => other,
    })?;
    extract_level_from_smoothed(&smoothed, level)
}

/// Extract the crossing cells for `level` from an already smoothed surface.
///
/// The smoothed raster does not depend on the level, so callers extracting
/// many levels smooth once and share it.
pub fn extract_level_from_smoothed(smoothed: &Raster<f64>, level: f64) -> Result<Raster<f64>> {
    if !level.is_finite() {
        return Err(Error::invalid_parameter("level", level, "must be finite"));
    }

    let signs = difference_signs(smoothed, level)?;
    let (rows, cols) = signs.dim();

    let marked: Vec<Vec<f64>> = (0..rows)
        .into_par_iter()
        .map(|row| {
            (0..cols)
                .map(|col| {
                    let sign = signs[[row, col]];
                    let crossing = sign != INVALID
                        && CROSSING_CONNECTIVITY
                            .neighbors(row, col, rows, cols)
                            .any(|(nr, nc)| {
                                let other = signs[[nr, nc]];
                                other != INVALID && other != sign
                            });
                    if crossing {
                        level
                    } else {
                        f64::NAN
                    }
                })
                .collect()
        })
        .collect();

    let data: Vec<f64> = marked.into_iter().flatten().collect();
    let data = Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    smoothed.derive(data, Some(f64::NAN))
}

/// Sign of `smoothed - level` per cell, `INVALID` on nodata
fn difference_signs(smoothed: &Raster<f64>, level: f64) -> Result<Array2<i8>> {
    let mut signs = Array2::from_elem(smoothed.shape(), INVALID);

    for ((row, col), &value) in smoothed.data().indexed_iter() {
        if smoothed.is_nodata(value) {
            continue;
        }
        let diff = value - level;
        if !diff.is_finite() {
            return Err(Error::ExtractionFailed {
                level,
                reason: format!("difference at ({}, {}) is not finite", row, col),
            });
        }
        signs[[row, col]] = if diff > 0.0 {
            1
        } else if diff < 0.0 {
            -1
        } else {
            0
        };
    }

    Ok(signs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contorno_core::GeoTransform;

    fn dem_from(rows: usize, cols: usize, f: impl Fn(usize, usize) -> f64) -> Raster<f64> {
        let mut r = Raster::new(rows, cols);
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        for row in 0..rows {
            for col in 0..cols {
                r.set(row, col, f(row, col)).unwrap();
            }
        }
        r
    }

    fn crossing_cols(raster: &Raster<f64>, row: usize) -> Vec<usize> {
        (0..raster.cols()).filter(|&c| raster.valid(row, c).is_some()).collect()
    }

    #[test]
    fn test_step_marks_both_sides() {
        let dem = dem_from(5, 10, |_, c| if c < 5 { 0.0 } else { 10.0 });
        let out = extract_level_from_smoothed(&dem, 5.0).unwrap();

        for row in 0..5 {
            assert_eq!(crossing_cols(&out, row), vec![4, 5]);
        }
        assert_eq!(out.get(0, 4).unwrap(), 5.0);
    }

    #[test]
    fn test_exact_zero_counts_as_crossing() {
        let dem = dem_from(3, 5, |_, c| c as f64);
        let out = extract_level_from_smoothed(&dem, 2.0).unwrap();
        // Column 2 sits exactly on the level; 1 and 3 differ in sign from it
        assert_eq!(crossing_cols(&out, 1), vec![1, 2, 3]);
    }

    #[test]
    fn test_flat_at_level_has_no_crossing() {
        let dem = dem_from(6, 6, |_, _| 100.0);
        let out = extract_level_from_smoothed(&dem, 100.0).unwrap();
        assert_eq!(out.valid_count(), 0);
    }

    #[test]
    fn test_level_outside_range_has_no_crossing() {
        let dem = dem_from(6, 6, |r, c| (r + c) as f64);
        let out = extract_level_from_smoothed(&dem, 1000.0).unwrap();
        assert_eq!(out.valid_count(), 0);
    }

    #[test]
    fn test_diagonal_neighbors_count() {
        // Single high cell; with 8-connectivity all of its ring sees the change
        let dem = dem_from(5, 5, |r, c| if r == 2 && c == 2 { 10.0 } else { 0.0 });
        let out = extract_level_from_smoothed(&dem, 5.0).unwrap();
        assert_eq!(out.valid_count(), 9);
    }

    #[test]
    fn test_nodata_neighbors_ignored() {
        let mut dem = dem_from(3, 3, |_, _| 1.0);
        dem.set(1, 1, f64::NAN).unwrap();
        let out = extract_level_from_smoothed(&dem, 5.0).unwrap();
        assert_eq!(out.valid_count(), 0);
    }

    #[test]
    fn test_zero_level_is_kept() {
        let dem = dem_from(3, 4, |_, c| c as f64 - 1.5);
        let out = extract_level_from_smoothed(&dem, 0.0).unwrap();
        assert_eq!(crossing_cols(&out, 0), vec![1, 2]);
        assert_eq!(out.get(0, 1).unwrap(), 0.0);
    }

    #[test]
    fn test_extract_level_smooths_first() {
        let dem = dem_from(20, 40, |_, c| c as f64);
        let out = extract_level(&dem, 2.0, 20.0).unwrap();
        assert!(out.same_grid(&dem));
        for row in 0..20 {
            let cols = crossing_cols(&out, row);
            assert!(!cols.is_empty());
            assert!(cols.iter().all(|c| (19..=21).contains(c)), "row {}: {:?}", row, cols);
        }
    }

    #[test]
    fn test_overflow_is_extraction_failure() {
        let dem = dem_from(3, 3, |_, _| f64::MAX);
        let err = extract_level_from_smoothed(&dem, -f64::MAX).unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed { .. }));

        let mut dem = dem_from(5, 5, |_, _| f64::MAX);
        dem.set(2, 2, -f64::MAX).unwrap();
        let err = extract_level(&dem, 1.0, 0.0).unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed { level, .. } if level == 0.0));
    }

    #[test]
    fn test_invalid_kernel() {
        let dem = dem_from(3, 3, |_, _| 0.0);
        assert!(matches!(
            extract_level(&dem, 0.0, 1.0),
            Err(Error::InvalidParameter { name: "kernel_size", .. })
        ));
    }
}
