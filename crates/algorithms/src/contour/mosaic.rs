//! Mosaic of per-level contour rasters
//!
//! Layers are stacked in level order; for every cell the value of the last
//! layer that is valid there wins. The result is then clipped to the region
//! of interest.

use crate::maybe_rayon::*;
use contorno_core::raster::Raster;
use contorno_core::vector::Roi;
use contorno_core::{Error, Result};
use ndarray::Array2;

/// Stack `layers` so that for every cell the last valid layer wins.
///
/// Cells no layer covers are NaN. All layers must share one grid.
///
/// # Errors
/// - [`Error::InvalidParameter`] for an empty layer list
/// - [`Error::SizeMismatch`] / [`Error::TransformMismatch`] for layers on
///   different grids
pub fn mosaic_last_valid(layers: &[Raster<f64>]) -> Result<Raster<f64>> {
    let first = layers
        .first()
        .ok_or_else(|| Error::invalid_parameter("layers", 0, "at least one layer is required"))?;
    for layer in &layers[1..] {
        first.ensure_same_grid(layer)?;
    }

    let mut data = Array2::from_elem(first.shape(), f64::NAN);
    for layer in layers {
        ndarray::Zip::from(&mut data)
            .and(layer.data())
            .for_each(|out, &v| {
                if !layer.is_nodata(v) {
                    *out = v;
                }
            });
    }

    first.derive(data, Some(f64::NAN))
}

/// Set every cell whose center lies outside `roi` to NaN.
///
/// A center on the ROI boundary counts as inside.
pub fn clip_to_roi(raster: &Raster<f64>, roi: &Roi) -> Result<Raster<f64>> {
    let (rows, cols) = raster.shape();
    let bbox = roi.bounding_rect();

    let clipped: Vec<Vec<f64>> = (0..rows)
        .into_par_iter()
        .map(|row| {
            (0..cols)
                .map(|col| {
                    let value = raster.data()[[row, col]];
                    if raster.is_nodata(value) {
                        return f64::NAN;
                    }
                    let (x, y) = raster.cell_center(row, col);
                    let inside = match bbox {
                        Some(rect) => {
                            x >= rect.min().x
                                && x <= rect.max().x
                                && y >= rect.min().y
                                && y <= rect.max().y
                                && roi.contains(x, y)
                        }
                        None => false,
                    };
                    if inside {
                        value
                    } else {
                        f64::NAN
                    }
                })
                .collect()
        })
        .collect();

    let data = Array2::from_shape_vec((rows, cols), clipped.into_iter().flatten().collect())
        .map_err(|e| Error::Other(e.to_string()))?;
    raster.derive(data, Some(f64::NAN))
}

/// Mosaic `layers` last-valid-wins and clip the result to `roi`.
pub fn composite(layers: &[Raster<f64>], roi: &Roi) -> Result<Raster<f64>> {
    let mosaic = mosaic_last_valid(layers)?;
    clip_to_roi(&mosaic, roi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contorno_core::GeoTransform;

    fn grid(values: &[f64], rows: usize, cols: usize) -> Raster<f64> {
        let mut r = Raster::from_vec(values.to_vec(), rows, cols).unwrap();
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        r.set_nodata(Some(f64::NAN));
        r
    }

    const N: f64 = f64::NAN;

    #[test]
    fn test_last_valid_wins() {
        let a = grid(&[10.0, 10.0, N, N], 2, 2);
        let b = grid(&[N, 20.0, 20.0, N], 2, 2);
        let out = mosaic_last_valid(&[a, b]).unwrap();

        assert_eq!(out.get(0, 0).unwrap(), 10.0);
        // Overlap: the later layer replaces the earlier one
        assert_eq!(out.get(0, 1).unwrap(), 20.0);
        assert_eq!(out.get(1, 0).unwrap(), 20.0);
        assert!(out.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn test_order_matters() {
        let a = grid(&[10.0; 4], 2, 2);
        let b = grid(&[20.0; 4], 2, 2);
        let ab = mosaic_last_valid(&[a.clone(), b.clone()]).unwrap();
        let ba = mosaic_last_valid(&[b, a]).unwrap();
        assert_eq!(ab.get(0, 0).unwrap(), 20.0);
        assert_eq!(ba.get(0, 0).unwrap(), 10.0);
    }

    #[test]
    fn test_coverage_is_union() {
        let a = grid(&[1.0, N, N, N, N, 1.0], 2, 3);
        let b = grid(&[N, N, 2.0, N, N, N], 2, 3);
        let c = grid(&[N, N, N, 3.0, N, N], 2, 3);
        let out = mosaic_last_valid(&[a.clone(), b, c]).unwrap();
        assert_eq!(out.valid_count(), 4);
        assert!(out.valid_count() >= a.valid_count());
    }

    #[test]
    fn test_empty_layers() {
        assert!(matches!(
            mosaic_last_valid(&[]),
            Err(Error::InvalidParameter { name: "layers", .. })
        ));
    }

    #[test]
    fn test_grid_mismatch() {
        let a = grid(&[1.0; 4], 2, 2);
        let b = grid(&[1.0; 6], 2, 3);
        assert!(mosaic_last_valid(&[a, b]).is_err());
    }

    #[test]
    fn test_clip_by_cell_center() {
        // 4x4 grid over [0,4]x[0,4]; ROI covers the left half
        let r = grid(&[5.0; 16], 4, 4);
        let roi = Roi::from_rect(0.0, 0.0, 2.0, 4.0);
        let out = clip_to_roi(&r, &roi).unwrap();

        for row in 0..4 {
            assert_eq!(out.get(row, 0).unwrap(), 5.0);
            assert_eq!(out.get(row, 1).unwrap(), 5.0);
            assert!(out.get(row, 2).unwrap().is_nan());
            assert!(out.get(row, 3).unwrap().is_nan());
        }
    }

    #[test]
    fn test_clip_boundary_center_is_inside() {
        let r = grid(&[5.0; 16], 4, 4);
        // Right edge passes through the centers of column 1
        let roi = Roi::from_rect(0.0, 0.0, 1.5, 4.0);
        let out = clip_to_roi(&r, &roi).unwrap();
        assert_eq!(out.valid_count(), 8);
    }

    #[test]
    fn test_clip_empty_roi() {
        let r = grid(&[5.0; 4], 2, 2);
        let out = clip_to_roi(&r, &Roi::empty()).unwrap();
        assert_eq!(out.valid_count(), 0);
    }

    #[test]
    fn test_composite() {
        let a = grid(&[1.0, 1.0, 1.0, 1.0], 2, 2);
        let b = grid(&[N, 2.0, N, N], 2, 2);
        let roi = Roi::from_rect(1.0, 0.0, 2.0, 2.0);
        let out = composite(&[a, b], &roi).unwrap();

        assert!(out.get(0, 0).unwrap().is_nan());
        assert_eq!(out.get(0, 1).unwrap(), 2.0);
        assert_eq!(out.get(1, 1).unwrap(), 1.0);
    }
}
