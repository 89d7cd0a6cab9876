//! Elevation band vectorization
//!
//! Quantizes a DEM into bands of `floor(z / interval)` inside a region of
//! interest, labels maximal 8-connected regions of equal band, and traces
//! each region's outline into a polygon tagged with its elevation.
//!
//! ## Algorithm
//!
//! 1. Clip the work to the cells under the ROI's bounding box. If that block
//!    holds more cells than the budget allows, sample every `s`-th cell in
//!    both directions, with `s` the smallest stride that fits.
//! 2. Flood-fill label same-band cells with 8-connectivity.
//! 3. Walk the cell edges separating each region from everything else. At a
//!    vertex where the region only touches itself diagonally the walk crosses
//!    over to the other cell, so a diagonally connected region yields one
//!    outline. Rings with positive area in row-down pixel space are
//!    exteriors, negative ones are holes.
//! 4. Map ring vertices through the geotransform and simplify them with
//!    Douglas-Peucker.

use std::collections::HashMap;

use crate::maybe_rayon::*;
use crate::vector::simplify::simplify_polygon_dp;
use contorno_core::raster::{Connectivity, GeoTransform, Raster};
use contorno_core::vector::{AttributeValue, Feature, FeatureCollection, PixelWindow, Roi};
use contorno_core::{Error, Result};
use geo::{Coord, Geometry, LineString, MultiPolygon, Polygon};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Attribute holding `band × interval` on every vectorized feature
pub const ELEVATION_ATTRIBUTE: &str = "elevation";
/// Attribute holding the integer band index
pub const BAND_ATTRIBUTE: &str = "band";
/// Attribute holding the number of (sampled) cells in the region
pub const COUNT_ATTRIBUTE: &str = "count";

/// Default simplification tolerance in map units
pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 10.0;
/// Default cell budget for vectorization
pub const DEFAULT_MAX_CELLS: usize = 10_000_000;

/// Parameters for band vectorization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizeParams {
    /// Band width in elevation units
    pub interval: f64,
    /// Douglas-Peucker tolerance in map units
    pub simplify_tolerance: f64,
    /// Largest number of cells examined; larger windows are subsampled
    pub max_cells: usize,
    /// Requested sampling scale in map units. `None` samples at native
    /// resolution (subject to `max_cells`).
    pub scale: Option<f64>,
}

impl Default for VectorizeParams {
    fn default() -> Self {
        Self {
            interval: 100.0,
            simplify_tolerance: DEFAULT_SIMPLIFY_TOLERANCE,
            max_cells: DEFAULT_MAX_CELLS,
            scale: None,
        }
    }
}

impl VectorizeParams {
    pub fn validate(&self) -> Result<()> {
        if !self.interval.is_finite() || self.interval <= 0.0 {
            return Err(Error::invalid_parameter(
                "interval",
                self.interval,
                "must be a finite value > 0",
            ));
        }
        if !self.simplify_tolerance.is_finite() || self.simplify_tolerance < 0.0 {
            return Err(Error::invalid_parameter(
                "simplify_tolerance",
                self.simplify_tolerance,
                "must be a finite value >= 0",
            ));
        }
        if let Some(scale) = self.scale {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(Error::invalid_parameter("scale", scale, "must be a finite value > 0"));
            }
        }
        Ok(())
    }
}

/// Vectorized bands plus the resolution they were computed at
#[derive(Debug, Clone)]
pub struct BandVectors {
    pub features: FeatureCollection,
    /// Sampling stride in cells (1 = native resolution)
    pub stride: usize,
    /// Cell size actually used, in map units
    pub effective_scale: f64,
}

/// Vectorize elevation bands of `dem` inside `roi`.
///
/// Returns one polygon feature per connected equal-band region with
/// `elevation`, `band` and `count` attributes. An ROI that misses the grid or
/// covers only invalid cells yields an empty collection, not an error.
///
/// # Errors
/// - [`Error::InvalidParameter`] for a non-positive interval or scale
/// - [`Error::ResourceBudgetExceeded`] when `max_cells` is zero
pub fn vectorize_bands(dem: &Raster<f64>, roi: &Roi, params: &VectorizeParams) -> Result<BandVectors> {
    params.validate()?;

    let (rows, cols) = dem.shape();
    let cell_size = dem.cell_size();

    let Some(window) = roi.pixel_window(dem.transform(), rows, cols) else {
        debug!("ROI does not overlap the raster; nothing to vectorize");
        return Ok(BandVectors {
            features: FeatureCollection::new(),
            stride: 1,
            effective_scale: cell_size,
        });
    };

    let min_stride = params
        .scale
        .map(|scale| ((scale / cell_size).round() as usize).max(1))
        .unwrap_or(1);
    let stride = choose_stride(&window, params.max_cells, min_stride)?;
    let effective_scale = cell_size * stride as f64;

    if stride > 1 {
        debug!(
            window_cells = window.cells(),
            budget = params.max_cells,
            stride,
            effective_scale,
            "vectorizing at degraded resolution"
        );
    }

    let bands = quantize(dem, roi, &window, stride, params.interval);
    let (labels, regions) = label_regions(&bands);
    let grid = dem.transform().subgrid(window.col0, window.row0, stride);

    let features: Vec<Feature> = regions
        .par_iter()
        .enumerate()
        .map(|(idx, region)| {
            let id = idx as u32 + 1;
            let geometry = trace_region(&labels, id, region, &grid, params.simplify_tolerance);
            Feature::new(geometry)
                .with_property(ELEVATION_ATTRIBUTE, AttributeValue::Float(region.band as f64 * params.interval))
                .with_property(BAND_ATTRIBUTE, AttributeValue::Int(region.band))
                .with_property(COUNT_ATTRIBUTE, AttributeValue::Int(region.cells.len() as i64))
        })
        .collect();

    debug!(regions = features.len(), stride, "band vectorization complete");

    Ok(BandVectors {
        features: features.into_iter().collect(),
        stride,
        effective_scale,
    })
}

/// Smallest stride ≥ `min_stride` whose sampled grid fits in `max_cells`
fn choose_stride(window: &PixelWindow, max_cells: usize, min_stride: usize) -> Result<usize> {
    if max_cells == 0 {
        return Err(Error::ResourceBudgetExceeded {
            cells: window.cells(),
            budget: max_cells,
        });
    }

    let sampled = |s: usize| window.rows.div_ceil(s) * window.cols.div_ceil(s);
    let estimate = ((window.cells() as f64 / max_cells as f64).sqrt().floor() as usize).max(1);
    let mut stride = min_stride.max(estimate);
    while sampled(stride) > max_cells {
        stride += 1;
    }
    Ok(stride)
}

/// Band index per sampled cell; `None` outside the ROI or on invalid data
fn quantize(
    dem: &Raster<f64>,
    roi: &Roi,
    window: &PixelWindow,
    stride: usize,
    interval: f64,
) -> Array2<Option<i64>> {
    let srows = window.rows.div_ceil(stride);
    let scols = window.cols.div_ceil(stride);

    let cells: Vec<Option<i64>> = (0..srows)
        .into_par_iter()
        .flat_map(|i| {
            let row = window.row0 + i * stride;
            (0..scols)
                .map(|j| {
                    let col = window.col0 + j * stride;
                    let value = dem.valid(row, col)?;
                    let (x, y) = dem.cell_center(row, col);
                    roi.contains(x, y).then(|| (value / interval).floor() as i64)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    Array2::from_shape_vec((srows, scols), cells).unwrap_or_else(|_| Array2::from_elem((srows, scols), None))
}

/// A connected set of equal-band cells
#[derive(Debug, Clone)]
struct Region {
    band: i64,
    cells: Vec<(usize, usize)>,
}

/// Label 8-connected regions. Labels start at 1; 0 marks unlabeled cells.
fn label_regions(bands: &Array2<Option<i64>>) -> (Array2<u32>, Vec<Region>) {
    let (rows, cols) = bands.dim();
    let mut labels = Array2::<u32>::zeros((rows, cols));
    let mut regions = Vec::new();
    let mut stack = Vec::new();

    for row in 0..rows {
        for col in 0..cols {
            let Some(band) = bands[[row, col]] else { continue };
            if labels[[row, col]] != 0 {
                continue;
            }

            let id = regions.len() as u32 + 1;
            let mut cells = Vec::new();
            labels[[row, col]] = id;
            stack.push((row, col));

            while let Some((r, c)) = stack.pop() {
                cells.push((r, c));
                for (nr, nc) in Connectivity::Eight.neighbors(r, c, rows, cols) {
                    if labels[[nr, nc]] == 0 && bands[[nr, nc]] == Some(band) {
                        labels[[nr, nc]] = id;
                        stack.push((nr, nc));
                    }
                }
            }

            regions.push(Region { band, cells });
        }
    }

    (labels, regions)
}

/// Grid vertex (x = column, y = row) in sampled pixel space
type Vertex = (usize, usize);

#[derive(Debug, Clone, Copy)]
struct Edge {
    from: Vertex,
    to: Vertex,
}

impl Edge {
    fn direction(&self) -> (isize, isize) {
        (
            self.to.0 as isize - self.from.0 as isize,
            self.to.1 as isize - self.from.1 as isize,
        )
    }
}

/// Outline of one labeled region as a (multi)polygon in map coordinates
fn trace_region(
    labels: &Array2<u32>,
    id: u32,
    region: &Region,
    grid: &GeoTransform,
    tolerance: f64,
) -> Geometry<f64> {
    let rings = boundary_rings(labels, id, region);

    let mut exteriors: Vec<(f64, LineString<f64>)> = Vec::new();
    let mut holes: Vec<LineString<f64>> = Vec::new();
    for ring in rings {
        let area = signed_area(&ring);
        let coords: Vec<Coord<f64>> = ring
            .iter()
            .map(|&(x, y)| {
                let (gx, gy) = grid.pixel_to_geo_corner(x, y);
                Coord { x: gx, y: gy }
            })
            .collect();
        let line = LineString::new(coords);
        if area > 0 {
            exteriors.push((area as f64, line));
        } else {
            holes.push(line);
        }
    }

    // An 8-connected region against a 4-connected background has exactly one
    // outer ring; any extra exterior is kept as a separate part.
    exteriors.sort_by(|a, b| b.0.total_cmp(&a.0));
    let mut parts = exteriors.into_iter().map(|(_, ring)| ring);
    let outer = parts.next().unwrap_or_else(|| LineString::new(vec![]));
    let mut polygons = vec![simplify_polygon_dp(&Polygon::new(outer, holes), tolerance)];
    polygons.extend(parts.map(|ring| simplify_polygon_dp(&Polygon::new(ring, vec![]), tolerance)));

    if polygons.len() == 1 {
        Geometry::Polygon(polygons.remove(0))
    } else {
        Geometry::MultiPolygon(MultiPolygon::new(polygons))
    }
}

/// Closed vertex rings (first == last) bounding the region, collinear
/// vertices removed
fn boundary_rings(labels: &Array2<u32>, id: u32, region: &Region) -> Vec<Vec<Vertex>> {
    let (rows, cols) = labels.dim();
    let outside = |r: isize, c: isize| {
        r < 0 || c < 0 || r >= rows as isize || c >= cols as isize || labels[[r as usize, c as usize]] != id
    };

    // Directed so the region lies to the right when walking in row-down space
    let mut edges = Vec::new();
    for &(r, c) in &region.cells {
        let (ri, ci) = (r as isize, c as isize);
        if outside(ri - 1, ci) {
            edges.push(Edge { from: (c, r), to: (c + 1, r) });
        }
        if outside(ri, ci + 1) {
            edges.push(Edge { from: (c + 1, r), to: (c + 1, r + 1) });
        }
        if outside(ri + 1, ci) {
            edges.push(Edge { from: (c + 1, r + 1), to: (c, r + 1) });
        }
        if outside(ri, ci - 1) {
            edges.push(Edge { from: (c, r + 1), to: (c, r) });
        }
    }

    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::with_capacity(edges.len());
    for (idx, edge) in edges.iter().enumerate() {
        outgoing.entry(edge.from).or_default().push(idx);
    }

    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();

    for start in 0..edges.len() {
        if used[start] {
            continue;
        }

        let mut ring = vec![edges[start].from];
        let mut current = start;
        loop {
            used[current] = true;
            let edge = edges[current];
            ring.push(edge.to);

            let next = successor(&edges, &outgoing, current);
            if next == start || used[next] {
                break;
            }
            current = next;
        }

        rings.push(drop_collinear(ring));
    }

    rings
}

/// The edge that follows `current` along the boundary.
///
/// Every vertex has as many incoming as outgoing boundary edges: one of each,
/// or two of each at a pinch point where the region touches itself only
/// diagonally. There the walk turns left, crossing over to the diagonal cell,
/// so each ring separates the region from exactly one background area and
/// successors form a permutation of the edges.
fn successor(edges: &[Edge], outgoing: &HashMap<Vertex, Vec<usize>>, current: usize) -> usize {
    let edge = edges[current];
    let Some(out) = outgoing.get(&edge.to) else {
        return current;
    };
    let (dx, dy) = edge.direction();
    out.iter()
        .copied()
        .find(|&e| out.len() == 1 || edges[e].direction() == (dy, -dx))
        .unwrap_or(current)
}

/// Remove vertices where the boundary continues straight on
fn drop_collinear(ring: Vec<Vertex>) -> Vec<Vertex> {
    // ring is closed: ring[0] == ring[n - 1]
    let n = ring.len() - 1;
    if n < 3 {
        return ring;
    }

    let dir = |a: Vertex, b: Vertex| {
        (
            (b.0 as isize - a.0 as isize).signum(),
            (b.1 as isize - a.1 as isize).signum(),
        )
    };

    let mut kept: Vec<Vertex> = (0..n)
        .filter(|&i| {
            let prev = ring[(i + n - 1) % n];
            let next = ring[(i + 1) % n];
            dir(prev, ring[i]) != dir(ring[i], next)
        })
        .map(|i| ring[i])
        .collect();

    if let Some(&first) = kept.first() {
        kept.push(first);
    }
    kept
}

/// Twice the signed area of a closed ring in row-down pixel space
fn signed_area(ring: &[Vertex]) -> i64 {
    ring.windows(2)
        .map(|w| {
            let (x0, y0) = (w[0].0 as i64, w[0].1 as i64);
            let (x1, y1) = (w[1].0 as i64, w[1].1 as i64);
            x0 * y1 - x1 * y0
        })
        .sum()
}
