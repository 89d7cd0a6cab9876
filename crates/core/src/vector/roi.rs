//! Region of interest

use crate::raster::GeoTransform;
use geo::{BoundingRect, Intersects};
use geo_types::{coord, LineString, MultiPolygon, Point, Polygon, Rect};

/// An immutable region of interest in map coordinates.
///
/// A cell belongs to the region when its center lies inside the polygon
/// or on its boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Roi {
    geometry: MultiPolygon<f64>,
}

/// A rectangular block of cells, `rows` × `cols` starting at (`row0`, `col0`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub row0: usize,
    pub col0: usize,
    pub rows: usize,
    pub cols: usize,
}

impl PixelWindow {
    /// Number of cells in the window
    pub fn cells(&self) -> usize {
        self.rows * self.cols
    }
}

impl Roi {
    pub fn new(geometry: MultiPolygon<f64>) -> Self {
        Self { geometry }
    }

    pub fn from_polygon(polygon: Polygon<f64>) -> Self {
        Self::new(MultiPolygon::new(vec![polygon]))
    }

    /// Axis-aligned rectangle
    pub fn from_rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        let rect = Rect::new(coord! { x: min_x, y: min_y }, coord! { x: max_x, y: max_y });
        Self::from_polygon(rect.to_polygon())
    }

    /// Closed ring from a list of vertices; the ring is closed if needed
    pub fn from_vertices(vertices: Vec<(f64, f64)>) -> Self {
        Self::from_polygon(Polygon::new(LineString::from(vertices), vec![]))
    }

    /// The full extent of a grid
    pub fn covering(transform: &GeoTransform, rows: usize, cols: usize) -> Self {
        let (min_x, min_y, max_x, max_y) = transform.bounds(cols, rows);
        Self::from_rect(min_x, min_y, max_x, max_y)
    }

    /// A region containing nothing
    pub fn empty() -> Self {
        Self::new(MultiPolygon::new(vec![]))
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.0.is_empty()
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.geometry.bounding_rect()
    }

    /// Whether the map point (x, y) is inside the region or on its boundary
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.geometry.intersects(&Point::new(x, y))
    }

    /// Cells of a `rows` × `cols` grid touched by the region's bounding box.
    ///
    /// `None` when the region is empty or lies entirely off the grid.
    pub fn pixel_window(
        &self,
        transform: &GeoTransform,
        rows: usize,
        cols: usize,
    ) -> Option<PixelWindow> {
        let rect = self.bounding_rect()?;
        let (min, max) = (rect.min(), rect.max());

        let corners = [
            transform.geo_to_pixel(min.x, min.y),
            transform.geo_to_pixel(min.x, max.y),
            transform.geo_to_pixel(max.x, min.y),
            transform.geo_to_pixel(max.x, max.y),
        ];
        if corners.iter().any(|(c, r)| !c.is_finite() || !r.is_finite()) {
            return None;
        }

        let (c_lo, r_lo, c_hi, r_hi) = corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(c_lo, r_lo, c_hi, r_hi), &(c, r)| (c_lo.min(c), r_lo.min(r), c_hi.max(c), r_hi.max(r)),
        );

        let clamp = |v: f64, hi: usize| v.max(0.0).min(hi as f64) as usize;
        let row0 = clamp(r_lo.floor(), rows);
        let col0 = clamp(c_lo.floor(), cols);
        let row1 = clamp(r_hi.ceil(), rows);
        let col1 = clamp(c_hi.ceil(), cols);

        if row1 <= row0 || col1 <= col0 {
            return None;
        }

        Some(PixelWindow {
            row0,
            col0,
            rows: row1 - row0,
            cols: col1 - col0,
        })
    }
}

impl From<Polygon<f64>> for Roi {
    fn from(polygon: Polygon<f64>) -> Self {
        Self::from_polygon(polygon)
    }
}

impl From<MultiPolygon<f64>> for Roi {
    fn from(geometry: MultiPolygon<f64>) -> Self {
        Self::new(geometry)
    }
}
