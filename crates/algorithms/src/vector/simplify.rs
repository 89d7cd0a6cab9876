//! Douglas-Peucker simplification of traced region boundaries

use geo::{Geometry, LineString, MultiPolygon, Polygon, Simplify};

/// Fewest coordinates a closed ring can have (triangle plus closing point)
const MIN_RING_COORDS: usize = 4;

/// Simplify a polygonal geometry with Douglas-Peucker.
///
/// An exterior ring that would collapse below a triangle keeps its original
/// vertices so small regions are never lost; collapsing holes are dropped.
/// Non-polygonal geometries are returned unchanged.
pub fn simplify_dp(geom: &Geometry<f64>, tolerance: f64) -> Geometry<f64> {
    match geom {
        Geometry::Polygon(p) => Geometry::Polygon(simplify_polygon_dp(p, tolerance)),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(MultiPolygon::new(
            mp.0.iter().map(|p| simplify_polygon_dp(p, tolerance)).collect(),
        )),
        other => other.clone(),
    }
}

/// Simplify one polygon, keeping it a valid ring
pub fn simplify_polygon_dp(polygon: &Polygon<f64>, tolerance: f64) -> Polygon<f64> {
    if tolerance <= 0.0 {
        return polygon.clone();
    }

    let exterior = simplify_ring(polygon.exterior(), tolerance)
        .unwrap_or_else(|| polygon.exterior().clone());
    let interiors: Vec<LineString<f64>> = polygon
        .interiors()
        .iter()
        .filter_map(|ring| simplify_ring(ring, tolerance))
        .collect();
    Polygon::new(exterior, interiors)
}

fn simplify_ring(ring: &LineString<f64>, tolerance: f64) -> Option<LineString<f64>> {
    let simplified = ring.simplify(&tolerance);
    (simplified.0.len() >= MIN_RING_COORDS).then_some(simplified)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wobbly_square() -> Polygon<f64> {
        let exterior = LineString::from(vec![
            (0.0, 0.0),
            (1.0, 0.1),
            (2.0, 0.0),
            (3.0, 0.05),
            (4.0, 0.0),
            (5.0, 0.0),
            (5.0, 5.0),
            (4.0, 4.9),
            (3.0, 5.0),
            (2.0, 5.1),
            (1.0, 5.0),
            (0.0, 5.0),
            (0.0, 0.0),
        ]);
        Polygon::new(exterior, vec![])
    }

    #[test]
    fn test_simplify_reduces_vertices() {
        let poly = wobbly_square();
        let original_count = poly.exterior().0.len();

        let Geometry::Polygon(p) = simplify_dp(&Geometry::Polygon(poly), 0.15) else {
            panic!("Expected Polygon");
        };

        assert!(
            p.exterior().0.len() < original_count,
            "Polygon should be simplified: {} -> {}",
            original_count,
            p.exterior().0.len()
        );
        assert_eq!(p.exterior().0.first(), p.exterior().0.last());
    }

    #[test]
    fn test_small_region_not_collapsed() {
        // A 1x1 square simplified with a huge tolerance would degenerate
        let square = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]),
            vec![],
        );
        let p = simplify_polygon_dp(&square, 100.0);
        assert_eq!(p.exterior().0.len(), 5);
    }

    #[test]
    fn test_collapsing_hole_dropped() {
        let exterior = LineString::from(vec![
            (0.0, 0.0),
            (100.0, 0.0),
            (100.0, 100.0),
            (0.0, 100.0),
            (0.0, 0.0),
        ]);
        let hole = LineString::from(vec![(50.0, 50.0), (51.0, 50.0), (51.0, 51.0), (50.0, 50.0)]);
        let p = simplify_polygon_dp(&Polygon::new(exterior, vec![hole]), 10.0);
        assert!(p.interiors().is_empty());
        assert_eq!(p.exterior().0.len(), 5);
    }

    #[test]
    fn test_zero_tolerance_is_identity() {
        let poly = wobbly_square();
        assert_eq!(simplify_polygon_dp(&poly, 0.0), poly);
    }
}
