//! Contour level sequences

use contorno_core::{Error, Result};

/// Slack, in units of `interval`, when deciding whether the top level still
/// fits under `max`. Ranges derived from bands are exact multiples of the
/// interval up to rounding, and that rounding must not drop the top level.
const LEVEL_SLACK: f64 = 1e-9;

/// Largest number of levels a sequence may hold. Every level becomes a
/// full-size raster downstream.
pub const MAX_LEVELS: usize = 10_000;

/// Evenly spaced contour levels `min, min + interval, …` up to the largest
/// value not above `max`.
///
/// The sequence has `floor((max - min) / interval) + 1` entries; level `i`
/// is computed as `min + i·interval` so error does not accumulate.
///
/// # Errors
/// [`Error::InvalidParameter`] when `interval <= 0`, `min > max`, any input
/// is not finite, or the range holds more than [`MAX_LEVELS`] levels.
pub fn level_sequence(min: f64, max: f64, interval: f64) -> Result<Vec<f64>> {
    if !interval.is_finite() || interval <= 0.0 {
        return Err(Error::invalid_parameter("interval", interval, "must be a finite value > 0"));
    }
    if !min.is_finite() || !max.is_finite() {
        return Err(Error::invalid_parameter(
            "range",
            format!("[{}, {}]", min, max),
            "bounds must be finite",
        ));
    }
    if min > max {
        return Err(Error::invalid_parameter(
            "range",
            format!("[{}, {}]", min, max),
            "min must not exceed max",
        ));
    }

    let steps = ((max - min) / interval + LEVEL_SLACK).floor();
    if !steps.is_finite() || steps >= MAX_LEVELS as f64 {
        return Err(Error::invalid_parameter(
            "interval",
            interval,
            format!(
                "range [{}, {}] would need more than {} levels",
                min, max, MAX_LEVELS
            ),
        ));
    }
    let steps = steps as usize;
    Ok((0..=steps).map(|i| min + i as f64 * interval).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inclusive_of_max() {
        assert_eq!(level_sequence(0.0, 90.0, 10.0).unwrap().len(), 10);
        assert_eq!(
            level_sequence(100.0, 130.0, 10.0).unwrap(),
            vec![100.0, 110.0, 120.0, 130.0]
        );
    }

    #[test]
    fn test_stops_below_max() {
        assert_eq!(level_sequence(0.0, 25.0, 10.0).unwrap(), vec![0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_single_level() {
        assert_eq!(level_sequence(100.0, 100.0, 10.0).unwrap(), vec![100.0]);
    }

    #[test]
    fn test_length_and_spacing_property() {
        for &(min, max, interval) in &[
            (0.0, 99.0, 10.0),
            (-250.0, 4810.0, 100.0),
            (1.5, 2.75, 0.25),
            (2858.0, 5981.0, 2.0),
        ] {
            let levels = level_sequence(min, max, interval).unwrap();
            let expected = ((max - min) / interval).floor() as usize + 1;
            assert_eq!(levels.len(), expected);
            assert_eq!(levels[0], min);
            assert!(*levels.last().unwrap() <= max);
            for pair in levels.windows(2) {
                assert_relative_eq!(pair[1] - pair[0], interval, max_relative = 1e-9);
            }
        }
    }

    #[test]
    fn test_rounded_band_range_keeps_top_level() {
        // 3 × 0.1 is 0.30000000000000004; the top level must survive either way
        let levels = level_sequence(0.1, 0.3, 0.1).unwrap();
        assert_eq!(levels.len(), 3);
    }

    #[test]
    fn test_level_count_is_bounded() {
        assert_eq!(level_sequence(0.0, 9_999.0, 1.0).unwrap().len(), MAX_LEVELS);

        for (min, max, interval) in [
            (0.0, 10_000.0, 1.0),
            (0.0, 1e300, 1.0),
            (-f64::MAX, f64::MAX, 1.0),
            (0.0, 1.0, 1e-310),
        ] {
            assert!(matches!(
                level_sequence(min, max, interval),
                Err(Error::InvalidParameter { name: "interval", .. })
            ));
        }
    }

    #[test]
    fn test_invalid_parameters() {
        for (min, max, interval) in [
            (0.0, 10.0, 0.0),
            (0.0, 10.0, -5.0),
            (10.0, 0.0, 1.0),
            (f64::NAN, 10.0, 1.0),
            (0.0, f64::INFINITY, 1.0),
        ] {
            assert!(matches!(
                level_sequence(min, max, interval),
                Err(Error::InvalidParameter { .. })
            ));
        }
    }
}
