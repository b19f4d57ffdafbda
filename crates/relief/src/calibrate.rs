//! Height calibration
//!
//! Maps raw decimeter elevations into an encoder-friendly window. A
//! calibration either comes from the caller (persisted from an earlier run)
//! or is derived automatically from the observed elevation range. No global
//! state is involved; the calibration travels with the request.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grid::Grid;

/// Maximum automatic vertical exaggeration, in percent
pub const MAX_HEIGHT_SCALE: f64 = 250.0;

/// Parameters controlling how elevations map onto the output height range.
/// All levels are in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Elevation subtracted from every sample before scaling
    pub base_level: f64,
    /// Headroom raised under land so water can sit below it
    pub water_depth: f64,
    /// Vertical exaggeration in percent (100 = unscaled)
    pub height_scale: f64,
    /// Elevation at or below which a cell counts as sea
    pub sea_level: f64,
}

/// Observed elevation range in meters over a square sub-window of the
/// heightmap. Window cells falling outside the grid are skipped, so a
/// window that misses the grid entirely yields an inverted infinite pair.
pub fn min_max(heightmap: &Grid<i32>, x_off: usize, y_off: usize, window: usize) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for y in 0..window {
        for x in 0..window {
            let Some(v) = heightmap.get(x + x_off, y + y_off) else {
                continue;
            };
            let meters = v as f64 / 10.0;
            if meters < min {
                min = meters;
            }
            if meters > max {
                max = meters;
            }
        }
    }
    (min, max)
}

/// Derive a calibration from an observed elevation range in meters.
///
/// The base sits at the minimum so the lowest terrain lands just above
/// water depth, and the scale stretches the range toward the top of the
/// 1024 m output window without exceeding [`MAX_HEIGHT_SCALE`] percent.
pub fn auto_calibrate(min: f64, max: f64) -> Result<Calibration> {
    if !min.is_finite() || !max.is_finite() || max <= min {
        return Err(Error::DegenerateRange);
    }
    let water_depth = 5.0;
    let scale = ((1024.0 - water_depth) / (max - min) * 100.0).floor();
    Ok(Calibration {
        base_level: min,
        water_depth,
        height_scale: scale.min(MAX_HEIGHT_SCALE),
        sea_level: min.floor(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_calibrate_wide_range() {
        let cal = auto_calibrate(0.0, 1000.0).unwrap();
        assert_eq!(cal.base_level, 0.0);
        assert_eq!(cal.water_depth, 5.0);
        assert_eq!(cal.height_scale, 101.0);
        assert_eq!(cal.sea_level, 0.0);
    }

    #[test]
    fn test_auto_calibrate_clamps_scale() {
        // A 10 m range would want a huge exaggeration.
        let cal = auto_calibrate(200.5, 210.5).unwrap();
        assert_eq!(cal.height_scale, MAX_HEIGHT_SCALE);
        assert_eq!(cal.base_level, 200.5);
        assert_eq!(cal.sea_level, 200.0);
    }

    #[test]
    fn test_auto_calibrate_rejects_flat_terrain() {
        assert!(matches!(
            auto_calibrate(100.0, 100.0),
            Err(Error::DegenerateRange)
        ));
        assert!(matches!(
            auto_calibrate(100.0, 50.0),
            Err(Error::DegenerateRange)
        ));
    }

    #[test]
    fn test_min_max_in_meters() {
        let grid = Grid::from_data(2, vec![30, -12, 900, 4]);
        assert_eq!(min_max(&grid, 0, 0, 2), (-1.2, 90.0));
    }

    #[test]
    fn test_min_max_respects_window() {
        let grid = Grid::from_data(3, vec![10, 20, 900, 30, 40, 900, 900, 900, 900]);
        assert_eq!(min_max(&grid, 0, 0, 2), (1.0, 4.0));
    }

    #[test]
    fn test_min_max_skips_out_of_bounds() {
        let grid = Grid::from_data(2, vec![50, 60, 70, 80]);
        // Window pokes past the grid on both axes.
        assert_eq!(min_max(&grid, 1, 1, 4), (8.0, 8.0));
        let (min, max) = min_max(&grid, 5, 5, 2);
        assert!(min > max);
    }
}
