//! Output encoders
//!
//! Three pure functions turning a heightmap plus water mask into the final
//! buffers. No I/O happens here; callers persist the results.

use image::RgbaImage;

use crate::calibrate::Calibration;
use crate::grid::Grid;

/// Side of the playable output window, in cells
pub const MAP_SIDE: usize = 1081;
/// Magic bytes overwriting the first 16-bit pair of a raw heightmap
pub const RAW_MARKER: [u8; 4] = [255, 255, 0, 0];
/// Spacing of the optional orientation grid on grayscale output, in cells
pub const GRID_SPACING: usize = 120;

/// Vertical resolution of the 16-bit format, in meters per step
const RAW_STEP_M: f64 = 0.015625;
/// Vertical resolution of the 8-bit format, in meters per step
const GRAY_STEP_M: f64 = 4.0;

fn scaled_height(elevation: i32, water: f32, cal: &Calibration, step: f64) -> f64 {
    let height =
        (elevation as f64 / 10.0 - cal.base_level) / step * cal.height_scale / 100.0;
    let depth_units = cal.water_depth / step;
    (height + depth_units * water as f64).round().max(0.0)
}

/// Encode a [`MAP_SIDE`]-cell sub-window as 16-bit big-endian heights.
///
/// One step is 1/64 m; land is raised by the calibrated water depth times
/// its mask value, heights below the base clamp to zero. The first four
/// bytes carry the [`RAW_MARKER`].
pub fn raw16(
    heightmap: &Grid<i32>,
    watermask: &Grid<f32>,
    cal: &Calibration,
    x_off: usize,
    y_off: usize,
) -> Vec<u8> {
    let mut out = vec![0u8; 2 * MAP_SIDE * MAP_SIDE];
    for y in 0..MAP_SIDE {
        for x in 0..MAP_SIDE {
            let elevation = heightmap.get(x + x_off, y + y_off).unwrap_or(0);
            let water = watermask.get(x + x_off, y + y_off).unwrap_or(1.0);
            let h = scaled_height(elevation, water, cal, RAW_STEP_M).min(65535.0) as u16;
            let index = (y * MAP_SIDE + x) * 2;
            out[index] = (h >> 8) as u8;
            out[index + 1] = (h & 255) as u8;
        }
    }
    out[..4].copy_from_slice(&RAW_MARKER);
    out
}

/// Encode a [`MAP_SIDE`]-cell sub-window as an opaque grayscale RGBA image.
///
/// One step is 4 m, so the brightest pixel is 1020 m over base. With
/// `draw_grid`, every [`GRID_SPACING`]th row and column (the zeroth
/// excluded) is overdrawn in mid-gray for orientation.
pub fn gray8(
    heightmap: &Grid<i32>,
    watermask: &Grid<f32>,
    cal: &Calibration,
    x_off: usize,
    y_off: usize,
    draw_grid: bool,
) -> RgbaImage {
    let mut img = RgbaImage::new(MAP_SIDE as u32, MAP_SIDE as u32);
    for y in 0..MAP_SIDE {
        for x in 0..MAP_SIDE {
            let elevation = heightmap.get(x + x_off, y + y_off).unwrap_or(0);
            let water = watermask.get(x + x_off, y + y_off).unwrap_or(1.0);
            let h = scaled_height(elevation, water, cal, GRAY_STEP_M).min(255.0) as u8;
            img.put_pixel(x as u32, y as u32, image::Rgba([h, h, h, 255]));
        }
    }
    if draw_grid {
        for y in 1..MAP_SIDE {
            for x in 1..MAP_SIDE {
                if y % GRID_SPACING == 0 || x % GRID_SPACING == 0 {
                    let alpha = img.get_pixel(x as u32, y as u32)[3];
                    img.put_pixel(x as u32, y as u32, image::Rgba([63, 63, 63, alpha]));
                }
            }
        }
    }
    img
}

/// Re-encode a heightmap as a terrain-RGB image at its own resolution,
/// the exact inverse of the tile decoder.
pub fn terrain_rgb(heightmap: &Grid<i32>) -> RgbaImage {
    let side = heightmap.side;
    let mut img = RgbaImage::new(side as u32, side as u32);
    for y in 0..side {
        for x in 0..side {
            let v = (heightmap.data[y * side + x] + 100_000) as u32;
            let r = (v >> 16) as u8;
            let g = ((v >> 8) & 255) as u8;
            let b = (v & 255) as u8;
            img.put_pixel(x as u32, y as u32, image::Rgba([r, g, b, 255]));
        }
    }
    img
}
