//! Bilinear resampling of the source elevation grid
//!
//! Resamples the assembled tile-block elevations into the target heightmap
//! resolution. The last row and column of the target are copied straight
//! from the last source row/column (with the orthogonal index clamped)
//! instead of interpolated; the rest of the pipeline relies on that exact
//! boundary behavior.

use crate::grid::Grid;

/// Bilinearly resample `src` into a grid of side `target_side`.
pub fn resample(src: &Grid<i32>, target_side: usize) -> Grid<i32> {
    let src_side = src.side;
    if target_side == 0 {
        return Grid { side: 0, data: Vec::new() };
    }
    if src_side < 2 || target_side < 2 {
        let value = src.data.first().copied().unwrap_or(0);
        return Grid::filled(target_side, value);
    }

    let mut out = Grid::filled(target_side, 0i32);
    let ratio = (target_side - 1) as f64 / (src_side - 1) as f64;

    // Interior cells: standard four-corner bilinear blend.
    for i in 0..target_side - 1 {
        let sy = i as f64 / ratio;
        let y0 = sy.floor() as usize;
        let y1 = (y0 + 1).min(src_side - 1);
        let dy = sy - y0 as f64;

        for j in 0..target_side - 1 {
            let sx = j as f64 / ratio;
            let x0 = sx.floor() as usize;
            let x1 = (x0 + 1).min(src_side - 1);
            let dx = sx - x0 as f64;

            let v00 = src.data[y0 * src_side + x0] as f64;
            let v10 = src.data[y0 * src_side + x1] as f64;
            let v01 = src.data[y1 * src_side + x0] as f64;
            let v11 = src.data[y1 * src_side + x1] as f64;

            let value = (1.0 - dx) * (1.0 - dy) * v00
                + dx * (1.0 - dy) * v10
                + (1.0 - dx) * dy * v01
                + dx * dy * v11;
            out.data[i * target_side + j] = value.round() as i32;
        }
    }

    // Edge-copy contract: last column then last row come straight from the
    // last source column/row with the other index clamped.
    for i in 0..target_side {
        let sy = i.min(src_side - 1);
        out.data[i * target_side + (target_side - 1)] = src.data[sy * src_side + (src_side - 1)];
    }
    for j in 0..target_side {
        let sx = j.min(src_side - 1);
        out.data[(target_side - 1) * target_side + j] = src.data[(src_side - 1) * src_side + sx];
    }

    out
}
