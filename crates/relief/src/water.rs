//! Water mask rasterization
//!
//! Turns the water/waterway geometry of a vector tile block into a land/water
//! mask aligned to the heightmap grid: 1.0 = land, 0.0 = water, intermediate
//! values only after tapering or blurring. Polygon rings are filled with an
//! explicit non-zero-winding scanline pass over the flat mask; no drawing
//! surface is involved.

use crate::grid::Grid;
use crate::mvt::{GeomType, Tile};

/// Name of the polygon layer holding water bodies
pub const WATER_LAYER: &str = "water";
/// Name of the line layer holding waterways (streams, canals)
pub const WATERWAY_LAYER: &str = "waterway";

/// Rasterize the water geometry of a tile block onto a `canvas_side` mask.
///
/// `tiles` holds the decoded vector tiles row-major (`tile_count` per side);
/// a `None` slot simply contributes no geometry. Ring coordinates are
/// tile-local and get scaled by `canvas_side / (tile_count * extent)` plus
/// the per-tile translation before filling. With `draw_waterways`, line
/// features of the waterway layer are stroked one cell wide as water.
pub fn rasterize(
    tiles: &[Option<Tile>],
    tile_count: usize,
    canvas_side: usize,
    draw_waterways: bool,
) -> Grid<f32> {
    let mut mask = Grid::filled(canvas_side, 1.0f32);
    if canvas_side == 0 || tile_count == 0 {
        return mask;
    }

    // All rings from all tiles share one winding pass, so overlapping
    // geometry from neighboring tiles behaves like a single fill.
    let mut rings: Vec<Vec<(i32, i32)>> = Vec::new();
    for ty in 0..tile_count {
        for tx in 0..tile_count {
            let Some(tile) = tiles.get(ty * tile_count + tx).and_then(|t| t.as_ref()) else {
                continue;
            };
            let Some(layer) = tile.layer(WATER_LAYER) else {
                continue;
            };

            let coef = canvas_side as f64 / (tile_count as f64 * layer.extent() as f64);
            let off_x = tx as f64 * canvas_side as f64 / tile_count as f64;
            let off_y = ty as f64 * canvas_side as f64 / tile_count as f64;

            for feature in &layer.features {
                if feature.kind() != GeomType::Polygon {
                    continue;
                }
                for path in feature.paths() {
                    let ring: Vec<(i32, i32)> = path
                        .iter()
                        .map(|&(x, y)| {
                            (
                                (x as f64 * coef + off_x).round() as i32,
                                (y as f64 * coef + off_y).round() as i32,
                            )
                        })
                        .collect();
                    if ring.len() >= 3 {
                        rings.push(ring);
                    }
                }
            }
        }
    }
    fill_rings(&mut mask, &rings);

    if draw_waterways {
        stroke_waterways(&mut mask, tiles, tile_count, canvas_side);
    }

    mask
}

/// Non-zero-winding scanline fill: cells whose center falls inside any of
/// the rings (in aggregate) become water.
fn fill_rings(mask: &mut Grid<f32>, rings: &[Vec<(i32, i32)>]) {
    if rings.is_empty() {
        return;
    }
    let side = mask.side;
    let mut crossings: Vec<(f64, i32)> = Vec::new();

    for y in 0..side {
        let yc = y as f64 + 0.5;
        crossings.clear();

        for ring in rings {
            let n = ring.len();
            for i in 0..n {
                let (x0, y0) = ring[i];
                let (x1, y1) = ring[(i + 1) % n];
                if y0 == y1 {
                    continue;
                }
                let (y0, y1, x0, x1) = (y0 as f64, y1 as f64, x0 as f64, x1 as f64);
                // Half-open span so shared vertices count exactly once.
                let crosses = (y0 <= yc) != (y1 <= yc);
                if crosses {
                    let t = (yc - y0) / (y1 - y0);
                    let x_int = x0 + t * (x1 - x0);
                    let dir = if y1 > y0 { 1 } else { -1 };
                    crossings.push((x_int, dir));
                }
            }
        }
        if crossings.is_empty() {
            continue;
        }
        crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut winding = 0i32;
        let mut next = 0usize;
        for x in 0..side {
            let xc = x as f64 + 0.5;
            while next < crossings.len() && crossings[next].0 <= xc {
                winding += crossings[next].1;
                next += 1;
            }
            if winding != 0 {
                mask.data[y * side + x] = 0.0;
            }
        }
    }
}

fn stroke_waterways(
    mask: &mut Grid<f32>,
    tiles: &[Option<Tile>],
    tile_count: usize,
    canvas_side: usize,
) {
    for ty in 0..tile_count {
        for tx in 0..tile_count {
            let Some(tile) = tiles.get(ty * tile_count + tx).and_then(|t| t.as_ref()) else {
                continue;
            };
            let Some(layer) = tile.layer(WATERWAY_LAYER) else {
                continue;
            };

            let coef = canvas_side as f64 / (tile_count as f64 * layer.extent() as f64);
            let off_x = tx as f64 * canvas_side as f64 / tile_count as f64;
            let off_y = ty as f64 * canvas_side as f64 / tile_count as f64;

            for feature in &layer.features {
                if feature.kind() != GeomType::LineString {
                    continue;
                }
                for path in feature.paths() {
                    let points: Vec<(i32, i32)> = path
                        .iter()
                        .map(|&(x, y)| {
                            (
                                (x as f64 * coef + off_x).round() as i32,
                                (y as f64 * coef + off_y).round() as i32,
                            )
                        })
                        .collect();
                    for segment in points.windows(2) {
                        stroke_segment(mask, segment[0], segment[1]);
                    }
                }
            }
        }
    }
}

/// One-cell-wide Bresenham stroke marking cells as water
fn stroke_segment(mask: &mut Grid<f32>, from: (i32, i32), to: (i32, i32)) {
    let (mut x, mut y) = from;
    let (x1, y1) = to;
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if x >= 0 && y >= 0 {
            mask.set(x as usize, y as usize, 0.0);
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Grade the land/water boundary into a slope band.
///
/// The falloff is a linear ramp over a chamfer distance transform: every
/// land cell gets `min(1, dist_to_water / slope_distance)` where distance
/// steps cost 1 orthogonally and sqrt(2) diagonally. Water cells stay 0.
/// A non-positive `slope_distance` leaves the mask untouched.
pub fn taper(mask: &Grid<f32>, slope_distance: f32) -> Grid<f32> {
    if slope_distance <= 0.0 {
        return mask.clone();
    }
    let side = mask.side;
    if side == 0 {
        return mask.clone();
    }

    const DIAG: f32 = std::f32::consts::SQRT_2;
    let mut dist = vec![f32::INFINITY; side * side];
    for (i, &v) in mask.data.iter().enumerate() {
        if v < 0.5 {
            dist[i] = 0.0;
        }
    }

    // Forward pass: top-left to bottom-right.
    for y in 0..side {
        for x in 0..side {
            let i = y * side + x;
            let mut d = dist[i];
            if x > 0 {
                d = d.min(dist[i - 1] + 1.0);
            }
            if y > 0 {
                d = d.min(dist[i - side] + 1.0);
                if x > 0 {
                    d = d.min(dist[i - side - 1] + DIAG);
                }
                if x + 1 < side {
                    d = d.min(dist[i - side + 1] + DIAG);
                }
            }
            dist[i] = d;
        }
    }
    // Backward pass: bottom-right to top-left.
    for y in (0..side).rev() {
        for x in (0..side).rev() {
            let i = y * side + x;
            let mut d = dist[i];
            if x + 1 < side {
                d = d.min(dist[i + 1] + 1.0);
            }
            if y + 1 < side {
                d = d.min(dist[i + side] + 1.0);
                if x + 1 < side {
                    d = d.min(dist[i + side + 1] + DIAG);
                }
                if x > 0 {
                    d = d.min(dist[i + side - 1] + DIAG);
                }
            }
            dist[i] = d;
        }
    }

    let mut out = mask.clone();
    for (i, v) in out.data.iter_mut().enumerate() {
        *v = if *v < 0.5 {
            0.0
        } else {
            (dist[i] / slope_distance).min(1.0)
        };
    }
    out
}

/// 3x3 blur with weights {corner 1/16, edge 1/8, center 1/4} and
/// replicate-edge padding on every side.
pub fn blur(mask: &Grid<f32>) -> Grid<f32> {
    let side = mask.side;
    if side == 0 {
        return mask.clone();
    }
    let mut out = Grid::filled(side, 0.0f32);

    let sample = |x: isize, y: isize| -> f32 {
        let x = x.clamp(0, side as isize - 1) as usize;
        let y = y.clamp(0, side as isize - 1) as usize;
        mask.data[y * side + x]
    };

    for y in 0..side {
        for x in 0..side {
            let (xi, yi) = (x as isize, y as isize);
            let corners = sample(xi - 1, yi - 1)
                + sample(xi + 1, yi - 1)
                + sample(xi - 1, yi + 1)
                + sample(xi + 1, yi + 1);
            let edges = sample(xi, yi - 1)
                + sample(xi - 1, yi)
                + sample(xi + 1, yi)
                + sample(xi, yi + 1);
            out.data[y * side + x] =
                corners / 16.0 + edges / 8.0 + sample(xi, yi) / 4.0;
        }
    }
    out
}
