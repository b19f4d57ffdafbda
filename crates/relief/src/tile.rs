//! Slippy-map tile arithmetic
//!
//! Web Mercator tile indexing, the inverse corner projection, and the
//! adaptive zoom/block selection that keeps a map extent within the tile
//! budget.

use crate::coords::{Extent, GeoCoord};
use crate::error::{Error, Result};

/// A map tile coordinate in the standard Web Mercator tile scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// X tile coordinate (0 to 2^zoom - 1)
    pub x: u32,
    /// Y tile coordinate (0 to 2^zoom - 1)
    pub y: u32,
    /// Zoom level
    pub zoom: u8,
}

impl TileCoord {
    /// Create a new tile coordinate
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Convert geographic coordinates to the containing tile at a zoom level
    pub fn from_geo(coord: &GeoCoord, zoom: u8) -> Self {
        let n = 2_u32.pow(zoom as u32) as f64;
        let x = ((coord.lon + 180.0) / 360.0 * n).floor() as u32;

        let lat_rad = coord.lat.to_radians();
        let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0
            * n)
            .floor() as u32;

        Self {
            x: x.min(n as u32 - 1),
            y: y.min(n as u32 - 1),
            zoom,
        }
    }

    /// Geographic coordinate of this tile's top-left (north-west) corner
    pub fn corner(&self) -> GeoCoord {
        let n = 2_u32.pow(self.zoom as u32) as f64;
        let lon = self.x as f64 / n * 360.0 - 180.0;
        let lat = (std::f64::consts::PI * (1.0 - 2.0 * self.y as f64 / n))
            .sinh()
            .atan()
            .to_degrees();
        GeoCoord::new(lat, lon)
    }

    /// Number of tiles per axis at a zoom level
    pub fn tiles_at_zoom(zoom: u8) -> u32 {
        2_u32.pow(zoom as u32)
    }
}

/// Pick the zoom level and square tile block covering `extent`.
///
/// Starts at `preferred_zoom` and walks down until the block fits within
/// `max_tiles_per_side` tiles. Tile counts shrink strictly as zoom drops, so
/// this terminates; an extent that still overflows at zoom 0 is rejected
/// with [`Error::ZoomUnderflow`].
///
/// Returns the block origin (north-west tile) and the tiles-per-side count.
pub fn select_zoom_and_block(
    extent: &Extent,
    preferred_zoom: u8,
    max_tiles_per_side: u32,
) -> Result<(TileCoord, u32)> {
    let mut zoom = preferred_zoom;
    loop {
        let tl = TileCoord::from_geo(&extent.top_left, zoom);
        let br = TileCoord::from_geo(&extent.bottom_right, zoom);
        let count = (br.x - tl.x).max(br.y - tl.y) + 1;

        if count <= max_tiles_per_side {
            return Ok((tl, count));
        }
        if zoom == 0 {
            return Err(Error::ZoomUnderflow {
                max_tiles: max_tiles_per_side,
            });
        }
        zoom -= 1;
    }
}
