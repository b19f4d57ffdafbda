//! Elevation tile decoding and block assembly
//!
//! Terrain-RGB tiles encode a 24-bit integer per pixel across the three
//! color channels; the decoded value is biased so that 0 represents
//! -100000 tenth-meters. Both the channel order and the bias are a fixed
//! contract of the tile provider's encoding.

use crate::error::{Error, Result};
use crate::fetch::TileBlock;
use crate::grid::Grid;

/// Pixel side of one decoded elevation tile
pub const TILE_SIZE: usize = 512;

/// Bias applied to the 24-bit channel value, in 0.1 m units
pub const ELEVATION_OFFSET: i32 = 100_000;

/// Decode one encoded elevation tile into a 512x512 grid of elevations
/// in 0.1 m units.
pub fn decode_tile(payload: &[u8]) -> Result<Grid<i32>> {
    let img = image::load_from_memory(payload)?.to_rgb8();
    if img.width() as usize != TILE_SIZE || img.height() as usize != TILE_SIZE {
        return Err(Error::UnexpectedTileSize {
            width: img.width(),
            height: img.height(),
        });
    }

    let mut grid = Grid::filled(TILE_SIZE, 0i32);
    for (y, row) in img.rows().enumerate() {
        for (x, pixel) in row.enumerate() {
            let v = pixel[0] as i32 * 65536 + pixel[1] as i32 * 256 + pixel[2] as i32;
            grid.data[y * TILE_SIZE + x] = v - ELEVATION_OFFSET;
        }
    }
    Ok(grid)
}

/// Assemble a complete tile block into one source elevation grid of side
/// `tile_count * 512`, each decoded tile placed at its (row*512, col*512)
/// offset.
pub fn assemble(block: &TileBlock) -> Result<Grid<i32>> {
    let count = block.tile_count;
    let side = count * TILE_SIZE;
    let mut source = Grid::filled(side, 0i32);

    for row in 0..count {
        for col in 0..count {
            let payload = block
                .raster_at(row, col)
                .ok_or(Error::IncompleteBlock { row, col })?;
            let tile = decode_tile(payload)?;

            let y0 = row * TILE_SIZE;
            let x0 = col * TILE_SIZE;
            for y in 0..TILE_SIZE {
                let src = &tile.data[y * TILE_SIZE..(y + 1) * TILE_SIZE];
                let dst_start = (y0 + y) * side + x0;
                source.data[dst_start..dst_start + TILE_SIZE].copy_from_slice(src);
            }
        }
    }
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    pub(crate) fn uniform_tile_png(r: u8, g: u8, b: u8) -> Vec<u8> {
        let img = RgbImage::from_pixel(512, 512, Rgb([r, g, b]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_uniform_tile() {
        // R=15, G=66, B=64 encodes v = 1000000, i.e. 900000 tenth-meters.
        let payload = uniform_tile_png(15, 66, 64);
        let grid = decode_tile(&payload).unwrap();

        assert_eq!(grid.side, 512);
        assert!(grid.data.iter().all(|&v| v == 900_000));
    }

    #[test]
    fn test_decode_rejects_wrong_size() {
        let img = RgbImage::from_pixel(256, 256, Rgb([0, 0, 0]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        assert!(matches!(
            decode_tile(&bytes),
            Err(Error::UnexpectedTileSize { width: 256, .. })
        ));
    }

    #[test]
    fn test_assemble_places_tiles() {
        let mut block = TileBlock {
            tile_count: 2,
            raster: vec![None; 4],
            vector: vec![None; 4],
        };
        // Distinct elevation per tile: v = B, so elevation = B - 100000.
        for (i, b) in [10u8, 20, 30, 40].iter().enumerate() {
            block.raster[i] = Some(uniform_tile_png(0, 0, *b));
        }

        let source = assemble(&block).unwrap();
        assert_eq!(source.side, 1024);
        assert_eq!(source.get(0, 0), Some(10 - ELEVATION_OFFSET));
        assert_eq!(source.get(1023, 0), Some(20 - ELEVATION_OFFSET));
        assert_eq!(source.get(0, 1023), Some(30 - ELEVATION_OFFSET));
        assert_eq!(source.get(1023, 1023), Some(40 - ELEVATION_OFFSET));
    }

    #[test]
    fn test_assemble_rejects_missing_slot() {
        let mut block = TileBlock {
            tile_count: 2,
            raster: vec![None; 4],
            vector: vec![None; 4],
        };
        block.raster[0] = Some(uniform_tile_png(0, 0, 0));
        block.raster[1] = Some(uniform_tile_png(0, 0, 0));
        block.raster[3] = Some(uniform_tile_png(0, 0, 0));

        assert!(matches!(
            assemble(&block),
            Err(Error::IncompleteBlock { row: 1, col: 0 })
        ));
    }
}
