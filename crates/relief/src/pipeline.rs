//! Generation pipeline
//!
//! Runs the whole chain from a map center to an encoded heightmap: extent,
//! zoom selection, concurrent tile fetch, elevation assembly, resampling,
//! water rasterization and the chosen encoder. Each stage failure aborts
//! the run with that stage's error; nothing partial escapes.

use image::RgbaImage;
use tracing::{debug, info};

use crate::calibrate::{self, Calibration};
use crate::coords::{Extent, GeoCoord};
use crate::elevation;
use crate::encode::{self, MAP_SIDE};
use crate::error::{Error, Result};
use crate::fetch::{TileFetcher, DEFAULT_FETCH_TIMEOUT};
use crate::mvt::Tile;
use crate::resample;
use crate::tile::{select_zoom_and_block, TileCoord};
use crate::water;

/// Playable map size, in kilometers per side
pub const MAP_SIZE_KM: f64 = 17.28;
/// Viewable map size surrounding the playable area, in kilometers per side
pub const VIEW_SIZE_KM: f64 = 18.0;
/// Zoom level requested when the tile budget allows it
pub const PREFERRED_ZOOM: u8 = 13;
/// Most tiles fetched per block side
pub const MAX_TILES_PER_SIDE: u32 = 6;

/// Which encoder produces the output buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// 16-bit big-endian raw heights with the corner marker
    Raw16,
    /// 8-bit grayscale RGBA preview
    Gray8,
    /// Terrain-RGB re-encoding of the full resampled heightmap
    TerrainRgb,
}

/// Tuning knobs of a generation run
#[derive(Clone, Copy, Debug)]
pub struct GenerateOptions {
    /// Blur the water mask after tapering
    pub smoothing: bool,
    /// Stroke waterway lines into the water mask
    pub draw_waterways: bool,
    /// Overlay the orientation grid on grayscale output
    pub draw_grid: bool,
    /// Force sea level to zero in the derived calibration
    pub land_only: bool,
    /// Width of the water-to-land slope band, in sixteenths of a cell
    pub water_side_slope: f32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            smoothing: false,
            draw_waterways: false,
            draw_grid: false,
            land_only: false,
            water_side_slope: 16.0,
        }
    }
}

/// One generation request
#[derive(Clone, Debug)]
pub struct GenerateRequest {
    pub center: GeoCoord,
    /// `None` runs the pipeline for its measurements only
    pub format: Option<OutputFormat>,
    pub options: GenerateOptions,
    /// Reused calibration; derived from the terrain when absent
    pub calibration: Option<Calibration>,
}

/// Encoded output of a run
pub enum OutputBuffer {
    Raw(Vec<u8>),
    Image(RgbaImage),
}

/// Everything a run produces
pub struct GeneratedMap {
    /// Lowest elevation over the playable window, in meters
    pub min_height: f64,
    /// Highest elevation over the playable window, in meters
    pub max_height: f64,
    /// Calibration the encoders used, when one was needed or supplied
    pub calibration: Option<Calibration>,
    pub output: Option<OutputBuffer>,
}

/// Drives generation runs against one tile source
pub struct Pipeline {
    fetcher: TileFetcher,
}

impl Pipeline {
    pub fn new(fetcher: TileFetcher) -> Self {
        Pipeline { fetcher }
    }

    /// Run one generation end to end.
    pub async fn generate(&mut self, request: GenerateRequest) -> Result<GeneratedMap> {
        let extent = Extent::around(request.center, MAP_SIZE_KM)?;
        let (origin, tile_count) =
            select_zoom_and_block(&extent, PREFERRED_ZOOM, MAX_TILES_PER_SIDE)?;
        info!(
            zoom = origin.zoom,
            tile_count, "fetching {} tiles", 2 * tile_count * tile_count
        );

        let handle = self.fetcher.fetch_block(origin, tile_count);
        let block = handle.wait_complete(DEFAULT_FETCH_TIMEOUT).await?;

        let source = elevation::assemble(&block)?;
        let (distance_km, top_km, left_km) = block_geometry(origin, tile_count, &extent);
        let side = heightmap_side(distance_km);
        debug!(side, distance_km, "resampling elevation block");
        let heightmap = resample::resample(&source, side);

        let x_off = ((left_km / distance_km) * side as f64).round() as usize;
        let y_off = ((top_km / distance_km) * side as f64).round() as usize;
        let (min_height, max_height) = calibrate::min_max(&heightmap, x_off, y_off, MAP_SIDE);
        info!(min_height, max_height, "playable window measured");

        let vector_tiles = decode_vector_tiles(&block, tile_count)?;
        let mask = water::rasterize(
            &vector_tiles,
            tile_count as usize,
            side,
            request.options.draw_waterways,
        );
        let mask = water::taper(&mask, request.options.water_side_slope / 16.0);
        let mask = if request.options.smoothing {
            water::blur(&mask)
        } else {
            mask
        };

        let (calibration, output) = match request.format {
            Some(OutputFormat::Raw16) => {
                let cal = resolve_calibration(&request, min_height, max_height)?;
                let buf = encode::raw16(&heightmap, &mask, &cal, x_off, y_off);
                (Some(cal), Some(OutputBuffer::Raw(buf)))
            }
            Some(OutputFormat::Gray8) => {
                let cal = resolve_calibration(&request, min_height, max_height)?;
                let img = encode::gray8(
                    &heightmap,
                    &mask,
                    &cal,
                    x_off,
                    y_off,
                    request.options.draw_grid,
                );
                (Some(cal), Some(OutputBuffer::Image(img)))
            }
            // Terrain-RGB re-encodes raw elevations; no scaling is involved.
            Some(OutputFormat::TerrainRgb) => (
                request.calibration,
                Some(OutputBuffer::Image(encode::terrain_rgb(&heightmap))),
            ),
            // Measurement-only runs report a calibration when one is derivable.
            None => (
                request
                    .calibration
                    .or_else(|| resolve_calibration(&request, min_height, max_height).ok()),
                None,
            ),
        };

        Ok(GeneratedMap {
            min_height,
            max_height,
            calibration,
            output,
        })
    }
}

/// Physical side of the tile block in kilometers, plus the distance from
/// the block's top-left corner to the requested extent's top and left edges.
fn block_geometry(origin: TileCoord, tile_count: u32, extent: &Extent) -> (f64, f64, f64) {
    let corner = origin.corner();
    let far = TileCoord {
        x: origin.x + tile_count,
        y: origin.y + tile_count,
        zoom: origin.zoom,
    }
    .corner();

    let distance_km = corner.distance_to(&far) / 1000.0 / std::f64::consts::SQRT_2;
    let top_km = corner
        .distance_to(&GeoCoord::new(extent.top_left.lat, corner.lon))
        / 1000.0;
    let left_km = corner
        .distance_to(&GeoCoord::new(corner.lat, extent.top_left.lon))
        / 1000.0;
    (distance_km, top_km, left_km)
}

/// Resampled heightmap side so the playable window spans [`MAP_SIDE`] cells
fn heightmap_side(distance_km: f64) -> usize {
    (MAP_SIDE as f64 * distance_km / MAP_SIZE_KM).round() as usize
}

fn decode_vector_tiles(
    block: &crate::fetch::TileBlock,
    tile_count: u32,
) -> Result<Vec<Option<Tile>>> {
    let count = tile_count as usize;
    let mut tiles = Vec::with_capacity(count * count);
    for row in 0..count {
        for col in 0..count {
            match block.vector_at(row, col) {
                Some(payload) => tiles.push(Some(Tile::decode_payload(payload)?)),
                None => return Err(Error::IncompleteBlock { row, col }),
            }
        }
    }
    Ok(tiles)
}

/// Supplied calibration, or one derived from the observed range
fn resolve_calibration(
    request: &GenerateRequest,
    min_height: f64,
    max_height: f64,
) -> Result<Calibration> {
    if let Some(cal) = request.calibration {
        return Ok(cal);
    }
    let mut cal = calibrate::auto_calibrate(min_height, max_height)?;
    if request.options.land_only {
        cal.sea_level = 0.0;
    }
    Ok(cal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heightmap_side_scales_with_distance() {
        assert_eq!(heightmap_side(MAP_SIZE_KM), MAP_SIDE);
        assert_eq!(heightmap_side(MAP_SIZE_KM * 2.0), 2 * MAP_SIDE);
        // A 6-tile zoom-13 block near the equator spans roughly 28 km.
        assert_eq!(heightmap_side(28.0), 1752);
    }

    #[test]
    fn test_block_geometry_covers_extent() {
        let center = GeoCoord::new(37.75152, -122.43877);
        let extent = Extent::around(center, MAP_SIZE_KM).unwrap();
        let (origin, tile_count) =
            select_zoom_and_block(&extent, PREFERRED_ZOOM, MAX_TILES_PER_SIDE).unwrap();
        let (distance_km, top_km, left_km) = block_geometry(origin, tile_count, &extent);

        // The block encloses the playable area with some margin.
        assert!(distance_km >= MAP_SIZE_KM);
        assert!(top_km >= 0.0 && top_km < distance_km);
        assert!(left_km >= 0.0 && left_km < distance_km);

        // The window fits inside the resampled heightmap.
        let side = heightmap_side(distance_km);
        let x_off = ((left_km / distance_km) * side as f64).round() as usize;
        let y_off = ((top_km / distance_km) * side as f64).round() as usize;
        assert!(x_off + MAP_SIDE <= side + 1);
        assert!(y_off + MAP_SIDE <= side + 1);
    }

    #[test]
    fn test_resolve_calibration_prefers_supplied() {
        let supplied = Calibration {
            base_level: 10.0,
            water_depth: 5.0,
            height_scale: 120.0,
            sea_level: 10.0,
        };
        let request = GenerateRequest {
            center: GeoCoord::new(0.0, 0.0),
            format: Some(OutputFormat::Raw16),
            options: GenerateOptions::default(),
            calibration: Some(supplied),
        };
        // Supplied wins even over a range that could not be auto-derived.
        let cal = resolve_calibration(&request, 5.0, 5.0).unwrap();
        assert_eq!(cal, supplied);
    }

    #[test]
    fn test_resolve_calibration_land_only() {
        let request = GenerateRequest {
            center: GeoCoord::new(0.0, 0.0),
            format: Some(OutputFormat::Gray8),
            options: GenerateOptions {
                land_only: true,
                ..GenerateOptions::default()
            },
            calibration: None,
        };
        let cal = resolve_calibration(&request, 12.0, 500.0).unwrap();
        assert_eq!(cal.base_level, 12.0);
        assert_eq!(cal.sea_level, 0.0);
    }

    #[test]
    fn test_resolve_calibration_flat_terrain_fails() {
        let request = GenerateRequest {
            center: GeoCoord::new(0.0, 0.0),
            format: Some(OutputFormat::Raw16),
            options: GenerateOptions::default(),
            calibration: None,
        };
        assert!(matches!(
            resolve_calibration(&request, 5.0, 5.0),
            Err(Error::DegenerateRange)
        ));
    }

    #[test]
    fn test_vector_gap_names_position_not_stage() {
        let block = crate::fetch::TileBlock {
            tile_count: 2,
            raster: vec![Some(Vec::new()); 4],
            vector: vec![Some(Vec::new()), None, Some(Vec::new()), Some(Vec::new())],
        };
        let err = decode_vector_tiles(&block, 2).unwrap_err();
        match &err {
            Error::IncompleteBlock { row, col } => assert_eq!((*row, *col), (0, 1)),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            err.to_string(),
            "tile block incomplete: missing tile at row 0, col 1"
        );
    }
}
