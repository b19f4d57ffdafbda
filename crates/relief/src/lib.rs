//! Terrain heightmap generation from map tiles
//!
//! This crate turns a geographic center point into game-ready heightmaps:
//! it fetches Mapbox terrain-RGB elevation tiles and vector water tiles
//! concurrently, decodes and assembles them, resamples the elevations onto
//! the playable grid, rasterizes water geometry into a land mask and
//! encodes the result in one of three output formats.
//!
//! # Modules
//!
//! - [`coords`]: Geographic coordinates, extents and geodesic math
//! - [`tile`]: Slippy-map tile addressing and zoom selection
//! - [`grid`]: Flat row-major square grids
//! - [`fetch`]: Concurrent tile downloads with a completion barrier
//! - [`elevation`]: Terrain-RGB decoding and block assembly
//! - [`resample`]: Bilinear heightmap resampling
//! - [`mvt`]: Mapbox Vector Tile decoding
//! - [`water`]: Water mask rasterization, taper and blur
//! - [`calibrate`]: Height calibration
//! - [`encode`]: Raw, grayscale and terrain-RGB encoders
//! - [`pipeline`]: End-to-end generation

pub mod calibrate;
pub mod coords;
pub mod elevation;
pub mod encode;
pub mod error;
pub mod fetch;
pub mod grid;
pub mod mvt;
pub mod pipeline;
pub mod resample;
pub mod tile;
pub mod water;

pub use calibrate::Calibration;
pub use coords::{Extent, GeoCoord};
pub use error::{Error, Result};
pub use fetch::TileFetcher;
pub use grid::Grid;
pub use pipeline::{
    GenerateOptions, GenerateRequest, GeneratedMap, OutputBuffer, OutputFormat, Pipeline,
};
pub use tile::TileCoord;
