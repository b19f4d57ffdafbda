//! Error types for the compositing pipeline

use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can abort a map generation
#[derive(Debug, Error)]
pub enum Error {
    /// Requested extent size is not positive
    #[error("extent size must be positive, got {0} km")]
    InvalidExtent(f64),

    /// The extent cannot be covered within the tile budget at any zoom level
    #[error("cannot cover extent with {max_tiles} tiles per side at any zoom level")]
    ZoomUnderflow { max_tiles: u32 },

    /// A raster or vector slot was still empty when the block was consumed
    #[error("tile block incomplete: missing tile at row {row}, col {col}")]
    IncompleteBlock { row: usize, col: usize },

    /// The download completion barrier exceeded its deadline
    #[error("tile download timed out with {unresolved} of {expected} fetches unresolved")]
    Timeout { unresolved: usize, expected: usize },

    /// Elevation range is zero-width, no height scale can be derived
    #[error("degenerate elevation range: min and max are equal, cannot derive a height scale")]
    DegenerateRange,

    /// An elevation tile decoded to an unexpected pixel size
    #[error("unexpected elevation tile size {width}x{height}, expected 512x512")]
    UnexpectedTileSize { width: u32, height: u32 },

    /// Image decoding error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Vector tile payload failed to decode
    #[error("vector tile error: {0}")]
    VectorTile(#[from] prost::DecodeError),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
