use thiserror::Error;

use crate::geometry::GeometryKind;

/// Errors raised by the protobuf wire cursor.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("buffer truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("invalid varint or field key: {0}")]
    Varint(#[from] prost::DecodeError),

    #[error("unsupported wire type {0}")]
    UnsupportedWireType(String),

    #[error("field is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("value {0} does not fit in 32 bits")]
    Overflow(u64),
}

/// A feature's command stream could not be turned into a geometry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("unknown command id {0}")]
    UnknownCommand(u32),

    #[error("command {0} has a zero repeat count")]
    ZeroCount(u32),

    #[error("command {command} is not valid for {kind:?} geometry")]
    UnexpectedCommand { command: u32, kind: GeometryKind },

    #[error("MoveTo with count {0} in a line or polygon geometry")]
    InvalidMoveTo(u32),

    #[error("ClosePath with count {0}")]
    InvalidClosePath(u32),

    #[error("command {0} issued before any MoveTo")]
    MissingMoveTo(u32),

    #[error("command stream ends inside a parameter run")]
    TruncatedParameters,

    #[error("coordinate overflows the tile coordinate range")]
    CoordinateOverflow,

    #[error("geometry has no valid parts")]
    Empty,
}

/// Reasons a single feature is dropped. Never escapes the layer decoder.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("unreadable feature message: {0}")]
    Wire(#[from] WireError),

    #[error("unsupported geometry type {0}")]
    UnknownGeometryType(u64),

    #[error("invalid geometry: {0}")]
    Geometry(#[from] GeometryError),
}

/// Reasons a whole layer is dropped from the tile.
#[derive(Debug, Error)]
pub enum LayerError {
    #[error("unreadable layer message: {0}")]
    Wire(#[from] WireError),

    #[error("layer has no name")]
    MissingName,

    #[error("layer extent {0} is out of range")]
    InvalidExtent(u64),

    #[error("decode cancelled")]
    Cancelled,
}

/// Fatal tile-level failure. No partial `TileData` accompanies it.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed tile structure: {0}")]
    Malformed(#[from] WireError),

    #[error("failed to inflate gzip tile: {0}")]
    Decompress(#[from] std::io::Error),

    #[error("inflated tile exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("decode cancelled")]
    Cancelled,
}
