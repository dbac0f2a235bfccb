//! Error type shared by the canvas, codec and catalog.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DrawError {
    /// Canvas dimensions must both be positive
    #[error("invalid canvas dimensions {width}x{height}")]
    InvalidDimension { width: i64, height: i64 },

    /// Coordinate outside the canvas
    #[error("cell ({x}, {y}) is outside the {width}x{height} canvas")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u16,
        height: u16,
    },

    /// Color name not in the palette
    #[error("unknown color '{0}'")]
    InvalidColor(String),

    /// Drawing name empty or too long
    #[error("invalid drawing name: {0}")]
    InvalidName(String),

    /// Backing store could not be read or written
    #[error("drawing store unavailable: {0}")]
    StoreUnavailable(String),
}

pub type DrawResult<T> = Result<T, DrawError>;
