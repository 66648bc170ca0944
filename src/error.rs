use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("{plane} plane holds {actual} bytes, expected {expected}")]
    PlaneSize {
        plane: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("NV12 frames need even dimensions, got {width}x{height}")]
    OddDimensions { width: u32, height: u32 },

    #[error("Expected {expected} landmarks, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Unknown accessory: {0}")]
    UnknownAccessory(String),
}

pub type Result<T> = std::result::Result<T, Error>;
