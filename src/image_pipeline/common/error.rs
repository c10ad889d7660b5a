use thiserror::Error;

/// Failures on the setup and control paths of an acquisition session.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to open device: {0}")]
    DeviceOpen(String),

    #[error("Failed to initialize transfer: {0}")]
    TransferInit(String),

    #[error("Transfer command failed: {0}")]
    TransferCommand(String),

    #[error("Feature '{name}' access failed: {reason}")]
    Feature { name: String, reason: String },

    #[error("Acquisition error: {0}")]
    Acquisition(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(u32, u32),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to start display thread: {0}")]
    ThreadSpawn(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PipelineError {
    pub fn feature(name: &str, reason: impl Into<String>) -> Self {
        PipelineError::Feature {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failures of a single save request. None of them end the session.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("No image buffer has been acquired yet")]
    NoFrameYet,

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(u32, u32),

    #[error("Frame buffer holds {actual} bytes, {expected} required")]
    ShortBuffer { expected: usize, actual: usize },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Demosaic failed: {0}")]
    Demosaic(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
pub type SaveResult<T> = std::result::Result<T, SaveError>;
