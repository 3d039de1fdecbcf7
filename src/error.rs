//! Error types for torchscan operations

use thiserror::Error;

/// Result type alias using torchscan's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for torchscan operations
#[derive(Error, Debug)]
pub enum Error {
    /// Camera-related errors
    #[error("Camera error: {0}")]
    Camera(String),

    /// Camera device not found
    #[error("Camera device not found: {0}")]
    CameraNotFound(String),

    /// Failed to capture frame from camera
    #[error("Frame capture failed: {0}")]
    FrameCapture(String),

    /// QR code decoding failed
    #[error("Failed to decode QR code: {0}")]
    QrDecode(String),

    /// No QR code found in frame
    #[error("No QR code found in frame")]
    NoQrCodeFound,

    /// Torch could not be switched
    #[error("Torch error: {0}")]
    Torch(String),

    /// Ambient light sensor access failed
    #[error("Sensor error: {0}")]
    Sensor(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image processing error
    #[error("Image processing error: {0}")]
    Image(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}

// V4L errors are converted manually in camera module

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Other(format!("JSON error: {}", e))
    }
}
