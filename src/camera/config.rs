//! Camera configuration

use serde::{Deserialize, Serialize};

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Camera device index (e.g., 0 for /dev/video0)
    /// If None, the first capture device is used
    pub device_index: Option<usize>,

    /// Camera device name to search for (case-insensitive substring)
    /// If set, this takes priority over device_index
    pub device_name: Option<String>,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Frames per second
    pub fps: u32,

    /// Pixel format
    pub format: PixelFormat,

    /// Number of V4L2 buffers to keep mapped
    pub buffer_count: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: None,
            device_name: None,
            width: 1280,
            height: 720,
            fps: 15,
            format: PixelFormat::Mjpeg,
            buffer_count: 4,
        }
    }
}

impl CameraConfig {
    /// Preset for older webcams without MJPEG support
    pub fn compatible() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 15,
            format: PixelFormat::Yuyv,
            ..Default::default()
        }
    }

    /// Path of the video node this configuration resolves to, when fixed by index
    pub fn device_path(&self) -> Option<String> {
        self.device_index.map(|i| format!("/dev/video{i}"))
    }
}

/// Pixel format for camera capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Motion JPEG (compressed)
    Mjpeg,
    /// YUYV 4:2:2 (uncompressed)
    Yuyv,
    /// RGB24 (uncompressed, high bandwidth)
    Rgb24,
}

impl PixelFormat {
    /// Convert to V4L2 FourCC code
    pub fn to_fourcc(self) -> v4l::FourCC {
        match self {
            PixelFormat::Mjpeg => v4l::FourCC::new(b"MJPG"),
            PixelFormat::Yuyv => v4l::FourCC::new(b"YUYV"),
            PixelFormat::Rgb24 => v4l::FourCC::new(b"RGB3"),
        }
    }

    /// Parse from a user-provided string (case-insensitive)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mjpeg" | "mjpg" => Some(PixelFormat::Mjpeg),
            "yuyv" => Some(PixelFormat::Yuyv),
            "rgb" | "rgb24" => Some(PixelFormat::Rgb24),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CameraConfig::default();
        assert_eq!((config.width, config.height), (1280, 720));
        assert!(config.device_path().is_none());
    }

    #[test]
    fn test_device_path_from_index() {
        let config = CameraConfig {
            device_index: Some(2),
            ..CameraConfig::compatible()
        };
        assert_eq!(config.device_path().as_deref(), Some("/dev/video2"));
        assert_eq!(config.format, PixelFormat::Yuyv);
    }

    #[test]
    fn test_pixel_format_parse() {
        assert_eq!(PixelFormat::parse("MJPG"), Some(PixelFormat::Mjpeg));
        assert_eq!(PixelFormat::parse(" yuyv "), Some(PixelFormat::Yuyv));
        assert_eq!(PixelFormat::parse("rgb"), Some(PixelFormat::Rgb24));
        assert!(PixelFormat::parse("h264").is_none());
        assert_eq!(PixelFormat::Yuyv.to_fourcc(), v4l::FourCC::new(b"YUYV"));
    }
}
