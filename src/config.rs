//! torchscan runtime configuration handling

#[cfg(feature = "camera")]
use crate::camera::{CameraConfig, PixelFormat};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration structure persisted to disk or environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TorchscanConfig {
    /// Camera capture configuration overrides
    pub camera: CameraOptions,
    /// Torch backend selection
    pub torch: TorchOptions,
    /// Ambient light sensor and preference locations
    pub light: LightOptions,
    /// Scan behaviour
    pub scan: ScanOptions,
    /// Logging configuration
    pub logging: LoggingOptions,
}

impl TorchscanConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            Self::from_file(path)?
        } else if let Some(path) = Self::discover_file()? {
            tracing::info!("Using configuration file: {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::debug!("No torchscan.toml / torchscan.yaml found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        for candidate in ["torchscan.toml", "torchscan.yaml", "torchscan.yml"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            let base = PathBuf::from(xdg_config).join("torchscan");
            for candidate in ["config.toml", "config.yaml"] {
                let path = base.join(candidate);
                if path.exists() {
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }

    /// Read configuration from a concrete file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
            .as_str()
        {
            "toml" => toml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse TOML {}: {e}", path.display()))
            }),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse YAML {}: {e}", path.display()))
            }),
            other => Err(Error::Config(format!(
                "Unsupported config format '{}', expected toml/yaml",
                other
            ))),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.camera.apply_env_overrides();
        self.torch.apply_env_overrides();
        self.light.apply_env_overrides();
        self.scan.apply_env_overrides();
        self.logging.apply_env_overrides();
    }

    /// Produce a fully resolved camera configuration ready to open the V4L2 device.
    #[cfg(feature = "camera")]
    pub fn camera_config(&self) -> Result<CameraConfig> {
        self.camera.to_camera_config()
    }
}

/// Camera overrides merged on top of `CameraConfig::default()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraOptions {
    /// Numeric camera index (e.g. `/dev/video2`).
    pub device_index: Option<usize>,
    /// Camera name substring match.
    pub device_name: Option<String>,
    /// Frame width in pixels.
    pub width: Option<u32>,
    /// Frame height in pixels.
    pub height: Option<u32>,
    /// Frames per second.
    pub fps: Option<u32>,
    /// Pixel format string (mjpeg/yuyv/rgb24).
    pub format: Option<String>,
    /// Number of V4L2 buffers to allocate.
    pub buffer_count: Option<u32>,
}

impl CameraOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(name) = env::var("TORCHSCAN_CAMERA_DEVICE") {
            self.device_name = Some(name);
            self.device_index = None;
        }
        if let Ok(index) = env::var("TORCHSCAN_CAMERA_INDEX") {
            if let Ok(parsed) = index.parse::<usize>() {
                self.device_index = Some(parsed);
                self.device_name = None;
            }
        }
        if let Ok(width) = env::var("TORCHSCAN_CAMERA_WIDTH") {
            self.width = width.parse::<u32>().ok();
        }
        if let Ok(height) = env::var("TORCHSCAN_CAMERA_HEIGHT") {
            self.height = height.parse::<u32>().ok();
        }
        if let Ok(format) = env::var("TORCHSCAN_CAMERA_FORMAT") {
            self.format = Some(format);
        }
    }

    /// Merge overrides onto the default camera configuration.
    #[cfg(feature = "camera")]
    pub fn to_camera_config(&self) -> Result<CameraConfig> {
        let mut config = CameraConfig::default();

        if let Some(name) = &self.device_name {
            config.device_name = Some(name.clone());
        } else if let Some(index) = self.device_index {
            config.device_index = Some(index);
        }

        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(fps) = self.fps {
            config.fps = fps.max(1);
        }
        if let Some(format) = &self.format {
            config.format = PixelFormat::parse(format).ok_or_else(|| {
                Error::Config(format!(
                    "Unknown pixel format '{}'. Use mjpeg, yuyv, or rgb24",
                    format
                ))
            })?;
        }
        if let Some(buffers) = self.buffer_count {
            config.buffer_count = buffers.max(2);
        }

        Ok(config)
    }
}

/// How the torch is reached
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TorchBackend {
    /// Flash LED mode control on the capture device
    #[default]
    V4l2,
    /// LED class device under `/sys/class/leds`
    Led,
    /// No torch; ambient light control stays idle
    None,
}

impl TorchBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "v4l2" => Some(Self::V4l2),
            "led" | "sysfs" => Some(Self::Led),
            "none" | "off" => Some(Self::None),
            _ => None,
        }
    }
}

/// Torch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TorchOptions {
    /// Backend driving the torch
    pub backend: TorchBackend,
    /// LED class device name when `backend = "led"` (e.g. `white:flash`)
    pub led_name: Option<String>,
    /// Video node index carrying the flash control, if not the capture device
    pub device_index: Option<usize>,
}

impl TorchOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(backend) = env::var("TORCHSCAN_TORCH_BACKEND") {
            if let Some(parsed) = TorchBackend::parse(&backend) {
                self.backend = parsed;
            }
        }
        if let Ok(name) = env::var("TORCHSCAN_TORCH_LED") {
            self.led_name = Some(name);
        }
    }
}

/// Ambient light configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LightOptions {
    /// IIO device directory to read instead of discovering one
    pub sensor_path: Option<PathBuf>,
    /// Preference file holding the front light mode
    pub preferences: Option<PathBuf>,
}

impl LightOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(path) = env::var("TORCHSCAN_LIGHT_SENSOR") {
            self.sensor_path = Some(PathBuf::from(path));
        }
        if let Ok(path) = env::var("TORCHSCAN_PREFERENCES") {
            self.preferences = Some(PathBuf::from(path));
        }
    }
}

/// Scan behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Seconds to wait for a code before canceling; `0` waits forever
    pub timeout_secs: u64,
    /// Pause between frames without a code, in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retry_delay_ms: 90,
        }
    }
}

impl ScanOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(timeout) = env::var("TORCHSCAN_SCAN_TIMEOUT") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                self.timeout_secs = parsed;
            }
        }
    }

    /// Scan timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Pause between empty frames
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `TORCHSCAN_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in stderr logging
    pub color: bool,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            color: true,
            rotation: None,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("TORCHSCAN_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(file) = env::var("TORCHSCAN_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Ok(color) = env::var("TORCHSCAN_LOG_COLOR") {
            match color.to_ascii_lowercase().as_str() {
                "0" | "false" | "off" => self.color = false,
                "1" | "true" | "on" => self.color = true,
                _ => {}
            }
        }
        if let Ok(rotation) = env::var("TORCHSCAN_LOG_ROTATION") {
            if let Some(parsed) = LogRotation::parse(&rotation) {
                self.rotation = Some(parsed);
            }
        }
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl LogRotation {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_sections_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("torchscan.toml");
        fs::write(
            &path,
            r#"
[camera]
device_index = 2
format = "yuyv"

[torch]
backend = "led"
led_name = "white:flash"

[light]
sensor_path = "/sys/bus/iio/devices/iio:device1"

[scan]
timeout_secs = 0
"#,
        )
        .unwrap();

        let config = TorchscanConfig::from_file(&path).unwrap();
        assert_eq!(config.camera.device_index, Some(2));
        assert_eq!(config.torch.backend, TorchBackend::Led);
        assert_eq!(config.torch.led_name.as_deref(), Some("white:flash"));
        assert!(config.light.sensor_path.is_some());
        assert_eq!(config.scan.timeout(), None);
        assert_eq!(config.scan.retry_delay(), Duration::from_millis(90));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_yaml_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("torchscan.yaml");
        fs::write(&path, "torch:\n  backend: none\nlogging:\n  rotation: daily\n").unwrap();

        let config = TorchscanConfig::from_file(&path).unwrap();
        assert_eq!(config.torch.backend, TorchBackend::None);
        assert_eq!(config.logging.rotation, Some(LogRotation::Daily));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("torchscan.ini");
        fs::write(&path, "").unwrap();
        assert!(matches!(
            TorchscanConfig::from_file(&path),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_default_scan_timeout() {
        assert_eq!(
            ScanOptions::default().timeout(),
            Some(Duration::from_secs(30))
        );
        assert_eq!(TorchBackend::parse("SYSFS"), Some(TorchBackend::Led));
    }

    #[cfg(feature = "camera")]
    #[test]
    fn test_camera_overrides_merge() {
        let options = CameraOptions {
            device_name: Some("Integrated".to_string()),
            device_index: Some(3),
            format: Some("rgb24".to_string()),
            buffer_count: Some(1),
            ..Default::default()
        };
        let config = options.to_camera_config().unwrap();
        assert_eq!(config.device_name.as_deref(), Some("Integrated"));
        assert_eq!(config.device_index, None);
        assert_eq!(config.format, PixelFormat::Rgb24);
        assert_eq!(config.buffer_count, 2);

        let bad = CameraOptions {
            format: Some("h264".to_string()),
            ..Default::default()
        };
        assert!(bad.to_camera_config().is_err());
    }
}
