//! torchscan - Linux-first QR scanner with ambient light torch control
//!
//! Scans QR codes from a V4L2 camera and relays the decoded text to a display,
//! while optionally steering the camera torch from an ambient light sensor.
//!
//! # Features
//!
//! - **Result relay**: request/response hand-off to a scanning component,
//!   rendering only successful answers to its own request
//! - **Ambient light control**: torch on at or below 45 lux, off at or above
//!   450 lux, untouched in between
//! - **Linux backends**: V4L2 capture and flash control, IIO light sensors,
//!   LED class torches
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use torchscan::light::{FilePreferences, IioSensorManager};
//! use torchscan::relay::capture::CaptureScanner;
//! use torchscan::{Camera, CameraConfig, ResultRelay, ScanSession, TerminalDisplay};
//!
//! #[tokio::main]
//! async fn main() -> torchscan::Result<()> {
//!     let camera = Camera::open(CameraConfig::default()).await?;
//!     let mut session = ScanSession::open(
//!         CaptureScanner::new(camera),
//!         None,
//!         Arc::new(IioSensorManager::new()),
//!         Arc::new(FilePreferences::discover()?),
//!     );
//!
//!     let mut relay = ResultRelay::new(TerminalDisplay::stdout(false));
//!     session.scan(&mut relay).await;
//!     session.close().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod display;
pub mod error;
pub mod light;
pub mod logging;
pub mod qr;
pub mod relay;
pub mod session;
pub mod torch;

#[cfg(feature = "camera")]
#[cfg_attr(docsrs, doc(cfg(feature = "camera")))]
pub mod camera;

// Re-exports for convenience
pub use error::{Error, Result};

#[cfg(feature = "camera")]
pub use camera::{Camera, CameraConfig, CameraDevice, V4l2Torch};

pub use config::{
    LightOptions, LogRotation, LoggingOptions, ScanOptions, TorchBackend, TorchOptions,
    TorchscanConfig,
};
pub use display::TerminalDisplay;
pub use light::{AmbientLightManager, FrontLightMode};
pub use qr::{QrDecoder, QrPayload};
pub use relay::{ResultDisplay, ResultRelay, ScanLauncher, ScanRequest, ScanResponse};
pub use session::ScanSession;
pub use torch::{SysfsLedTorch, TorchControl};
