//! V4L2 camera interface for Linux
//!
//! Frame capture for QR scanning plus torch control through the flash LED
//! control class.

mod config;
mod device;
mod torch;

pub use config::{CameraConfig, PixelFormat};
pub use device::{Camera, CameraDevice};
pub use torch::{V4L2_CID_FLASH_LED_MODE, V4l2Torch};

use crate::error::{Error, Result};

/// List available V4L2 capture devices
pub fn list_devices() -> Result<Vec<CameraDevice>> {
    let mut devices = Vec::new();

    for i in 0..10 {
        let Ok(dev) = v4l::Device::new(i) else {
            continue;
        };
        let Ok(caps) = dev.query_caps() else {
            continue;
        };

        if caps
            .capabilities
            .contains(v4l::capability::Flags::VIDEO_CAPTURE)
        {
            devices.push(CameraDevice {
                index: i,
                path: format!("/dev/video{}", i),
                name: caps.card,
                driver: caps.driver,
                bus_info: caps.bus,
            });
        }
    }

    if devices.is_empty() {
        return Err(Error::CameraNotFound(
            "No V4L2 capture devices found".to_string(),
        ));
    }

    Ok(devices)
}

/// Find a camera device by name (case-insensitive substring match)
pub fn find_device_by_name(name: &str) -> Result<CameraDevice> {
    let devices = list_devices()?;
    let name_lower = name.to_lowercase();

    devices
        .into_iter()
        .find(|d| d.name.to_lowercase().contains(&name_lower))
        .ok_or_else(|| Error::CameraNotFound(format!("No device matching '{}'", name)))
}
