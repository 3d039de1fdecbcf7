//! Camera torch capability
//!
//! The torch is the flash LED next to the camera used as a continuous light
//! source. Callers only ever issue on/off commands; the current state is never
//! read back.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Default sysfs root for LED class devices
pub const LED_SYSFS_ROOT: &str = "/sys/class/leds";

/// Something that can switch a camera torch
pub trait TorchControl: Send + Sync {
    /// Switch the torch on or off
    fn set_torch(&self, on: bool) -> Result<()>;
}

/// Torch exposed as a Linux LED class device (`/sys/class/leds/<name>`)
#[derive(Debug, Clone)]
pub struct SysfsLedTorch {
    dir: PathBuf,
    max_brightness: u32,
}

impl SysfsLedTorch {
    /// Open the LED called `name` under the system LED root
    pub fn open(name: &str) -> Result<Self> {
        Self::open_in(Path::new(LED_SYSFS_ROOT), name)
    }

    /// Open the LED called `name` under an alternative root
    pub fn open_in(root: &Path, name: &str) -> Result<Self> {
        let dir = root.join(name);
        if !dir.join("brightness").exists() {
            return Err(Error::Torch(format!(
                "LED '{}' not found under {}",
                name,
                root.display()
            )));
        }

        let max_brightness = match fs::read_to_string(dir.join("max_brightness")) {
            Ok(text) => text.trim().parse::<u32>().map_err(|e| {
                Error::Torch(format!("Invalid max_brightness for LED '{name}': {e}"))
            })?,
            Err(_) => 1,
        };

        tracing::debug!(led = name, max_brightness, "Opened sysfs torch");
        Ok(Self {
            dir,
            max_brightness: max_brightness.max(1),
        })
    }

    /// Brightness written when switching on
    pub fn max_brightness(&self) -> u32 {
        self.max_brightness
    }
}

impl TorchControl for SysfsLedTorch {
    fn set_torch(&self, on: bool) -> Result<()> {
        let value = if on { self.max_brightness } else { 0 };
        let path = self.dir.join("brightness");
        fs::write(&path, value.to_string())
            .map_err(|e| Error::Torch(format!("Failed to write {}: {e}", path.display())))?;
        tracing::debug!(on, "Torch switched");
        Ok(())
    }
}
