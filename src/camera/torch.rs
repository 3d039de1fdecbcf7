//! Torch control through the V4L2 flash control class

use crate::error::{Error, Result};
use crate::torch::TorchControl;
use v4l::Device;
use v4l::control::{Control, Value};

const V4L2_CID_FLASH_CLASS_BASE: u32 = 0x009c_0900;
/// `V4L2_CID_FLASH_LED_MODE`
pub const V4L2_CID_FLASH_LED_MODE: u32 = V4L2_CID_FLASH_CLASS_BASE + 1;

const V4L2_FLASH_LED_MODE_NONE: i64 = 0;
const V4L2_FLASH_LED_MODE_TORCH: i64 = 2;

/// Torch driven by the flash LED mode control of a video (or flash sub-) device
pub struct V4l2Torch {
    device: Device,
    index: usize,
}

impl V4l2Torch {
    /// Open `/dev/video{index}` for control access
    pub fn open(index: usize) -> Result<Self> {
        let device = Device::new(index).map_err(|e| {
            Error::Torch(format!("Failed to open /dev/video{index} for torch control: {e}"))
        })?;

        Ok(Self { device, index })
    }

    /// Index of the video node carrying the flash control
    pub fn index(&self) -> usize {
        self.index
    }
}

impl TorchControl for V4l2Torch {
    fn set_torch(&self, on: bool) -> Result<()> {
        let mode = if on {
            V4L2_FLASH_LED_MODE_TORCH
        } else {
            V4L2_FLASH_LED_MODE_NONE
        };

        self.device
            .set_control(Control {
                id: V4L2_CID_FLASH_LED_MODE,
                value: Value::Integer(mode),
            })
            .map_err(|e| {
                Error::Torch(format!(
                    "Failed to set flash LED mode on /dev/video{}: {e}",
                    self.index
                ))
            })?;

        tracing::debug!(on, device = self.index, "Torch switched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_led_mode_control_id() {
        assert_eq!(V4L2_CID_FLASH_LED_MODE, 0x009c_0901);
    }
}
