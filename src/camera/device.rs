//! V4L2 capture device

use crate::camera::{CameraConfig, PixelFormat, find_device_by_name, list_devices};
use crate::error::{Error, Result};
use crate::relay::capture::FrameSource;
use async_trait::async_trait;
use image::{DynamicImage, ImageBuffer};
use serde::{Deserialize, Serialize};
use std::mem;
use std::sync::Arc;
use tokio::sync::Mutex;
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

/// Information about a camera device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraDevice {
    /// Device index (e.g., 0 for /dev/video0)
    pub index: usize,
    /// Device path (e.g., "/dev/video0")
    pub path: String,
    /// Device name reported by the driver
    pub name: String,
    /// Driver name
    pub driver: String,
    /// Bus information
    pub bus_info: String,
}

struct CameraInner {
    stream: MmapStream<'static>,
    /// Owning handle to the V4L device. Field order drops the stream first.
    _device: Box<Device>,
}

/// Camera handle for capturing frames
pub struct Camera {
    inner: Arc<Mutex<CameraInner>>,
    config: CameraConfig,
    info: CameraDevice,
}

impl Camera {
    /// Resolve the device described by `config`
    pub fn resolve(config: &CameraConfig) -> Result<CameraDevice> {
        if let Some(ref name) = config.device_name {
            return find_device_by_name(name);
        }

        let mut devices = list_devices()?.into_iter();
        match config.device_index {
            Some(index) => devices.find(|d| d.index == index).ok_or_else(|| {
                Error::CameraNotFound(format!("Device /dev/video{} not found", index))
            }),
            None => devices
                .next()
                .ok_or_else(|| Error::CameraNotFound("No cameras available".to_string())),
        }
    }

    /// Open a camera with the given configuration
    pub async fn open(config: CameraConfig) -> Result<Self> {
        let device_info = Self::resolve(&config)?;

        tracing::info!(
            "Opening camera: {} at {}",
            device_info.name,
            device_info.path
        );

        let dev = Device::new(device_info.index)
            .map_err(|e| Error::Camera(format!("Failed to open device: {}", e)))?;

        let mut fmt = dev
            .format()
            .map_err(|e| Error::Camera(format!("Failed to get format: {}", e)))?;
        fmt.width = config.width;
        fmt.height = config.height;
        fmt.fourcc = config.format.to_fourcc();
        let fmt = dev
            .set_format(&fmt)
            .map_err(|e| Error::Camera(format!("Failed to set format: {}", e)))?;

        let mut params = dev
            .params()
            .map_err(|e| Error::Camera(format!("Failed to get params: {}", e)))?;
        params.interval = v4l::Fraction::new(1, config.fps.max(1));
        dev.set_params(&params)
            .map_err(|e| Error::Camera(format!("Failed to set params: {}", e)))?;

        tracing::info!(
            "Camera configured: {}x{} @ {} fps ({})",
            fmt.width,
            fmt.height,
            config.fps,
            String::from_utf8_lossy(&fmt.fourcc.repr)
        );

        // The driver may have negotiated a different frame size.
        let config = CameraConfig {
            width: fmt.width,
            height: fmt.height,
            ..config
        };

        // SAFETY: The boxed device outlives the mmap stream and both are dropped together inside CameraInner.
        let device = Box::new(dev);
        let static_device: &'static Device =
            unsafe { mem::transmute::<&Device, &'static Device>(device.as_ref()) };

        let stream =
            MmapStream::with_buffers(static_device, Type::VideoCapture, config.buffer_count.max(2))
                .map_err(|e| Error::FrameCapture(format!("Failed to create stream: {}", e)))?;

        Ok(Self {
            inner: Arc::new(Mutex::new(CameraInner {
                stream,
                _device: device,
            })),
            config,
            info: device_info,
        })
    }

    /// Get camera device information
    pub fn info(&self) -> &CameraDevice {
        &self.info
    }

    /// Get camera configuration
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Capture a single frame
    pub async fn capture(&self) -> Result<DynamicImage> {
        let mut inner = self.inner.lock().await;

        let (buf, _meta) = inner
            .stream
            .next()
            .map_err(|e| Error::FrameCapture(format!("Failed to capture: {}", e)))?;

        decode_frame(&self.config, buf)
    }
}

#[async_trait]
impl FrameSource for Camera {
    async fn capture_frame(&mut self) -> Result<DynamicImage> {
        self.capture().await
    }
}

fn decode_frame(config: &CameraConfig, buf: &[u8]) -> Result<DynamicImage> {
    match config.format {
        PixelFormat::Mjpeg => image::load_from_memory_with_format(buf, image::ImageFormat::Jpeg)
            .map_err(|e| Error::Image(format!("MJPEG decode failed: {}", e))),
        PixelFormat::Yuyv => yuyv_to_rgb(config.width, config.height, buf),
        PixelFormat::Rgb24 => {
            ImageBuffer::from_raw(config.width, config.height, buf.to_vec())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| Error::Image("Failed to create RGB image".to_string()))
        }
    }
}

/// Convert a packed YUYV 4:2:2 frame to RGB
fn yuyv_to_rgb(width: u32, height: u32, yuyv: &[u8]) -> Result<DynamicImage> {
    let (w, h) = (width as usize, height as usize);
    let mut rgb = vec![0u8; w * h * 3];

    let convert = |y: i32, u: i32, v: i32| -> [u8; 3] {
        [
            (y + ((v * 1436) >> 10)).clamp(0, 255) as u8,
            (y - ((u * 352 + v * 731) >> 10)).clamp(0, 255) as u8,
            (y + ((u * 1814) >> 10)).clamp(0, 255) as u8,
        ]
    };

    for (src, dst) in yuyv.chunks_exact(4).zip(rgb.chunks_exact_mut(6)) {
        let u = src[1] as i32 - 128;
        let v = src[3] as i32 - 128;
        dst[..3].copy_from_slice(&convert(src[0] as i32, u, v));
        dst[3..].copy_from_slice(&convert(src[2] as i32, u, v));
    }

    ImageBuffer::from_raw(width, height, rgb)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| Error::Image("Failed to create RGB image from YUYV".to_string()))
}
