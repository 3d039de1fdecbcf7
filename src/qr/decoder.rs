//! QR code decoder using rqrr

use crate::error::{Error, Result};
use crate::qr::QrPayload;
use image::{DynamicImage, GrayImage};

/// QR code decoder
#[derive(Debug, Default, Clone, Copy)]
pub struct QrDecoder;

impl QrDecoder {
    /// Create a new QR decoder
    pub fn new() -> Self {
        Self
    }

    /// Decode the first QR code found in an image
    pub fn decode(&self, img: &DynamicImage) -> Result<QrPayload> {
        self.decode_gray(img.to_luma8())
    }

    /// Decode the first QR code found in a grayscale image
    pub fn decode_gray(&self, img: GrayImage) -> Result<QrPayload> {
        let mut prepared = rqrr::PreparedImage::prepare(img);
        let grids = prepared.detect_grids();

        let Some(grid) = grids.first() else {
            return Err(Error::NoQrCodeFound);
        };

        let mut content = Vec::new();
        match grid.decode_to(&mut content) {
            Ok(meta) => {
                tracing::debug!(
                    "Decoded QR: version={:?}, ecc_level={:?}, length={}",
                    meta.version,
                    meta.ecc_level,
                    content.len()
                );
                Ok(QrPayload::from_bytes(content))
            }
            Err(e) => Err(Error::QrDecode(format!("Decode failed: {:?}", e))),
        }
    }
}
