//! Capture component: scans frames until a QR code decodes

use crate::error::{Error, Result};
use crate::qr::{QrDecoder, QrPayload};
use crate::relay::{CAPTURE_COMPONENT, ScanLauncher, ScanRequest, ScanResponse};
use async_trait::async_trait;
use image::DynamicImage;
use std::time::Duration;

/// Default pause between frames without a QR code
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(90);

/// Produces camera frames
#[async_trait]
pub trait FrameSource: Send {
    /// Capture the next frame
    async fn capture_frame(&mut self) -> Result<DynamicImage>;
}

/// Scanning component answering [`ScanRequest`]s from camera frames
pub struct CaptureScanner<F> {
    source: F,
    decoder: QrDecoder,
    timeout: Option<Duration>,
    retry_delay: Duration,
}

impl<F: FrameSource> CaptureScanner<F> {
    /// Scanner reading frames from `source`, without a timeout
    pub fn new(source: F) -> Self {
        Self {
            source,
            decoder: QrDecoder::new(),
            timeout: None,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Give up and answer "canceled" after `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pause between frames that contain no QR code
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Frame source
    pub fn source(&self) -> &F {
        &self.source
    }

    /// Capture frames until one decodes
    pub async fn scan_once(&mut self) -> Result<QrPayload> {
        loop {
            let frame = self.source.capture_frame().await?;

            match self.decoder.decode(&frame) {
                Ok(payload) => return Ok(payload),
                Err(Error::NoQrCodeFound) => {}
                Err(Error::QrDecode(reason)) => {
                    tracing::debug!("QR grid found but not decodable: {reason}");
                }
                Err(other) => return Err(other),
            }

            tokio::time::sleep(self.retry_delay).await;
        }
    }

    async fn scan_with_timeout(&mut self) -> Result<QrPayload> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.scan_once())
                .await
                .map_err(|_| Error::Other(format!("No QR code within {limit:?}")))?,
            None => self.scan_once().await,
        }
    }
}

#[async_trait]
impl<F: FrameSource> ScanLauncher for CaptureScanner<F> {
    async fn launch(&mut self, request: ScanRequest) -> ScanResponse {
        if request.component != CAPTURE_COMPONENT {
            tracing::warn!(component = %request.component, "Scan request for unknown component");
            return ScanResponse::canceled(request.request_code);
        }

        match self.scan_with_timeout().await {
            Ok(payload) => match payload.as_str() {
                Some(text) => {
                    tracing::info!(length = text.len(), "QR code scanned");
                    ScanResponse::success(request.request_code, text)
                }
                None => {
                    tracing::warn!(
                        bytes = payload.as_bytes().len(),
                        "Scanned QR code is not text, discarding"
                    );
                    ScanResponse::canceled(request.request_code)
                }
            },
            Err(err) => {
                tracing::warn!("Scan abandoned: {err}");
                ScanResponse::canceled(request.request_code)
            }
        }
    }
}
