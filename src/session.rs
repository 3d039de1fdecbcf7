//! A scanning session: capture component, torch and ambient light control

use crate::light::{
    AmbientHandle, AmbientLightManager, FrontLightMode, PreferenceStore, SensorManager,
};
use crate::relay::capture::{CaptureScanner, FrameSource};
use crate::relay::{ResultDisplay, ResultRelay};
use crate::torch::TorchControl;
use std::sync::Arc;

/// Owns the pieces that live for the duration of a scan session
pub struct ScanSession<F> {
    scanner: CaptureScanner<F>,
    torch: Option<Arc<dyn TorchControl>>,
    ambient: Option<AmbientHandle>,
    mode: FrontLightMode,
}

impl<F: FrameSource> ScanSession<F> {
    /// Open a session.
    ///
    /// With mode `On` the torch is switched on once; with `Auto` the ambient
    /// light manager follows the light sensor on its own task. Without a torch
    /// the light sensor is never touched. Must be called within a tokio runtime.
    pub fn open(
        scanner: CaptureScanner<F>,
        torch: Option<Arc<dyn TorchControl>>,
        sensors: Arc<dyn SensorManager>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        let mode = FrontLightMode::read_pref(preferences.as_ref());
        tracing::info!(%mode, torch = torch.is_some(), "Opening scan session");

        let mut ambient = None;
        if let Some(torch) = &torch {
            if mode == FrontLightMode::On {
                if let Err(err) = torch.set_torch(true) {
                    tracing::warn!("Failed to switch torch on: {err}");
                }
            }

            let mut manager = AmbientLightManager::new(sensors, preferences);
            manager.start(Arc::clone(torch));
            if manager.is_active() {
                ambient = Some(manager.spawn());
            }
        }

        Self {
            scanner,
            torch,
            ambient,
            mode,
        }
    }

    /// Front light mode read when the session opened
    pub fn mode(&self) -> FrontLightMode {
        self.mode
    }

    /// Whether ambient light control is running
    pub fn follows_ambient_light(&self) -> bool {
        self.ambient.is_some()
    }

    /// Run one scan through `relay`, returning the rendered result
    pub async fn scan<D: ResultDisplay>(&mut self, relay: &mut ResultRelay<D>) -> Option<String> {
        relay.scan_with(&mut self.scanner).await
    }

    /// Stop ambient light control and switch the torch off
    pub async fn close(mut self) {
        if let Some(ambient) = self.ambient.take() {
            ambient.shutdown().await;
        }

        if let Some(torch) = self.torch.take() {
            if self.mode != FrontLightMode::Off {
                if let Err(err) = torch.set_torch(false) {
                    tracing::warn!("Failed to switch torch off: {err}");
                }
            }
        }

        tracing::debug!("Scan session closed");
    }
}
