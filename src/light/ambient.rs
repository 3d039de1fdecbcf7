//! Ambient light driven torch control
//!
//! While the front light mode is [`FrontLightMode::Auto`], readings from the
//! default light sensor switch the torch on when it is too dark and off once it
//! is bright enough. Readings between the two thresholds leave the torch alone
//! so it does not flicker around a single cut-off.

use crate::light::mode::{FrontLightMode, PreferenceStore};
use crate::light::sensor::{
    SensorAccuracy, SensorDelay, SensorEvent, SensorInfo, SensorKind, SensorManager,
    SensorSubscription,
};
use crate::torch::TorchControl;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// At or below this illuminance the torch is switched on
pub const TOO_DARK_LUX: f32 = 45.0;
/// At or above this illuminance the torch is switched off
pub const BRIGHT_ENOUGH_LUX: f32 = 450.0;

/// Lifecycle state of an [`AmbientLightManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbientState {
    /// No sensor subscription is held
    Inactive,
    /// Readings are being received from a light sensor
    Active,
}

/// Torch command derived from a single light reading, if any
pub fn torch_command(lux: f32) -> Option<bool> {
    if lux <= TOO_DARK_LUX {
        Some(true)
    } else if lux >= BRIGHT_ENOUGH_LUX {
        Some(false)
    } else {
        None
    }
}

/// Drives a camera torch from ambient light readings
pub struct AmbientLightManager {
    sensors: Arc<dyn SensorManager>,
    preferences: Arc<dyn PreferenceStore>,
    camera: Option<Arc<dyn TorchControl>>,
    subscription: Option<SensorSubscription>,
}

impl AmbientLightManager {
    /// Create an inactive manager
    pub fn new(sensors: Arc<dyn SensorManager>, preferences: Arc<dyn PreferenceStore>) -> Self {
        Self {
            sensors,
            preferences,
            camera: None,
            subscription: None,
        }
    }

    /// Begin following the light sensor if the stored mode is `Auto`.
    ///
    /// A missing sensor or any other mode leaves the manager inactive.
    pub fn start(&mut self, camera: Arc<dyn TorchControl>) {
        if self.subscription.is_some() {
            self.stop();
        }

        self.camera = Some(camera);

        let mode = FrontLightMode::read_pref(self.preferences.as_ref());
        if mode != FrontLightMode::Auto {
            tracing::debug!(%mode, "Front light not in auto mode, ambient sensor unused");
            return;
        }

        let Some(sensor) = self.sensors.default_sensor(SensorKind::Light) else {
            tracing::info!("No ambient light sensor available, torch stays under manual control");
            return;
        };

        match self.sensors.register_listener(&sensor, SensorDelay::Normal) {
            Ok(subscription) => {
                tracing::info!(sensor = %sensor.name, "Following ambient light sensor");
                self.subscription = Some(subscription);
            }
            Err(err) => {
                tracing::warn!(sensor = %sensor.name, "Failed to register light sensor: {err}");
            }
        }
    }

    /// Cancel the sensor subscription and release the camera. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.sensors.unregister_listener(subscription);
            self.camera = None;
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> AmbientState {
        if self.subscription.is_some() {
            AmbientState::Active
        } else {
            AmbientState::Inactive
        }
    }

    /// Whether a sensor subscription is held
    pub fn is_active(&self) -> bool {
        self.state() == AmbientState::Active
    }

    /// Sensor currently being followed
    pub fn sensor(&self) -> Option<&SensorInfo> {
        self.subscription.as_ref().map(|s| s.sensor())
    }

    /// Handle a sensor event; the first value is the illuminance in lux
    pub fn on_sensor_changed(&self, event: &SensorEvent) -> Option<bool> {
        let lux = *event.values.first()?;
        self.on_reading(lux)
    }

    /// Apply one lux reading and return the torch command issued, if any
    pub fn on_reading(&self, lux: f32) -> Option<bool> {
        let camera = self.camera.as_ref()?;
        tracing::debug!(lux, "Ambient light reading");

        let on = torch_command(lux)?;
        if let Err(err) = camera.set_torch(on) {
            tracing::warn!(on, "Failed to switch torch: {err}");
        }
        Some(on)
    }

    /// Accuracy changes carry no information for torch control
    pub fn on_accuracy_changed(&self, _sensor: &SensorInfo, _accuracy: SensorAccuracy) {}

    /// Wait for the next reading from the active subscription
    pub async fn next_event(&mut self) -> Option<SensorEvent> {
        match self.subscription.as_mut() {
            Some(subscription) => subscription.recv().await,
            None => None,
        }
    }

    /// Dispatch readings until delivery ends or `shutdown` resolves
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let event = tokio::select! {
                _ = &mut shutdown => None,
                event = self.next_event() => event,
            };

            match event {
                Some(event) => {
                    self.on_sensor_changed(&event);
                }
                None => break,
            }
        }
    }

    /// Move the manager onto a task that dispatches readings until shut down.
    ///
    /// The manager is stopped when the task ends, whichever way it ends.
    /// Must be called from within a tokio runtime.
    pub fn spawn(mut self) -> AmbientHandle {
        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            self.run(async {
                let _ = signal.await;
            })
            .await;
            self.stop();
            self
        });

        AmbientHandle { shutdown, task }
    }
}

/// Handle to an [`AmbientLightManager`] running on its own task
///
/// Dropping the handle also ends the task and releases the subscription.
pub struct AmbientHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<AmbientLightManager>,
}

impl AmbientHandle {
    /// Stop dispatching, release the subscription and hand the manager back
    pub async fn shutdown(self) -> Option<AmbientLightManager> {
        let _ = self.shutdown.send(());
        match self.task.await {
            Ok(manager) => Some(manager),
            Err(err) => {
                tracing::warn!("Ambient light task ended abnormally: {err}");
                None
            }
        }
    }
}

impl Drop for AmbientLightManager {
    fn drop(&mut self) {
        self.stop();
    }
}
