//! Sensor service abstraction
//!
//! Sensor readings are delivered through a channel-backed [`SensorSubscription`]
//! rather than a registered listener object, so the consumer owns the receive side
//! and decides where events are dispatched.

use crate::error::Result;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Kinds of sensors the service can hand out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// Ambient light sensor reporting illuminance in lux
    Light,
}

/// A sensor known to a [`SensorManager`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorInfo {
    /// What the sensor measures
    pub kind: SensorKind,
    /// Human-readable name reported by the driver
    pub name: String,
    /// Backend-specific location (e.g. an IIO device directory)
    pub path: PathBuf,
}

/// Delivery rate requested when registering for sensor events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorDelay {
    /// As fast as the backend can deliver
    Fastest,
    /// Suitable for games
    Game,
    /// Suitable for user interface updates
    Ui,
    /// Default rate, suitable for screen orientation and ambient light
    Normal,
}

impl SensorDelay {
    /// Polling period associated with the delay
    pub fn period(self) -> Duration {
        match self {
            SensorDelay::Fastest => Duration::ZERO,
            SensorDelay::Game => Duration::from_millis(20),
            SensorDelay::Ui => Duration::from_millis(66),
            SensorDelay::Normal => Duration::from_millis(200),
        }
    }
}

/// Accuracy reported alongside accuracy-change notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorAccuracy {
    /// Readings cannot be trusted
    Unreliable,
    /// Low accuracy
    Low,
    /// Medium accuracy
    Medium,
    /// Maximum accuracy
    High,
}

/// A single reading delivered by a sensor
#[derive(Debug, Clone, PartialEq)]
pub struct SensorEvent {
    /// Raw values; for [`SensorKind::Light`] the first value is lux
    pub values: Vec<f32>,
    /// When the reading was taken
    pub timestamp: SystemTime,
}

impl SensorEvent {
    /// Build a light reading
    pub fn light(lux: f32) -> Self {
        Self {
            values: vec![lux],
            timestamp: SystemTime::now(),
        }
    }
}

/// An active registration with a [`SensorManager`]
///
/// Events arrive on the receiver until the subscription is handed back to
/// [`SensorManager::unregister_listener`] or dropped.
#[derive(Debug)]
pub struct SensorSubscription {
    sensor: SensorInfo,
    delay: SensorDelay,
    events: mpsc::Receiver<SensorEvent>,
    task: Option<JoinHandle<()>>,
}

impl SensorSubscription {
    /// Create a subscription fed by `events`, optionally owning the delivery task
    pub fn new(
        sensor: SensorInfo,
        delay: SensorDelay,
        events: mpsc::Receiver<SensorEvent>,
        task: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            sensor,
            delay,
            events,
            task,
        }
    }

    /// Sensor this subscription delivers readings for
    pub fn sensor(&self) -> &SensorInfo {
        &self.sensor
    }

    /// Delivery rate requested at registration
    pub fn delay(&self) -> SensorDelay {
        self.delay
    }

    /// Wait for the next event. Returns `None` once delivery has ended.
    pub async fn recv(&mut self) -> Option<SensorEvent> {
        self.events.recv().await
    }

    /// Take an already-queued event without waiting
    pub fn try_recv(&mut self) -> Option<SensorEvent> {
        self.events.try_recv().ok()
    }

    /// Stop delivery and close the channel
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.events.close();
    }
}

impl Drop for SensorSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Access to the host's sensors
pub trait SensorManager: Send + Sync {
    /// The default sensor of the given kind, if the host has one
    fn default_sensor(&self, kind: SensorKind) -> Option<SensorInfo>;

    /// Start delivering readings from `sensor` at `delay`
    fn register_listener(
        &self,
        sensor: &SensorInfo,
        delay: SensorDelay,
    ) -> Result<SensorSubscription>;

    /// Stop delivering readings for `subscription`
    fn unregister_listener(&self, subscription: SensorSubscription);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_sensor() -> SensorInfo {
        SensorInfo {
            kind: SensorKind::Light,
            name: "test-als".to_string(),
            path: PathBuf::from("/dev/null"),
        }
    }

    #[test]
    fn test_normal_delay_period() {
        assert_eq!(SensorDelay::Normal.period(), Duration::from_millis(200));
        assert!(SensorDelay::Game.period() < SensorDelay::Ui.period());
    }

    #[tokio::test]
    async fn test_subscription_delivers_then_closes_on_cancel() {
        let (tx, rx) = mpsc::channel(4);
        let mut sub = SensorSubscription::new(light_sensor(), SensorDelay::Normal, rx, None);

        tx.send(SensorEvent::light(12.5)).await.unwrap();
        let event = sub.recv().await.unwrap();
        assert_eq!(event.values, vec![12.5]);

        sub.cancel();
        assert!(tx.send(SensorEvent::light(1.0)).await.is_err());
        assert!(sub.recv().await.is_none());
    }
}
