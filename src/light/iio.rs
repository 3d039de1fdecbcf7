//! Linux Industrial I/O (IIO) ambient light backend
//!
//! Light sensors show up under `/sys/bus/iio/devices/iio:deviceN` with either a
//! processed `<channel>_input` attribute (lux) or a raw one that has to be
//! scaled: `lux = (raw + offset) * scale`. The channel is `in_illuminance` on
//! most drivers and `in_illuminance0` on indexed ones (isl29018, tsl2563, ...).

use crate::error::{Error, Result};
use crate::light::sensor::{
    SensorDelay, SensorEvent, SensorInfo, SensorKind, SensorManager, SensorSubscription,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

/// Default sysfs root for IIO devices
pub const IIO_SYSFS_ROOT: &str = "/sys/bus/iio/devices";

const CHANNELS: [&str; 2] = ["in_illuminance", "in_illuminance0"];
const EVENT_QUEUE_DEPTH: usize = 16;
const MIN_POLL_PERIOD: Duration = Duration::from_millis(5);

/// Sensor manager backed by IIO illuminance channels
#[derive(Debug, Clone)]
pub struct IioSensorManager {
    root: PathBuf,
    preferred: Option<PathBuf>,
}

impl Default for IioSensorManager {
    fn default() -> Self {
        Self::new()
    }
}

impl IioSensorManager {
    /// Manager scanning the system IIO root
    pub fn new() -> Self {
        Self::with_root(IIO_SYSFS_ROOT)
    }

    /// Manager scanning an alternative root (useful for tests and containers)
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            preferred: None,
        }
    }

    /// Prefer a specific IIO device directory over discovery
    pub fn with_sensor_path(mut self, path: Option<PathBuf>) -> Self {
        self.preferred = path;
        self
    }

    /// List every IIO device exposing an illuminance channel
    pub fn list_sensors(&self) -> Result<Vec<SensorInfo>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::Sensor(format!(
                    "Failed to read {}: {e}",
                    self.root.display()
                )));
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("iio:device"))
            })
            .collect();
        dirs.sort();

        Ok(dirs.into_iter().filter_map(|dir| sensor_info(&dir)).collect())
    }
}

impl SensorManager for IioSensorManager {
    fn default_sensor(&self, kind: SensorKind) -> Option<SensorInfo> {
        match kind {
            SensorKind::Light => {}
        }

        if let Some(path) = &self.preferred {
            match sensor_info(path) {
                Some(info) => return Some(info),
                None => tracing::warn!(
                    "Configured light sensor {} has no illuminance channel",
                    path.display()
                ),
            }
        }

        match self.list_sensors() {
            Ok(sensors) => sensors.into_iter().next(),
            Err(err) => {
                tracing::warn!("Light sensor discovery failed: {err}");
                None
            }
        }
    }

    fn register_listener(
        &self,
        sensor: &SensorInfo,
        delay: SensorDelay,
    ) -> Result<SensorSubscription> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Sensor(format!("No async runtime for sensor polling: {e}")))?;

        let channel = illuminance_channel(&sensor.path).ok_or_else(|| {
            Error::Sensor(format!(
                "{} has no illuminance channel",
                sensor.path.display()
            ))
        })?;

        let (tx, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let dir = sensor.path.clone();
        let period = delay.period().max(MIN_POLL_PERIOD);

        tracing::debug!(sensor = %sensor.name, ?period, "Registering light sensor listener");

        let task = runtime.spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last: Option<f32> = None;

            loop {
                ticker.tick().await;

                let lux = match read_channel(&dir, channel) {
                    Ok(lux) => lux,
                    Err(err) => {
                        tracing::warn!("Failed to read light sensor {}: {err}", dir.display());
                        continue;
                    }
                };

                if last == Some(lux) {
                    continue;
                }
                last = Some(lux);

                if tx.send(SensorEvent::light(lux)).await.is_err() {
                    break;
                }
            }
        });

        Ok(SensorSubscription::new(
            sensor.clone(),
            delay,
            rx,
            Some(task),
        ))
    }

    fn unregister_listener(&self, mut subscription: SensorSubscription) {
        tracing::debug!(sensor = %subscription.sensor().name, "Unregistering light sensor listener");
        subscription.cancel();
    }
}

/// First illuminance channel with a processed or raw attribute
fn illuminance_channel(dir: &Path) -> Option<&'static str> {
    CHANNELS.into_iter().find(|channel| {
        dir.join(format!("{channel}_input")).exists()
            || dir.join(format!("{channel}_raw")).exists()
    })
}

fn sensor_info(dir: &Path) -> Option<SensorInfo> {
    illuminance_channel(dir)?;

    let name = fs::read_to_string(dir.join("name"))
        .map(|s| s.trim().to_string())
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            dir.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

    Some(SensorInfo {
        kind: SensorKind::Light,
        name,
        path: dir.to_path_buf(),
    })
}

/// Read the current illuminance of an IIO device directory in lux
pub fn read_lux(dir: &Path) -> Result<f32> {
    let channel = illuminance_channel(dir).ok_or_else(|| {
        Error::Sensor(format!("{} has no illuminance channel", dir.display()))
    })?;
    read_channel(dir, channel)
}

fn read_channel(dir: &Path, channel: &str) -> Result<f32> {
    let input = dir.join(format!("{channel}_input"));
    if input.exists() {
        return read_attr(&input);
    }

    let raw = read_attr(&dir.join(format!("{channel}_raw")))?;
    let scale = read_optional_attr(&dir.join(format!("{channel}_scale")))?.unwrap_or(1.0);
    let offset = read_optional_attr(&dir.join(format!("{channel}_offset")))?.unwrap_or(0.0);

    Ok((raw + offset) * scale)
}

fn read_attr(path: &Path) -> Result<f32> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::Sensor(format!("Failed to read {}: {e}", path.display())))?;
    text.trim()
        .parse::<f32>()
        .map_err(|e| Error::Sensor(format!("Invalid value in {}: {e}", path.display())))
}

fn read_optional_attr(path: &Path) -> Result<Option<f32>> {
    if path.exists() {
        read_attr(path).map(Some)
    } else {
        Ok(None)
    }
}
