use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, GrayImage, Luma};
use qrcode::QrCode;
use tokio::sync::mpsc;

use torchscan::light::{
    KEY_FRONT_LIGHT_MODE, MemoryPreferences, SensorDelay, SensorEvent, SensorInfo, SensorKind,
    SensorManager, SensorSubscription,
};
use torchscan::relay::capture::{CaptureScanner, FrameSource};
use torchscan::relay::{RelayState, SCAN_REQUEST_CODE, ScanResponse};
use torchscan::{
    Error, FrontLightMode, Result, ResultRelay, ScanLauncher, ScanRequest, ScanSession,
    TerminalDisplay, TorchControl,
};

struct QrFrames {
    frames: Vec<DynamicImage>,
}

impl QrFrames {
    fn showing(text: &str) -> Self {
        let code = QrCode::new(text.as_bytes()).unwrap();
        let image = code.render::<Luma<u8>>().min_dimensions(300, 300).build();
        Self {
            frames: vec![DynamicImage::ImageLuma8(image)],
        }
    }
}

#[async_trait]
impl FrameSource for QrFrames {
    async fn capture_frame(&mut self) -> Result<DynamicImage> {
        Ok(self.frames.pop().unwrap_or_else(|| {
            DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([255])))
        }))
    }
}

#[derive(Default)]
struct RecordingTorch {
    commands: Mutex<Vec<bool>>,
}

impl TorchControl for RecordingTorch {
    fn set_torch(&self, on: bool) -> Result<()> {
        self.commands.lock().unwrap().push(on);
        Ok(())
    }
}

struct NoSensors;

impl SensorManager for NoSensors {
    fn default_sensor(&self, _kind: SensorKind) -> Option<SensorInfo> {
        None
    }

    fn register_listener(
        &self,
        _sensor: &SensorInfo,
        _delay: SensorDelay,
    ) -> Result<SensorSubscription> {
        Err(Error::Sensor("no sensors".to_string()))
    }

    fn unregister_listener(&self, _subscription: SensorSubscription) {}
}

/// Torch and light sensor writing into one shared journal, so ordering is visible
#[derive(Default)]
struct Journal {
    entries: Mutex<Vec<&'static str>>,
    feed: Mutex<Option<mpsc::Sender<SensorEvent>>>,
}

impl Journal {
    fn entries(&self) -> Vec<&'static str> {
        self.entries.lock().unwrap().clone()
    }

    fn record(&self, entry: &'static str) {
        self.entries.lock().unwrap().push(entry);
    }
}

struct JournalTorch(Arc<Journal>);

impl TorchControl for JournalTorch {
    fn set_torch(&self, on: bool) -> Result<()> {
        self.0.record(if on { "torch on" } else { "torch off" });
        Ok(())
    }
}

struct JournalSensors(Arc<Journal>);

impl SensorManager for JournalSensors {
    fn default_sensor(&self, kind: SensorKind) -> Option<SensorInfo> {
        Some(SensorInfo {
            kind,
            name: "als".to_string(),
            path: "/sys/bus/iio/devices/iio:device0".into(),
        })
    }

    fn register_listener(
        &self,
        sensor: &SensorInfo,
        delay: SensorDelay,
    ) -> Result<SensorSubscription> {
        self.0.record("register");
        let (tx, rx) = mpsc::channel(8);
        *self.0.feed.lock().unwrap() = Some(tx);
        Ok(SensorSubscription::new(sensor.clone(), delay, rx, None))
    }

    fn unregister_listener(&self, _subscription: SensorSubscription) {
        self.0.record("unregister");
    }
}

fn prefs(mode: FrontLightMode) -> Arc<MemoryPreferences> {
    Arc::new(MemoryPreferences::new().with(KEY_FRONT_LIGHT_MODE, mode.as_str()))
}

/// Scanning component answering with a fixed response
struct Canned(ScanResponse);

#[async_trait]
impl ScanLauncher for Canned {
    async fn launch(&mut self, _request: ScanRequest) -> ScanResponse {
        self.0.clone()
    }
}

#[tokio::test(start_paused = true)]
async fn scanned_code_is_rendered() {
    let mut session = ScanSession::open(
        CaptureScanner::new(QrFrames::showing("ABC123")),
        None,
        Arc::new(NoSensors),
        prefs(FrontLightMode::Off),
    );
    let mut relay = ResultRelay::new(TerminalDisplay::new(Vec::new(), false));

    let result = session.scan(&mut relay).await;
    session.close().await;

    assert_eq!(result.as_deref(), Some("ABC123"));
    assert_eq!(relay.display().writer().as_slice(), b"ABC123\n");
    assert_eq!(relay.state(), &RelayState::Displayed("ABC123".to_string()));
}

#[tokio::test]
async fn mismatched_request_tag_renders_nothing() {
    let mut relay = ResultRelay::new(TerminalDisplay::new(Vec::new(), false));
    let mut launcher = Canned(ScanResponse::success(SCAN_REQUEST_CODE + 1, "ABC123"));

    assert_eq!(relay.scan_with(&mut launcher).await, None);
    assert!(relay.display().writer().is_empty());
    assert_eq!(relay.display().text(), None);
}

#[tokio::test]
async fn on_mode_lights_torch_for_the_session() {
    let torch = Arc::new(RecordingTorch::default());
    let session = ScanSession::open(
        CaptureScanner::new(QrFrames::showing("unused")),
        Some(torch.clone() as Arc<dyn TorchControl>),
        Arc::new(NoSensors),
        prefs(FrontLightMode::On),
    );

    assert_eq!(session.mode(), FrontLightMode::On);
    assert!(!session.follows_ambient_light());
    session.close().await;

    assert_eq!(*torch.commands.lock().unwrap(), vec![true, false]);
}

#[tokio::test]
async fn auto_mode_without_sensor_does_not_follow_light() {
    let torch = Arc::new(RecordingTorch::default());
    let session = ScanSession::open(
        CaptureScanner::new(QrFrames::showing("unused")),
        Some(torch.clone() as Arc<dyn TorchControl>),
        Arc::new(NoSensors),
        prefs(FrontLightMode::Auto),
    );

    assert!(!session.follows_ambient_light());
    session.close().await;

    // Closing still switches the torch off in case the sensor had turned it on
    assert_eq!(*torch.commands.lock().unwrap(), vec![false]);
}

#[tokio::test]
async fn auto_mode_follows_light_until_close() {
    let journal = Arc::new(Journal::default());
    let session = ScanSession::open(
        CaptureScanner::new(QrFrames::showing("unused")),
        Some(Arc::new(JournalTorch(journal.clone())) as Arc<dyn TorchControl>),
        Arc::new(JournalSensors(journal.clone())),
        prefs(FrontLightMode::Auto),
    );
    assert!(session.follows_ambient_light());

    let feed = journal.feed.lock().unwrap().clone().unwrap();
    feed.send(SensorEvent::light(8.0)).await.unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !journal.entries().contains(&"torch on") && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(journal.entries(), vec!["register", "torch on"]);

    session.close().await;
    assert_eq!(
        journal.entries(),
        vec!["register", "torch on", "unregister", "torch off"]
    );

    // The subscription is gone, so later readings reach nobody
    assert!(feed.try_send(SensorEvent::light(1.0)).is_err());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(journal.entries().len(), 4);
}

#[tokio::test]
async fn off_mode_never_touches_torch() {
    let torch = Arc::new(RecordingTorch::default());
    let session = ScanSession::open(
        CaptureScanner::new(QrFrames::showing("unused")),
        Some(torch.clone() as Arc<dyn TorchControl>),
        Arc::new(NoSensors),
        prefs(FrontLightMode::Off),
    );
    session.close().await;

    assert!(torch.commands.lock().unwrap().is_empty());
}
