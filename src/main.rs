//! torchscan command-line entrypoint

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use torchscan::config::TorchBackend;
use torchscan::light::{
    FilePreferences, IioSensorManager, KEY_FRONT_LIGHT_MODE, MemoryPreferences, PreferenceStore,
};
use torchscan::relay::capture::CaptureScanner;
use torchscan::{
    Camera, Error, FrontLightMode, Result, ResultRelay, ScanSession, SysfsLedTorch,
    TerminalDisplay, TorchControl, TorchscanConfig, V4l2Torch, camera, logging,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "torchscan",
    version,
    about = "Scan a QR code, with the camera torch following ambient light"
)]
struct Cli {
    /// Optional configuration file (toml/yaml). Defaults to torchscan.{toml,yaml} in cwd/XDG config.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override camera by name (takes precedence over config file)
    #[arg(long, value_name = "NAME")]
    device: Option<String>,

    /// Override camera by index (/dev/videoN)
    #[arg(long, value_name = "INDEX")]
    device_index: Option<usize>,

    /// Preference file holding the front light mode
    #[arg(long, value_name = "PATH")]
    preferences: Option<PathBuf>,

    /// Front light mode for this run (on, auto, off), ignoring stored preferences
    #[arg(long, value_name = "MODE")]
    front_light: Option<FrontLightMode>,

    /// Output results as JSON lines instead of plain text
    #[arg(long)]
    json: bool,

    /// Keep scanning and print every result
    #[arg(long)]
    watch: bool,

    /// List detected cameras and exit
    #[arg(long)]
    list_cameras: bool,

    /// List detected ambient light sensors and exit
    #[arg(long)]
    list_sensors: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_cameras {
        return list_cameras();
    }

    let mut config = TorchscanConfig::load(cli.config.as_deref())?;

    if let Some(ref name) = cli.device {
        config.camera.device_name = Some(name.clone());
        config.camera.device_index = None;
    }
    if let Some(index) = cli.device_index {
        config.camera.device_index = Some(index);
        config.camera.device_name = None;
    }
    if let Some(ref path) = cli.preferences {
        config.light.preferences = Some(path.clone());
    }

    logging::init(&config.logging)?;

    let sensors =
        IioSensorManager::new().with_sensor_path(config.light.sensor_path.clone());

    if cli.list_sensors {
        return list_sensors(&sensors);
    }

    let preferences = load_preferences(&config, cli.front_light)?;

    let camera_config = config.camera_config()?;
    info!(device = ?camera_config.device_path(), ?camera_config, "Starting torchscan");
    let camera = Camera::open(camera_config).await?;
    let torch = open_torch(&config, &camera);

    let scanner = CaptureScanner::new(camera)
        .with_timeout(config.scan.timeout())
        .with_retry_delay(config.scan.retry_delay());

    let mut session = ScanSession::open(scanner, torch, Arc::new(sensors), preferences);
    let mut relay = ResultRelay::new(TerminalDisplay::stdout(cli.json));

    let outcome = run_scans(&mut session, &mut relay, cli.watch).await;
    session.close().await;
    outcome
}

async fn run_scans(
    session: &mut ScanSession<Camera>,
    relay: &mut ResultRelay<TerminalDisplay>,
    watch: bool,
) -> Result<()> {
    loop {
        let scanned = tokio::select! {
            scanned = session.scan(relay) => scanned,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                return Ok(());
            }
        };

        match scanned {
            Some(_) if watch => continue,
            Some(_) => return Ok(()),
            None if watch => warn!("Scan produced no result, retrying"),
            None => return Err(Error::Other("No QR code scanned".to_string())),
        }
    }
}

fn load_preferences(
    config: &TorchscanConfig,
    front_light: Option<FrontLightMode>,
) -> Result<Arc<dyn PreferenceStore>> {
    if let Some(mode) = front_light {
        return Ok(Arc::new(
            MemoryPreferences::new().with(KEY_FRONT_LIGHT_MODE, mode.as_str()),
        ));
    }

    let preferences = match config.light.preferences.as_deref() {
        Some(path) => FilePreferences::load(path)?,
        None => FilePreferences::discover()?,
    };
    Ok(Arc::new(preferences))
}

fn open_torch(config: &TorchscanConfig, camera: &Camera) -> Option<Arc<dyn TorchControl>> {
    let opened: Result<Arc<dyn TorchControl>> = match config.torch.backend {
        TorchBackend::None => return None,
        TorchBackend::V4l2 => {
            let index = config.torch.device_index.unwrap_or(camera.info().index);
            V4l2Torch::open(index).map(|t| Arc::new(t) as Arc<dyn TorchControl>)
        }
        TorchBackend::Led => match config.torch.led_name.as_deref() {
            Some(name) => SysfsLedTorch::open(name).map(|t| Arc::new(t) as Arc<dyn TorchControl>),
            None => Err(Error::Config(
                "torch.backend = \"led\" requires torch.led_name".to_string(),
            )),
        },
    };

    match opened {
        Ok(torch) => Some(torch),
        Err(err) => {
            warn!("Torch unavailable, continuing without it: {err}");
            None
        }
    }
}

fn list_cameras() -> Result<()> {
    let devices = camera::list_devices()?;
    println!("Discovered cameras:");
    for dev in devices {
        println!("  [{}] {} ({})", dev.index, dev.name, dev.path);
    }
    Ok(())
}

fn list_sensors(sensors: &IioSensorManager) -> Result<()> {
    let found = sensors.list_sensors()?;
    if found.is_empty() {
        println!("No ambient light sensors detected");
        return Ok(());
    }

    println!("Discovered ambient light sensors:");
    for sensor in found {
        match torchscan::light::iio::read_lux(&sensor.path) {
            Ok(lux) => println!("  {} ({}) {lux:.1} lux", sensor.name, sensor.path.display()),
            Err(err) => println!("  {} ({}) unreadable: {err}", sensor.name, sensor.path.display()),
        }
    }
    Ok(())
}
