//! Ambient light sensing and front light mode handling

pub mod ambient;
pub mod iio;
pub mod mode;
pub mod sensor;

pub use ambient::{
    AmbientHandle, AmbientLightManager, AmbientState, BRIGHT_ENOUGH_LUX, TOO_DARK_LUX,
};
pub use iio::IioSensorManager;
pub use mode::{
    FilePreferences, FrontLightMode, KEY_FRONT_LIGHT_MODE, MemoryPreferences, PreferenceStore,
};
pub use sensor::{
    SensorAccuracy, SensorDelay, SensorEvent, SensorInfo, SensorKind, SensorManager,
    SensorSubscription,
};
