//! Front light mode preference and the key/value stores it is read from

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Preference key holding the front light mode
pub const KEY_FRONT_LIGHT_MODE: &str = "preferences_front_light_mode";

/// How the camera torch is driven while scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FrontLightMode {
    /// Torch always on
    On,
    /// Torch follows the ambient light sensor
    Auto,
    /// Torch always off
    #[default]
    Off,
}

impl FrontLightMode {
    /// Parse a mode identifier (case-insensitive). Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "on" => Some(Self::On),
            "auto" => Some(Self::Auto),
            "off" => Some(Self::Off),
            _ => None,
        }
    }

    /// Read the persisted mode, falling back to `Off` when unset or unparsable.
    pub fn read_pref(store: &dyn PreferenceStore) -> Self {
        store
            .get_string(KEY_FRONT_LIGHT_MODE)
            .as_deref()
            .and_then(Self::parse)
            .unwrap_or_default()
    }

    /// Canonical string representation for preference files
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Auto => "auto",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for FrontLightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrontLightMode {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(value)
            .ok_or_else(|| format!("Unsupported front light mode '{value}', expected on/auto/off"))
    }
}

/// Read access to persisted user preferences
pub trait PreferenceStore: Send + Sync {
    /// Look up a string preference by key
    fn get_string(&self, key: &str) -> Option<String>;
}

/// Preferences held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl MemoryPreferences {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a string preference, returning the store for chaining
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a string preference
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Preferences persisted as a flat TOML table
#[derive(Debug, Clone, Default)]
pub struct FilePreferences {
    path: Option<PathBuf>,
    values: HashMap<String, String>,
}

impl FilePreferences {
    /// Load preferences from `path`. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Preference file {} not found, using defaults", path.display());
            return Ok(Self {
                path: Some(path.to_path_buf()),
                values: HashMap::new(),
            });
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;
        let table: toml::Table = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Failed to parse preferences {}: {e}", path.display()))
        })?;

        let values = table
            .into_iter()
            .filter_map(|(key, value)| match value {
                toml::Value::String(s) => Some((key, s)),
                toml::Value::Boolean(b) => Some((key, b.to_string())),
                toml::Value::Integer(i) => Some((key, i.to_string())),
                other => {
                    tracing::warn!(%key, kind = other.type_str(), "Ignoring non-scalar preference");
                    None
                }
            })
            .collect();

        Ok(Self {
            path: Some(path.to_path_buf()),
            values,
        })
    }

    /// Load from `$XDG_CONFIG_HOME/torchscan/preferences.toml` (or `~/.config`).
    pub fn discover() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Default location of the preference file, if a config home can be resolved
    pub fn default_path() -> Option<PathBuf> {
        let base = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
        Some(base.join("torchscan").join("preferences.toml"))
    }

    /// Path the preferences were loaded from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl PreferenceStore for FilePreferences {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_pref_defaults_to_off() {
        let store = MemoryPreferences::new();
        assert_eq!(FrontLightMode::read_pref(&store), FrontLightMode::Off);
    }

    #[test]
    fn test_read_pref_parses_case_insensitively() {
        let store = MemoryPreferences::new().with(KEY_FRONT_LIGHT_MODE, "AUTO");
        assert_eq!(FrontLightMode::read_pref(&store), FrontLightMode::Auto);

        let store = MemoryPreferences::new().with(KEY_FRONT_LIGHT_MODE, "On");
        assert_eq!(FrontLightMode::read_pref(&store), FrontLightMode::On);
    }

    #[test]
    fn test_read_pref_unknown_value_is_off() {
        let store = MemoryPreferences::new().with(KEY_FRONT_LIGHT_MODE, "sometimes");
        assert_eq!(FrontLightMode::read_pref(&store), FrontLightMode::Off);
    }

    #[test]
    fn test_file_preferences_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = FilePreferences::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(prefs.get_string(KEY_FRONT_LIGHT_MODE), None);
    }

    #[test]
    fn test_file_preferences_reads_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "preferences_front_light_mode = \"auto\"").unwrap();
        writeln!(file, "preferences_play_beep = true").unwrap();

        let prefs = FilePreferences::load(&path).unwrap();
        assert_eq!(FrontLightMode::read_pref(&prefs), FrontLightMode::Auto);
        assert_eq!(prefs.get_string("preferences_play_beep").as_deref(), Some("true"));
    }

    #[test]
    fn test_file_preferences_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");
        fs::write(&path, "preferences_front_light_mode = ").unwrap();

        assert!(matches!(FilePreferences::load(&path), Err(Error::Config(_))));
    }
}
