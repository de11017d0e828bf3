use std::{ops::Not, path::PathBuf, time::Duration};

use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, sound::MIN_BEEP_INTERVAL};

const APP_NAME: &str = "mirai_alert";

#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Not for Theme {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl From<Theme> for egui::Visuals {
    fn from(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// strftime format used for the header clock and the alarm list
    pub time_format: String,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub sound: SoundSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NotificationSettings {
    /// the answer given when the app asks for notification permission
    #[serde(default = "always_true")]
    pub allow: bool,
    /// set once the user has been asked, the answer is replayed on the next start
    #[serde(default)]
    pub asked: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            allow: true,
            asked: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SoundSettings {
    #[serde(default = "default_beep_interval_ms")]
    pub beep_interval_ms: u64,
    /// overrides the default sounds directory
    pub directory: Option<PathBuf>,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            beep_interval_ms: default_beep_interval_ms(),
            directory: None,
        }
    }
}

impl SoundSettings {
    /// never shorter than [`MIN_BEEP_INTERVAL`], a 0 in the file would beep without pause
    #[must_use]
    pub fn beep_interval(&self) -> Duration {
        Duration::from_millis(self.beep_interval_ms).max(MIN_BEEP_INTERVAL)
    }
}

const fn default_beep_interval_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_format: "%l:%M %p".to_string(),
            theme: Theme::Dark,
            notifications: NotificationSettings::default(),
            sound: SoundSettings::default(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// a missing file is not an error, it just means nothing was configured yet
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let config =
            std::fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })?;
        Ok(toml::from_str(&config)?)
    }

    pub fn save(&self, path: PathBuf) -> Result<(), ConfigError> {
        let config = toml::to_string(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&path, config).map_err(|source| ConfigError::Write { path, source })
    }

    fn project_dirs() -> Result<directories::ProjectDirs, ConfigError> {
        directories::ProjectDirs::from("", "", APP_NAME).ok_or(ConfigError::NoProjectDirs)
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let mut path = Self::project_dirs()?.config_dir().to_path_buf();
        path.push("config.toml");
        Ok(path)
    }

    pub fn store_path() -> Result<PathBuf, ConfigError> {
        let mut path = Self::project_dirs()?.data_dir().to_path_buf();
        path.push("alarms.toml");
        Ok(path)
    }

    pub fn default_sounds_path() -> Result<PathBuf, ConfigError> {
        let mut path = Self::project_dirs()?.data_dir().to_path_buf();
        path.push("sounds");
        Ok(path)
    }

    pub fn sounds_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.sound.directory {
            Some(directory) => Ok(directory.clone()),
            None => Self::default_sounds_path(),
        }
    }

    #[must_use]
    pub fn is_config_present() -> bool {
        Self::config_path().is_ok_and(|path| path.exists())
    }
}

#[inline]
#[must_use]
pub const fn always_true() -> bool {
    true
}
