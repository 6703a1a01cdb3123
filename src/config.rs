use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const APP_DIR: &str = "meteo";
const CONFIG_FILE: &str = "config.toml";
const STORAGE_FILE: &str = "storage.json";
const LOG_FILE: &str = "meteo.log";

/// The weather panel has room for this many upcoming-hour cards.
pub const MAX_LOOKAHEAD_HOURS: usize = 4;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub alerts: AlertConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub geocoding_url: String,
    pub forecast_url: String,

    /// Locale passed to the geocoder; controls the language of place names.
    pub language: String,

    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            geocoding_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            language: "en".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertConfig {
    /// Degrees Celsius; an hour strictly above this raises a heat alert.
    pub temperature_threshold: f64,
    pub lookahead_hours: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            temperature_threshold: 10.0,
            lookahead_hours: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub toast_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            toast_secs: 8,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
}

impl Config {
    /// Loads `path`, or the default location when `None`. A missing file
    /// yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config: Config =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, url) in [
            ("api.geocoding_url", &self.api.geocoding_url),
            ("api.forecast_url", &self.api.forecast_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be an http(s) URL, got {url:?}"
                )));
            }
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "api.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if !(1..=MAX_LOOKAHEAD_HOURS).contains(&self.alerts.lookahead_hours) {
            return Err(ConfigError::Invalid(format!(
                "alerts.lookahead_hours must be between 1 and {MAX_LOOKAHEAD_HOURS}, got {}",
                self.alerts.lookahead_hours
            )));
        }
        Ok(())
    }

    pub fn storage_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| data_dir().join(STORAGE_FILE))
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
}

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn log_path() -> PathBuf {
    data_dir().join(LOG_FILE)
}
