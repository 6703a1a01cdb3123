//! Error types for lookups, storage and configuration.
//!
//! Lookup errors carry enough detail for the log file; `user_message()` turns
//! them into the single line shown in the error region.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which of the two upstream requests failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Geocoding,
    Forecast,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Geocoding => f.write_str("geocoding"),
            Stage::Forecast => f.write_str("forecast"),
        }
    }
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("empty search query")]
    Query,

    #[error("no match for {0:?}")]
    NotFound(String),

    #[error("{stage} request returned HTTP {status}")]
    Http { stage: Stage, status: u16 },

    #[error("{stage} request failed: {source}")]
    Network {
        stage: Stage,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed {stage} response: {message}")]
    Parse { stage: Stage, message: String },
}

impl WeatherError {
    pub fn parse(stage: Stage, message: impl Into<String>) -> Self {
        Self::Parse {
            stage,
            message: message.into(),
        }
    }

    /// The message shown to the user. HTTP, transport and parse failures of
    /// the same request read identically.
    pub fn user_message(&self) -> String {
        match self {
            WeatherError::Query => "Please enter a city name.".to_string(),
            WeatherError::NotFound(query) => format!("City \"{query}\" not found."),
            WeatherError::Http { stage, .. }
            | WeatherError::Network { stage, .. }
            | WeatherError::Parse { stage, .. } => match stage {
                Stage::Geocoding => "Geocoding failed.".to_string(),
                Stage::Forecast => "Could not retrieve weather data.".to_string(),
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
