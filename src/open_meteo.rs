use std::time::Duration;

use chrono::NaiveDateTime;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::config::ApiConfig;
use crate::error::{Stage, WeatherError};
use crate::weather::{
    CityLocation, CurrentConditions, Forecast, HourlyEntry, HourlySeries, Report, WeatherCode,
};

const USER_AGENT: &str = concat!("meteo/", env!("CARGO_PKG_VERSION"));
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
const CURRENT_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,apparent_temperature,weather_code,wind_speed_10m";
const HOURLY_FIELDS: &str = "temperature_2m,weather_code,precipitation_probability";

/// Anything that can turn a city name into a forecast.
pub trait WeatherSource: Send + Sync {
    fn resolve_city(&self, query: &str) -> Result<CityLocation, WeatherError>;

    fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<Forecast, WeatherError>;

    /// Geocode, then fetch. The two requests run one after the other.
    fn lookup(&self, query: &str) -> Result<Report, WeatherError> {
        let city = self.resolve_city(query)?;
        self.report_for(city)
    }

    fn report_for(&self, city: CityLocation) -> Result<Report, WeatherError> {
        let forecast = self.fetch_forecast(city.latitude, city.longitude)?;
        Ok(Report { city, forecast })
    }
}

pub mod geocoding {
    use super::*;

    #[derive(Deserialize, Debug, Default)]
    pub struct Response {
        #[serde(default)]
        pub results: Option<Vec<Place>>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Place {
        pub name: String,

        #[serde(default)]
        pub admin1: Option<String>,

        #[serde(default)]
        pub country: Option<String>,

        pub latitude: f64,

        pub longitude: f64,
    }

    impl Place {
        pub fn into_city(self) -> CityLocation {
            CityLocation {
                name: CityLocation::label(
                    &self.name,
                    self.admin1.as_deref(),
                    self.country.as_deref(),
                ),
                latitude: self.latitude,
                longitude: self.longitude,
            }
        }
    }
}

pub mod forecast {
    use super::*;

    #[derive(Deserialize, Debug)]
    pub struct Response {
        pub current: Current,
        pub hourly: Hourly,
    }

    #[derive(Deserialize, Debug)]
    pub struct Current {
        #[serde(default)]
        pub time: Option<String>,
        pub temperature_2m: f64,
        pub relative_humidity_2m: f64,
        pub apparent_temperature: f64,
        pub weather_code: WeatherCode,
        pub wind_speed_10m: f64,
    }

    #[derive(Deserialize, Debug)]
    pub struct Hourly {
        pub time: Vec<String>,
        pub temperature_2m: Vec<Option<f64>>,
        pub weather_code: Vec<Option<WeatherCode>>,

        #[serde(default)]
        pub precipitation_probability: Vec<Option<f64>>,
    }

    fn parse_time(raw: &str) -> Result<NaiveDateTime, String> {
        NaiveDateTime::parse_from_str(raw, TIME_FORMAT).map_err(|e| format!("bad time {raw:?}: {e}"))
    }

    impl Response {
        pub fn into_forecast(self) -> Result<Forecast, String> {
            let Hourly {
                time,
                temperature_2m,
                weather_code,
                precipitation_probability,
            } = self.hourly;

            let len = time.len();
            if temperature_2m.len() != len
                || weather_code.len() != len
                || (!precipitation_probability.is_empty() && precipitation_probability.len() != len)
            {
                return Err(format!(
                    "hourly arrays differ in length (time={}, temperature={}, code={}, precipitation={})",
                    len,
                    temperature_2m.len(),
                    weather_code.len(),
                    precipitation_probability.len()
                ));
            }

            let mut entries = Vec::with_capacity(len);
            for (idx, raw) in time.iter().enumerate() {
                entries.push(HourlyEntry {
                    time: parse_time(raw)?,
                    temperature: temperature_2m[idx],
                    weather_code: weather_code[idx],
                    precipitation_probability: precipitation_probability
                        .get(idx)
                        .copied()
                        .flatten(),
                });
            }

            let current = CurrentConditions {
                time: self.current.time.as_deref().map(parse_time).transpose()?,
                temperature: self.current.temperature_2m,
                apparent_temperature: self.current.apparent_temperature,
                humidity: self.current.relative_humidity_2m,
                wind_speed: self.current.wind_speed_10m,
                weather_code: self.current.weather_code,
            };

            Ok(Forecast {
                current,
                hourly: HourlySeries(entries),
            })
        }
    }
}

/// Blocking Open-Meteo client. Cheap to clone; clones share one connection
/// pool.
#[derive(Debug, Clone)]
pub struct OpenMeteo {
    client: Client,
    geocoding_url: String,
    forecast_url: String,
    language: String,
}

impl OpenMeteo {
    pub fn new(api: &ApiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            geocoding_url: api.geocoding_url.clone(),
            forecast_url: api.forecast_url.clone(),
            language: api.language.clone(),
        })
    }

    fn get_web_json<T: DeserializeOwned>(
        &self,
        stage: Stage,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|source| WeatherError::Network { stage, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Http {
                stage,
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .map_err(|source| WeatherError::Network { stage, source })?;
        serde_json::from_str(&text).map_err(|e| WeatherError::parse(stage, e.to_string()))
    }
}

impl WeatherSource for OpenMeteo {
    #[instrument(skip(self))]
    fn resolve_city(&self, query: &str) -> Result<CityLocation, WeatherError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WeatherError::Query);
        }

        let response: geocoding::Response = self.get_web_json(
            Stage::Geocoding,
            &self.geocoding_url,
            &[
                ("name", query.to_string()),
                ("count", "1".to_string()),
                ("language", self.language.clone()),
                ("format", "json".to_string()),
            ],
        )?;

        let place = response
            .results
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| WeatherError::NotFound(query.to_string()))?;
        let city = place.into_city();
        info!(city = %city.name, "resolved city");
        Ok(city)
    }

    #[instrument(skip(self))]
    fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<Forecast, WeatherError> {
        let response: forecast::Response = self.get_web_json(
            Stage::Forecast,
            &self.forecast_url,
            &[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
                ("forecast_days", "1".to_string()),
            ],
        )?;
        response
            .into_forecast()
            .map_err(|message| WeatherError::parse(Stage::Forecast, message))
    }
}
