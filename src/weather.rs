use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// WMO codes that count as rain or other precipitation.
const RAIN_CODES: [i32; 22] = [
    51, 53, 55, 56, 57, 61, 63, 65, 66, 67, 71, 73, 75, 77, 80, 81, 82, 85, 86, 95, 96, 99,
];

pub const FALLBACK_GLYPH: &str = "🌤️";

/// A WMO weather interpretation code as reported by Open-Meteo.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(transparent)]
pub struct WeatherCode(pub i32);

impl WeatherCode {
    pub fn is_rain(self) -> bool {
        RAIN_CODES.contains(&self.0)
    }

    pub fn glyph(self) -> &'static str {
        match self.0 {
            0 => "☀️",
            1 => "🌤️",
            2 => "⛅",
            3 => "☁️",
            45 | 48 => "🌫️",
            51 | 53 | 80 => "🌦️",
            55 | 61 | 63 | 65 | 81 => "🌧️",
            56 | 57 | 66 | 67 | 71 | 73 | 77 | 85 => "🌨️",
            75 | 86 => "❄️",
            82 | 95 | 96 | 99 => "⛈️",
            _ => FALLBACK_GLYPH,
        }
    }
}

/// A geocoded city. `name` is the full display label and doubles as the
/// identity used for favorites.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CityLocation {
    pub name: String,

    #[serde(rename = "lat")]
    pub latitude: f64,

    #[serde(rename = "lon")]
    pub longitude: f64,
}

impl CityLocation {
    pub fn label(name: &str, region: Option<&str>, country: Option<&str>) -> String {
        let mut label = name.to_string();
        for part in [region, country].into_iter().flatten() {
            if !part.is_empty() {
                label.push_str(", ");
                label.push_str(part);
            }
        }
        label
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub time: Option<NaiveDateTime>,
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub weather_code: WeatherCode,
}

/// One hour of forecast. The provider may leave any value `null` for an hour
/// it has no data for; such an hour is never rainy nor warm.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyEntry {
    pub time: NaiveDateTime,
    pub temperature: Option<f64>,
    pub weather_code: Option<WeatherCode>,
    pub precipitation_probability: Option<f64>,
}

impl HourlyEntry {
    pub fn is_rain(&self) -> bool {
        self.weather_code.is_some_and(WeatherCode::is_rain)
    }

    pub fn glyph(&self) -> &'static str {
        self.weather_code.map_or(FALLBACK_GLYPH, WeatherCode::glyph)
    }
}

/// Hourly entries for one local day; index 0 is local midnight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlySeries(pub Vec<HourlyEntry>);

impl HourlySeries {
    /// Entries at `origin + 1 ..= origin + lookahead`, paired with their offset
    /// from `origin`. Indices past the end of the day are skipped.
    pub fn window(
        &self,
        origin: usize,
        lookahead: usize,
    ) -> impl Iterator<Item = (usize, &HourlyEntry)> + '_ {
        let len = self.0.len();
        let start = origin.saturating_add(1).min(len);
        let end = origin
            .saturating_add(lookahead)
            .saturating_add(1)
            .min(len)
            .max(start);
        self.0[start..end]
            .iter()
            .enumerate()
            .map(|(i, entry)| (i + 1, entry))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub current: CurrentConditions,
    pub hourly: HourlySeries,
}

impl Forecast {
    /// Index of the current hour within the hourly series. The provider
    /// reports `current.time` in the city's own timezone; the local clock is
    /// only a fallback.
    pub fn origin_hour(&self) -> usize {
        match self.current.time {
            Some(time) => time.hour() as usize,
            None => Local::now().hour() as usize,
        }
    }
}

/// Everything one lookup produced: where, and what the weather is there.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub city: CityLocation,
    pub forecast: Forecast,
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_rain_code_and_glyph_agree() {
        let code = WeatherCode(61);
        assert!(code.is_rain());
        assert_eq!(code.glyph(), "🌧️");
    }

    #[test]
    fn test_clear_codes_are_not_rain() {
        for code in [0, 1, 2, 3, 45, 48] {
            assert!(!WeatherCode(code).is_rain(), "code {code}");
        }
    }

    #[test]
    fn test_unknown_code_uses_fallback_glyph() {
        assert_eq!(WeatherCode(42).glyph(), FALLBACK_GLYPH);
        assert_eq!(WeatherCode(-1).glyph(), FALLBACK_GLYPH);
    }

    #[test]
    fn test_label_includes_region_and_country() {
        assert_eq!(
            CityLocation::label("Paris", Some("Île-de-France"), Some("France")),
            "Paris, Île-de-France, France"
        );
        assert_eq!(
            CityLocation::label("Monaco", None, Some("Monaco")),
            "Monaco, Monaco"
        );
        assert_eq!(CityLocation::label("Nowhere", Some(""), None), "Nowhere");
    }

    #[test]
    fn test_window_skips_past_end_of_day() {
        let hourly = series(&[1.0, 2.0, 3.0], &[0, 0, 0]);
        assert_eq!(hourly.window(23, 4).count(), 0);
        let offsets: Vec<_> = hourly.window(0, 4).map(|(o, _)| o).collect();
        assert_eq!(offsets, vec![1, 2]);
    }

    #[test]
    fn test_window_stops_at_series_end() {
        let hourly = series(&[5.0; 24], &[0; 24]);
        let offsets: Vec<_> = hourly.window(20, usize::MAX).map(|(o, _)| o).collect();
        assert_eq!(offsets, vec![1, 2, 3]);
        assert_eq!(hourly.window(usize::MAX, usize::MAX).count(), 0);
        assert_eq!(hourly.window(3, 0).count(), 0);
    }

    #[test]
    fn test_hour_without_data() {
        let entry = HourlyEntry {
            time: hour(4),
            temperature: None,
            weather_code: None,
            precipitation_probability: None,
        };
        assert!(!entry.is_rain());
        assert_eq!(entry.glyph(), FALLBACK_GLYPH);
    }

    #[test]
    fn test_origin_hour_follows_provider_time() {
        let report = report("Paris", 14, series(&[], &[]));
        assert_eq!(report.forecast.origin_hour(), 14);
    }

    #[test]
    fn test_favorite_wire_shape() {
        let city = CityLocation {
            name: "Paris, Île-de-France, France".to_string(),
            latitude: 48.85,
            longitude: 2.35,
        };
        let json = serde_json::to_value(&city).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Paris, Île-de-France, France", "lat": 48.85, "lon": 2.35})
        );
    }
}
