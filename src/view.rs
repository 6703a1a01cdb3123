//! State → view-model. Nothing here knows about the terminal.

use crate::alerts::AlertEvaluator;
use crate::notify::Permission;
use crate::store::Theme;
use crate::units::{self, humidity, speed, temperature};
use crate::weather::{CityLocation, Report};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStyle {
    Rain,
    Warm,
    Neutral,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourCard {
    pub label: String,
    pub glyph: &'static str,
    pub temperature: String,
    /// Chance of precipitation, when the provider reports one.
    pub precipitation: Option<String>,
    pub style: CardStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherPanel {
    pub city: String,
    pub temperature: i64,
    pub glyph: &'static str,
    pub wind: String,
    pub humidity: String,
    pub feels_like: String,
    pub hours: Vec<HourCard>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteEntry {
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeView {
    pub dark: bool,
    pub toggle_glyph: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyButton {
    pub label: &'static str,
    pub enabled: bool,
}

pub fn weather_panel(report: &Report, evaluator: &AlertEvaluator) -> WeatherPanel {
    let current = &report.forecast.current;
    let origin = report.forecast.origin_hour();

    let hours = report
        .forecast
        .hourly
        .window(origin, evaluator.lookahead)
        .map(|(_, entry)| {
            let style = if entry.is_rain() {
                CardStyle::Rain
            } else if entry.temperature.is_some_and(|t| evaluator.is_warm(t)) {
                CardStyle::Warm
            } else {
                CardStyle::Neutral
            };
            HourCard {
                label: entry.time.format("%-Hh").to_string(),
                glyph: entry.glyph(),
                temperature: entry
                    .temperature
                    .map_or_else(|| "--".to_string(), temperature::celsius),
                precipitation: entry
                    .precipitation_probability
                    .map(|p| format!("💧 {}", humidity::chance(p))),
                style,
            }
        })
        .collect();

    WeatherPanel {
        city: report.city.name.clone(),
        temperature: units::round(current.temperature),
        glyph: current.weather_code.glyph(),
        wind: speed::kph(current.wind_speed),
        humidity: humidity::percent(current.humidity),
        feels_like: temperature::celsius(current.apparent_temperature),
        hours,
    }
}

pub fn favorites_panel(favorites: &[CityLocation], selected: Option<usize>) -> Vec<FavoriteEntry> {
    favorites
        .iter()
        .enumerate()
        .map(|(idx, city)| FavoriteEntry {
            label: city.name.clone(),
            selected: selected == Some(idx),
        })
        .collect()
}

pub fn theme_view(theme: Theme) -> ThemeView {
    match theme {
        Theme::Dark => ThemeView {
            dark: true,
            toggle_glyph: "☀️",
        },
        Theme::Light => ThemeView {
            dark: false,
            toggle_glyph: "🌙",
        },
    }
}

pub fn notify_button(permission: Permission) -> NotifyButton {
    match permission {
        Permission::Default => NotifyButton {
            label: "🔔 Enable notifications",
            enabled: true,
        },
        Permission::Granted => NotifyButton {
            label: "✅ Notifications enabled",
            enabled: true,
        },
        Permission::Denied => NotifyButton {
            label: "❌ Notifications blocked",
            enabled: true,
        },
        Permission::Unsupported => NotifyButton {
            label: "🔔 Notifications not supported",
            enabled: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::fixtures::{report, series};

    #[test]
    fn test_weather_panel_fields() {
        let mut temps = vec![0.0; 24];
        let mut codes = vec![0; 24];
        temps[15] = 14.5;
        codes[15] = 2;
        temps[16] = 13.0;
        codes[16] = 61;
        temps[17] = 9.4;
        codes[17] = 3;
        temps[18] = 8.0;
        codes[18] = 42;
        let r = report("Paris, Île-de-France, France", 14, series(&temps, &codes));

        let panel = weather_panel(&r, &AlertEvaluator::default());
        assert_eq!(panel.city, "Paris, Île-de-France, France");
        assert_eq!(panel.temperature, 10);
        assert_eq!(panel.glyph, "☁️");
        assert_eq!(panel.wind, "12 km/h");
        assert_eq!(panel.humidity, "81 %");
        assert_eq!(panel.feels_like, "7°C");

        let labels: Vec<_> = panel.hours.iter().map(|h| h.label.as_str()).collect();
        assert_eq!(labels, vec!["15h", "16h", "17h", "18h"]);
        let styles: Vec<_> = panel.hours.iter().map(|h| h.style).collect();
        assert_eq!(
            styles,
            vec![
                CardStyle::Warm,
                CardStyle::Rain,
                CardStyle::Neutral,
                CardStyle::Neutral
            ]
        );
        assert_eq!(panel.hours[0].temperature, "15°C");
        assert_eq!(panel.hours[1].glyph, "🌧️");
        assert_eq!(panel.hours[3].glyph, "🌤️");
        assert_eq!(panel.hours[0].precipitation.as_deref(), Some("💧 0%"));
    }

    #[test]
    fn test_late_evening_shows_fewer_cards() {
        let r = report("X", 22, series(&[5.0; 24], &[0; 24]));
        let panel = weather_panel(&r, &AlertEvaluator::default());
        assert_eq!(panel.hours.len(), 1);
        assert_eq!(panel.hours[0].label, "23h");
    }

    #[test]
    fn test_early_hours_have_no_leading_zero() {
        let r = report("X", 0, series(&[5.0; 24], &[0; 24]));
        let panel = weather_panel(&r, &AlertEvaluator::default());
        assert_eq!(panel.hours[0].label, "1h");
    }

    #[test]
    fn test_hour_without_data_is_neutral() {
        let mut hourly = series(&[30.0; 24], &[61; 24]);
        hourly.0[5].temperature = None;
        hourly.0[5].weather_code = None;
        hourly.0[5].precipitation_probability = Some(62.5);
        let r = report("X", 4, hourly);

        let panel = weather_panel(&r, &AlertEvaluator::default());
        let card = &panel.hours[0];
        assert_eq!(card.style, CardStyle::Neutral);
        assert_eq!(card.temperature, "--");
        assert_eq!(card.glyph, "🌤️");
        assert_eq!(card.precipitation.as_deref(), Some("💧 63%"));
        assert_eq!(panel.hours[1].style, CardStyle::Rain);
    }

    #[test]
    fn test_favorites_panel_marks_selection() {
        let cities = vec![
            CityLocation {
                name: "Paris".into(),
                latitude: 0.0,
                longitude: 0.0,
            },
            CityLocation {
                name: "Lyon".into(),
                latitude: 0.0,
                longitude: 0.0,
            },
        ];
        let entries = favorites_panel(&cities, Some(1));
        assert_eq!(entries[0].label, "Paris");
        assert!(!entries[0].selected);
        assert!(entries[1].selected);
        assert!(favorites_panel(&[], None).is_empty());
    }

    #[test]
    fn test_theme_glyph() {
        assert_eq!(theme_view(Theme::Dark).toggle_glyph, "☀️");
        assert!(!theme_view(Theme::Light).dark);
        assert_eq!(theme_view(Theme::Light).toggle_glyph, "🌙");
    }

    #[test]
    fn test_notify_button_states() {
        assert!(!notify_button(Permission::Unsupported).enabled);
        assert_eq!(notify_button(Permission::Granted).label, "✅ Notifications enabled");
        assert_eq!(notify_button(Permission::Denied).label, "❌ Notifications blocked");
    }
}
