use crate::config::AlertConfig;
use crate::units;
use crate::weather::HourlySeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Rain,
    Heat,
}

impl AlertKind {
    /// Notification tag; a newer alert of the same kind replaces the older.
    pub fn tag(self) -> &'static str {
        match self {
            AlertKind::Rain => "rain",
            AlertKind::Heat => "heat",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub city: String,
    /// Lead time in hours for rain, rounded °C for heat.
    pub value: i64,
    pub message: String,
}

impl AlertEvent {
    fn rain(city: &str, hours: usize) -> Self {
        let plural = if hours > 1 { "s" } else { "" };
        Self {
            kind: AlertKind::Rain,
            city: city.to_string(),
            value: hours as i64,
            message: format!("🌧️ Rain expected in {hours} hour{plural}!"),
        }
    }

    fn heat(city: &str, temp: i64) -> Self {
        Self {
            kind: AlertKind::Heat,
            city: city.to_string(),
            value: temp,
            message: format!("🌡️ High temperature expected: {temp}°C"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertEvaluator {
    pub threshold: f64,
    pub lookahead: usize,
}

impl Default for AlertEvaluator {
    fn default() -> Self {
        Self::from(&AlertConfig::default())
    }
}

impl From<&AlertConfig> for AlertEvaluator {
    fn from(config: &AlertConfig) -> Self {
        Self {
            threshold: config.temperature_threshold,
            lookahead: config.lookahead_hours,
        }
    }
}

impl AlertEvaluator {
    pub fn is_warm(&self, temp: f64) -> bool {
        temp > self.threshold
    }

    /// Scans the hours after `origin` and reports the first rainy hour and
    /// the first warm hour, each at most once.
    pub fn evaluate(&self, series: &HourlySeries, origin: usize, city: &str) -> Vec<AlertEvent> {
        let mut rain_in = None;
        let mut warm = None;

        for (offset, entry) in series.window(origin, self.lookahead) {
            if rain_in.is_none() && entry.is_rain() {
                rain_in = Some(offset);
            }
            if warm.is_none() {
                warm = entry
                    .temperature
                    .filter(|&t| self.is_warm(t))
                    .map(units::round);
            }
            if rain_in.is_some() && warm.is_some() {
                break;
            }
        }

        let mut events = Vec::new();
        if let Some(hours) = rain_in {
            events.push(AlertEvent::rain(city, hours));
        }
        if let Some(temp) = warm {
            events.push(AlertEvent::heat(city, temp));
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::fixtures::series;

    fn day(origin: usize, temps: &[f64], codes: &[i32]) -> HourlySeries {
        let mut all_temps = vec![0.0; origin + 1];
        let mut all_codes = vec![0; origin + 1];
        all_temps.extend_from_slice(temps);
        all_codes.extend_from_slice(codes);
        series(&all_temps, &all_codes)
    }

    #[test]
    fn test_last_hour_of_day_scans_nothing() {
        let hourly = series(&[30.0, 30.0, 30.0], &[61, 61, 61]);
        assert!(AlertEvaluator::default().evaluate(&hourly, 23, "X").is_empty());
    }

    #[test]
    fn test_rain_lead_time() {
        let hourly = day(9, &[5.0, 5.0, 5.0, 5.0], &[0, 61, 0, 0]);
        let events = AlertEvaluator::default().evaluate(&hourly, 9, "Paris");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AlertKind::Rain);
        assert_eq!(events[0].value, 2);
        assert_eq!(events[0].message, "🌧️ Rain expected in 2 hours!");
        assert_eq!(events[0].city, "Paris");
    }

    #[test]
    fn test_single_hour_is_not_plural() {
        let hourly = day(0, &[5.0], &[80]);
        let events = AlertEvaluator::default().evaluate(&hourly, 0, "Paris");
        assert_eq!(events[0].message, "🌧️ Rain expected in 1 hour!");
    }

    #[test]
    fn test_heat_reports_first_match_not_max() {
        let hourly = day(12, &[5.0, 8.0, 12.0, 15.0], &[0, 0, 0, 0]);
        let events = AlertEvaluator::default().evaluate(&hourly, 12, "Nice");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AlertKind::Heat);
        assert_eq!(events[0].value, 12);
        assert_eq!(events[0].message, "🌡️ High temperature expected: 12°C");
    }

    #[test]
    fn test_threshold_is_strict() {
        let hourly = day(3, &[10.0, 10.0, 10.0, 10.0], &[0, 0, 0, 0]);
        assert!(AlertEvaluator::default().evaluate(&hourly, 3, "X").is_empty());
    }

    #[test]
    fn test_at_most_one_of_each_kind() {
        let hourly = day(6, &[20.0, 21.0, 22.0, 23.0], &[61, 63, 65, 95]);
        let events = AlertEvaluator::default().evaluate(&hourly, 6, "X");
        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![AlertKind::Rain, AlertKind::Heat]);
        assert_eq!(events[0].value, 1);
        assert_eq!(events[1].value, 20);
    }

    #[test]
    fn test_hours_outside_window_are_ignored() {
        // rain at the origin itself and five hours later
        let hourly = series(
            &[5.0; 8],
            &[61, 0, 0, 0, 0, 61, 0, 0],
        );
        assert!(AlertEvaluator::default().evaluate(&hourly, 0, "X").is_empty());
    }

    #[test]
    fn test_hours_without_data_raise_nothing() {
        let mut hourly = day(0, &[30.0, 30.0], &[61, 0]);
        hourly.0[1].temperature = None;
        hourly.0[1].weather_code = None;
        let events = AlertEvaluator::default().evaluate(&hourly, 0, "X");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AlertKind::Heat);
        assert_eq!(events[0].value, 30);
    }

    #[test]
    fn test_custom_threshold_from_config() {
        let evaluator = AlertEvaluator::from(&AlertConfig {
            temperature_threshold: 25.0,
            lookahead_hours: 2,
        });
        let hourly = day(0, &[24.0, 26.0, 30.0], &[0, 0, 61]);
        let events = evaluator.evaluate(&hourly, 0, "X");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].value, 26);
    }
}
