/// Rounds half-way values towards positive infinity, so `-2.5` becomes `-2`
/// and `2.5` becomes `3`.
pub fn round(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[test]
fn test_round() {
    assert_eq!(round(12.4), 12);
    assert_eq!(round(12.5), 13);
    assert_eq!(round(-2.5), -2);
    assert_eq!(round(-2.6), -3);
    assert_eq!(round(0.0), 0);
}

pub mod temperature {
    pub fn celsius(temp: f64) -> String {
        format!("{}°C", super::round(temp))
    }

    #[test]
    fn test_celsius() {
        assert_eq!(celsius(7.6), "8°C");
        assert_eq!(celsius(-0.4), "0°C");
    }
}

pub mod speed {
    pub fn kph(speed: f64) -> String {
        format!("{} km/h", super::round(speed))
    }

    #[test]
    fn test_kph() {
        assert_eq!(kph(14.6), "15 km/h");
    }
}

pub mod humidity {
    pub fn percent(humidity: f64) -> String {
        format!("{humidity} %")
    }

    /// Chance of precipitation, in whole percent.
    pub fn chance(probability: f64) -> String {
        format!("{}%", super::round(probability))
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(65.0), "65 %");
        assert_eq!(percent(72.5), "72.5 %");
    }

    #[test]
    fn test_chance() {
        assert_eq!(chance(35.0), "35%");
        assert_eq!(chance(62.5), "63%");
    }
}
