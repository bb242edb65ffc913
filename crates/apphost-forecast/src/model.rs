//! Wire types of the forecast endpoint.

use serde::{Deserialize, Serialize};

/// One day of the forecast, as served by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    /// ISO-8601 date or date-time.
    pub date: String,
    /// Temperature in degrees Celsius.
    pub temperature_c: i32,
    /// Temperature in degrees Fahrenheit.
    pub temperature_f: i32,
    /// Free-form summary (`Mild`, `Chilly`, ...).
    pub summary: String,
}

impl Forecast {
    /// Calendar date part of [`date`](Self::date).
    #[must_use]
    pub fn day(&self) -> &str {
        self.date
            .split_once('T')
            .map_or(self.date.as_str(), |(day, _)| day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_camel_case_payload() {
        let json = r#"[{"date":"2024-01-01","temperatureC":20,"temperatureF":68,"summary":"Mild"}]"#;
        let forecasts: Vec<Forecast> = serde_json::from_str(json).expect("decode");
        assert_eq!(
            forecasts,
            vec![Forecast {
                date: "2024-01-01".into(),
                temperature_c: 20,
                temperature_f: 68,
                summary: "Mild".into(),
            }]
        );
    }

    #[test]
    fn day_strips_time_of_day() {
        let forecast = Forecast {
            date: "2024-01-02T09:30:00.123456".into(),
            temperature_c: -4,
            temperature_f: 25,
            summary: "Bracing".into(),
        };
        assert_eq!(forecast.day(), "2024-01-02");
    }

    #[test]
    fn negative_temperatures_decode() {
        let json = r#"{"date":"2024-01-03","temperatureC":-20,"temperatureF":-4,"summary":"Freezing"}"#;
        let forecast: Forecast = serde_json::from_str(json).expect("decode");
        assert_eq!(forecast.temperature_c, -20);
        assert_eq!(forecast.temperature_f, -4);
    }
}
