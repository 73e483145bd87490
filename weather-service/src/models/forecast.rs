//! Forecast entries and the per-metric extremes derived from them.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// One time slice of an OpenWeather-style forecast. Fields not needed for
/// scoring are ignored during deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ForecastEntry {
    pub main: MainReadings,
    pub wind: WindReadings,
    #[validate(length(min = 1))]
    pub weather: Vec<WeatherCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub humidity: f64,
    pub pressure: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindReadings {
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub main: String,
}

impl ForecastEntry {
    /// The headline condition (`weather[0].main`). Empty for an entry that
    /// has not been validated.
    pub fn condition(&self) -> &str {
        self.weather.first().map_or("", |w| w.main.as_str())
    }
}

/// The entries holding the highest temperature, wind speed and humidity.
///
/// Each metric is selected independently, so the three may come from
/// different time slices.
#[derive(Debug, Clone, Copy)]
pub struct WeatherExtremes<'a> {
    pub max_temp: &'a ForecastEntry,
    pub max_wind: &'a ForecastEntry,
    pub max_humidity: &'a ForecastEntry,
}

impl<'a> WeatherExtremes<'a> {
    /// Returns `None` for an empty forecast.
    pub fn from_forecast(forecast: &'a [ForecastEntry]) -> Option<Self> {
        Some(Self {
            max_temp: first_max_by(forecast, |e| e.main.temp)?,
            max_wind: first_max_by(forecast, |e| e.wind.speed)?,
            max_humidity: first_max_by(forecast, |e| e.main.humidity)?,
        })
    }

    pub fn temperature(&self) -> f64 {
        self.max_temp.main.temp
    }

    pub fn wind_speed(&self) -> f64 {
        self.max_wind.wind.speed
    }

    pub fn humidity(&self) -> f64 {
        self.max_humidity.main.humidity
    }

    /// Pressure reported alongside the hottest reading.
    pub fn pressure(&self) -> f64 {
        self.max_temp.main.pressure
    }

    /// Condition reported alongside the hottest reading.
    pub fn condition(&self) -> &'a str {
        self.max_temp.condition()
    }

    /// Classifier input, in training order: temperature, wind speed, humidity.
    pub fn risk_features(&self) -> [f64; 3] {
        [self.temperature(), self.wind_speed(), self.humidity()]
    }

    pub fn conditions(&self) -> WeatherConditions {
        WeatherConditions {
            temperature: self.temperature(),
            wind_speed: self.wind_speed(),
            pressure: self.pressure(),
            humidity: self.humidity(),
        }
    }
}

/// Scalar summary used to prompt the recommendation generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherConditions {
    pub temperature: f64,
    pub wind_speed: f64,
    pub pressure: f64,
    pub humidity: f64,
}

/// Maximum by key; ties keep the earliest entry.
fn first_max_by<T, F>(items: &[T], key: F) -> Option<&T>
where
    F: Fn(&T) -> f64,
{
    let mut iter = items.iter();
    let mut best = iter.next()?;
    let mut best_key = key(best);
    for item in iter {
        let k = key(item);
        if k > best_key {
            best = item;
            best_key = k;
        }
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(temp: f64, humidity: f64, pressure: f64, speed: f64, condition: &str) -> ForecastEntry {
        ForecastEntry {
            main: MainReadings {
                temp,
                humidity,
                pressure,
            },
            wind: WindReadings { speed },
            weather: vec![WeatherCondition {
                main: condition.to_string(),
            }],
        }
    }

    #[test]
    fn extremes_are_selected_independently() {
        let forecast = vec![
            entry(30.0, 40.0, 1010.0, 5.0, "Clear"),
            entry(25.0, 90.0, 1000.0, 3.0, "Rain"),
            entry(20.0, 60.0, 995.0, 20.0, "Wind"),
        ];

        let extremes = WeatherExtremes::from_forecast(&forecast).unwrap();
        assert_eq!(extremes.temperature(), 30.0);
        assert_eq!(extremes.wind_speed(), 20.0);
        assert_eq!(extremes.humidity(), 90.0);
        assert_eq!(extremes.pressure(), 1010.0);
        assert_eq!(extremes.condition(), "Clear");
        assert_eq!(extremes.risk_features(), [30.0, 20.0, 90.0]);
    }

    #[test]
    fn ties_resolve_to_first_entry() {
        let forecast = vec![
            entry(30.0, 50.0, 1001.0, 5.0, "Clouds"),
            entry(30.0, 50.0, 1002.0, 5.0, "Rain"),
        ];

        let extremes = WeatherExtremes::from_forecast(&forecast).unwrap();
        assert_eq!(extremes.pressure(), 1001.0);
        assert_eq!(extremes.condition(), "Clouds");
        assert!(std::ptr::eq(extremes.max_wind, &forecast[0]));
        assert!(std::ptr::eq(extremes.max_humidity, &forecast[0]));
    }

    #[test]
    fn empty_forecast_has_no_extremes() {
        assert!(WeatherExtremes::from_forecast(&[]).is_none());
    }

    #[test]
    fn deserializes_openweather_entry_ignoring_extra_fields() {
        let json = serde_json::json!({
            "dt": 1700000000,
            "main": { "temp": 12.5, "feels_like": 11.0, "humidity": 81, "pressure": 1012 },
            "wind": { "speed": 4.1, "deg": 200 },
            "weather": [{ "id": 500, "main": "Rain", "description": "light rain" }]
        });

        let entry: ForecastEntry = serde_json::from_value(json).unwrap();
        assert_eq!(entry.main.humidity, 81.0);
        assert_eq!(entry.condition(), "Rain");
    }

    #[test]
    fn missing_wind_fails_to_deserialize() {
        let json = serde_json::json!({
            "main": { "temp": 12.5, "humidity": 81, "pressure": 1012 },
            "weather": [{ "main": "Rain" }]
        });

        assert!(serde_json::from_value::<ForecastEntry>(json).is_err());
    }

    #[test]
    fn empty_weather_array_fails_validation() {
        let mut bare = entry(12.5, 81.0, 1012.0, 4.1, "Rain");
        assert!(bare.validate().is_ok());

        bare.weather.clear();
        assert!(bare.validate().is_err());
        assert_eq!(bare.condition(), "");
    }
}
