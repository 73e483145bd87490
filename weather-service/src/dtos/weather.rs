use serde::Serialize;
use serde_json::Value;
use service_core::error::AppError;
use validator::Validate;

use crate::models::{ForecastEntry, WeatherExtremes};

/// Location reported when the request does not name one.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Illustration attached to every summary.
pub const SUMMARY_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1527482797697-8795b05a13fe?w=800&auto=format&fit=crop";

pub const ERR_NO_DATA: &str = "No data received";
pub const ERR_INVALID_FORMAT: &str = "Invalid forecast data format";
pub const ERR_EMPTY_FORECAST: &str = "Empty forecast data";
pub const ERR_INVALID_STRUCTURE: &str = "Invalid forecast data structure";
pub const ERR_INVALID_LOCATION: &str = "Invalid location";

/// A validated `POST /extreme_weather` body.
#[derive(Debug, Clone)]
pub struct ExtremeWeatherRequest {
    pub forecast: Vec<ForecastEntry>,
    pub location: String,
}

impl ExtremeWeatherRequest {
    /// Validate a raw JSON body, producing the client-facing 400 messages.
    pub fn from_json(body: Value) -> Result<Self, AppError> {
        let mut data = match body {
            Value::Object(map) if !map.is_empty() => map,
            _ => return Err(AppError::bad_request(ERR_NO_DATA)),
        };

        let location = match data.remove("location") {
            None | Some(Value::Null) => UNKNOWN_LOCATION.to_string(),
            Some(Value::String(s)) => s,
            Some(_) => return Err(AppError::bad_request(ERR_INVALID_LOCATION)),
        };

        let entries = match data.remove("forecast") {
            Some(Value::Array(entries)) => entries,
            _ => return Err(AppError::bad_request(ERR_INVALID_FORMAT)),
        };

        if entries.is_empty() {
            return Err(AppError::bad_request(ERR_EMPTY_FORECAST));
        }

        let forecast = entries
            .into_iter()
            .enumerate()
            .map(|(index, raw)| parse_entry(index, raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { forecast, location })
    }
}

fn parse_entry(index: usize, raw: Value) -> Result<ForecastEntry, AppError> {
    let rejected = |error: String| {
        tracing::warn!(index, error = %error, "Forecast entry failed validation");
        AppError::bad_request(ERR_INVALID_STRUCTURE)
    };

    let entry: ForecastEntry = serde_json::from_value(raw).map_err(|e| rejected(e.to_string()))?;
    entry.validate().map_err(|e| rejected(e.to_string()))?;
    Ok(entry)
}

#[derive(Debug, Serialize)]
pub struct ExtremeWeatherResponse {
    pub today: TodaySummary,
}

/// Readings are carried as `f64`, so integral inputs serialize with a
/// fractional part (`92` comes back as `92.0`).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodaySummary {
    pub location: String,
    pub max_temp: f64,
    pub max_wind: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub condition: String,
    pub risk_score: f64,
    pub recommendations: Vec<String>,
    pub image: String,
}

impl TodaySummary {
    pub fn new(
        location: String,
        extremes: &WeatherExtremes<'_>,
        risk_score: f64,
        recommendations: Vec<String>,
    ) -> Self {
        Self {
            location,
            max_temp: extremes.temperature(),
            max_wind: extremes.wind_speed(),
            humidity: extremes.humidity(),
            pressure: extremes.pressure(),
            condition: extremes.condition().to_string(),
            risk_score,
            recommendations,
            image: SUMMARY_IMAGE_URL.to_string(),
        }
    }
}
