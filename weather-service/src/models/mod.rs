pub mod forecast;

pub use forecast::{
    ForecastEntry, MainReadings, WeatherCondition, WeatherConditions, WeatherExtremes,
    WindReadings,
};
