#![allow(dead_code)]

use service_core::config::Config as CoreConfig;
use std::path::PathBuf;
use weather_service::config::{
    CacheConfig, GeneratorBackend, GeneratorConfig, RiskModelConfig, WeatherConfig,
};
use weather_service::services::init_metrics;
use weather_service::startup::Application;

/// Logistic model: p = sigmoid(-10 + 0.2*temp + 0.1*wind + 0.0*humidity).
pub const LOGISTIC_MODEL: &str = r#"{
    "kind": "logistic_regression",
    "feature_names": ["temp", "wind_speed", "humidity"],
    "coefficients": [0.2, 0.1, 0.0],
    "intercept": -10.0
}"#;

pub struct TestApp {
    pub http_address: String,
    pub http_port: u16,
    pub client: reqwest::Client,
}

pub fn mock_generator() -> GeneratorConfig {
    GeneratorConfig {
        backend: GeneratorBackend::Mock,
        ..GeneratorConfig::default()
    }
}

pub fn command_generator(program: &str, args: &[&str]) -> GeneratorConfig {
    GeneratorConfig {
        backend: GeneratorBackend::Command,
        program: program.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        timeout_secs: 10,
        ..GeneratorConfig::default()
    }
}

/// Write `contents` to a fresh file under the system temp dir.
pub fn write_model(contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("weather_risk_model_{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, contents).expect("Failed to write model file");
    path
}

pub fn test_config(generator: GeneratorConfig, model: Option<&str>) -> WeatherConfig {
    let model_path = match model {
        Some(contents) => write_model(contents),
        None => std::env::temp_dir().join(format!("missing_model_{}.json", uuid::Uuid::new_v4())),
    };

    WeatherConfig {
        common: CoreConfig {
            port: 0,
            ..CoreConfig::default()
        },
        model: RiskModelConfig {
            path: model_path.to_string_lossy().into_owned(),
        },
        generator,
        cache: CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        },
    }
}

impl TestApp {
    /// Mock generator, no model.
    pub async fn spawn() -> Self {
        Self::spawn_with(test_config(mock_generator(), None)).await
    }

    pub async fn spawn_with(config: WeatherConfig) -> Self {
        init_metrics();

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let http_port = app.http_port();
        let http_address = format!("http://127.0.0.1:{}", http_port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", http_address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            http_address,
            http_port,
            client,
        }
    }

    pub async fn post_forecast(&self, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/extreme_weather", self.http_address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_chat(&self, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/chat", self.http_address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// An OpenWeather-style forecast entry.
pub fn forecast_entry(
    temp: f64,
    humidity: f64,
    pressure: f64,
    wind: f64,
    condition: &str,
) -> serde_json::Value {
    serde_json::json!({
        "dt_txt": "2025-01-01 12:00:00",
        "main": { "temp": temp, "humidity": humidity, "pressure": pressure, "feels_like": temp },
        "wind": { "speed": wind, "deg": 180 },
        "weather": [{ "id": 800, "main": condition, "description": condition.to_lowercase() }]
    })
}

pub fn sample_forecast() -> serde_json::Value {
    serde_json::json!({
        "location": "Chennai",
        "forecast": [
            forecast_entry(31.0, 60.0, 1008.0, 4.0, "Clouds"),
            forecast_entry(36.0, 55.0, 1004.0, 6.0, "Clear"),
            forecast_entry(29.0, 92.0, 1006.0, 18.0, "Rain"),
        ]
    })
}
