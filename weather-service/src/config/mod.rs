use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_MODEL_PATH: &str = "weather_risk_model.json";
const DEFAULT_GENERATOR_PROGRAM: &str = "ollama";
const DEFAULT_GENERATOR_ARGS: &str = "run llama2";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_GENERATOR_MODEL: &str = "llama2";
const DEFAULT_GENERATOR_TIMEOUT_SECS: u64 = 120;
const DEFAULT_GENERATOR_MAX_CONCURRENT: usize = 4;
const DEFAULT_CACHE_TTL_SECS: u64 = 900;
const DEFAULT_CACHE_MAX_ENTRIES: usize = 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub model: RiskModelConfig,
    pub generator: GeneratorConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskModelConfig {
    /// JSON export of the trained classifier. Missing or invalid files leave
    /// the service running with the default risk score.
    pub path: String,
}

/// Which text-generation backend answers prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorBackend {
    /// Local CLI fed the prompt on stdin (e.g. `ollama run llama2`).
    Command,
    /// Ollama HTTP API (`POST /api/generate`).
    Ollama,
    /// Canned responses, for tests and local development.
    Mock,
}

impl GeneratorBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorBackend::Command => "command",
            GeneratorBackend::Ollama => "ollama",
            GeneratorBackend::Mock => "mock",
        }
    }
}

impl FromStr for GeneratorBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "command" | "cli" => Ok(GeneratorBackend::Command),
            "ollama" | "http" => Ok(GeneratorBackend::Ollama),
            "mock" => Ok(GeneratorBackend::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown GENERATOR_BACKEND '{}', expected command, ollama or mock",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    pub backend: GeneratorBackend,
    pub program: String,
    pub args: Vec<String>,
    pub ollama_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_concurrent: usize,
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub max_entries: usize,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl WeatherConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(WeatherConfig {
            common: common_config,
            model: RiskModelConfig {
                path: get_env("RISK_MODEL_PATH", Some(DEFAULT_MODEL_PATH), is_prod)?,
            },
            generator: GeneratorConfig {
                backend: get_env("GENERATOR_BACKEND", Some("command"), is_prod)?.parse()?,
                program: get_env("GENERATOR_PROGRAM", Some(DEFAULT_GENERATOR_PROGRAM), is_prod)?,
                args: split_args(&get_env(
                    "GENERATOR_ARGS",
                    Some(DEFAULT_GENERATOR_ARGS),
                    is_prod,
                )?),
                ollama_url: get_env("OLLAMA_URL", Some(DEFAULT_OLLAMA_URL), is_prod)?,
                model: get_env("GENERATOR_MODEL", Some(DEFAULT_GENERATOR_MODEL), is_prod)?,
                timeout_secs: parse_or(
                    &get_env(
                        "GENERATOR_TIMEOUT_SECS",
                        Some(&DEFAULT_GENERATOR_TIMEOUT_SECS.to_string()),
                        is_prod,
                    )?,
                    DEFAULT_GENERATOR_TIMEOUT_SECS,
                ),
                max_concurrent: parse_or(
                    &get_env(
                        "GENERATOR_MAX_CONCURRENT",
                        Some(&DEFAULT_GENERATOR_MAX_CONCURRENT.to_string()),
                        is_prod,
                    )?,
                    DEFAULT_GENERATOR_MAX_CONCURRENT,
                )
                .max(1),
            },
            cache: CacheConfig {
                enabled: parse_or(
                    &get_env("RECOMMENDATION_CACHE_ENABLED", Some("true"), is_prod)?,
                    true,
                ),
                ttl_secs: parse_or(
                    &get_env(
                        "RECOMMENDATION_CACHE_TTL_SECS",
                        Some(&DEFAULT_CACHE_TTL_SECS.to_string()),
                        is_prod,
                    )?,
                    DEFAULT_CACHE_TTL_SECS,
                ),
                max_entries: parse_or(
                    &get_env(
                        "RECOMMENDATION_CACHE_MAX_ENTRIES",
                        Some(&DEFAULT_CACHE_MAX_ENTRIES.to_string()),
                        is_prod,
                    )?,
                    DEFAULT_CACHE_MAX_ENTRIES,
                ),
            },
        })
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            backend: GeneratorBackend::Command,
            program: DEFAULT_GENERATOR_PROGRAM.to_string(),
            args: split_args(DEFAULT_GENERATOR_ARGS),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_GENERATOR_MODEL.to_string(),
            timeout_secs: DEFAULT_GENERATOR_TIMEOUT_SECS,
            max_concurrent: DEFAULT_GENERATOR_MAX_CONCURRENT,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
        }
    }
}

fn split_args(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

fn parse_or<T: FromStr>(raw: &str, default: T) -> T {
    raw.trim().parse().unwrap_or(default)
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
