//! Safety recommendations and weather chat on top of a [`TextProvider`].
//!
//! The generator is asked for a numbered list; the first four items are
//! kept. When the generator cannot help, one of two static lists is served
//! instead, so the forecast endpoint always has recommendations to return.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::models::WeatherConditions;
use crate::services::cache::RecommendationCache;
use crate::services::metrics;
use crate::services::providers::{ProviderError, TextProvider};

/// Items kept from a generated list.
pub const MAX_RECOMMENDATIONS: usize = 4;

/// Served when the generator answered without a numbered list.
pub const NO_RECOMMENDATIONS: &str = "No recommendations available.";

/// Served when the generator ran but reported failure.
pub const GENERATION_FAILED_RECOMMENDATIONS: [&str; 3] =
    ["Stay indoors", "Monitor updates", "Follow local alerts"];

/// Served when the generator could not be invoked at all.
pub const UNAVAILABLE_RECOMMENDATIONS: [&str; 4] = [
    "Stay informed about weather updates",
    "Keep emergency supplies ready",
    "Follow local authority guidelines",
    "Stay indoors during severe weather",
];

static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.\s(.+)").expect("numbered item pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationSource {
    Generated,
    Cached,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendations {
    pub items: Vec<String>,
    pub source: RecommendationSource,
}

/// Readings use `f64` `Display`, so whole numbers render without a decimal
/// point (`22`, not `22.0`).
pub fn recommendation_prompt(conditions: &WeatherConditions) -> String {
    format!(
        "Based on the weather conditions:\n\
         Temperature: {}°C\n\
         Wind Speed: {} km/h\n\
         Pressure: {} hPa\n\
         Humidity: {}%\n\
         \n\
         Provide exactly 10 specific safety recommendations in a numbered list format.\n",
        conditions.temperature, conditions.wind_speed, conditions.pressure, conditions.humidity
    )
}

pub fn chat_prompt(message: &str) -> String {
    format!(
        "User Question about weather safety: {}\n\
         \n\
         Provide a helpful response about weather safety, considering:\n\
         - Current weather conditions\n\
         - Safety precautions\n\
         - Emergency preparedness\n\
         - Weather-related advice\n\
         \n\
         Keep the response concise and practical.",
        message
    )
}

/// Extract up to [`MAX_RECOMMENDATIONS`] items from a numbered list.
pub fn parse_recommendations(text: &str) -> Vec<String> {
    let items: Vec<String> = NUMBERED_ITEM
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end().to_string())
        .take(MAX_RECOMMENDATIONS)
        .collect();

    if items.is_empty() {
        vec![NO_RECOMMENDATIONS.to_string()]
    } else {
        items
    }
}

/// Static list for a provider failure.
pub fn fallback_recommendations(error: &ProviderError) -> Vec<String> {
    let list: &[&str] = if error.is_generation_failure() {
        &GENERATION_FAILED_RECOMMENDATIONS
    } else {
        &UNAVAILABLE_RECOMMENDATIONS
    };
    list.iter().map(|s| s.to_string()).collect()
}

#[derive(Clone)]
pub struct SafetyAdvisor {
    provider: Arc<dyn TextProvider>,
    limiter: Arc<Semaphore>,
    cache: Option<RecommendationCache>,
}

impl SafetyAdvisor {
    pub fn new(
        provider: Arc<dyn TextProvider>,
        max_concurrent: usize,
        cache: Option<RecommendationCache>,
    ) -> Self {
        Self {
            provider,
            limiter: Arc::new(Semaphore::new(max_concurrent.max(1))),
            cache,
        }
    }

    pub fn provider(&self) -> &Arc<dyn TextProvider> {
        &self.provider
    }

    /// Recommendations for the given conditions. Never fails.
    #[tracing::instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn recommendations(&self, conditions: &WeatherConditions) -> Recommendations {
        if let Some(cache) = &self.cache {
            let cached = cache.get(conditions);
            metrics::record_cache_lookup(cached.is_some());
            if let Some(items) = cached {
                tracing::debug!("Serving cached recommendations");
                return Recommendations {
                    items,
                    source: RecommendationSource::Cached,
                };
            }
        }

        let prompt = recommendation_prompt(conditions);
        match self.generate(&prompt).await {
            Ok(text) => {
                let items = parse_recommendations(&text);
                if let Some(cache) = &self.cache {
                    cache.insert(conditions, items.clone());
                }
                Recommendations {
                    items,
                    source: RecommendationSource::Generated,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Recommendation generation failed, using fallback");
                metrics::record_fallback(e.kind());
                Recommendations {
                    items: fallback_recommendations(&e),
                    source: RecommendationSource::Fallback,
                }
            }
        }
    }

    /// Free-text answer to a weather safety question.
    #[tracing::instrument(skip(self, message), fields(provider = self.provider.name(), message_len = message.len()))]
    pub async fn chat(&self, message: &str) -> Result<String, ProviderError> {
        self.generate(&chat_prompt(message)).await
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let provider = self.provider.name();
        let start = Instant::now();
        let result = self.provider.generate(prompt).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(text) => {
                tracing::info!(
                    provider,
                    prompt_len = prompt.len(),
                    response_len = text.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Generated response"
                );
                tracing::debug!(response = %text, "Generator output");
                metrics::record_generator_request(provider, "success", elapsed.as_secs_f64());
            }
            Err(e) => {
                tracing::error!(
                    provider,
                    error = %e,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Generation failed"
                );
                metrics::record_generator_request(provider, e.kind(), elapsed.as_secs_f64());
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockTextProvider;
    use std::time::Duration;

    fn conditions() -> WeatherConditions {
        WeatherConditions {
            temperature: 38.5,
            wind_speed: 22.0,
            pressure: 1002.0,
            humidity: 85.0,
        }
    }

    #[test]
    fn prompt_includes_conditions() {
        let prompt = recommendation_prompt(&conditions());
        assert!(prompt.starts_with("Based on the weather conditions:\n"));
        assert!(prompt.contains("Temperature: 38.5°C\n"));
        assert!(prompt.contains("Wind Speed: 22 km/h\n"));
        assert!(prompt.contains("Pressure: 1002 hPa\n"));
        assert!(prompt.contains("Humidity: 85%\n"));
        assert!(prompt.contains("exactly 10 specific safety recommendations"));
    }

    #[test]
    fn chat_prompt_embeds_message() {
        let prompt = chat_prompt("Is it safe to drive in hail?");
        assert!(prompt.starts_with("User Question about weather safety: Is it safe to drive in hail?\n"));
        assert!(prompt.ends_with("Keep the response concise and practical."));
    }

    #[test]
    fn parses_first_four_numbered_items() {
        let text = "Sure! Here you go:\n\
                    1. Stay indoors\n\
                    2. Drink water\r\n\
                    3. Close windows\n\
                    4. Charge your phone\n\
                    5. Check on neighbours";
        assert_eq!(
            parse_recommendations(text),
            vec![
                "Stay indoors",
                "Drink water",
                "Close windows",
                "Charge your phone"
            ]
        );
    }

    #[test]
    fn numbered_items_may_appear_mid_line() {
        let text = "Tips: 1. Avoid travel 2. Keep a torch";
        assert_eq!(
            parse_recommendations(text),
            vec!["Avoid travel 2. Keep a torch"]
        );
    }

    #[test]
    fn text_without_list_yields_placeholder() {
        assert_eq!(
            parse_recommendations("Stay safe out there."),
            vec![NO_RECOMMENDATIONS]
        );
        assert_eq!(parse_recommendations(""), vec![NO_RECOMMENDATIONS]);
    }

    #[test]
    fn fallback_depends_on_failure_kind() {
        let failed = fallback_recommendations(&ProviderError::Failed("exit 1".into()));
        assert_eq!(failed, GENERATION_FAILED_RECOMMENDATIONS);

        let unavailable =
            fallback_recommendations(&ProviderError::Unavailable("not found".into()));
        assert_eq!(unavailable, UNAVAILABLE_RECOMMENDATIONS);
    }

    #[tokio::test]
    async fn generated_recommendations_are_capped_at_four() {
        let advisor = SafetyAdvisor::new(Arc::new(MockTextProvider::new(true)), 4, None);
        let recs = advisor.recommendations(&conditions()).await;
        assert_eq!(recs.source, RecommendationSource::Generated);
        assert_eq!(recs.items.len(), MAX_RECOMMENDATIONS);
        assert_eq!(recs.items[0], "Stay hydrated and avoid strenuous outdoor activity");
    }

    #[tokio::test]
    async fn disabled_provider_yields_unavailable_fallback() {
        let advisor = SafetyAdvisor::new(Arc::new(MockTextProvider::new(false)), 4, None);
        let recs = advisor.recommendations(&conditions()).await;
        assert_eq!(recs.source, RecommendationSource::Fallback);
        assert_eq!(recs.items, UNAVAILABLE_RECOMMENDATIONS);
    }

    #[tokio::test]
    async fn cache_serves_repeat_requests_without_generating() {
        let provider = Arc::new(MockTextProvider::new(true));
        let cache = RecommendationCache::new(Duration::from_secs(60), 16);
        let advisor = SafetyAdvisor::new(provider.clone(), 4, Some(cache));

        let first = advisor.recommendations(&conditions()).await;
        let second = advisor.recommendations(&conditions()).await;

        assert_eq!(first.source, RecommendationSource::Generated);
        assert_eq!(second.source, RecommendationSource::Cached);
        assert_eq!(first.items, second.items);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn fallbacks_are_not_cached() {
        let provider = Arc::new(MockTextProvider::new(false));
        let cache = RecommendationCache::new(Duration::from_secs(60), 16);
        let advisor = SafetyAdvisor::new(provider.clone(), 4, Some(cache.clone()));

        advisor.recommendations(&conditions()).await;
        advisor.recommendations(&conditions()).await;

        assert!(cache.is_empty());
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn chat_returns_provider_text() {
        let provider = Arc::new(MockTextProvider::with_response(true, "Avoid open fields."));
        let advisor = SafetyAdvisor::new(provider, 1, None);
        assert_eq!(
            advisor.chat("Lightning?").await.unwrap(),
            "Avoid open fields."
        );
    }
}
