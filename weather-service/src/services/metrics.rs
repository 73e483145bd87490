//! Prometheus metrics for weather-service.
//!
//! Recording helpers are no-ops until `init_metrics` has run, so library code
//! and unit tests can call them freely.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// HTTP metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Scoring metrics
pub static RISK_PREDICTIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Generator metrics
pub static GENERATOR_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static GENERATOR_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static RECOMMENDATION_FALLBACKS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static RECOMMENDATION_CACHE_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Later calls are ignored.
pub fn init_metrics() {
    if REGISTRY.get().is_some() {
        return;
    }

    let registry = Registry::new();

    let http_requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("Failed to create http_requests_total metric");

    let http_request_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["method", "path"],
    )
    .expect("Failed to create http_request_duration_seconds metric");

    let risk_predictions = IntCounterVec::new(
        Opts::new(
            "risk_predictions_total",
            "Risk scores computed, by source (model or default)",
        ),
        &["outcome"],
    )
    .expect("Failed to create risk_predictions_total metric");

    let generator_requests = IntCounterVec::new(
        Opts::new(
            "generator_requests_total",
            "Text generation requests by provider and outcome",
        ),
        &["provider", "outcome"],
    )
    .expect("Failed to create generator_requests_total metric");

    let generator_latency = HistogramVec::new(
        HistogramOpts::new(
            "generator_latency_seconds",
            "Text generation latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["provider"],
    )
    .expect("Failed to create generator_latency_seconds metric");

    let fallbacks = IntCounterVec::new(
        Opts::new(
            "recommendation_fallbacks_total",
            "Static recommendation lists served instead of generated ones",
        ),
        &["reason"],
    )
    .expect("Failed to create recommendation_fallbacks_total metric");

    let cache = IntCounterVec::new(
        Opts::new(
            "recommendation_cache_total",
            "Recommendation cache lookups by result",
        ),
        &["result"],
    )
    .expect("Failed to create recommendation_cache_total metric");

    registry
        .register(Box::new(http_requests_total.clone()))
        .expect("Failed to register http_requests_total");
    registry
        .register(Box::new(http_request_duration.clone()))
        .expect("Failed to register http_request_duration_seconds");
    registry
        .register(Box::new(risk_predictions.clone()))
        .expect("Failed to register risk_predictions_total");
    registry
        .register(Box::new(generator_requests.clone()))
        .expect("Failed to register generator_requests_total");
    registry
        .register(Box::new(generator_latency.clone()))
        .expect("Failed to register generator_latency_seconds");
    registry
        .register(Box::new(fallbacks.clone()))
        .expect("Failed to register recommendation_fallbacks_total");
    registry
        .register(Box::new(cache.clone()))
        .expect("Failed to register recommendation_cache_total");

    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(http_requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(http_request_duration);
    let _ = RISK_PREDICTIONS_TOTAL.set(risk_predictions);
    let _ = GENERATOR_REQUESTS_TOTAL.set(generator_requests);
    let _ = GENERATOR_LATENCY_SECONDS.set(generator_latency);
    let _ = RECOMMENDATION_FALLBACKS_TOTAL.set(fallbacks);
    let _ = RECOMMENDATION_CACHE_TOTAL.set(cache);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

/// Record a completed HTTP request.
pub fn record_http_request(method: &str, path: &str, status: &str, duration_secs: f64) {
    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[method, path, status]).inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }
}

/// Record a risk score, labelled `model` or `default`.
pub fn record_risk_prediction(outcome: &str) {
    if let Some(counter) = RISK_PREDICTIONS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// Record one generator call.
pub fn record_generator_request(provider: &str, outcome: &str, duration_secs: f64) {
    if let Some(counter) = GENERATOR_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[provider, outcome]).inc();
    }
    if let Some(histogram) = GENERATOR_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider])
            .observe(duration_secs);
    }
}

pub fn record_fallback(reason: &str) {
    if let Some(counter) = RECOMMENDATION_FALLBACKS_TOTAL.get() {
        counter.with_label_values(&[reason]).inc();
    }
}

pub fn record_cache_lookup(hit: bool) {
    if let Some(counter) = RECOMMENDATION_CACHE_TOTAL.get() {
        counter
            .with_label_values(&[if hit { "hit" } else { "miss" }])
            .inc();
    }
}
