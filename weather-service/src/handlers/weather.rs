use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;
use service_core::error::AppError;

use crate::dtos::weather::{ERR_EMPTY_FORECAST, ERR_NO_DATA};
use crate::dtos::{ExtremeWeatherRequest, ExtremeWeatherResponse, TodaySummary};
use crate::models::WeatherExtremes;
use crate::startup::AppState;

/// Score a forecast and attach safety recommendations.
#[tracing::instrument(skip(state, payload))]
pub async fn extreme_weather(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ExtremeWeatherResponse>, AppError> {
    let Json(body) = payload.map_err(|e| {
        tracing::warn!(error = %e, "Rejected forecast body");
        AppError::bad_request(ERR_NO_DATA)
    })?;

    let request = ExtremeWeatherRequest::from_json(body)?;
    tracing::info!(
        location = %request.location,
        entries = request.forecast.len(),
        "Processing forecast"
    );

    let extremes = WeatherExtremes::from_forecast(&request.forecast)
        .ok_or_else(|| AppError::bad_request(ERR_EMPTY_FORECAST))?;

    let risk = state.risk_scorer.score(&extremes.risk_features());
    let recommendations = state.advisor.recommendations(&extremes.conditions()).await;

    tracing::info!(
        location = %request.location,
        risk_score = risk.score,
        risk_source = risk.source.as_str(),
        recommendation_source = ?recommendations.source,
        "Forecast assessed"
    );

    Ok(Json(ExtremeWeatherResponse {
        today: TodaySummary::new(
            request.location.clone(),
            &extremes,
            risk.score,
            recommendations.items,
        ),
    }))
}
