use axum::{extract::rejection::JsonRejection, extract::State, Json};
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::{ChatRequest, ChatResponse};
use crate::startup::AppState;

const ERR_NO_MESSAGE: &str = "No message provided";

#[tracing::instrument(skip(state, payload))]
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = payload.map_err(|e| {
        tracing::warn!(error = %e, "Rejected chat body");
        AppError::bad_request(ERR_NO_MESSAGE)
    })?;
    request
        .validate()
        .map_err(|_| AppError::bad_request(ERR_NO_MESSAGE))?;

    let response = state.advisor.chat(&request.message).await.map_err(|e| {
        tracing::error!(error = %e, "Error in chat endpoint");
        AppError::InternalError(anyhow::anyhow!(e))
    })?;

    Ok(Json(ChatResponse { response }))
}
