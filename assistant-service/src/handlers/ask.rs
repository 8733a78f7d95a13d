use crate::models::{AskRequest, AskResponse};
use crate::startup::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use service_core::error::AppError;

const MISSING_PROMPT: &str = "Prompt saknas";

/// `POST /ask`: route a free-text request to a service company.
pub async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected /ask body");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(anyhow::anyhow!("Request body exceeds the size limit"))
        } else {
            AppError::bad_request(MISSING_PROMPT)
        }
    })?;

    let prompt = request
        .prompt()
        .ok_or_else(|| AppError::bad_request(MISSING_PROMPT))?;

    Ok(Json(state.router.route(prompt).await))
}
