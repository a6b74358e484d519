use crate::dtos::{ApiResponse, FitnessPlanRequest, PostureAnalysisRequest, TherapistChatRequest};
use crate::services::assistant::decode_image;
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;

pub async fn fitness_plan(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<FitnessPlanRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.assistant.fitness_plan(&request).await;
    tracing::info!(fallback = outcome.fallback, "Fitness plan served");

    Ok(Json(ApiResponse::proxied(outcome.data, outcome.fallback)))
}

pub async fn therapist_chat(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<TherapistChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.assistant.therapist_chat(&request).await;
    tracing::info!(
        fallback = outcome.fallback,
        history_turns = request.history.len(),
        "Therapist reply served"
    );

    Ok(Json(ApiResponse::proxied(outcome.data, outcome.fallback)))
}

pub async fn analyze_posture(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<PostureAnalysisRequest>,
) -> Result<impl IntoResponse, AppError> {
    let image = decode_image(&request.image).map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))?;

    let outcome = state.assistant.analyze_posture(image, &request).await;
    tracing::info!(
        fallback = outcome.fallback,
        score = outcome.data.score,
        "Posture report served"
    );

    Ok(Json(ApiResponse::proxied(outcome.data, outcome.fallback)))
}
