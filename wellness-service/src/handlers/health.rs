use crate::dtos::ApiResponse;
use crate::services::metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "wellness-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Ready when the session store answers, or when none is configured.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match &state.store {
        Some(store) => match store.health_check().await {
            Ok(_) => StatusCode::OK,
            Err(e) => {
                tracing::warn!(error = %e, "Readiness check failed");
                StatusCode::SERVICE_UNAVAILABLE
            }
        },
        None => StatusCode::OK,
    }
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        [("content-type", "text/plain; version=0.0.4")],
        metrics::get_metrics(),
    )
}

#[derive(Debug, Serialize)]
pub struct ConnectionReport {
    pub ai: &'static str,
    pub database: &'static str,
}

/// Checks the text model and the session store. 503 unless the model answers.
pub async fn test_connection(State(state): State<AppState>) -> impl IntoResponse {
    let ai = match state.assistant.health_check().await {
        Ok(_) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "AI provider connectivity check failed");
            "error"
        }
    };

    let database = match &state.store {
        Some(store) => match store.health_check().await {
            Ok(_) => "ok",
            Err(e) => {
                tracing::warn!(error = %e, "Database connectivity check failed");
                "error"
            }
        },
        None => "not_configured",
    };

    let status = if ai == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let mut body = ApiResponse::ok(ConnectionReport { ai, database });
    body.success = status.is_success();

    (status, Json(body))
}
