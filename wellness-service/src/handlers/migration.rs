use crate::dtos::{ApiResponse, MigrationRequest};
use crate::middleware::AuthUser;
use crate::services::{metrics, MigrationPlan};
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;

/// Counts what would be imported. Writes nothing.
pub async fn preview_migration(
    ValidatedJson(request): ValidatedJson<MigrationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let plan = MigrationPlan::from_snapshot(&request.local_data);
    Ok(Json(ApiResponse::ok(plan.preview())))
}

pub async fn migrate(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<MigrationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store()?;
    let plan = MigrationPlan::from_snapshot(&request.local_data);

    let records = plan.records(user.user_id());
    if !records.is_empty() {
        let inserted = store.insert_many(&records).await.map_err(|e| {
            tracing::error!(error = %e, records = records.len(), "Local data migration failed");
            e
        })?;
        metrics::record_migrated(inserted as usize);
    }

    let summary = plan.summary(&request.local_data);
    tracing::info!(
        total = summary.total,
        ignored = summary.ignored_keys.len(),
        "Local data migrated"
    );

    Ok(Json(ApiResponse::ok(summary)))
}
