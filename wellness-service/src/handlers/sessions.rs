use crate::dtos::{ApiResponse, CreateSessionRequest, Pagination, SessionListParams, SessionResponse};
use crate::middleware::AuthUser;
use crate::models::SessionQuery;
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

pub async fn list_sessions(
    State(state): State<AppState>,
    user: AuthUser,
    params: Result<Query<SessionListParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid query: {}", e.body_text())))?;
    let query = SessionQuery::from(params);
    if query.skip().is_none() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "page {} is out of range",
            query.page
        )));
    }

    let page = state.store()?.list(user.user_id(), &query).await?;

    let pagination = Pagination {
        page: query.page,
        limit: query.limit,
        total: page.total,
        total_pages: query.total_pages(page.total),
    };
    let data: Vec<SessionResponse> = page.records.into_iter().map(SessionResponse::from).collect();

    Ok(Json(ApiResponse::paginated(data, pagination)))
}

pub async fn get_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .store()?
        .find_owned(user.user_id(), &id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session not found")))?;

    Ok(Json(ApiResponse::ok(SessionResponse::from(record))))
}

pub async fn create_session(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store()?;
    let record = request.into_record(user.user_id().to_string());
    store.insert(&record).await?;

    tracing::info!(
        session_id = %record.id,
        kind = record.kind.as_str(),
        "Session recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(SessionResponse::from(record))),
    ))
}

pub async fn delete_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.store()?.delete_owned(user.user_id(), &id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Session not found")));
    }

    tracing::info!(session_id = %id, "Session deleted");
    Ok(Json(ApiResponse::ok(serde_json::json!({ "id": id }))))
}
