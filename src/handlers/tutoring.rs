use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use super::ApiError;
use crate::{
    extractors::AppJson,
    middlewares::auth::Identity,
    models::tutoring::{CreateTutoringSessionRequest, TutoringSessionPatch},
    services::{tutoring_service::TutoringService, AppState},
};

/// GET /api/tutoring-sessions — the caller's records, newest date first.
pub async fn list_tutoring_sessions(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, ApiError> {
    let service = TutoringService::new(state.storage.clone());
    let records = service.list(identity.user_id()).await.map_err(|e| {
        tracing::error!("Failed to list tutoring sessions: {:#}", e);
        ApiError::internal("Failed to list tutoring sessions")
    })?;

    Ok(Json(records))
}

/// POST /api/tutoring-sessions
pub async fn create_tutoring_session(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    AppJson(req): AppJson<CreateTutoringSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = TutoringService::new(state.storage.clone());
    let record = service.create(identity.user_id(), req).await.map_err(|e| {
        tracing::error!("Failed to create tutoring session: {:#}", e);
        ApiError::internal("Failed to create tutoring session")
    })?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/tutoring-sessions/:id
pub async fn get_tutoring_session(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = TutoringService::new(state.storage.clone());
    let record = service
        .get(&id, identity.user_id())
        .await
        .map_err(|e| {
            tracing::error!("Failed to get tutoring session: {:#}", e);
            ApiError::internal("Failed to get tutoring session")
        })?
        .ok_or_else(|| ApiError::not_found("Tutoring session not found"))?;

    Ok(Json(record))
}

/// PATCH /api/tutoring-sessions/:id — merge update, 404 when the record is
/// absent or owned by someone else.
pub async fn update_tutoring_session(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    AppJson(patch): AppJson<TutoringSessionPatch>,
) -> Result<impl IntoResponse, ApiError> {
    patch
        .validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = TutoringService::new(state.storage.clone());
    let record = service
        .update(&id, identity.user_id(), &patch)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update tutoring session: {:#}", e);
            ApiError::internal("Failed to update tutoring session")
        })?
        .ok_or_else(|| ApiError::not_found("Tutoring session not found"))?;

    Ok(Json(record))
}

/// DELETE /api/tutoring-sessions/:id — 204 on success.
pub async fn delete_tutoring_session(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = TutoringService::new(state.storage.clone());
    let deleted = service.delete(&id, identity.user_id()).await.map_err(|e| {
        tracing::error!("Failed to delete tutoring session: {:#}", e);
        ApiError::internal("Failed to delete tutoring session")
    })?;

    if !deleted {
        return Err(ApiError::not_found("Tutoring session not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
