use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use super::ApiError;
use crate::services::{tutoring_service::TutoringService, AppState};

/// GET /api/admin/users — every known user. Route is behind the admin guard.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state.storage.list_users().await.map_err(|e| {
        tracing::error!("Failed to list users: {:#}", e);
        ApiError::internal("Failed to list users")
    })?;

    Ok(Json(users))
}

/// GET /api/admin/tutoring-sessions — all users' records.
pub async fn list_all_tutoring_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let service = TutoringService::new(state.storage.clone());
    let records = service.list_all().await.map_err(|e| {
        tracing::error!("Failed to list tutoring sessions: {:#}", e);
        ApiError::internal("Failed to list tutoring sessions")
    })?;

    Ok(Json(records))
}
