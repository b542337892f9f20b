use axum::{
    extract::{Extension, Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use super::ApiError;
use crate::{
    extractors::AppJson,
    middlewares::auth::Identity,
    models::{CheckAnswerRequest, Difficulty, GameSessionPatch},
    services::{
        answer_service::AnswerService, problem_service::ProblemService,
        session_service::SessionService, AppState,
    },
};

/// GET /api/problem/:difficulty — generate and persist a fresh problem.
/// Unknown tiers fall back to easy.
pub async fn get_problem(
    State(state): State<Arc<AppState>>,
    Path(difficulty): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let difficulty = Difficulty::parse_or_easy(&difficulty);

    let service = ProblemService::new(state.storage.clone());
    let problem = service.generate(difficulty).await.map_err(|e| {
        tracing::error!("Failed to generate problem: {:#}", e);
        ApiError::internal("Failed to generate problem")
    })?;

    Ok(Json(problem))
}

/// POST /api/check-answer — evaluate a submission and update the caller's
/// session. 404 when the problem id is unknown.
pub async fn check_answer(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    AppJson(req): AppJson<CheckAnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AnswerService::new(state.storage.clone());

    let response = service
        .check_answer(identity.user_id(), &req)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check answer: {:#}", e);
            ApiError::internal("Failed to check answer")
        })?
        .ok_or_else(|| ApiError::not_found("Problem not found"))?;

    Ok(Json(response))
}

/// GET /api/session — get-or-create the caller's session plus unlocked
/// achievements.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, ApiError> {
    let service = SessionService::new(state.storage.clone());
    let profile = identity.claims().map(|claims| claims.to_upsert_user());

    let overview = service
        .current_session(identity.user_id(), profile)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get session: {:#}", e);
            ApiError::internal("Failed to get session")
        })?;

    Ok(Json(overview))
}

/// PATCH /api/session — merge a partial settings update into the caller's
/// session. Progress counters are not settable here; they change through
/// check-answer and reset only.
pub async fn update_session(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    AppJson(patch): AppJson<GameSessionPatch>,
) -> Result<impl IntoResponse, ApiError> {
    if patch.touches_counters() {
        return Err(ApiError::bad_request(
            "Progress counters cannot be updated directly",
        ));
    }
    patch
        .validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = SessionService::new(state.storage.clone());
    let session = service
        .update_settings(identity.user_id(), &patch)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update session: {:#}", e);
            ApiError::internal("Failed to update session")
        })?;

    Ok(Json(session))
}

/// POST /api/reset — zero the progress counters, keep settings.
pub async fn reset_progress(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, ApiError> {
    let service = SessionService::new(state.storage.clone());
    let session = service
        .reset_progress(identity.user_id())
        .await
        .map_err(|e| {
            tracing::error!("Failed to reset progress: {:#}", e);
            ApiError::internal("Failed to reset progress")
        })?;

    Ok(Json(session))
}
