use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod storage;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api_routes(app_state.clone()))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn api_routes(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/problem/{difficulty}", get(handlers::game::get_problem))
        .route("/check-answer", post(handlers::game::check_answer))
        .route(
            "/session",
            get(handlers::game::get_session).patch(handlers::game::update_session),
        )
        .route("/reset", post(handlers::game::reset_progress))
        .route(
            "/tutoring-sessions",
            get(handlers::tutoring::list_tutoring_sessions)
                .post(handlers::tutoring::create_tutoring_session),
        )
        .route(
            "/tutoring-sessions/{id}",
            get(handlers::tutoring::get_tutoring_session)
                .patch(handlers::tutoring::update_tutoring_session)
                .delete(handlers::tutoring::delete_tutoring_session),
        )
        .nest("/admin", admin_routes())
        // Outermost /api layer: every handler sees an Identity extension,
        // Anonymous when no valid bearer token is present.
        .layer(middleware::from_fn_with_state(
            app_state,
            middlewares::auth::identity_middleware,
        ))
}

fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(handlers::admin::list_users))
        .route(
            "/tutoring-sessions",
            get(handlers::admin::list_all_tutoring_sessions),
        )
        .route_layer(middleware::from_fn(
            middlewares::auth::admin_guard_middleware,
        ))
}
