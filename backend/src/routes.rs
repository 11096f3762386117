use axum::routing::{get, patch};
use axum::{Json, Router, extract::State};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/v1/tasks",
            get(api::list_tasks)
                .post(api::create_task)
                .delete(api::delete_all_tasks),
        )
        .route("/api/v1/tasks/stats", get(api::task_stats))
        .route(
            "/api/v1/tasks/{id}",
            get(api::get_task)
                .put(api::update_task)
                .delete(api::delete_task),
        )
        .route("/api/v1/tasks/{id}/toggle", patch(api::toggle_task))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Readiness check: answers 200 only after a `select 1` reaches the store,
/// so an unreachable store yields 500 rather than a liveness-style 200.
async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    state.tasks.ping().await?;
    Ok(Json(HealthResponse {
        status: "OK".to_string(),
        message: "Task Manager API is running".to_string(),
    }))
}
