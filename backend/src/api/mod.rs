use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TaskQueryParams {
    filter: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskQueryParams>,
) -> Result<Json<Vec<Task>>, AppError> {
    let filter = FilterType::from_param(params.filter.as_deref());
    let tasks = state.tasks.list(filter).await?;
    debug!("listed {} tasks ({:?})", tasks.len(), filter);
    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<NewTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let Json(req) = payload?;
    if req.text.is_empty() {
        return Err(AppError::Validation("text is required".to_string()));
    }

    let task = state.tasks.create(req).await?;
    info!("created task {}", task.id);
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    let task = state.tasks.find(&id).await?;
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<Task>, AppError> {
    let Json(req) = payload?;
    if req.text.as_deref() == Some("") {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }

    let task = state.tasks.update(&id, req).await?;
    Ok(Json(task))
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    let task = state.tasks.toggle(&id).await?;
    debug!("task {} completed={}", task.id, task.completed);
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let removed = state.tasks.delete(&id).await?;
    info!("delete task {}: {} removed", id, removed);
    Ok(MessageResponse::new("Task deleted successfully"))
}

pub async fn delete_all_tasks(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    let removed = state.tasks.delete_all().await?;
    info!("deleted all tasks ({} removed)", removed);
    Ok(MessageResponse::new("All tasks deleted successfully"))
}

pub async fn task_stats(State(state): State<AppState>) -> Result<Json<TaskStats>, AppError> {
    let stats = state.tasks.stats().await?;
    Ok(Json(stats))
}
