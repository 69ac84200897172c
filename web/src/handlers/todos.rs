//! Todo CRUD handlers.
//!
//! Each handler validates its input, takes the store lock, dispatches the
//! store operation, and maps the result into the uniform envelope.
//! Validation happens before any store call; store absences map to 404.

use crate::envelope::ApiResponse;
use crate::error::ApiError;
use crate::extractors::ValidJson;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tasklist_store::{Todo, UpdateTodo};

/// Request body for `POST /todos`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateTodoRequest {
    /// Title of the new todo.
    #[serde(default)]
    pub title: Option<String>,
}

/// Response body for `DELETE /todos/completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearCompletedResponse {
    /// How many completed todos were removed.
    pub removed: usize,
}

/// List all todos.
///
/// # Endpoint
///
/// ```text
/// GET /todos
/// ```
pub async fn list_todos(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Todo>>>, ApiError> {
    let todos = state.store.read().await.list();
    Ok(Json(ApiResponse::ok(todos)))
}

/// Fetch a single todo by id.
///
/// # Endpoint
///
/// ```text
/// GET /todos/:id
/// ```
pub async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Todo>>, ApiError> {
    let store = state.store.read().await;
    let todo = store.get(&id).ok_or_else(|| ApiError::not_found(&id))?;
    Ok(Json(ApiResponse::ok(todo.clone())))
}

/// Create a todo.
///
/// # Endpoint
///
/// ```text
/// POST /todos
/// Content-Type: application/json
///
/// {"title": "Buy milk"}
/// ```
///
/// Returns 201 with the created record, or 400 when the title is missing,
/// not a string, or empty after trimming.
pub async fn create_todo(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateTodoRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Todo>>), ApiError> {
    let title = validate_title(request.title.as_deref())?;

    let todo = state.store.write().await.create(title);
    tracing::info!(id = %todo.id, "todo created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(todo))))
}

/// Apply a partial update to a todo.
///
/// # Endpoint
///
/// ```text
/// PATCH /todos/:id
/// Content-Type: application/json
///
/// {"title": "...", "completed": true}
/// ```
///
/// Both fields are optional; a provided title must be non-empty after
/// trimming.
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(update): ValidJson<UpdateTodo>,
) -> Result<Json<ApiResponse<Todo>>, ApiError> {
    if let Some(title) = update.title.as_deref() {
        validate_title(Some(title))?;
    }

    let updated = state
        .store
        .write()
        .await
        .update(&id, update)
        .ok_or_else(|| ApiError::not_found(&id))?;
    tracing::info!(id = %updated.id, "todo updated");
    Ok(Json(ApiResponse::ok(updated)))
}

/// Delete a todo.
///
/// # Endpoint
///
/// ```text
/// DELETE /todos/:id
/// ```
///
/// Returns a data-less success envelope, or 404 for an unknown id.
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if !state.store.write().await.delete(&id) {
        return Err(ApiError::not_found(&id));
    }
    tracing::info!(id = %id, "todo deleted");
    Ok(Json(ApiResponse::ok_empty()))
}

/// Remove every completed todo in one sweep.
///
/// # Endpoint
///
/// ```text
/// DELETE /todos/completed
/// ```
pub async fn clear_completed(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ClearCompletedResponse>>, ApiError> {
    let removed = state.store.write().await.clear_completed();
    tracing::info!(removed, "completed todos cleared");
    Ok(Json(ApiResponse::ok(ClearCompletedResponse { removed })))
}

// Titles must be present and non-empty after trimming; the store itself
// never re-validates.
fn validate_title(title: Option<&str>) -> Result<&str, ApiError> {
    match title {
        Some(title) if !title.trim().is_empty() => Ok(title),
        Some(_) => Err(ApiError::validation("Title must not be empty")),
        None => Err(ApiError::validation(
            "Title is required and must be a non-empty string",
        )),
    }
}
