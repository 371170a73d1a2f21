use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::api::server::AppState;
use crate::auth::{CurrentUser, LoginRequest, Profile, SessionToken, SignupRequest, TokenResponse};
use crate::error::ApiError;
use crate::task::{NewTask, Task, TaskPatch};

pub async fn handle_health() -> Json<Value> {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

pub async fn handle_signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state.users.signup(req)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "User registered successfully"})),
    ))
}

pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.users.login(req)?;
    Ok(Json(TokenResponse { token }))
}

pub async fn handle_logout(
    SessionToken(token): SessionToken,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    state.users.logout(&token)?;
    Ok(Json(json!({"message": "Logged out"})))
}

pub async fn handle_profile(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Profile>, ApiError> {
    // A valid token always points at an existing account.
    let profile = state.users.profile(&user)?.ok_or(ApiError::InvalidToken)?;
    Ok(Json(profile))
}

pub async fn handle_create_task(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(new): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = state.tasks.create(&user, new)?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn handle_list_tasks(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.tasks.list(&user)?))
}

pub async fn handle_get_task(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(state.tasks.get_one(&user, &id)?))
}

pub async fn handle_update_task(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(state.tasks.update(&user, &id, &patch)?))
}

pub async fn handle_delete_task(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.tasks.delete(&user, &id)?;
    Ok(Json(json!({"message": "Task deleted"})))
}
