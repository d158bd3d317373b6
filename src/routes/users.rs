//! User endpoints.
//!
//! Minimal registration so the reminder scheduler can resolve recipient
//! addresses. Credentials and sessions are handled by the auth service in
//! front of this one.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use daysync_core::store::UserDirectory;
use daysync_core::{DaySyncError, User};

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user))
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
}

/// POST /users - Register a reminder recipient.
async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    if !req.email.contains('@') {
        return Err(DaySyncError::Validation(format!("invalid email address '{}'", req.email)).into());
    }
    let user = state.store.create_user(req.email, req.name).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/:id
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = state
        .store
        .get_user(id)
        .await?
        .ok_or_else(|| DaySyncError::NotFound(format!("user {id}")))?;
    Ok(Json(user))
}
