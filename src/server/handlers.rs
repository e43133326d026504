//! API request handlers

use axum::{
    Extension, Json,
    extract::State,
    http::{Method, Uri},
};
use serde::Serialize;
use serde_json::{Value, json};

use super::AppState;
use super::auth::Claims;
use super::error::HttpError;
use crate::backup::BackupOutcome;

pub const CREATED_MESSAGE: &str = "Mongo dump created";
pub const ALREADY_EXISTS_MESSAGE: &str = "Mongo dump already exists for today, all good!";

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /mongodump - run today's backup on demand
pub async fn mongodump(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>, HttpError> {
    tracing::info!(subject = %claims.sub, "On-demand backup requested");

    // runs to completion even if the client hangs up
    let orchestrator = state.orchestrator.clone();
    let outcome = tokio::spawn(async move { orchestrator.run_daily_backup().await })
        .await
        .map_err(|e| HttpError::Internal(format!("Backup task failed: {}", e)))?;

    let message = match outcome {
        BackupOutcome::Created { .. } => CREATED_MESSAGE,
        BackupOutcome::AlreadyExists { .. } => ALREADY_EXISTS_MESSAGE,
        BackupOutcome::Failed(err) => return Err(err.into()),
    };

    Ok(Json(MessageResponse {
        message: message.to_string(),
    }))
}

/// Any path not served above
pub async fn not_found(method: Method, uri: Uri) -> HttpError {
    HttpError::NotFound(format!("Cannot {} {}", method, uri.path()))
}

pub async fn method_not_allowed(method: Method, uri: Uri) -> HttpError {
    HttpError::MethodNotAllowed(format!("{} is not supported on {}", method, uri.path()))
}

/// GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
