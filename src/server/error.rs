//! HTTP error responses
//!
//! Every failure leaving the API is rendered as
//! `{"statusCode": .., "name": .., "message": ..}` with the status derived
//! from the error kind. Sources and backtraces never reach the body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::errors::BackupError;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Backup(#[from] BackupError),
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            HttpError::Forbidden(_) => StatusCode::FORBIDDEN,
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            HttpError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HttpError::Backup(err) => StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HttpError::Unauthorized(_) => "Unauthorized",
            HttpError::Forbidden(_) => "Forbidden",
            HttpError::NotFound(_) => "NotFound",
            HttpError::MethodNotAllowed(_) => "MethodNotAllowed",
            HttpError::Internal(_) => "InternalServerError",
            HttpError::Backup(err) => err.kind(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub name: &'static str,
    pub message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, name = self.name(), "Request failed");
        } else {
            tracing::warn!(error = %self, name = self.name(), "Request rejected");
        }

        let body = ErrorBody {
            status_code: status.as_u16(),
            name: self.name(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
