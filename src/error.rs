use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::domain::InventoryError;
use crate::transport::TransportError;
use crate::utils::ValidationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Config(_) | AppError::Io(_) | AppError::Transport(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Inventory(InventoryError::UnknownServer(_)) => StatusCode::FORBIDDEN,
            AppError::Inventory(InventoryError::UnknownSubnet { .. }) => StatusCode::BAD_REQUEST,
            AppError::Inventory(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        };
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!("{}: {}", status, message);
        } else {
            tracing::warn!("{}: {}", status, message);
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Transport(TransportError::Timeout), StatusCode::INTERNAL_SERVER_ERROR),
            (
                AppError::Inventory(InventoryError::UnknownServer("x".into())),
                StatusCode::FORBIDDEN,
            ),
            (
                AppError::Validation(ValidationError::InvalidIp("x".into())),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::Unauthorized("no".into()), StatusCode::UNAUTHORIZED),
            (AppError::Conflict("dup".into()), StatusCode::CONFLICT),
            (AppError::NotFound("gone".into()), StatusCode::NOT_FOUND),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
