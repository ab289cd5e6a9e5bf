//! Login and service status.
//!
//! POST /api/login
//! POST /api/status

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{authorize, dhcpd_service};
use crate::config::AppState;
use crate::error::{AppError, AppResult};
use crate::services::ServiceStatus;
use crate::transport::{SshTarget, TransportError};

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub auth: SshTarget,
}

/// Handle POST /api/login
///
/// Opens a session on the server to check the credentials.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(request): Json<AuthRequest>,
) -> AppResult<Json<Value>> {
    authorize(&state, &request.auth).await?;
    let config = state.config().await;

    match dhcpd_service(&state, &config).verify_login(&request.auth).await {
        Ok(()) => {}
        Err(e @ TransportError::Auth) => return Err(AppError::Unauthorized(e.to_string())),
        Err(e) => return Err(e.into()),
    }

    state
        .activity()
        .record(&request.auth.username, "Login", Some(&json!({ "host": request.auth.host })))
        .await;
    Ok(Json(json!({ "ok": true })))
}

/// Handle POST /api/status
pub async fn handle_status(
    State(state): State<AppState>,
    Json(request): Json<AuthRequest>,
) -> AppResult<Json<ServiceStatus>> {
    authorize(&state, &request.auth).await?;
    let config = state.config().await;

    let status = dhcpd_service(&state, &config).status(&request.auth).await?;
    tracing::debug!("{} on {} is {:?}", config.dhcp_service, request.auth.host, status.state);
    Ok(Json(status))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_login_ok() {
        let app = TestApp::new();
        let (status, body) = app.post("/api/login", json!({"auth": auth()})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        let entries = app.activity.entries();
        assert_eq!(entries[0].user, "alice");
        assert_eq!(entries[0].action, "Login");
    }

    #[tokio::test]
    async fn test_login_bad_password() {
        let app = TestApp::new();
        let (status, body) = app
            .post(
                "/api/login",
                json!({"auth": {"host": HOST, "username": "alice", "password": "wrong"}}),
            )
            .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body["error"],
            "Authentication failed. Please check your username and password."
        );
        assert!(app.activity.entries().is_empty());
    }

    #[tokio::test]
    async fn test_status() {
        let app = TestApp::new();
        let (status, body) = app.post("/api/status", json!({"auth": auth()})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "active");
        assert!(body["output"].as_str().unwrap().contains("Active: active (running)"));
    }

    #[tokio::test]
    async fn test_status_transport_error_is_500() {
        let app = TestApp::new();
        let (status, body) = app
            .post(
                "/api/status",
                json!({"auth": {"host": HOST, "username": "alice", "password": "wrong"}}),
            )
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("Authentication failed"));
    }
}
