//! HTTP route handlers.

pub mod conf;
pub mod hosts;
pub mod leases;
pub mod logs;
pub mod servers;
pub mod session;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;

use crate::config::{AppState, Config};
use crate::domain::Inventory;
use crate::error::AppResult;
use crate::services::DhcpdService;
use crate::transport::SshTarget;

/// HTTP request logging middleware.
///
/// Logs each request in format: "IP METHOD PATH - STATUS"
async fn request_logging(request: Request<Body>, next: Next) -> Response {
    let addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_string());
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status();
    tracing::info!("{} {} {} - {}", addr, method, uri, status.as_u16());

    response
}

/// Only servers listed in servers.json may be targeted.
async fn authorize(state: &AppState, auth: &SshTarget) -> AppResult<Arc<Inventory>> {
    let inventory = state.inventory().await;
    inventory.find(&auth.host)?;
    Ok(inventory)
}

fn dhcpd_service(state: &AppState, config: &Config) -> DhcpdService {
    DhcpdService::new(state.transport(), &config.dhcpd_conf_path, &config.dhcp_service)
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/servers", get(servers::handle_servers))
        .route("/api/login", post(session::handle_login))
        .route("/api/status", post(session::handle_status))
        .route("/api/dhcpd-conf", post(conf::handle_dhcpd_conf))
        .route("/api/update-dhcpd-conf", post(conf::handle_update_dhcpd_conf))
        .route("/api/leases", post(leases::handle_leases))
        .route("/api/hosts", post(hosts::handle_upsert))
        .route("/api/hosts/delete", post(hosts::handle_delete))
        .route("/api/logs", get(logs::handle_logs))
        .layer(middleware::from_fn(request_logging))
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_unknown_host_forbidden() {
        let app = TestApp::new();
        let (status, body) = app
            .post(
                "/api/status",
                json!({"auth": {"host": "192.168.9.9", "username": "alice", "password": PASSWORD}}),
            )
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().contains("192.168.9.9"));
        assert!(app.transport.commands().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = TestApp::new();
        let (status, _) = app.get("/api/nothing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
