//! Server inventory endpoint.
//!
//! GET /api/servers

use axum::extract::State;
use axum::Json;

use crate::config::AppState;
use crate::domain::Server;

/// Handle GET /api/servers
///
/// Returns servers.json in its on-disk shape.
pub async fn handle_servers(State(state): State<AppState>) -> Json<Vec<Server>> {
    let inventory = state.inventory().await;
    Json(inventory.servers().to_vec())
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use serde_json::Value;

    #[tokio::test]
    async fn test_lists_servers() {
        let app = TestApp::new();
        let (status, body) = app.get("/api/servers").await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json[0]["name"], "District Office");
        assert_eq!(json[0]["ipPrefix"], "10.110");
        assert_eq!(json[0]["typeDescriptions"]["Printers"][0], 30);
    }
}
