//! Activity log viewer.
//!
//! GET /api/logs
//! GET /api/logs?format=json

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::config::AppState;
use crate::error::AppResult;
use crate::services::ActivityEntry;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    #[serde(default)]
    pub format: Option<String>,
}

/// Handle GET /api/logs
///
/// Plain text by default; `format=json` returns parsed entries, newest
/// first.
pub async fn handle_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> AppResult<Response> {
    let content = state.activity().read_all().await?;

    if query.format.as_deref() == Some("json") {
        return Ok(Json(ActivityEntry::parse_log(&content)).into_response());
    }
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        content,
    )
        .into_response())
}
