//! Activity log: who changed what on which server, and when.
//!
//! One line per action:
//! `2024-05-01T12:00:00.000Z - User: alice, Action: Add Entry, Details: {...}`

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;

pub const ACTIVITY_LOG_FILE: &str = "activity.log";

/// Destination for activity records.
///
/// Recording is best effort: a sink that fails logs the problem and
/// carries on, it never fails the request that triggered it.
#[async_trait]
pub trait ActivitySink: Send + Sync {
    async fn record(&self, user: &str, action: &str, details: Option<&Value>);

    /// Everything recorded so far, oldest first.
    async fn read_all(&self) -> std::io::Result<String>;
}

/// Format one activity line (without the trailing newline).
pub fn format_line(timestamp: &str, user: &str, action: &str, details: Option<&Value>) -> String {
    match details {
        Some(details) => format!("{} - User: {}, Action: {}, Details: {}", timestamp, user, action, details),
        None => format!("{} - User: {}, Action: {}", timestamp, user, action),
    }
}

/// A parsed activity line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    pub user: String,
    pub action: String,
    pub details: Option<Value>,
}

impl ActivityEntry {
    /// Parse a line written by [`format_line`]. Returns `None` for lines in
    /// any other shape.
    pub fn parse_line(line: &str) -> Option<Self> {
        let (timestamp, rest) = line.split_once(" - ")?;
        let rest = rest.strip_prefix("User: ")?;
        let (user, rest) = rest.split_once(", Action: ")?;

        let (action, details) = match rest.split_once(", Details: ") {
            Some((action, details)) => (action, serde_json::from_str(details).ok()),
            None => (rest, None),
        };

        Some(Self {
            timestamp: timestamp.to_string(),
            user: user.to_string(),
            action: action.to_string(),
            details,
        })
    }

    /// Parse a whole log, newest entry first.
    pub fn parse_log(content: &str) -> Vec<Self> {
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(Self::parse_line)
            .rev()
            .collect()
    }
}

/// Appends activity lines to `<log_dir>/activity.log`.
pub struct FileActivityLog {
    path: PathBuf,
}

impl FileActivityLog {
    pub fn new(log_dir: &Path) -> Self {
        Self {
            path: log_dir.join(ACTIVITY_LOG_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{}\n", line).as_bytes()).await?;
        file.flush().await
    }
}

#[async_trait]
impl ActivitySink for FileActivityLog {
    async fn record(&self, user: &str, action: &str, details: Option<&Value>) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let line = format_line(&timestamp, user, action, details);
        tracing::info!("Activity: {}", line);

        if let Err(e) = self.append(&line).await {
            tracing::error!("Failed to write activity log {:?}: {}", self.path, e);
        }
    }

    async fn read_all(&self) -> std::io::Result<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e),
        }
    }
}
