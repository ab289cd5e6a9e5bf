//! Remote access to DHCP servers.
//!
//! Everything that touches the network goes through [`Transport`], so the
//! configuration model stays pure and routes can be tested against an
//! in-memory server.

mod ssh;

pub use ssh::OpenSshTransport;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_SSH_PORT: u16 = 22;

/// Credentials and address of one SSH login.
#[derive(Clone, Deserialize)]
pub struct SshTarget {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
}

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

impl SshTarget {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            username: username.into(),
            password: password.into(),
        }
    }
}

// Never print the password.
impl std::fmt::Debug for SshTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Authentication failed. Please check your username and password.")]
    Auth,

    #[error("Cannot connect to server. Please check the server address.")]
    Unreachable,

    #[error("Connection timeout. Please check your network connection.")]
    Timeout,

    /// The remote command ran and exited non-zero.
    #[error("Command exited with status {code}: {stderr}")]
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
    },

    /// sudo refused or asked for something we could not give it.
    #[error("Failed to execute command: {0}")]
    Sudo(String),

    #[error("Failed to run ssh: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Classify the stderr of a failed ssh connection.
    pub fn from_ssh_stderr(stderr: &str) -> Self {
        let lower = stderr.to_lowercase();
        if lower.contains("permission denied") || lower.contains("authentication methods failed") {
            TransportError::Auth
        } else if lower.contains("timed out") || lower.contains("timeout") {
            TransportError::Timeout
        } else if lower.contains("could not resolve hostname")
            || lower.contains("connection refused")
            || lower.contains("no route to host")
            || lower.contains("network is unreachable")
        {
            TransportError::Unreachable
        } else {
            TransportError::Exit {
                code: 255,
                stdout: String::new(),
                stderr: stderr.trim().to_string(),
            }
        }
    }
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Remote shell and file access on a DHCP server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run a shell command and return its stdout.
    ///
    /// Commands starting with `sudo -S` get the login password on stdin.
    async fn run_remote_command(&self, target: &SshTarget, command: &str) -> TransportResult<String>;

    /// Read a whole text file.
    async fn read_remote_text(&self, target: &SshTarget, path: &str) -> TransportResult<String>;

    /// Create or truncate a file with `content`.
    async fn write_remote_text(&self, target: &SshTarget, path: &str, content: &str) -> TransportResult<()>;
}

/// Quote `value` for a POSIX shell.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/etc/dhcp/dhcpd.conf"), "'/etc/dhcp/dhcpd.conf'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_classify_ssh_errors() {
        assert!(matches!(
            TransportError::from_ssh_stderr("admin@10.1.1.1: Permission denied (publickey,password)."),
            TransportError::Auth
        ));
        assert!(matches!(
            TransportError::from_ssh_stderr("ssh: connect to host 10.1.1.1 port 22: Connection timed out"),
            TransportError::Timeout
        ));
        assert!(matches!(
            TransportError::from_ssh_stderr("ssh: Could not resolve hostname dhcp1: Name or service not known"),
            TransportError::Unreachable
        ));
        assert!(matches!(
            TransportError::from_ssh_stderr("ssh: connect to host 10.1.1.1 port 22: Connection refused"),
            TransportError::Unreachable
        ));
        assert!(matches!(
            TransportError::from_ssh_stderr("kex_exchange_identification: read: Connection reset"),
            TransportError::Exit { code: 255, .. }
        ));
    }

    #[test]
    fn test_target_debug_hides_password() {
        let target = SshTarget::new("10.1.1.1", "admin", "hunter2");
        let debug = format!("{:?}", target);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }
}
