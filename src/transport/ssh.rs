//! Transport backed by the system OpenSSH client.
//!
//! Each call spawns one `ssh` process. Password logins go through
//! `sshpass -e` with the password in the environment, never on the
//! command line. Key logins (empty password) run ssh in batch mode.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{shell_quote, SshTarget, Transport, TransportError, TransportResult};

/// ssh exits with 255 when the connection itself failed.
const SSH_CONNECTION_FAILED: i32 = 255;
/// sshpass: invalid password.
const SSHPASS_BAD_PASSWORD: i32 = 5;
/// sshpass: host public key is unknown.
const SSHPASS_HOST_KEY_UNKNOWN: i32 = 6;

pub struct OpenSshTransport {
    ssh_binary: String,
    sshpass_binary: String,
    timeout: Duration,
}

impl OpenSshTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            ssh_binary: "ssh".to_string(),
            sshpass_binary: "sshpass".to_string(),
            timeout,
        }
    }

    pub fn with_ssh_binary(mut self, binary: impl Into<String>) -> Self {
        self.ssh_binary = binary.into();
        self
    }

    pub fn with_sshpass_binary(mut self, binary: impl Into<String>) -> Self {
        self.sshpass_binary = binary.into();
        self
    }

    fn command(&self, target: &SshTarget, remote_command: &str) -> Command {
        let mut cmd = if target.password.is_empty() {
            let mut cmd = Command::new(&self.ssh_binary);
            cmd.args(["-o", "BatchMode=yes"]);
            cmd
        } else {
            let mut cmd = Command::new(&self.sshpass_binary);
            cmd.arg("-e").arg(&self.ssh_binary);
            cmd.env("SSHPASS", &target.password);
            cmd
        };

        cmd.args(["-o", "StrictHostKeyChecking=accept-new"])
            .arg("-o")
            .arg(format!("ConnectTimeout={}", self.timeout.as_secs().max(1)))
            .arg("-p")
            .arg(target.port.to_string())
            .arg(format!("{}@{}", target.username, target.host))
            .arg("--")
            .arg(remote_command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Run `remote_command`, feeding `input` to its stdin.
    async fn exec(&self, target: &SshTarget, remote_command: &str, input: Vec<u8>) -> TransportResult<String> {
        tracing::debug!(
            "ssh {}@{}:{} -- {}",
            target.username,
            target.host,
            target.port,
            remote_command
        );

        let mut child = self.command(target, remote_command).spawn()?;

        // Write stdin on its own task so a chatty command cannot block us.
        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                stdin.write_all(&input).await?;
                stdin.shutdown().await
            })
        });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| TransportError::Timeout)??;

        if let Some(writer) = writer {
            if let Ok(Err(e)) = writer.await {
                // A command that ignores stdin closes the pipe early.
                tracing::trace!("stdin write to {} ended early: {}", target.host, e);
            }
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if stderr.contains("sudo:") {
            return Err(TransportError::Sudo(stderr.trim().to_string()));
        }

        match output.status.code() {
            Some(0) => Ok(stdout),
            Some(SSHPASS_BAD_PASSWORD) if !target.password.is_empty() => Err(TransportError::Auth),
            Some(SSHPASS_HOST_KEY_UNKNOWN) if !target.password.is_empty() => {
                Err(TransportError::from_ssh_stderr(&stderr))
            }
            Some(SSH_CONNECTION_FAILED) => Err(TransportError::from_ssh_stderr(&stderr)),
            Some(code) => Err(TransportError::Exit {
                code,
                stdout,
                stderr: stderr.trim().to_string(),
            }),
            None => Err(TransportError::Exit {
                code: -1,
                stdout,
                stderr: "terminated by signal".to_string(),
            }),
        }
    }
}

#[async_trait]
impl Transport for OpenSshTransport {
    async fn run_remote_command(&self, target: &SshTarget, command: &str) -> TransportResult<String> {
        let input = if command.starts_with("sudo -S") {
            format!("{}\n", target.password).into_bytes()
        } else {
            Vec::new()
        };
        self.exec(target, command, input).await
    }

    async fn read_remote_text(&self, target: &SshTarget, path: &str) -> TransportResult<String> {
        self.exec(target, &format!("cat {}", shell_quote(path)), Vec::new())
            .await
    }

    async fn write_remote_text(&self, target: &SshTarget, path: &str, content: &str) -> TransportResult<()> {
        self.exec(
            target,
            &format!("cat > {}", shell_quote(path)),
            content.as_bytes().to_vec(),
        )
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn args(cmd: &Command) -> Vec<String> {
        cmd.as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_password_login_uses_sshpass() {
        let transport = OpenSshTransport::new(Duration::from_secs(10));
        let target = SshTarget::new("10.1.1.5", "admin", "secret");
        let cmd = transport.command(&target, "cat '/etc/dhcp/dhcpd.conf'");

        assert_eq!(cmd.as_std().get_program(), OsStr::new("sshpass"));
        let args = args(&cmd);
        assert_eq!(args[0], "-e");
        assert_eq!(args[1], "ssh");
        assert!(args.contains(&"ConnectTimeout=10".to_string()));
        assert!(args.contains(&"admin@10.1.1.5".to_string()));
        assert_eq!(args.last().unwrap(), "cat '/etc/dhcp/dhcpd.conf'");
        assert!(!args.iter().any(|a| a.contains("secret")));

        let sshpass = cmd
            .as_std()
            .get_envs()
            .find(|(key, _)| key.to_str() == Some("SSHPASS"))
            .and_then(|(_, value)| value)
            .and_then(|value| value.to_str());
        assert_eq!(sshpass, Some("secret"));
    }

    #[test]
    fn test_key_login_uses_batch_mode() {
        let transport = OpenSshTransport::new(Duration::from_secs(30)).with_ssh_binary("/usr/bin/ssh");
        let mut target = SshTarget::new("dhcp1", "root", "");
        target.port = 2222;
        let cmd = transport.command(&target, "true");

        assert_eq!(cmd.as_std().get_program(), OsStr::new("/usr/bin/ssh"));
        let args = args(&cmd);
        assert_eq!(&args[..2], &["-o", "BatchMode=yes"]);
        let port = args.iter().position(|a| a == "-p").unwrap();
        assert_eq!(args[port + 1], "2222");
        assert_eq!(args[args.len() - 2], "--");
    }
}
