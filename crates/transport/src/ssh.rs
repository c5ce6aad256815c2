//! SSH transport using the system ssh/scp commands
//!
//! Shelling out keeps the user's existing SSH config, agents, and known
//! hosts working without reimplementing any of it. Every operation is one
//! short-lived process; remote commands are shell-quoted before they cross
//! the wire.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;
use tracing::{debug, info};

use crate::{Transport, TransportError, TransportResult};

/// Transport over system ssh/scp
pub struct SshTransport {
    host: String,
    port: u16,
    user: String,
    key_path: Option<PathBuf>,
}

impl SshTransport {
    /// Connect to a remote host and verify the session works
    ///
    /// # Errors
    /// Returns [`TransportError::Connection`] if the probe command fails
    pub async fn connect(
        host: &str,
        port: u16,
        user: &str,
        key_path: Option<&Path>,
    ) -> TransportResult<Self> {
        info!("Connecting to {user}@{host}:{port}");

        let transport = Self {
            host: host.to_string(),
            port,
            user: user.to_string(),
            key_path: key_path.map(Path::to_path_buf),
        };

        let output = transport
            .execute("true")
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        if !output.status.success() {
            return Err(TransportError::Connection(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        debug!("SSH connection verified");
        Ok(transport)
    }

    /// Build SSH destination string
    fn dest(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Build the scp destination for a remote path
    ///
    /// scp hands the path to the remote shell, so it is quoted like every
    /// other remote command.
    fn scp_target(&self, remote_path: &str) -> String {
        format!("{}:{}", self.dest(), quoted(remote_path))
    }

    fn ssh_command(&self, remote_command: &str) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.args(["-o", "BatchMode=yes", "-o", "ConnectTimeout=10"])
            .arg("-p")
            .arg(self.port.to_string());
        if let Some(key) = &self.key_path {
            cmd.arg("-i").arg(key);
        }
        cmd.arg(self.dest()).arg(remote_command);
        cmd
    }

    /// Execute a command on the remote host
    async fn execute(&self, remote_command: &str) -> TransportResult<Output> {
        debug!(command = remote_command, "ssh");
        let output = self.ssh_command(remote_command).output().await?;
        Ok(output)
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn upload_file(&self, source: &Path, remote_path: &str) -> TransportResult<()> {
        let mut cmd = Command::new("scp");
        cmd.args(["-o", "BatchMode=yes", "-o", "ConnectTimeout=10", "-q"])
            .arg("-P")
            .arg(self.port.to_string());
        if let Some(key) = &self.key_path {
            cmd.arg("-i").arg(key);
        }
        cmd.arg(source).arg(self.scp_target(remote_path));

        let output = cmd.output().await?;
        if !output.status.success() {
            return Err(TransportError::Transfer(format!(
                "upload of {remote_path} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    async fn delete_file(&self, remote_path: &str) -> TransportResult<()> {
        // rm -f so an already-missing file is not an error
        let output = self
            .execute(&format!("rm -f -- {}", quoted(remote_path)))
            .await?;
        if !output.status.success() {
            return Err(TransportError::Transfer(format!(
                "deletion of {remote_path} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    async fn exists(&self, remote_path: &str) -> TransportResult<bool> {
        let output = self
            .execute(&format!("test -e {}", quoted(remote_path)))
            .await?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(TransportError::Transfer(format!(
                "existence check for {remote_path} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
        }
    }

    async fn read_file(&self, remote_path: &str) -> TransportResult<Bytes> {
        // LC_ALL=C keeps the missing-file message stable across remote
        // locales
        let output = self
            .execute(&format!("LC_ALL=C cat {}", quoted(remote_path)))
            .await?;
        if output.status.success() {
            return Ok(Bytes::from(output.stdout));
        }
        Err(read_failure(
            remote_path,
            &String::from_utf8_lossy(&output.stderr),
        ))
    }

    async fn make_dir_all(&self, remote_path: &str) -> TransportResult<()> {
        let output = self
            .execute(&format!("mkdir -p -- {}", quoted(remote_path)))
            .await?;
        if !output.status.success() {
            return Err(TransportError::Transfer(format!(
                "mkdir of {remote_path} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Quote a remote path for use inside a remote shell command
fn quoted(remote_path: &str) -> String {
    shell_escape::escape(Cow::from(remote_path)).into_owned()
}

/// Classify a failed remote read by its stderr
fn read_failure(remote_path: &str, stderr: &str) -> TransportError {
    if stderr.contains("No such file") {
        TransportError::NotFound(remote_path.to_string())
    } else {
        TransportError::Transfer(format!(
            "read of {remote_path} failed: {}",
            stderr.trim()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoting_plain_path() {
        assert_eq!(quoted("/srv/www/index.html"), "/srv/www/index.html");
    }

    #[test]
    fn test_quoting_space_and_quote() {
        assert_eq!(quoted("/srv/a b"), "'/srv/a b'");
        assert_eq!(quoted("it's"), "'it'\\''s'");
    }

    #[test]
    fn test_dest_format() {
        let transport = SshTransport {
            host: "example.com".to_string(),
            port: 22,
            user: "deploy".to_string(),
            key_path: None,
        };
        assert_eq!(transport.dest(), "deploy@example.com");
    }

    #[test]
    fn test_scp_target_is_quoted() {
        let transport = SshTransport {
            host: "example.com".to_string(),
            port: 22,
            user: "deploy".to_string(),
            key_path: None,
        };
        assert_eq!(
            transport.scp_target("/srv/www/index.html"),
            "deploy@example.com:/srv/www/index.html"
        );
        assert_eq!(
            transport.scp_target("/srv/www/a b.txt"),
            "deploy@example.com:'/srv/www/a b.txt'"
        );
    }

    #[test]
    fn test_read_failure_classification() {
        let err = read_failure("/srv/x", "cat: /srv/x: No such file or directory");
        assert!(matches!(err, TransportError::NotFound(_)));

        let err = read_failure("/srv/x", "cat: /srv/x: Permission denied");
        assert!(matches!(err, TransportError::Transfer(_)));
    }
}
