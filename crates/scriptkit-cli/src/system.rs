//! Collaborators backed by the real machine: `sh -c` and the local disk.

use async_trait::async_trait;
use scriptkit::{Environment, Error, FileSystem, HostShell, Streams};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Runs each command line in a fresh `sh -c`.
///
/// Every line is its own process, so `cd` or `export` in one line does not
/// carry over to the next.
#[derive(Debug, Clone)]
pub struct SystemShell {
    shell: String,
}

impl Default for SystemShell {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl SystemShell {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

#[async_trait]
impl HostShell for SystemShell {
    async fn execute_command(
        &self,
        line: &str,
        io: &mut Streams<'_>,
        cancel: &CancellationToken,
    ) -> scriptkit::Result<i32> {
        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Command(format!("cannot start {}: {e}", self.shell)))?;

        let (Some(mut out), Some(mut err)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(Error::Command("child output was not captured".to_string()));
        };

        let run = async {
            tokio::try_join!(
                child.wait(),
                tokio::io::copy(&mut out, &mut *io.stdout),
                tokio::io::copy(&mut err, &mut *io.stderr),
            )
        };

        let (status, _, _) = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            result = run => result?,
        };

        tracing::debug!(%status, "command finished");
        // Killed by a signal: report the conventional 128+n where known.
        Ok(status.code().unwrap_or_else(|| signal_status(&status)))
    }

    fn environment(&self) -> Environment {
        std::env::vars().collect()
    }
}

#[cfg(unix)]
fn signal_status(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map_or(1, |sig| 128 + sig)
}

#[cfg(not(unix))]
fn signal_status(_status: &std::process::ExitStatus) -> i32 {
    1
}

/// Reads scripts from the local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskFs;

#[async_trait]
impl FileSystem for DiskFs {
    async fn read_file(&self, path: &Path) -> scriptkit::Result<Vec<u8>> {
        Ok(tokio::fs::read(path).await?)
    }

    async fn exists(&self, path: &Path) -> scriptkit::Result<bool> {
        Ok(tokio::fs::try_exists(path).await?)
    }
}
