//! Host shell bridge
//!
//! The interpreter never runs commands itself. Every plain command line and
//! every command-form condition is handed, fully expanded, to a [`HostShell`].
//!
//! # Custom Hosts
//!
//! ```rust
//! use scriptkit::{HostShell, Streams, async_trait};
//! use std::collections::HashMap;
//! use tokio_util::sync::CancellationToken;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl HostShell for Echo {
//!     async fn execute_command(
//!         &self,
//!         line: &str,
//!         io: &mut Streams<'_>,
//!         _cancel: &CancellationToken,
//!     ) -> scriptkit::Result<i32> {
//!         io.write_stdout(&format!("{line}\n")).await?;
//!         Ok(0)
//!     }
//!
//!     fn environment(&self) -> HashMap<String, String> {
//!         HashMap::new()
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Snapshot of the host's environment variables.
pub type Environment = HashMap<String, String>;

/// Output sink accepted by the interpreter and forwarded to the host.
pub type Sink<'a> = &'a mut (dyn AsyncWrite + Unpin + Send);

/// The stdout/stderr pair of one script run.
pub struct Streams<'a> {
    /// Standard output
    pub stdout: Sink<'a>,
    /// Standard error
    pub stderr: Sink<'a>,
}

impl fmt::Debug for Streams<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Streams").finish_non_exhaustive()
    }
}

impl<'a> Streams<'a> {
    /// Bundle a stdout and stderr sink.
    pub fn new(stdout: Sink<'a>, stderr: Sink<'a>) -> Self {
        Self { stdout, stderr }
    }

    /// Write `text` to stdout and flush.
    pub async fn write_stdout(&mut self, text: &str) -> Result<()> {
        self.stdout.write_all(text.as_bytes()).await?;
        self.stdout.flush().await?;
        Ok(())
    }

    /// Write `text` to stderr and flush.
    pub async fn write_stderr(&mut self, text: &str) -> Result<()> {
        self.stderr.write_all(text.as_bytes()).await?;
        self.stderr.flush().await?;
        Ok(())
    }
}

/// Command-execution capability the interpreter delegates to.
#[async_trait]
pub trait HostShell: Send + Sync {
    /// Run one expanded command line and return its exit code.
    ///
    /// Output goes to `io`. Implementations should stop promptly once
    /// `cancel` fires; the interpreter also abandons the returned future at
    /// that point.
    async fn execute_command(
        &self,
        line: &str,
        io: &mut Streams<'_>,
        cancel: &CancellationToken,
    ) -> Result<i32>;

    /// Current environment variables.
    ///
    /// Called once per expansion, so changes made by commands (for example an
    /// `export` in the host) are visible to the next line.
    fn environment(&self) -> Environment;
}
