//! Scriptkit - line-oriented shell script interpreter
//!
//! Scriptkit runs POSIX-flavoured scripts (assignments, `if`/`else`/`fi`,
//! `for`/`while`/`done`, `exit`) and forwards every other line to a
//! [`HostShell`] that actually executes commands.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use scriptkit::{HostShell, Runner, Streams, async_trait};
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
//!         let text = line.strip_prefix("echo ").unwrap_or("");
//!         io.write_stdout(&format!("{text}\n")).await?;
//!         Ok(0)
//!     }
//!
//!     fn environment(&self) -> HashMap<String, String> {
//!         HashMap::new()
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let runner = Runner::new(Arc::new(Echo));
//!     let (mut out, mut err) = (Vec::new(), Vec::new());
//!     let script = "for name in world moon\necho hello $name\ndone";
//!     let code = runner
//!         .execute_script_content(script, &[], &mut out, &mut err, &CancellationToken::new())
//!         .await;
//!     assert_eq!(code, 0);
//!     assert_eq!(String::from_utf8(out).unwrap(), "hello world\nhello moon\n");
//! }
//! ```

mod error;
mod fs;
mod host;
mod interpreter;
mod limits;
mod logging_impl;

pub use async_trait::async_trait;
pub use error::{Error, Result};
pub use fs::{FileSystem, InMemoryFs};
pub use host::{Environment, HostShell, Sink, Streams};
pub use interpreter::VariableStore;
pub use limits::ExecutionLimits;
pub use logging_impl::{LogConfig, format_script_for_log, sanitize_for_log};

use std::path::Path;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use interpreter::{Executor, parse_lines};

/// Name bound to `$0` when running script text that did not come from a file.
pub const DEFAULT_SCRIPT_NAME: &str = "script";

/// Main entry point for Scriptkit.
///
/// Holds the collaborators a run needs: the host shell that executes
/// commands and the filesystem scripts are read from.
pub struct Runner {
    host: Arc<dyn HostShell>,
    fs: Arc<dyn FileSystem>,
    script_name: String,
    limits: ExecutionLimits,
    log_config: LogConfig,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("script_name", &self.script_name)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl Runner {
    /// Create a runner with default settings and an empty in-memory filesystem.
    pub fn new(host: Arc<dyn HostShell>) -> Self {
        Self::builder(host).build()
    }

    /// Create a new RunnerBuilder for customized configuration.
    pub fn builder(host: Arc<dyn HostShell>) -> RunnerBuilder {
        RunnerBuilder {
            host,
            fs: None,
            script_name: None,
            limits: ExecutionLimits::default(),
            log_config: LogConfig::default(),
        }
    }

    /// Read and run the script at `path`. `$0` is bound to the path.
    ///
    /// Always returns an exit code; failures are reported on `stderr`.
    pub async fn execute_script_file(
        &self,
        path: impl AsRef<Path>,
        args: &[String],
        stdout: Sink<'_>,
        stderr: Sink<'_>,
        cancel: &CancellationToken,
    ) -> i32 {
        let path = path.as_ref();
        match self.read_script(path).await {
            Ok(content) => {
                let name = path.display().to_string();
                self.execute(&name, &content, args, stdout, stderr, cancel)
                    .await
            }
            Err(err) => {
                warn!(error = %err, "cannot load script");
                report(stderr, &err).await;
                err.exit_code()
            }
        }
    }

    /// Run script text with positional arguments `args`.
    ///
    /// Always returns an exit code; failures are reported on `stderr`.
    pub async fn execute_script_content(
        &self,
        content: &str,
        args: &[String],
        stdout: Sink<'_>,
        stderr: Sink<'_>,
        cancel: &CancellationToken,
    ) -> i32 {
        self.execute(&self.script_name, content, args, stdout, stderr, cancel)
            .await
    }

    async fn execute(
        &self,
        name: &str,
        content: &str,
        args: &[String],
        stdout: Sink<'_>,
        stderr: Sink<'_>,
        cancel: &CancellationToken,
    ) -> i32 {
        info!(
            name,
            script = %format_script_for_log(content, &self.log_config),
            args = args.len(),
            "starting script"
        );

        let result = if content.trim().is_empty() {
            Err(Error::EmptyScript)
        } else {
            let lines = parse_lines(content);
            let io = Streams::new(&mut *stdout, &mut *stderr);
            let vars = VariableStore::new(name, args);
            let mut executor =
                Executor::new(self.host.as_ref(), &self.log_config, cancel, io, vars);

            match self.limits.timeout {
                Some(limit) => tokio::time::timeout(limit, executor.run(&lines))
                    .await
                    .unwrap_or(Err(Error::Timeout(limit))),
                None => executor.run(&lines).await,
            }
        };

        let code = match result {
            Ok(code) => code,
            Err(err) => {
                warn!(error = %err, "script aborted");
                report(stderr, &err).await;
                err.exit_code()
            }
        };
        info!(name, exit_code = code, "script finished");
        code
    }

    async fn read_script(&self, path: &Path) -> Result<String> {
        if !self.fs.exists(path).await? {
            return Err(Error::ScriptNotFound(path.to_path_buf()));
        }
        let bytes = self.fs.read_file(path).await?;
        String::from_utf8(bytes).map_err(|_| Error::Unreadable(path.to_path_buf()))
    }
}

/// Write a run-level failure to the caller's stderr sink.
async fn report(stderr: Sink<'_>, err: &Error) {
    let message = format!("{err}\n");
    let written = match stderr.write_all(message.as_bytes()).await {
        Ok(()) => stderr.flush().await,
        Err(e) => Err(e),
    };
    if let Err(write_err) = written {
        warn!(error = %write_err, "failed to write to stderr sink");
    }
}

/// Builder for customized Runner configuration.
pub struct RunnerBuilder {
    host: Arc<dyn HostShell>,
    fs: Option<Arc<dyn FileSystem>>,
    script_name: Option<String>,
    limits: ExecutionLimits,
    log_config: LogConfig,
}

impl std::fmt::Debug for RunnerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerBuilder")
            .field("script_name", &self.script_name)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl RunnerBuilder {
    /// Set a custom filesystem.
    pub fn fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Set the name bound to `$0` for [`Runner::execute_script_content`].
    pub fn script_name(mut self, name: impl Into<String>) -> Self {
        self.script_name = Some(name.into());
        self
    }

    /// Set execution limits.
    pub fn limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set logging configuration.
    pub fn log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// Build the Runner instance.
    pub fn build(self) -> Runner {
        Runner {
            host: self.host,
            fs: self.fs.unwrap_or_else(|| Arc::new(InMemoryFs::new())),
            script_name: self
                .script_name
                .unwrap_or_else(|| DEFAULT_SCRIPT_NAME.to_string()),
            limits: self.limits,
            log_config: self.log_config,
        }
    }
}
