//! Error types for Scriptkit
//!
//! Errors never escape the public entry points: [`Runner`](crate::Runner)
//! turns every variant into an exit code plus a single stderr line. Inside the
//! interpreter they separate recoverable per-line failures from failures that
//! abort the enclosing block.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using Scriptkit's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Scriptkit error types.
#[derive(Error, Debug)]
pub enum Error {
    /// The script file does not exist.
    #[error("script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    /// The script file exists but its content is not valid UTF-8.
    #[error("cannot read script: {}", .0.display())]
    Unreadable(PathBuf),

    /// The script has no content to run.
    #[error("script is empty")]
    EmptyScript,

    /// A control structure has no matching terminator.
    #[error("{keyword} without matching {terminator}")]
    Unterminated {
        keyword: &'static str,
        terminator: &'static str,
    },

    /// Malformed control structure header or builtin argument.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// The host shell failed to run a command.
    #[error("command failed: {0}")]
    Command(String),

    /// I/O error from the filesystem or an output sink.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The run was cancelled through its cancellation token.
    #[error("script cancelled")]
    Cancelled,

    /// The run exceeded its configured wall-clock limit.
    #[error("script timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Whether this error aborts the rest of the enclosing block instead of
    /// only the line it occurred on.
    pub fn is_fatal_for_block(&self) -> bool {
        matches!(self, Self::Unterminated { .. })
    }

    /// Exit code reported when this error ends a run.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Cancelled => 130,
            Self::Timeout(_) => 124,
            _ => 1,
        }
    }
}
