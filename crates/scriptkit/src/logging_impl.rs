//! Logging configuration for Scriptkit
//!
//! The interpreter emits `tracing` events at these levels:
//!
//! - **ERROR**: per-line failures reported as `Error on line N`
//! - **WARN**: unterminated blocks, cancellation, timeouts
//! - **INFO**: run start and finish
//! - **DEBUG**: dispatched commands, condition results, loop iterations
//! - **TRACE**: line classification and variable assignment
//!
//! Scripts and environment snapshots routinely carry credentials, so logged
//! values pass through [`LogConfig`] first.

use std::borrow::Cow;
use std::collections::HashSet;

/// Configuration for logging behavior
///
/// By default, values of variables whose names look sensitive are redacted
/// and script bodies are summarised instead of logged.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether to redact sensitive variables from logs (default: true)
    pub redact_sensitive: bool,

    /// Variable name fragments to redact (matched case-insensitively)
    pub redact_env_vars: HashSet<String>,

    /// Whether to include script content in logs (default: false)
    pub log_script_content: bool,

    /// Maximum length of logged values before truncation (default: 200)
    pub max_value_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        let redact_env_vars = [
            "PASSWORD",
            "PASSWD",
            "SECRET",
            "TOKEN",
            "KEY",
            "CREDENTIAL",
            "AUTH",
            "PRIVATE",
            "SESSION",
            "COOKIE",
        ]
        .iter()
        .map(|p| p.to_string())
        .collect();

        Self {
            redact_sensitive: true,
            redact_env_vars,
            log_script_content: false,
            max_value_length: 200,
        }
    }
}

impl LogConfig {
    /// Create a new log configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable redaction. Only for trusted debugging sessions.
    pub fn unsafe_disable_redaction(mut self) -> Self {
        self.redact_sensitive = false;
        self
    }

    /// Add a variable name fragment to redact
    pub fn redact_env(mut self, pattern: &str) -> Self {
        self.redact_env_vars.insert(pattern.to_uppercase());
        self
    }

    /// Log full script content instead of a size summary
    pub fn unsafe_log_scripts(mut self) -> Self {
        self.log_script_content = true;
        self
    }

    /// Set maximum length for logged values
    pub fn max_value_length(mut self, len: usize) -> Self {
        self.max_value_length = len;
        self
    }

    /// Check if a variable name should be redacted
    pub fn should_redact_env(&self, name: &str) -> bool {
        if !self.redact_sensitive {
            return false;
        }
        let upper = name.to_uppercase();
        self.redact_env_vars
            .iter()
            .any(|pattern| upper.contains(pattern))
    }

    /// Render a variable's value for a log event.
    pub fn variable_for_log<'a>(&self, name: &str, value: &'a str) -> Cow<'a, str> {
        if self.should_redact_env(name) {
            Cow::Borrowed("[REDACTED]")
        } else {
            self.truncate(value)
        }
    }

    /// Render a script line for a log event.
    pub fn line_for_log(&self, line: &str) -> String {
        self.truncate(&sanitize_for_log(line)).into_owned()
    }

    /// Render an already-expanded line for a log event.
    ///
    /// Every value of a sensitive variable in `vars` is masked wherever it
    /// appears in `line`, since expansion has erased the variable name.
    pub fn expanded_for_log<'v>(
        &self,
        line: &str,
        vars: impl IntoIterator<Item = (&'v str, &'v str)>,
    ) -> String {
        if !self.redact_sensitive {
            return self.line_for_log(line);
        }

        let mut secrets: Vec<&str> = vars
            .into_iter()
            .filter(|(name, value)| !value.is_empty() && self.should_redact_env(name))
            .map(|(_, value)| value)
            .collect();
        // Longest first, so a secret containing another is masked whole.
        secrets.sort_unstable_by_key(|value| std::cmp::Reverse(value.len()));

        let mut masked = line.to_string();
        for secret in secrets {
            if masked.contains(secret) {
                masked = masked.replace(secret, "[REDACTED]");
            }
        }
        self.line_for_log(&masked)
    }

    /// Truncate on a char boundary at or before `max_value_length`.
    fn truncate<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if value.len() <= self.max_value_length {
            return Cow::Borrowed(value);
        }
        let mut end = self.max_value_length;
        while end > 0 && !value.is_char_boundary(end) {
            end -= 1;
        }
        Cow::Owned(format!(
            "{}...[truncated {} bytes]",
            &value[..end],
            value.len() - end
        ))
    }
}

/// Escape control characters so a logged value cannot forge log lines.
pub fn sanitize_for_log(input: &str) -> String {
    input
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}

/// Format a script for the run-start log event
pub fn format_script_for_log(script: &str, config: &LogConfig) -> String {
    if !config.log_script_content {
        return format!(
            "[script: {} lines, {} bytes]",
            script.lines().count(),
            script.len()
        );
    }
    config.line_for_log(script)
}
