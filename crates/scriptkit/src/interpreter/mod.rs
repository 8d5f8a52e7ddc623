//! Interpreter for executing scripts
//!
//! The executor walks a classified line sequence with a cursor. Control
//! structures are located with the block scanner and their selected bodies run
//! as nested blocks over sub-slices of the same sequence, so line numbers in
//! error messages always refer to the original script.

mod condition;
mod expand;
mod lines;
mod scanner;
mod state;

pub use state::VariableStore;

pub(crate) use lines::parse_lines;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use condition::Condition;
use lines::{ExitRequest, LineKind, ScriptLine, is_identifier};
use scanner::{BlockBounds, BlockKind, find_block_end};

use crate::error::{Error, Result};
use crate::host::{HostShell, Streams};
use crate::logging_impl::LogConfig;

/// How a block of lines finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Ran to the end; carries the status of the last line that set one
    Completed(Option<i32>),
    /// `exit` was executed; unwinds every enclosing block
    Exit(i32),
}

/// Result of executing the line under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Advance { next: usize, status: Option<i32> },
    Exit(i32),
}

impl Step {
    fn advance(next: usize, status: Option<i32>) -> Self {
        Self::Advance { next, status }
    }

    fn after_block(flow: Flow, next: usize) -> Self {
        match flow {
            Flow::Completed(status) => Self::advance(next, status),
            Flow::Exit(code) => Self::Exit(code),
        }
    }
}

/// Executes one script run against a host shell.
pub(crate) struct Executor<'a> {
    host: &'a dyn HostShell,
    log: &'a LogConfig,
    cancel: &'a CancellationToken,
    io: Streams<'a>,
    vars: VariableStore,
    last_status: i32,
}

impl<'a> Executor<'a> {
    pub fn new(
        host: &'a dyn HostShell,
        log: &'a LogConfig,
        cancel: &'a CancellationToken,
        io: Streams<'a>,
        vars: VariableStore,
    ) -> Self {
        Self {
            host,
            log,
            cancel,
            io,
            vars,
            last_status: 0,
        }
    }

    /// Run a whole script and return its exit code.
    ///
    /// Only cancellation escapes as an error; every other failure has already
    /// been reported on stderr.
    pub async fn run(&mut self, lines: &[ScriptLine]) -> Result<i32> {
        match self.run_block(lines).await? {
            Flow::Completed(status) => Ok(status.unwrap_or(0)),
            Flow::Exit(code) => Ok(code),
        }
    }

    fn run_block<'s>(&'s mut self, lines: &'s [ScriptLine]) -> BoxFuture<'s, Result<Flow>> {
        Box::pin(async move {
            let mut status = None;
            let mut cursor = 0;

            while cursor < lines.len() {
                self.check_cancelled()?;
                let number = lines[cursor].number;

                match self.step(lines, cursor).await {
                    Ok(Step::Advance { next, status: line_status }) => {
                        if line_status.is_some() {
                            status = line_status;
                        }
                        cursor = next;
                    }
                    Ok(Step::Exit(code)) => return Ok(Flow::Exit(code)),
                    Err(Error::Cancelled) => return Err(Error::Cancelled),
                    Err(err) => {
                        self.report_line_error(number, &err).await;
                        status = Some(1);
                        if err.is_fatal_for_block() {
                            return Ok(Flow::Completed(status));
                        }
                        cursor += 1;
                    }
                }
            }

            Ok(Flow::Completed(status))
        })
    }

    /// Run a selected body with an empty argument list.
    async fn run_nested(&mut self, body: &[ScriptLine]) -> Result<Flow> {
        let frame = self.vars.enter_block();
        let flow = self.run_block(body).await;
        self.vars.leave_block(frame);
        flow
    }

    async fn step(&mut self, lines: &[ScriptLine], cursor: usize) -> Result<Step> {
        let line = &lines[cursor];

        match &line.kind {
            LineKind::Skip | LineKind::Keyword(_) => Ok(Step::advance(cursor + 1, None)),
            LineKind::Assignment { name, value } => {
                self.assign(name, value);
                Ok(Step::advance(cursor + 1, None))
            }
            LineKind::If { condition } => self.run_if(lines, cursor, condition).await,
            LineKind::For { header } => self.run_for(lines, cursor, header).await,
            LineKind::While { condition } => self.run_while(lines, cursor, condition).await,
            LineKind::Command(text) => self.run_command(line.number, cursor, text).await,
        }
    }

    fn assign(&mut self, name: &str, raw: &str) {
        let value = self.expand(strip_quotes(raw.trim()));
        trace!(
            name,
            value = %self.value_for_log(name, &value),
            "assigned variable"
        );
        self.vars.set(name, value);
    }

    async fn run_if(
        &mut self,
        lines: &[ScriptLine],
        cursor: usize,
        condition: &str,
    ) -> Result<Step> {
        let BlockBounds { else_index, end } = find_block_end(lines, cursor, BlockKind::If)
            .ok_or_else(|| BlockKind::If.unterminated("if"))?;

        let body = if self.evaluate_condition(condition).await? {
            &lines[cursor + 1..else_index.unwrap_or(end)]
        } else if let Some(else_index) = else_index {
            &lines[else_index + 1..end]
        } else {
            return Ok(Step::advance(end + 1, None));
        };

        let flow = self.run_nested(body).await?;
        Ok(Step::after_block(flow, end + 1))
    }

    async fn run_for(&mut self, lines: &[ScriptLine], cursor: usize, header: &str) -> Result<Step> {
        let BlockBounds { end, .. } = find_block_end(lines, cursor, BlockKind::Loop)
            .ok_or_else(|| BlockKind::Loop.unterminated("for"))?;

        let (var, items) = match parse_for_header(header) {
            Ok(parsed) => parsed,
            Err(err) => {
                // The body is skipped as a whole; only the header line errs.
                self.report_line_error(lines[cursor].number, &err).await;
                return Ok(Step::advance(end + 1, Some(1)));
            }
        };

        let items = self.expand(items);
        let body = &lines[cursor + 1..end];
        let mut status = None;

        for item in items.split_whitespace() {
            self.check_cancelled()?;
            debug!(var, item = %self.redacted(item), "for iteration");
            self.vars.set(var, item);

            match self.run_nested(body).await? {
                Flow::Completed(Some(code)) => status = Some(code),
                Flow::Completed(None) => {}
                Flow::Exit(code) => return Ok(Step::Exit(code)),
            }
        }

        Ok(Step::advance(end + 1, status))
    }

    async fn run_while(
        &mut self,
        lines: &[ScriptLine],
        cursor: usize,
        condition: &str,
    ) -> Result<Step> {
        let BlockBounds { end, .. } = find_block_end(lines, cursor, BlockKind::Loop)
            .ok_or_else(|| BlockKind::Loop.unterminated("while"))?;

        let body = &lines[cursor + 1..end];
        let mut status = None;

        loop {
            self.check_cancelled()?;
            if !self.evaluate_condition(condition).await? {
                break;
            }

            match self.run_nested(body).await? {
                Flow::Completed(Some(code)) => status = Some(code),
                Flow::Completed(None) => {}
                Flow::Exit(code) => return Ok(Step::Exit(code)),
            }

            // A loop over local tests never reaches the host, so give the
            // runtime a chance to deliver cancellation and timeouts.
            tokio::task::yield_now().await;
        }

        Ok(Step::advance(end + 1, status))
    }

    async fn run_command(&mut self, number: usize, cursor: usize, text: &str) -> Result<Step> {
        let expanded = self.expand(text);

        if let Some(request) = ExitRequest::parse(&expanded) {
            let code = match request {
                ExitRequest::Current => self.last_status,
                ExitRequest::Code(code) => code,
                ExitRequest::Invalid(arg) => {
                    let err = Error::Syntax(format!("exit: {arg}: numeric argument required"));
                    self.report_line_error(number, &err).await;
                    2
                }
            };
            debug!(line = number, code, "script exit");
            return Ok(Step::Exit(code));
        }

        debug!(
            line = number,
            command = %self.redacted(&expanded),
            "dispatching command"
        );
        let code = self.dispatch(&expanded).await?;
        self.last_status = code;
        self.vars.set_last_status(code);
        Ok(Step::advance(cursor + 1, Some(code)))
    }

    /// Evaluate an `if`/`while` condition. Host failures count as false.
    async fn evaluate_condition(&mut self, raw: &str) -> Result<bool> {
        let expanded = self.expand(raw);

        let result = match Condition::parse(&expanded) {
            Condition::Test(result) => result,
            Condition::Command(command) => match self.dispatch(command).await {
                Ok(code) => code == 0,
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(err) => {
                    debug!(error = %err, "condition command failed");
                    false
                }
            },
        };

        debug!(
            condition = %self.redacted(&expanded),
            result,
            "evaluated condition"
        );
        Ok(result)
    }

    /// Hand one command to the host, racing it against cancellation.
    async fn dispatch(&mut self, command: &str) -> Result<i32> {
        let cancel = self.cancel;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = self.host.execute_command(command, &mut self.io, cancel) => result,
        }
    }

    fn expand(&self, text: &str) -> String {
        let env = self.host.environment();
        expand::expand(text, &env, &self.vars)
    }

    /// Render expanded text for a log event, masking sensitive values.
    fn redacted(&self, expanded: &str) -> String {
        let env = self.host.environment();
        let vars = env
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .chain(self.vars.iter());
        self.log.expanded_for_log(expanded, vars)
    }

    fn value_for_log(&self, name: &str, value: &str) -> String {
        if self.log.should_redact_env(name) {
            return self.log.variable_for_log(name, value).into_owned();
        }
        self.redacted(value)
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            warn!("script cancelled");
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    async fn report_line_error(&mut self, number: usize, err: &Error) {
        if err.is_fatal_for_block() {
            warn!(line = number, error = %err, "aborting block");
        } else {
            error!(line = number, error = %err, "line failed");
        }
        self.last_status = 1;
        self.vars.set_last_status(1);

        let message = format!("Error on line {number}: {err}\n");
        if let Err(write_err) = self.io.write_stderr(&message).await {
            warn!(error = %write_err, "failed to write to stderr sink");
        }
    }
}

/// Strip one pair of matching surrounding quotes.
fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Split `NAME in WORDS` into the loop variable and the unexpanded words.
fn parse_for_header(header: &str) -> Result<(&str, &str)> {
    let invalid = || Error::Syntax(format!("expected `for NAME in WORDS`, found `for {header}`"));

    let header = header.trim();
    let (var, rest) = header.split_once(char::is_whitespace).ok_or_else(invalid)?;
    if !is_identifier(var) {
        return Err(invalid());
    }

    let rest = rest.trim_start();
    let items = rest.strip_prefix("in").ok_or_else(invalid)?;
    if !items.is_empty() && !items.starts_with(char::is_whitespace) {
        return Err(invalid());
    }
    Ok((var, items.trim()))
}
