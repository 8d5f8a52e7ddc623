//! Test double for the host shell bridge.
//!
//! Understands a handful of commands:
//! - `echo WORDS` writes WORDS to stdout
//! - `true` / `false` exit 0 / 1
//! - `status N` exits N
//! - `fail` returns an error instead of an exit code
//! - `countdown` exits 0 the first `countdown` times, then 1
//! - `hang` never finishes on its own
//!
//! Anything else prints `unknown command` to stderr and exits 127.

#![allow(dead_code)]

use async_trait::async_trait;
use scriptkit::{Environment, HostShell, Runner, Streams};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub struct TestHost {
    env: Environment,
    commands: Mutex<Vec<String>>,
    countdown: AtomicUsize,
}

impl TestHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_env(pairs: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            env: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Self::default()
        })
    }

    pub fn with_countdown(times: usize) -> Arc<Self> {
        Arc::new(Self {
            countdown: AtomicUsize::new(times),
            ..Self::default()
        })
    }

    /// Every command line the interpreter dispatched, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostShell for TestHost {
    async fn execute_command(
        &self,
        line: &str,
        io: &mut Streams<'_>,
        cancel: &CancellationToken,
    ) -> scriptkit::Result<i32> {
        self.commands.lock().unwrap().push(line.to_string());

        let (name, rest) = line.split_once(' ').unwrap_or((line, ""));
        match name {
            "echo" => {
                io.write_stdout(&format!("{}\n", rest.trim())).await?;
                Ok(0)
            }
            "true" => Ok(0),
            "false" => Ok(1),
            "status" => Ok(rest.trim().parse().unwrap_or(2)),
            "fail" => Err(scriptkit::Error::Command("simulated failure".to_string())),
            "countdown" => {
                let left = self.countdown.load(Ordering::SeqCst);
                if left == 0 {
                    return Ok(1);
                }
                self.countdown.store(left - 1, Ordering::SeqCst);
                Ok(0)
            }
            "hang" => {
                cancel.cancelled().await;
                Ok(0)
            }
            _ => {
                io.write_stderr(&format!("{name}: unknown command\n")).await?;
                Ok(127)
            }
        }
    }

    fn environment(&self) -> HashMap<String, String> {
        self.env.clone()
    }
}

/// Captured result of one run.
#[derive(Debug)]
pub struct Output {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

pub async fn run_content(runner: &Runner, script: &str, args: &[&str]) -> Output {
    run_content_with(runner, script, args, &CancellationToken::new()).await
}

pub async fn run_content_with(
    runner: &Runner,
    script: &str,
    args: &[&str],
    cancel: &CancellationToken,
) -> Output {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
    let exit_code = runner
        .execute_script_content(script, &args, &mut stdout, &mut stderr, cancel)
        .await;
    Output {
        stdout: String::from_utf8(stdout).unwrap(),
        stderr: String::from_utf8(stderr).unwrap(),
        exit_code,
    }
}

pub async fn run_file(runner: &Runner, path: &str, args: &[&str]) -> Output {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
    let exit_code = runner
        .execute_script_file(
            path,
            &args,
            &mut stdout,
            &mut stderr,
            &CancellationToken::new(),
        )
        .await;
    Output {
        stdout: String::from_utf8(stdout).unwrap(),
        stderr: String::from_utf8(stderr).unwrap(),
        exit_code,
    }
}
