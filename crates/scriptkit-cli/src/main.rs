//! Scriptkit CLI - run line-oriented scripts against the system shell
//!
//! Usage:
//!   scriptkit -c 'echo hello'          # Execute script text
//!   scriptkit script.sh a b            # Execute a script file with arguments
//!   scriptkit --timeout 30 script.sh   # Abort after 30 seconds

mod system;

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser};
use scriptkit::{ExecutionLimits, Runner};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use system::{DiskFs, SystemShell};

/// Scriptkit - line-oriented shell script interpreter
#[derive(Parser, Debug)]
#[command(name = "scriptkit")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Execute the given script text
    #[arg(short = 'c')]
    command: Option<String>,

    /// Script file to execute (with -c, the first script argument)
    #[arg()]
    script: Option<PathBuf>,

    /// Arguments to pass to the script
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,

    /// Abort the script after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Shell used to run command lines
    #[arg(long, default_value = "sh")]
    shell: String,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let mut builder =
        Runner::builder(Arc::new(SystemShell::new(args.shell))).fs(Arc::new(DiskFs));
    if let Some(secs) = args.timeout {
        builder = builder.limits(ExecutionLimits::new().timeout(Duration::from_secs(secs)));
    }
    let runner = builder.build();

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, cancelling script");
                cancel.cancel();
            }
        }
    });

    let mut stdout = tokio::io::stdout();
    let mut stderr = tokio::io::stderr();

    let code = match (args.command, args.script) {
        (Some(content), first) => {
            let script_args: Vec<String> = first
                .map(|p| p.to_string_lossy().into_owned())
                .into_iter()
                .chain(args.args)
                .collect();
            runner
                .execute_script_content(&content, &script_args, &mut stdout, &mut stderr, &cancel)
                .await
        }
        (None, Some(path)) => {
            runner
                .execute_script_file(&path, &args.args, &mut stdout, &mut stderr, &cancel)
                .await
        }
        (None, None) => {
            eprintln!("scriptkit: no script given (use -c TEXT or a script path)");
            2
        }
    };

    std::process::exit(code);
}

/// Log to stderr. `RUST_LOG` overrides the `-v` level.
fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).context("invalid log filter")?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!(e))
}
