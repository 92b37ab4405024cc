//! Child-process helper for tool-backed collectors.

use tokio::process::Command;
use tokio::sync::Mutex;

use hostpulse_core::error::ErrorKind;
use hostpulse_core::{AppError, AppResult};

/// An external tool run at most once at a time.
///
/// A call made while the previous one is still running fails immediately
/// instead of spawning a second process.
#[derive(Debug)]
pub(crate) struct ToolCommand {
    program: String,
    in_flight: Mutex<()>,
}

impl ToolCommand {
    pub(crate) fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            in_flight: Mutex::new(()),
        }
    }

    /// Run the tool with `args` and return its stdout.
    pub(crate) async fn run(&self, args: &[&str]) -> AppResult<String> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            return Err(AppError::collector(format!(
                "{}: previous run still in progress",
                self.program
            )));
        };
        run_command(&self.program, args).await
    }
}

/// Run `program` and return its stdout.
///
/// The child is killed if the returned future is dropped.
async fn run_command(program: &str, args: &[&str]) -> AppResult<String> {
    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Collector, format!("failed to run {program}"), e)
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::collector(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    String::from_utf8(output.stdout).map_err(|e| {
        AppError::with_source(
            ErrorKind::Collector,
            format!("{program} produced non-UTF-8 output"),
            e,
        )
    })
}
