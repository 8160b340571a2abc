//! Runner trait and the process implementation that executes one sample.

use crate::core::error::Result;
use std::time::Duration;

pub mod process;

pub use process::ProcessRunner;

/// Raw stdout allowed on top of twice the output limit before a run is killed.
const CAPTURE_HEADROOM: u64 = 1 << 20;

/// Resource limits applied to a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    /// Wall-clock time after which the process is killed.
    pub time: Duration,
    /// Output limit in bytes, checked on normalized stdout.
    pub output: u64,
}

impl RunLimits {
    /// Limits with the given time and no output limit.
    pub fn new(time: Duration) -> Self {
        Self {
            time,
            output: u64::MAX,
        }
    }

    /// Set the output limit in bytes.
    pub fn with_output(mut self, bytes: u64) -> Self {
        self.output = bytes;
        self
    }

    /// Most raw stdout bytes a runner should hold before killing the program.
    pub fn capture_cap(&self) -> u64 {
        self.output
            .saturating_mul(2)
            .saturating_add(CAPTURE_HEADROOM)
    }
}

/// Runner trait for executing a program against one input.
pub trait Runner: Send + Sync {
    /// Run `command` with `input` on stdin.
    ///
    /// Returns `Err` only when the process could not be started or waited
    /// for; timeouts and non-zero exits are reported in the [`RunResult`].
    fn run(&self, command: &str, input: &str, limits: &RunLimits) -> Result<RunResult>;

    /// Get a human-readable name for this runner.
    fn name(&self) -> &str;

    /// Stderr captured by the most recent run, if the runner keeps it.
    ///
    /// Used to show diagnostics when [`Runner::run`] returned an error.
    fn last_stderr(&self) -> Option<String> {
        None
    }
}

/// Result of running a program once.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Exit code, or -1 when the process was killed by a signal.
    pub exit_code: i32,

    /// Whether the process exited successfully.
    pub success: bool,

    /// Captured stdout/stderr output.
    pub captured_output: Option<CapturedOutput>,

    /// Whether the run was terminated due to a timeout.
    pub timed_out: bool,

    /// Whether the run was killed for writing past the capture cap.
    pub output_exceeded: bool,

    /// Wall-clock time from spawn to exit.
    pub elapsed: Duration,
}

/// Captured stdout and stderr from a runner execution.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    /// Create a new run result.
    pub fn new(exit_code: i32, success: bool) -> Self {
        Self {
            exit_code,
            success,
            captured_output: None,
            timed_out: false,
            output_exceeded: false,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a successful result with exit code 0.
    pub fn success() -> Self {
        Self::new(0, true)
    }

    /// Create a failed result with the given exit code.
    pub fn failed(exit_code: i32) -> Self {
        Self::new(exit_code, false)
    }

    /// Attach captured output to the result.
    pub fn with_output(mut self, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.captured_output = Some(CapturedOutput {
            stdout: stdout.into(),
            stderr: stderr.into(),
        });
        self
    }

    /// Mark the result as timed out.
    pub fn with_timeout(mut self) -> Self {
        self.timed_out = true;
        self
    }

    /// Mark the result as killed for excessive output.
    pub fn with_output_exceeded(mut self) -> Self {
        self.output_exceeded = true;
        self
    }

    /// Record the elapsed wall-clock time.
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Captured stdout, or an empty string.
    pub fn stdout(&self) -> &str {
        self.captured_output
            .as_ref()
            .map(|c| c.stdout.as_str())
            .unwrap_or_default()
    }

    /// Captured stderr, or an empty string.
    pub fn stderr(&self) -> &str {
        self.captured_output
            .as_ref()
            .map(|c| c.stderr.as_str())
            .unwrap_or_default()
    }
}
