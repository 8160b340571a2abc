//! Output normalization and outcome classification for a single run.

use std::time::Duration;

use crate::config::RunConfig;
use crate::runner::RunResult;

/// Which limit a run exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Time,
    Output,
}

/// Classified result of running one sample.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Output matched the expected output.
    Pass { elapsed: Duration },
    /// The sample has no expected output; counted as a pass.
    NoExpectedOutput { elapsed: Duration },
    /// Output differed from the expected output.
    Mismatch { found: String },
    /// The run hit the time or output limit.
    LimitExceeded(LimitKind),
    /// The program exited with a non-zero status.
    RuntimeError { exit_code: i32 },
    /// The program could not be run at all. `stderr` is whatever the
    /// program wrote before the failure, possibly empty.
    Fatal { message: String, stderr: String },
}

impl RunOutcome {
    /// Whether the outcome counts towards the passed tally.
    pub fn is_pass(&self) -> bool {
        matches!(
            self,
            RunOutcome::Pass { .. } | RunOutcome::NoExpectedOutput { .. }
        )
    }

    /// Whether the outcome is a crash that hands control to recovery.
    pub fn is_crash(&self) -> bool {
        matches!(self, RunOutcome::RuntimeError { .. })
    }
}

/// How runs are judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyMode {
    /// Strip debug lines, enforce the output limit and compare.
    Strict,
    /// Skip comparison; everything that finishes in time passes.
    Diagnostic,
}

/// Turns a [`RunResult`] and the expected output into a [`RunOutcome`].
#[derive(Debug, Clone)]
pub struct Verifier {
    mode: VerifyMode,
    output_limit: u64,
}

impl Verifier {
    /// Create a strict verifier with the given output limit in bytes.
    pub fn new(output_limit: u64) -> Self {
        Self {
            mode: VerifyMode::Strict,
            output_limit,
        }
    }

    /// Create a verifier from run settings.
    pub fn from_config(run: &RunConfig) -> Self {
        let verifier = Self::new(run.output_limit);
        if run.debug {
            verifier.diagnostic()
        } else {
            verifier
        }
    }

    /// Switch to diagnostic mode.
    pub fn diagnostic(mut self) -> Self {
        self.mode = VerifyMode::Diagnostic;
        self
    }

    pub fn mode(&self) -> VerifyMode {
        self.mode
    }

    /// Classify a finished run.
    pub fn verify(&self, expected: &str, result: &RunResult) -> RunOutcome {
        if result.timed_out {
            return RunOutcome::LimitExceeded(LimitKind::Time);
        }

        // Killed by the runner for flooding stdout; the captured text is cut short
        if result.output_exceeded {
            return RunOutcome::LimitExceeded(LimitKind::Output);
        }

        if self.mode == VerifyMode::Diagnostic {
            return RunOutcome::Pass {
                elapsed: result.elapsed,
            };
        }

        if !result.success {
            return RunOutcome::RuntimeError {
                exit_code: result.exit_code,
            };
        }

        let found = normalize_output(result.stdout());
        if found.len() as u64 > self.output_limit {
            return RunOutcome::LimitExceeded(LimitKind::Output);
        }

        if found == expected {
            RunOutcome::Pass {
                elapsed: result.elapsed,
            }
        } else if expected.is_empty() {
            RunOutcome::NoExpectedOutput {
                elapsed: result.elapsed,
            }
        } else {
            RunOutcome::Mismatch { found }
        }
    }
}

/// Whether a stdout line is instrumentation rather than program output.
fn is_debug_line(line: &str) -> bool {
    line.starts_with('\x1b') || line.starts_with("DEBUG")
}

/// Drop debug lines and trim surrounding whitespace.
pub fn normalize_output(stdout: &str) -> String {
    stdout
        .lines()
        .filter(|line| !is_debug_line(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
