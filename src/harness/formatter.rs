//! Terminal narrative for sample runs.

use std::io::Write;
use std::time::Duration;

use colored::Colorize;

use super::Report;
use super::verifier::{LimitKind, RunOutcome};
use crate::runner::RunResult;
use crate::sample::Sample;

/// Maximum number of stderr bytes shown for a failing run.
pub const STDERR_PREVIEW_BYTES: usize = 4096;

const SUMMARY_RULE: &str = "------------------------";

/// Formats and prints per-sample results and the final tally.
pub struct ResultFormatter {
    diagnostic: bool,
}

impl ResultFormatter {
    /// Create a formatter; `diagnostic` switches to raw output dumps.
    pub fn new(diagnostic: bool) -> Self {
        Self { diagnostic }
    }

    /// Print the `Test <n>... ` label, leaving the cursor on the same line.
    pub fn print_label(&self, index: usize) {
        print!("Test {}... ", index);
        let _ = std::io::stdout().flush();
    }

    /// Print the narrative for one finished sample.
    pub fn report(&self, sample: &Sample, result: Option<&RunResult>, outcome: &RunOutcome) {
        println!("{}", self.render_outcome(sample, result, outcome));
    }

    /// Print the narrative for the post-crash rerun.
    pub fn report_rerun(&self, index: usize, result: Option<&RunResult>, outcome: &RunOutcome) {
        println!("{}", render_rerun(index, result, outcome));
    }

    /// Print the summary rule and tally.
    pub fn print_summary(&self, report: &Report) {
        println!("{}", render_summary(report));
    }

    /// Render the narrative for one finished sample.
    pub fn render_outcome(
        &self,
        sample: &Sample,
        result: Option<&RunResult>,
        outcome: &RunOutcome,
    ) -> String {
        if self.diagnostic {
            if let (Some(result), RunOutcome::Pass { .. }) = (result, outcome) {
                return render_diagnostic(sample, result);
            }
        }

        match outcome {
            RunOutcome::Pass { elapsed } => {
                format!("{}, time = {}", "OK".green(), seconds(*elapsed))
            }
            RunOutcome::NoExpectedOutput { elapsed } => format!(
                "{} (no expected output), time = {}",
                "OK".green(),
                seconds(*elapsed)
            ),
            RunOutcome::Mismatch { found } => format!(
                "{}\n{}\n{}\n{}\n{}\n{}\n{}",
                "Unexpected Output".red(),
                "Input:".cyan(),
                sample.input,
                "Expected:".green(),
                sample.expected,
                "Found:".red(),
                found
            ),
            RunOutcome::LimitExceeded(LimitKind::Time) => "Time limit exceeded".red().to_string(),
            RunOutcome::LimitExceeded(LimitKind::Output) => {
                "Output limit exceeded".red().to_string()
            }
            RunOutcome::RuntimeError { exit_code } => {
                format!("{} (exit code {})", "Runtime error".red(), exit_code)
            }
            RunOutcome::Fatal { message, stderr } => {
                let mut out = format!("{} {}", "Exception found:".red(), message);
                if !stderr.is_empty() {
                    out.push('\n');
                    out.push_str(&render_stderr(stderr));
                }
                out
            }
        }
    }
}

fn render_diagnostic(sample: &Sample, result: &RunResult) -> String {
    let mut out = format!(
        "time = {}\n{}\n{}\n{}\n{}",
        seconds(result.elapsed),
        "Input:".cyan(),
        sample.input,
        "Output:".cyan(),
        result.stdout().trim_end()
    );
    if !result.success {
        out.push_str(&format!("\nExit status: {}\n", result.exit_code));
        out.push_str(&render_stderr(result.stderr()));
    }
    out
}

fn render_rerun(index: usize, result: Option<&RunResult>, outcome: &RunOutcome) -> String {
    let mut out = format!("Re-running test {} with debug symbols...\n", index);
    match (result, outcome) {
        (_, RunOutcome::Fatal { message, stderr }) => {
            out.push_str(&format!("{} {}\n", "Exception found:".red(), message));
            if !stderr.is_empty() {
                out.push_str(&render_stderr(stderr));
                out.push('\n');
            }
        }
        (Some(result), _) => {
            if result.timed_out {
                out.push_str(&format!("{}\n", "Time limit exceeded".red()));
            } else {
                out.push_str(&format!("Exit status: {}\n", result.exit_code));
            }
            out.push_str(&render_stderr(result.stderr()));
            out.push('\n');
        }
        (None, _) => {}
    }
    out.push_str(&format!("Test {} {}", index, "failed".red()));
    out
}

/// Render the stderr block, truncated to [`STDERR_PREVIEW_BYTES`].
pub fn render_stderr(stderr: &str) -> String {
    format!(
        "Stderr info:\n{}\n========",
        truncate_at_boundary(stderr, STDERR_PREVIEW_BYTES).trim_end()
    )
}

/// Render the summary rule and the `<passed> out of <total>` line.
pub fn render_summary(report: &Report) -> String {
    format!(
        "{}\n{} out of {} tests passed.",
        SUMMARY_RULE, report.passed, report.total
    )
}

fn truncate_at_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn seconds(elapsed: Duration) -> String {
    format!("{:.3}s", elapsed.as_secs_f64())
}
