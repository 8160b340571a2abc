//! Test harness that runs every sample of a batch and tallies the results.
//!
//! The harness sits after the build step in the pipeline:
//! `SampleParser -> SampleCombiner -> BuildStep -> TestHarness`.
//! Each sample goes through the runner, the [`Verifier`] classifies it, and
//! the [`ResultFormatter`] prints the narrative. The first runtime crash hands
//! control to the [`RecoveryController`] and ends the batch.

mod formatter;
mod recovery;
mod verifier;

pub use formatter::{ResultFormatter, STDERR_PREVIEW_BYTES};
pub use recovery::{RecoveryController, RecoveryState};
pub use verifier::{LimitKind, RunOutcome, Verifier, VerifyMode, normalize_output};

use crate::config::RunConfig;
use crate::core::error::Result;
use crate::runner::{RunLimits, RunResult, Runner};
use crate::sample::Sample;

/// Tally of a finished batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    /// Samples that passed.
    pub passed: usize,
    /// Samples that were attempted.
    pub total: usize,
    /// Whether recovery stopped the batch early.
    pub halted: bool,
    /// Outcome of every attempted sample, in order.
    pub outcomes: Vec<RunOutcome>,
}

impl Report {
    fn record(&mut self, outcome: RunOutcome) {
        self.total += 1;
        if outcome.is_pass() {
            self.passed += 1;
        }
        self.outcomes.push(outcome);
    }

    /// Whether every attempted sample passed.
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

/// Runs samples through a [`Runner`] and reports on them.
pub struct TestHarness<'a> {
    runner: &'a dyn Runner,
    verifier: Verifier,
    formatter: ResultFormatter,
    limits: RunLimits,
}

impl<'a> TestHarness<'a> {
    /// Create a harness from run settings.
    pub fn new(runner: &'a dyn Runner, config: &RunConfig) -> Result<Self> {
        let limits = RunLimits::new(config.time_limit()?).with_output(config.output_limit);
        Ok(Self {
            runner,
            verifier: Verifier::from_config(config),
            formatter: ResultFormatter::new(config.debug),
            limits,
        })
    }

    /// Run one sample and classify it.
    ///
    /// Runner errors become [`RunOutcome::Fatal`], carrying whatever stderr
    /// the runner still has from the failed attempt.
    pub fn execute(&self, command: &str, sample: &Sample) -> (RunOutcome, Option<RunResult>) {
        match self.runner.run(command, &sample.input, &self.limits) {
            Ok(result) => (self.verifier.verify(&sample.expected, &result), Some(result)),
            Err(e) => {
                tracing::warn!(runner = self.runner.name(), error = %e, "run failed");
                (
                    RunOutcome::Fatal {
                        message: e.to_string(),
                        stderr: self.runner.last_stderr().unwrap_or_default(),
                    },
                    None,
                )
            }
        }
    }

    /// Run the batch, stopping after recovery from the first crash.
    ///
    /// Returns an error only when the debug rebuild fails.
    pub fn run(&self, samples: &[Sample], recovery: &mut RecoveryController) -> Result<Report> {
        let mut report = Report::default();

        for (i, sample) in samples.iter().enumerate() {
            let index = i + 1;
            self.formatter.print_label(index);

            let (outcome, result) = self.execute(recovery.target().run_command(), sample);
            self.formatter.report(sample, result.as_ref(), &outcome);
            let crashed = outcome.is_crash();
            report.record(outcome);

            if crashed {
                tracing::info!(test = index, "runtime error, entering recovery");
                if recovery.begin()? {
                    let (rerun, result) = self.execute(recovery.target().run_command(), sample);
                    self.formatter.report_rerun(index, result.as_ref(), &rerun);
                }
                report.halted = true;
                break;
            }
        }

        self.formatter.print_summary(&report);
        Ok(report)
    }
}
