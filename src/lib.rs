//! sample-runner: a local test harness for single-file programs.
//!
//! Given a project name and a working directory holding `<name>.<ext>` and
//! `<name>.txt`, the runner picks a build/run template for the source, builds
//! it when the artifact is stale, splits the sample file into input/expected
//! pairs and runs each pair under a time and output limit.
//!
//! # Quick Start
//!
//! ```no_run
//! use sample_runner::builder;
//!
//! # fn main() -> sample_runner::Result<()> {
//! let report = builder()
//!     .workdir(".")
//!     .project("a")
//!     .from_workdir_config()?
//!     .run()?;
//! println!("{} of {} passed", report.passed, report.total);
//! # Ok(())
//! # }
//! ```
//!
//! # Sample files
//!
//! Segments are separated by lines of two or more `%`. Segments pair up as
//! input, expected output, input, expected output and so on:
//!
//! ```text
//! 1 2
//! %%
//! 3
//! %%
//! 10 20
//! %%
//! 30
//! ```
//!
//! # Configuration
//!
//! `sample-runner.toml` in the working directory overrides the defaults:
//!
//! ```toml
//! [run]
//! time-limit = 1.0
//! combine = "ordered"
//!
//! [toolchain]
//! debug-flag = "-g -fsanitize=address"
//!
//! [[toolchain.targets]]
//! source = "{name}.cpp"
//! build = "clang++ -std=c++20 -O2 -DLOCAL -o {name} {name}.cpp"
//! run = "./{name}"
//! artifact = "{name}"
//!
//! [profiles.judge.run]
//! online-judge = true
//! ```
//!
//! `SAMPLE_RUNNER_PROFILE=judge` selects a profile, and `SAMPLE_RUNNER_*`
//! variables override single settings.
//!
//! # Architecture
//!
//! The pipeline is `SampleParser -> SampleCombiner -> BuildStep -> TestHarness`.
//! Programs are executed through the [`Runner`](runner::Runner) trait; the
//! default [`ProcessRunner`](runner::ProcessRunner) spawns shell commands,
//! polls them against the time limit and caps the stdout it captures.

pub mod build;
pub mod config;
pub mod core;
pub mod harness;
pub mod runner;
pub mod sample;
pub mod util;

// Re-export commonly used types
pub use crate::core::{Error, Result, SampleRunner, SampleRunnerBuilder};
pub use config::{CombinePolicy, Config};
pub use harness::{Report, RunOutcome};
pub use sample::Sample;

/// Create a new sample runner builder.
///
/// This is the main entry point for the fluent API.
pub fn builder() -> SampleRunnerBuilder {
    SampleRunnerBuilder::new()
}
