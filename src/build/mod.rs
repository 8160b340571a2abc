//! Build step: target selection from `{name}` templates and staleness-checked compilation.

mod target;

pub use target::{BuildTarget, resolve_target};

use crate::core::error::{Error, Result};
use crate::util::{is_stale, shell_command};
use std::path::PathBuf;

/// What [`BuildStep::ensure_built`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    /// The build command ran and succeeded.
    Built,
    /// The artifact was up to date; the build command did not run.
    Skipped,
    /// The target is interpreted.
    NotRequired,
}

/// Runs build commands for a [`BuildTarget`] in a working directory.
#[derive(Debug, Clone)]
pub struct BuildStep {
    workdir: PathBuf,
}

impl BuildStep {
    /// Create a build step rooted at `workdir`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Build the target if its artifact is missing or older than its source.
    pub fn ensure_built(&self, target: &BuildTarget) -> Result<BuildStatus> {
        let (Some(command), Some(artifact)) = (target.build_command(), target.artifact()) else {
            println!("Jumping over compilation phase...");
            return Ok(BuildStatus::NotRequired);
        };

        let source = self.workdir.join(target.source());
        if !is_stale(&self.workdir.join(artifact), &source)? {
            tracing::debug!(artifact = %artifact.display(), "artifact is up to date");
            println!("Jumping over compilation phase...");
            return Ok(BuildStatus::Skipped);
        }

        self.run_build(command)?;
        Ok(BuildStatus::Built)
    }

    /// Build the target unconditionally.
    pub fn rebuild(&self, target: &BuildTarget) -> Result<BuildStatus> {
        match target.build_command() {
            Some(command) => {
                self.run_build(command)?;
                Ok(BuildStatus::Built)
            }
            None => Ok(BuildStatus::NotRequired),
        }
    }

    fn run_build(&self, command: &str) -> Result<()> {
        println!("Running: {}", command);
        tracing::debug!(command, workdir = %self.workdir.display(), "running build command");

        let status = shell_command(command, &self.workdir)
            .status()
            .map_err(|e| Error::build_failed(command, e))?;

        if !status.success() {
            return Err(Error::build_failed(command, status));
        }
        Ok(())
    }
}
