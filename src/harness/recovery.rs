//! One-shot recovery after the first runtime crash in a batch.

use crate::build::{BuildStep, BuildTarget};
use crate::core::error::Result;

/// Recovery state. `Recovering` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    Normal,
    Recovering,
}

/// Owns the build target for a batch and rebuilds it with debug symbols
/// the first time a sample crashes.
#[derive(Debug)]
pub struct RecoveryController {
    state: RecoveryState,
    build: BuildStep,
    target: BuildTarget,
    debug_flag: String,
}

impl RecoveryController {
    pub fn new(build: BuildStep, target: BuildTarget, debug_flag: impl Into<String>) -> Self {
        Self {
            state: RecoveryState::Normal,
            build,
            target,
            debug_flag: debug_flag.into(),
        }
    }

    pub fn state(&self) -> RecoveryState {
        self.state
    }

    /// Target the next run should use.
    pub fn target(&self) -> &BuildTarget {
        &self.target
    }

    /// Move from `Normal` to `Recovering`.
    ///
    /// Native targets are rebuilt with the debug flag appended; a failed
    /// rebuild is returned as an error. Returns `false` without doing
    /// anything when recovery already happened.
    pub fn begin(&mut self) -> Result<bool> {
        if self.state == RecoveryState::Recovering {
            return Ok(false);
        }
        self.state = RecoveryState::Recovering;

        if self.target.is_native() {
            self.target = self.target.clone().with_debug_symbols(&self.debug_flag);
            let status = self.build.rebuild(&self.target)?;
            tracing::info!(?status, flag = %self.debug_flag, "rebuilt with debug symbols");
        } else {
            tracing::info!("interpreted target, skipping debug rebuild");
        }
        Ok(true)
    }
}
