//! Configuration types and loading from `sample-runner.toml`, profiles and env vars.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub mod env;
mod loader;
pub use loader::ConfigLoader;

/// Name of the configuration file picked up from the working directory.
pub const CONFIG_FILE_NAME: &str = "sample-runner.toml";

/// Complete configuration for sample-runner.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Per-invocation run settings.
    #[serde(default)]
    pub run: RunConfig,

    /// Build and run command templates.
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    /// Enable verbose output (debug-level logging).
    #[serde(default)]
    pub verbose: bool,
}

impl Config {
    /// Parse a configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a configuration from a standalone TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }
}

/// Sample combination policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum CombinePolicy {
    /// Run every sample on its own.
    #[default]
    None,
    /// Concatenate all samples, in file order, into one run.
    Ordered,
    /// Shuffle the samples, then concatenate them into one run.
    Shuffle,
}

impl CombinePolicy {
    /// Whether the samples are merged into a single run.
    pub fn combines(self) -> bool {
        matches!(self, CombinePolicy::Ordered | CombinePolicy::Shuffle)
    }
}

impl FromStr for CombinePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(CombinePolicy::None),
            "ordered" => Ok(CombinePolicy::Ordered),
            "shuffle" => Ok(CombinePolicy::Shuffle),
            other => Err(Error::invalid_config("combine", other)),
        }
    }
}

/// Immutable per-invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RunConfig {
    /// Wall-clock time limit per run, in seconds.
    pub time_limit: f64,

    /// Maximum size of the normalized output, in bytes.
    pub output_limit: u64,

    /// How samples are combined before running.
    pub combine: CombinePolicy,

    /// Rewrite build flags to emulate an online judge.
    pub online_judge: bool,

    /// Diagnostic mode: print raw results and skip verification.
    pub debug: bool,

    /// Prefix inputs with the number of test cases.
    pub case_numbering: bool,

    /// Run a single sample (1-based); 0 runs all of them.
    #[serde(rename = "test")]
    pub test_index: usize,

    /// Seed for the shuffle policy.
    pub seed: Option<u64>,

    /// Exit with a non-zero status when any sample fails.
    pub strict_exit: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            time_limit: 2.0,
            output_limit: 65536 * 1024,
            combine: CombinePolicy::None,
            online_judge: false,
            debug: false,
            case_numbering: false,
            test_index: 0,
            seed: None,
            strict_exit: false,
        }
    }
}

impl RunConfig {
    /// Time limit as a [`Duration`].
    pub fn time_limit(&self) -> Result<Duration> {
        if !(self.time_limit.is_finite() && self.time_limit > 0.0) {
            return Err(Error::invalid_config("run.time-limit", self.time_limit));
        }
        Duration::try_from_secs_f64(self.time_limit)
            .map_err(|_| Error::invalid_config("run.time-limit", self.time_limit))
    }

    /// Check that the settings can be used for a run.
    pub fn validate(&self) -> Result<()> {
        self.time_limit()?;
        Ok(())
    }
}

/// Build/run command templates and build-flag rewriting rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ToolchainConfig {
    /// Target templates in priority order; the first existing source wins.
    pub targets: Vec<TargetTemplate>,

    /// Flag appended to native build commands when rebuilding after a crash.
    pub debug_flag: String,

    /// Substring replacements applied to build commands in online-judge mode.
    pub judge_replacements: Vec<Replacement>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            targets: vec![
                TargetTemplate::native(
                    "{name}.cpp",
                    "g++ -std=c++17 -O2 -DLOCAL -o {name} {name}.cpp",
                    "./{name}",
                    "{name}",
                ),
                TargetTemplate::native(
                    "{name}.c",
                    "gcc -std=c11 -O2 -DLOCAL -o {name} {name}.c -lm",
                    "./{name}",
                    "{name}",
                ),
                TargetTemplate::native(
                    "{name}.rs",
                    "rustc -O --cfg local -o {name} {name}.rs",
                    "./{name}",
                    "{name}",
                ),
                TargetTemplate::interpreted("{name}.py", "python3 {name}.py"),
            ],
            debug_flag: "-g".to_string(),
            judge_replacements: vec![
                Replacement::new("-DLOCAL", "-DONLINE_JUDGE"),
                Replacement::new("--cfg local", "--cfg online_judge"),
            ],
        }
    }
}

/// A `{name}`-parameterized description of how to build and run one kind of source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetTemplate {
    /// Source file name, e.g. `{name}.cpp`.
    pub source: String,

    /// Build command; empty for interpreted targets.
    #[serde(default)]
    pub build: String,

    /// Command that runs the program.
    pub run: String,

    /// Build artifact whose timestamp is compared against the source.
    #[serde(default)]
    pub artifact: String,
}

impl TargetTemplate {
    /// Template for a compiled program.
    pub fn native(source: &str, build: &str, run: &str, artifact: &str) -> Self {
        Self {
            source: source.to_string(),
            build: build.to_string(),
            run: run.to_string(),
            artifact: artifact.to_string(),
        }
    }

    /// Template for a script run by an interpreter.
    pub fn interpreted(source: &str, run: &str) -> Self {
        Self {
            source: source.to_string(),
            build: String::new(),
            run: run.to_string(),
            artifact: String::new(),
        }
    }
}

/// A literal `from` -> `to` substring replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

impl Replacement {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}
