use crate::build::{BuildStep, BuildTarget, resolve_target};
use crate::config::{Config, ConfigLoader};
use crate::core::error::{Error, Result};
use crate::harness::{RecoveryController, Report, TestHarness};
use crate::runner::{ProcessRunner, Runner};
use crate::sample::{SampleCombiner, load_samples};
use crate::util::list_file_names;
use std::path::{Path, PathBuf};

/// Project name used when none is given.
pub const DEFAULT_PROJECT: &str = "a";

/// Builder for creating and running a sample batch.
pub struct SampleRunnerBuilder {
    config: Option<Config>,
    workdir: Option<PathBuf>,
    project: String,
    runner: Option<Box<dyn Runner>>,
}

impl SampleRunnerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: None,
            workdir: None,
            project: DEFAULT_PROJECT.to_string(),
            runner: None,
        }
    }

    /// Set the configuration directly.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Load configuration from `sample-runner.toml` in the working directory
    /// and the environment. The working directory must be set first.
    pub fn from_workdir_config(mut self) -> Result<Self> {
        let workdir = self
            .workdir
            .clone()
            .ok_or_else(|| Error::config("working directory not set (call workdir first)"))?;
        self.config = Some(ConfigLoader::new().workdir(workdir).load()?);
        Ok(self)
    }

    /// Load configuration from a standalone TOML file and the environment.
    pub fn from_config_file(mut self, path: impl Into<PathBuf>) -> Result<Self> {
        self.config = Some(ConfigLoader::new().config_file(path).load()?);
        Ok(self)
    }

    /// Set the directory holding the source and sample files.
    pub fn workdir(mut self, path: impl Into<PathBuf>) -> Self {
        self.workdir = Some(path.into());
        self
    }

    /// Set the project name: `<name>.<ext>` is the source, `<name>.txt` the samples.
    pub fn project(mut self, name: impl Into<String>) -> Self {
        self.project = name.into();
        self
    }

    /// Set a custom runner implementation.
    pub fn runner<R: Runner + 'static>(mut self, runner: R) -> Self {
        self.runner = Some(Box::new(runner));
        self
    }

    /// Build the sample runner.
    pub fn build(self) -> Result<SampleRunner> {
        let config = self.config.unwrap_or_default();
        config.run.validate()?;

        let workdir = match self.workdir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };

        if self.project.trim().is_empty() {
            return Err(Error::config("project name must not be empty"));
        }

        let runner = match self.runner {
            Some(r) => r,
            None => Box::new(ProcessRunner::new(&workdir)?),
        };

        Ok(SampleRunner {
            config,
            workdir,
            project: self.project,
            runner,
        })
    }

    /// Build and immediately run.
    pub fn run(self) -> Result<Report> {
        self.build()?.run()
    }
}

impl Default for SampleRunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Orchestrates target selection, build, sample loading and the test batch.
pub struct SampleRunner {
    config: Config,
    workdir: PathBuf,
    project: String,
    runner: Box<dyn Runner>,
}

impl SampleRunner {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Path of the sample file, `<workdir>/<name>.txt`.
    pub fn sample_path(&self) -> PathBuf {
        self.workdir.join(format!("{}.txt", self.project))
    }

    /// Select the build target from the files present in the working directory.
    ///
    /// Online-judge flag rewrites are applied here.
    pub fn resolve_target(&self) -> Result<BuildTarget> {
        let files = list_file_names(&self.workdir)?;
        let target = resolve_target(&self.config.toolchain.targets, &self.project, &files)?;
        tracing::info!(source = %target.source().display(), native = target.is_native(), "selected target");

        if self.config.run.online_judge {
            Ok(target.with_judge_flags(&self.config.toolchain.judge_replacements))
        } else {
            Ok(target)
        }
    }

    /// Run the full pipeline: select, build, load samples, run the batch.
    pub fn run(&self) -> Result<Report> {
        let run = &self.config.run;
        let target = self.resolve_target()?;

        let build = BuildStep::new(&self.workdir);
        build.ensure_built(&target)?;

        let samples = load_samples(&self.sample_path())?;
        let combiner = SampleCombiner::from_config(run);
        tracing::debug!(policy = ?run.combine, seed = combiner.seed(), "combining samples");
        let samples = combiner.combine(samples)?;

        if self.config.verbose {
            println!("Running with: {}", self.runner.name());
        }

        let harness = TestHarness::new(self.runner.as_ref(), run)?;
        let mut recovery =
            RecoveryController::new(build, target, self.config.toolchain.debug_flag.clone());
        harness.run(&samples, &mut recovery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetTemplate;
    use crate::runner::{RunLimits, RunResult};

    /// Echoes the input back as output.
    struct EchoRunner;

    impl Runner for EchoRunner {
        fn run(&self, _command: &str, input: &str, _limits: &RunLimits) -> Result<RunResult> {
            Ok(RunResult::success().with_output(input, ""))
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    fn echo_config() -> Config {
        let mut config = Config::default();
        config.toolchain.targets = vec![TargetTemplate::interpreted("{name}.sh", "sh {name}.sh")];
        config
    }

    #[test]
    fn test_sample_path() {
        let runner = SampleRunnerBuilder::new()
            .workdir("/work")
            .project("prob")
            .runner(EchoRunner)
            .build()
            .unwrap();
        assert_eq!(runner.sample_path(), PathBuf::from("/work/prob.txt"));
    }

    #[test]
    fn test_run_with_echo_runner() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.sh"), "cat\n").unwrap();
        std::fs::write(dir.path().join("a.txt"), "1\n%%\n1\n%%\n2\n%%\n3\n").unwrap();

        let report = SampleRunnerBuilder::new()
            .with_config(echo_config())
            .workdir(dir.path())
            .runner(EchoRunner)
            .run()
            .unwrap();
        assert_eq!(report.passed, 1);
        assert_eq!(report.total, 2);
    }

    #[test]
    fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "1\n%%\n1\n").unwrap();

        let err = SampleRunnerBuilder::new()
            .with_config(echo_config())
            .workdir(dir.path())
            .runner(EchoRunner)
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(name) if name == "a"));
    }

    #[test]
    fn test_missing_sample_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.sh"), "cat\n").unwrap();

        let err = SampleRunnerBuilder::new()
            .with_config(echo_config())
            .workdir(dir.path())
            .runner(EchoRunner)
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::SampleFileNotFound(path) if path.ends_with("a.txt")));
    }

    #[test]
    fn test_judge_flags_applied() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.cpp"), "").unwrap();
        let mut config = Config::default();
        config.run.online_judge = true;

        let runner = SampleRunnerBuilder::new()
            .with_config(config)
            .workdir(dir.path())
            .runner(EchoRunner)
            .build()
            .unwrap();
        let target = runner.resolve_target().unwrap();
        assert_eq!(
            target.build_command(),
            Some("g++ -std=c++17 -O2 -DONLINE_JUDGE -o a a.cpp")
        );
    }

    #[test]
    fn test_invalid_config_rejected_at_build() {
        let mut config = Config::default();
        config.run.time_limit = -1.0;
        let result = SampleRunnerBuilder::new()
            .with_config(config)
            .workdir("/work")
            .runner(EchoRunner)
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_from_workdir_config_requires_workdir() {
        let result = SampleRunnerBuilder::new().from_workdir_config();
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
