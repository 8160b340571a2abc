use clap::Parser;
use sample_runner::config::{CombinePolicy, Config, ConfigLoader, env};
use sample_runner::{Report, Result, builder};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Build a single-file program and check it against its sample file.
#[derive(Parser, Debug)]
#[command(name = "sample-runner", version)]
struct Cli {
    /// Project name: `<name>.<ext>` is the source, `<name>.txt` the samples
    #[arg(default_value = sample_runner::core::DEFAULT_PROJECT)]
    name: String,

    /// Time limit per run, in seconds
    #[arg(short = 't', long = "time")]
    time: Option<f64>,

    /// Output limit per run, in KB
    #[arg(long = "output", value_name = "KB")]
    output: Option<u64>,

    /// How samples are merged into runs
    #[arg(long = "comb", visible_alias = "sample-combine", value_enum)]
    combine: Option<CombinePolicy>,

    /// Build with online-judge flags
    #[arg(long)]
    check: bool,

    /// Diagnostic mode: print raw output instead of comparing
    #[arg(long = "dbg", visible_alias = "debug")]
    debug: bool,

    /// Prefix each run's input with its case count
    #[arg(long = "case-num")]
    case_num: bool,

    /// Run only the n-th sample (1-based, 0 = all)
    #[arg(long = "test", value_name = "N")]
    test: Option<usize>,

    /// Seed for the shuffle policy
    #[arg(long)]
    seed: Option<u64>,

    /// Standalone TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Exit with status 1 when any sample fails
    #[arg(long)]
    strict: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Working directory holding the source and sample files
    #[arg(short = 'C', long = "dir", value_name = "PATH")]
    dir: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line flags over the loaded configuration.
    fn apply(&self, config: &mut Config) {
        let run = &mut config.run;
        if let Some(time) = self.time {
            run.time_limit = time;
        }
        if let Some(kb) = self.output {
            run.output_limit = kb.saturating_mul(1024);
        }
        if let Some(combine) = self.combine {
            run.combine = combine;
        }
        if let Some(index) = self.test {
            run.test_index = index;
        }
        if self.seed.is_some() {
            run.seed = self.seed;
        }
        run.online_judge |= self.check;
        run.debug |= self.debug;
        run.case_numbering |= self.case_num;
        run.strict_exit |= self.strict;
        config.verbose |= self.verbose;
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over the verbose setting.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the layered configuration and apply the command line over it.
fn load_config(cli: &Cli, workdir: &Path) -> Result<Config> {
    let mut loader = ConfigLoader::new().workdir(workdir);
    if let Some(path) = &cli.config {
        loader = loader.config_file(path);
    }
    let mut config = loader.load()?;
    cli.apply(&mut config);
    Ok(config)
}

/// Whether the process should exit with a failure status.
fn should_fail(report: &Report, strict: bool) -> bool {
    strict && !report.all_passed()
}

fn run(cli: Cli) -> Result<(Report, bool)> {
    let workdir = match &cli.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    println!("Current working directory: {}", workdir.display());

    let config = load_config(&cli, &workdir)?;
    init_logging(config.verbose);

    for (key, value) in env::detect_active_overrides() {
        tracing::debug!(%key, %value, "environment override active");
    }

    if config.run.combine != CombinePolicy::Shuffle && config.run.seed.is_some() {
        tracing::debug!("seed has no effect without the shuffle policy");
    }

    let strict = config.run.strict_exit;
    let report = builder()
        .with_config(config)
        .workdir(workdir)
        .project(cli.name)
        .run()?;
    Ok((report, strict))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok((report, strict)) if should_fail(&report, strict) => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sample_runner::RunOutcome;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("sample-runner").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_leave_config_untouched() {
        let cli = parse(&[]);
        assert_eq!(cli.name, "a");

        let mut config = Config::default();
        cli.apply(&mut config);
        let defaults = Config::default();
        assert_eq!(config.run.time_limit, defaults.run.time_limit);
        assert_eq!(config.run.output_limit, defaults.run.output_limit);
        assert_eq!(config.run.combine, defaults.run.combine);
        assert_eq!(config.run.seed, None);
        assert!(!config.run.debug);
        assert!(!config.run.strict_exit);
        assert!(!config.verbose);
    }

    #[test]
    fn test_output_is_given_in_kilobytes() {
        let mut config = Config::default();
        parse(&["--output", "64"]).apply(&mut config);
        assert_eq!(config.run.output_limit, 64 * 1024);

        parse(&["--output", &u64::MAX.to_string()]).apply(&mut config);
        assert_eq!(config.run.output_limit, u64::MAX);
    }

    #[test]
    fn test_flags_only_switch_settings_on() {
        let mut config = Config::default();
        config.run.online_judge = true;
        config.run.strict_exit = true;
        config.verbose = true;

        parse(&["--dbg"]).apply(&mut config);
        assert!(config.run.online_judge);
        assert!(config.run.strict_exit);
        assert!(config.verbose);
        assert!(config.run.debug);
        assert!(!config.run.case_numbering);
    }

    #[test]
    fn test_values_and_aliases() {
        let cli = parse(&[
            "prob",
            "-t",
            "2.5",
            "--sample-combine",
            "shuffle",
            "--seed",
            "7",
            "--test",
            "3",
            "--debug",
            "--case-num",
            "--check",
            "--strict",
            "-v",
            "-C",
            "/tmp/work",
        ]);
        assert_eq!(cli.name, "prob");
        assert_eq!(cli.dir.as_deref(), Some(Path::new("/tmp/work")));

        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.run.time_limit, 2.5);
        assert_eq!(config.run.combine, CombinePolicy::Shuffle);
        assert_eq!(config.run.seed, Some(7));
        assert_eq!(config.run.test_index, 3);
        assert!(config.run.debug);
        assert!(config.run.case_numbering);
        assert!(config.run.online_judge);
        assert!(config.run.strict_exit);
        assert!(config.verbose);
    }

    #[test]
    fn test_unknown_combine_policy_rejected() {
        assert!(Cli::try_parse_from(["sample-runner", "--comb", "sideways"]).is_err());
    }

    #[test]
    fn test_strict_exit_only_on_failures() {
        let mut report = Report {
            passed: 2,
            total: 2,
            halted: false,
            outcomes: Vec::new(),
        };
        assert!(!should_fail(&report, true));

        report.total = 3;
        report.outcomes.push(RunOutcome::Mismatch {
            found: "4".to_string(),
        });
        assert!(should_fail(&report, true));
        assert!(!should_fail(&report, false));
    }

    #[test]
    fn test_load_config_reads_workdir_file_before_flags() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(sample_runner::config::CONFIG_FILE_NAME),
            "verbose = true\n[run]\ntime-limit = 3.0\n",
        )
        .unwrap();

        let config = load_config(&parse(&["-t", "0.5"]), dir.path()).unwrap();
        assert!(config.verbose);
        assert_eq!(config.run.time_limit, 0.5);
    }
}
