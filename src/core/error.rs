use std::path::PathBuf;

/// Result type alias for sample-runner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sample-runner.
///
/// Only setup failures live here. Per-sample problems (mismatches, limits,
/// crashes) are reported as [`RunOutcome`](crate::harness::RunOutcome) values.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No source file matched any target template.
    #[error("Source file not found for project '{0}'")]
    SourceNotFound(String),

    /// The sample file does not exist.
    #[error("Sample file not found: {}", .0.display())]
    SampleFileNotFound(PathBuf),

    /// The build command could not be run or exited unsuccessfully.
    #[error("Build failed ({status}): {command}")]
    BuildFailed { command: String, status: String },

    /// `--test` selected a sample that does not exist.
    #[error("Test {index} does not exist (sample file has {count} tests)")]
    TestIndexOutOfRange { index: usize, count: usize },

    /// Runner execution errors.
    #[error("Runner error: {0}")]
    Runner(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {field}: {value}")]
    InvalidConfig { field: String, value: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization error.
    #[error("TOML parsing error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a runner error.
    pub fn runner(msg: impl Into<String>) -> Self {
        Error::Runner(msg.into())
    }

    /// Create a build failure for `command` with a printable status.
    pub fn build_failed(command: impl Into<String>, status: impl ToString) -> Self {
        Error::BuildFailed {
            command: command.into(),
            status: status.to_string(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, value: impl ToString) -> Self {
        Error::InvalidConfig {
            field: field.into(),
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        assert_eq!(
            Error::config("bad value").to_string(),
            "Configuration error: bad value"
        );
        assert_eq!(
            Error::runner("spawn failed").to_string(),
            "Runner error: spawn failed"
        );
        assert_eq!(
            Error::SourceNotFound("a".to_string()).to_string(),
            "Source file not found for project 'a'"
        );
    }

    #[test]
    fn test_error_sample_file_not_found() {
        let err = Error::SampleFileNotFound(PathBuf::from("/missing/a.txt"));
        assert_eq!(err.to_string(), "Sample file not found: /missing/a.txt");
    }

    #[test]
    fn test_error_build_failed() {
        let err = Error::build_failed("g++ -o a a.cpp", "exit status: 1");
        assert_eq!(err.to_string(), "Build failed (exit status: 1): g++ -o a a.cpp");
    }

    #[test]
    fn test_error_test_index_out_of_range() {
        let err = Error::TestIndexOutOfRange { index: 4, count: 3 };
        assert_eq!(
            err.to_string(),
            "Test 4 does not exist (sample file has 3 tests)"
        );
    }

    #[test]
    fn test_error_invalid_config() {
        let err = Error::invalid_config("run.time-limit", -1.0);
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for run.time-limit: -1"
        );
    }
}
