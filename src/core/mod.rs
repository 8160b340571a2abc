//! Core types for the sample pipeline: the runner builder and error handling.

pub mod builder;
pub mod error;

pub use builder::{DEFAULT_PROJECT, SampleRunner, SampleRunnerBuilder};
pub use error::{Error, Result};
