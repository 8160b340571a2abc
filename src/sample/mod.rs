//! Sample files: parsing `%%`-delimited input/output pairs and combining them into runs.
//!
//! The pipeline is `load_samples` -> [`SampleCombiner::combine`] -> harness. The combined
//! set is read-only once the harness starts.

mod combiner;
mod parser;

pub use combiner::SampleCombiner;
pub use parser::SampleParser;

use crate::core::error::{Error, Result};
use std::path::Path;

/// One input/expected-output pair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sample {
    /// Text delivered on the program's stdin.
    pub input: String,
    /// Expected stdout after normalization; empty when the file gives none.
    pub expected: String,
}

impl Sample {
    /// Create a sample from input and expected output.
    pub fn new(input: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected: expected.into(),
        }
    }
}

/// Read and parse a sample file.
pub fn load_samples(path: &Path) -> Result<Vec<Sample>> {
    if !path.is_file() {
        return Err(Error::SampleFileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let samples = SampleParser::new()?.parse(&content);
    tracing::debug!(path = %path.display(), count = samples.len(), "parsed sample file");
    Ok(samples)
}
