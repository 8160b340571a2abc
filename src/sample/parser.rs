//! Regex-based splitter for `%%`-delimited sample files.

use regex::Regex;

use super::Sample;
use crate::core::error::{Error, Result};

/// A delimiter is a whole line of two or more `%`, optionally followed by blanks.
const DELIMITER_PATTERN: &str = r"(?m)^%{2,}[ \t]*\r?(?:\n|\z)";

/// Splits sample file text into (input, expected output) pairs.
pub struct SampleParser {
    delimiter: Regex,
}

impl SampleParser {
    /// Create a parser for the standard `%%` delimiter.
    pub fn new() -> Result<Self> {
        let delimiter = Regex::new(DELIMITER_PATTERN).map_err(|e| {
            Error::config(format!("invalid sample delimiter '{}': {}", DELIMITER_PATTERN, e))
        })?;
        Ok(Self { delimiter })
    }

    /// Split `content` into trimmed segments, in file order.
    pub fn segments<'a>(&self, content: &'a str) -> Vec<&'a str> {
        self.delimiter.split(content).map(str::trim).collect()
    }

    /// Parse sample file text.
    ///
    /// Segments pair up 0-1, 2-3, ...; an unpaired trailing segment becomes a
    /// sample with an empty expected output.
    pub fn parse(&self, content: &str) -> Vec<Sample> {
        self.segments(content)
            .chunks(2)
            .map(|pair| Sample::new(pair[0], pair.get(1).copied().unwrap_or_default()))
            .collect()
    }
}
