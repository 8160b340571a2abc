//! Filesystem and process helpers.

pub mod fs;
pub mod shell;

pub use fs::{is_stale, list_file_names};
pub use shell::shell_command;
