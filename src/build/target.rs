use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::{Replacement, TargetTemplate};
use crate::core::error::{Error, Result};

/// The program selected for this invocation.
///
/// Paths are relative to the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildTarget {
    /// A program compiled into an artifact before running.
    Native {
        source: PathBuf,
        build_command: String,
        run_command: String,
        artifact: PathBuf,
    },
    /// A script run directly by an interpreter.
    Interpreted { source: PathBuf, run_command: String },
}

impl BuildTarget {
    /// Instantiate a template for project `name`.
    pub fn from_template(template: &TargetTemplate, name: &str) -> Self {
        let source = PathBuf::from(render(&template.source, name));
        let run_command = render(&template.run, name);

        if template.build.trim().is_empty() {
            return BuildTarget::Interpreted {
                source,
                run_command,
            };
        }

        let artifact = if template.artifact.is_empty() {
            PathBuf::from(name)
        } else {
            PathBuf::from(render(&template.artifact, name))
        };
        BuildTarget::Native {
            source,
            build_command: render(&template.build, name),
            run_command,
            artifact,
        }
    }

    /// Source file of the program.
    pub fn source(&self) -> &Path {
        match self {
            BuildTarget::Native { source, .. } | BuildTarget::Interpreted { source, .. } => source,
        }
    }

    /// Command that runs the program.
    pub fn run_command(&self) -> &str {
        match self {
            BuildTarget::Native { run_command, .. }
            | BuildTarget::Interpreted { run_command, .. } => run_command,
        }
    }

    /// Build command, if the program needs compiling.
    pub fn build_command(&self) -> Option<&str> {
        match self {
            BuildTarget::Native { build_command, .. } => Some(build_command),
            BuildTarget::Interpreted { .. } => None,
        }
    }

    /// Build artifact, if the program needs compiling.
    pub fn artifact(&self) -> Option<&Path> {
        match self {
            BuildTarget::Native { artifact, .. } => Some(artifact),
            BuildTarget::Interpreted { .. } => None,
        }
    }

    /// Whether the program is compiled before running.
    pub fn is_native(&self) -> bool {
        matches!(self, BuildTarget::Native { .. })
    }

    /// Rewrite build flags to match an online judge.
    pub fn with_judge_flags(self, replacements: &[Replacement]) -> Self {
        self.map_build_command(|cmd| {
            replacements
                .iter()
                .fold(cmd.to_string(), |acc, r| acc.replace(&r.from, &r.to))
        })
    }

    /// The same target built with `flag` appended, for post-crash debugging.
    pub fn with_debug_symbols(self, flag: &str) -> Self {
        if flag.trim().is_empty() {
            return self;
        }
        self.map_build_command(|cmd| format!("{} {}", cmd, flag))
    }

    fn map_build_command(self, f: impl FnOnce(&str) -> String) -> Self {
        match self {
            BuildTarget::Native {
                source,
                build_command,
                run_command,
                artifact,
            } => BuildTarget::Native {
                build_command: f(&build_command),
                source,
                run_command,
                artifact,
            },
            interpreted => interpreted,
        }
    }
}

/// Pick the first template whose source file is in `files`.
pub fn resolve_target(
    templates: &[TargetTemplate],
    name: &str,
    files: &HashSet<String>,
) -> Result<BuildTarget> {
    templates
        .iter()
        .find(|t| files.contains(&render(&t.source, name)))
        .map(|t| BuildTarget::from_template(t, name))
        .ok_or_else(|| Error::SourceNotFound(name.to_string()))
}

fn render(template: &str, name: &str) -> String {
    template.replace("{name}", name)
}
