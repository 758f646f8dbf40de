//! Sequential execution of external commands through `sh -c`.
//!
//! Extraction strategies describe their work as a list of [`Step`]s; running
//! them is left to a [`CommandRunner`] so plans can be inspected and executed
//! against a fake in tests.

use crate::error::{InstallError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Placeholder substituted with the matched path in [`Step::IfMatch`] commands.
pub const MATCH: &str = "{match}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Any,
    Dir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Run {
        label: Option<String>,
        command: String,
    },
    /// Runs `command` against the first path matching `pattern`; skipped when
    /// nothing matches.
    IfMatch {
        pattern: String,
        kind: MatchKind,
        command: String,
    },
}

impl Step {
    pub fn run(command: impl Into<String>) -> Self {
        Step::Run {
            label: None,
            command: command.into(),
        }
    }

    pub fn labeled(label: impl Into<String>, command: impl Into<String>) -> Self {
        Step::Run {
            label: Some(label.into()),
            command: command.into(),
        }
    }

    pub fn if_match(pattern: impl Into<String>, kind: MatchKind, command: impl Into<String>) -> Self {
        Step::IfMatch {
            pattern: pattern.into(),
            kind,
            command: command.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    /// stdout followed by stderr.
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

pub trait CommandRunner {
    fn run(&self, command: &str) -> std::io::Result<CommandOutput>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> std::io::Result<CommandOutput> {
        tracing::debug!("Executing: sh -c {:?}", command);
        let output = Command::new("sh").arg("-c").arg(command).output()?;
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(CommandOutput {
            code: output.status.code(),
            output: combined,
        })
    }
}

/// Quote a path for interpolation into a shell command line.
pub fn quote(path: &Path) -> String {
    shell_words::quote(&path.to_string_lossy()).into_owned()
}

/// Escape a path so it matches literally inside a glob pattern.
pub fn glob_literal(path: &Path) -> String {
    glob::Pattern::escape(&path.to_string_lossy())
}

fn first_match(pattern: &str, kind: MatchKind) -> Option<PathBuf> {
    let paths = match glob::glob(pattern) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::warn!("Ignoring invalid pattern {}: {}", pattern, e);
            return None;
        }
    };
    let mut matches: Vec<PathBuf> = paths
        .filter_map(|entry| entry.ok())
        .filter(|path| kind == MatchKind::Any || path.is_dir())
        .collect();
    matches.sort();
    matches.into_iter().next()
}

/// Run `steps` in order, stopping at the first command that fails.
pub fn run_sequence<R: CommandRunner + ?Sized>(runner: &R, steps: &[Step]) -> Result<()> {
    for step in steps {
        let command = match step {
            Step::Run { label, command } => {
                if let Some(label) = label {
                    tracing::info!("{}", label);
                }
                command.clone()
            }
            Step::IfMatch {
                pattern,
                kind,
                command,
            } => match first_match(pattern, *kind) {
                Some(path) => command.replace(MATCH, &quote(&path)),
                None => {
                    tracing::debug!("Nothing matches {}, skipping", pattern);
                    continue;
                }
            },
        };

        let output = runner.run(&command).map_err(|e| InstallError::Command {
            command: command.clone(),
            reason: e.to_string(),
        })?;

        if !output.success() {
            tracing::error!("{}", output.output);
            let reason = match output.code {
                Some(code) => format!("exit status {}", code),
                None => "terminated by signal".to_string(),
            };
            return Err(InstallError::Command { command, reason });
        }
    }
    Ok(())
}
