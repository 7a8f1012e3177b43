//! Post-write validation through an external compose tool.
//!
//! Validation never fails the operation that wrote the file: the written
//! descriptor stays in place and the outcome is reported as a [`Verdict`].

use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Stdio};

/// Outcome of validating a written descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The tool accepted the file
    Valid,
    /// The tool rejected the file; carries its diagnostic output
    Invalid(String),
    /// The tool could not be run
    Unavailable(String),
}

/// Something that can check a descriptor file.
pub trait Validator {
    /// Validate the descriptor at `path`.
    fn validate(&self, path: &Path) -> Verdict;
}

/// Runs `<program> <args...> -f <path> config` and judges by exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandValidator {
    program: String,
    args: Vec<String>,
}

impl CommandValidator {
    /// Build from a full argv prefix such as `["docker", "compose"]`.
    ///
    /// Returns `None` for an empty argv.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    /// The `docker compose` plugin.
    pub fn docker_compose() -> Self {
        Self {
            program: "docker".to_string(),
            args: vec!["compose".to_string()],
        }
    }

    /// The command line, for display.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for CommandValidator {
    fn default() -> Self {
        Self::docker_compose()
    }
}

impl Validator for CommandValidator {
    fn validate(&self, path: &Path) -> Verdict {
        log::debug!("validating {} with {}", path.display(), self.command_line());
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("-f")
            .arg(path)
            .arg("config")
            .stdin(Stdio::null())
            .output();

        match output {
            Ok(out) if out.status.success() => Verdict::Valid,
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
                let message = if stderr.is_empty() {
                    String::from_utf8_lossy(&out.stdout).trim().to_string()
                } else {
                    stderr
                };
                Verdict::Invalid(message)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Verdict::Unavailable(format!("'{}' is not installed or not on PATH", self.program))
            }
            Err(e) => Verdict::Unavailable(format!("failed to run {}: {e}", self.command_line())),
        }
    }
}
