//! External process execution.
//!
//! Every external invocation (the Go cross-build, `docker build`,
//! `docker run`, the toolchain root query) goes through [`CommandRunner`],
//! so tests can substitute a deterministic fake instead of spawning real
//! binaries.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A fully described command invocation.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub envs: Vec<(String, String)>,
    /// Stream stdout/stderr to the controlling terminal instead of
    /// capturing stdout. Build and run output is meant to be watched live.
    pub streamed: bool,
}

impl CommandSpec {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            cwd: None,
            envs: Vec::new(),
            streamed: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn streamed(mut self) -> Self {
        self.streamed = true;
        self
    }

    /// Render as a shell-like line for error messages.
    pub fn display_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// What an invocation produced: the exit status plus captured stdout
/// (empty for streamed invocations).
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub status_code: Option<i32>,
    pub stdout: Vec<u8>,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.status_code == Some(0)
    }

    pub fn stdout_trimmed(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim().to_string()
    }
}

/// Executes [`CommandSpec`]s. The production implementation is
/// [`HostRunner`]; tests inject recording fakes.
pub trait CommandRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutcome>;
}

/// Runs commands on the host, blocking until they finish.
pub struct HostRunner;

impl CommandRunner for HostRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutcome> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &spec.envs {
            cmd.env(key, value);
        }

        if spec.streamed {
            let status = cmd
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .with_context(|| format!("spawning '{}'", spec.display_line()))?;
            Ok(CommandOutcome {
                status_code: status.code(),
                stdout: Vec::new(),
            })
        } else {
            // Captured stdout, passed-through stderr: callers that parse
            // output still want diagnostics visible.
            let output = cmd
                .stderr(Stdio::inherit())
                .output()
                .with_context(|| format!("spawning '{}'", spec.display_line()))?;
            Ok(CommandOutcome {
                status_code: output.status.code(),
                stdout: output.stdout,
            })
        }
    }
}

/// Check if a command exists on the host system.
pub fn exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Fail with an installation hint if a command is missing.
pub fn ensure_exists(cmd: &str, package: &str) -> Result<()> {
    if !exists(cmd) {
        bail!("'{}' not found in PATH (install: {})", cmd, package);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_line_joins_program_and_args() {
        let spec = CommandSpec::new("docker").args(["build", "--rm=true", "."]);
        assert_eq!(spec.display_line(), "docker build --rm=true .");
    }

    #[test]
    fn test_host_runner_captures_stdout() {
        let outcome = HostRunner
            .run(&CommandSpec::new("echo").arg("hello"))
            .unwrap();
        assert!(outcome.success());
        assert_eq!(outcome.stdout_trimmed(), "hello");
    }

    #[test]
    fn test_host_runner_reports_nonzero_exit() {
        let outcome = HostRunner.run(&CommandSpec::new("false")).unwrap();
        assert!(!outcome.success());
    }

    #[test]
    fn test_host_runner_spawn_failure_is_error() {
        let result = HostRunner.run(&CommandSpec::new("definitely_not_a_real_command_12345"));
        assert!(result.is_err());
    }

    #[test]
    fn test_exists() {
        assert!(exists("ls"));
        assert!(!exists("definitely_not_a_real_command_12345"));
    }
}
