//! Input file resolution.
//!
//! Every build input is looked up first in the working directory, then in
//! the kernel repository checkout under the Go toolchain root. Resolution
//! of all inputs happens up front so a missing file aborts the run before
//! any external process is started.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::process::{CommandRunner, CommandSpec};

/// Query the Go toolchain root (`GOPATH`) once at startup.
///
/// Goes through the [`CommandRunner`] so tests substitute a fake root
/// without a Go installation.
pub fn toolchain_root(runner: &dyn CommandRunner) -> Result<PathBuf> {
    let spec = CommandSpec::new("go").args(["env", "GOPATH"]);
    let outcome = runner
        .run(&spec)
        .context("querying Go toolchain root ('go env GOPATH')")?;
    if !outcome.success() {
        bail!(
            "'{}' exited with status {:?}",
            spec.display_line(),
            outcome.status_code
        );
    }

    let root = outcome.stdout_trimmed();
    if root.is_empty() {
        bail!("'go env GOPATH' printed an empty toolchain root");
    }
    Ok(PathBuf::from(root))
}

/// Locates named input files in one of two known directories.
#[derive(Debug, Clone)]
pub struct InputResolver {
    cwd: PathBuf,
    secondary: PathBuf,
}

impl InputResolver {
    pub fn new(cwd: &Path, toolchain_root: &Path, secondary_subdir: &str) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            secondary: toolchain_root.join(secondary_subdir),
        }
    }

    /// Return the existing absolute path for `filename`, searching the
    /// working directory first and the kernel repository checkout second.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf> {
        let local = self.cwd.join(filename);
        if local.exists() {
            return Ok(local);
        }

        let secondary = self.secondary.join(filename);
        if secondary.exists() {
            return Ok(secondary);
        }

        bail!(
            "could not find file '{}' (looked in {} and {})",
            filename,
            self.cwd.display(),
            self.secondary.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CommandOutcome;
    use std::fs;
    use tempfile::TempDir;

    struct FixedOutput {
        status_code: Option<i32>,
        stdout: &'static [u8],
    }

    impl CommandRunner for FixedOutput {
        fn run(&self, _spec: &CommandSpec) -> Result<CommandOutcome> {
            Ok(CommandOutcome {
                status_code: self.status_code,
                stdout: self.stdout.to_vec(),
            })
        }
    }

    #[test]
    fn test_toolchain_root_trims_output() {
        let runner = FixedOutput {
            status_code: Some(0),
            stdout: b"/home/user/go\n",
        };
        assert_eq!(
            toolchain_root(&runner).unwrap(),
            PathBuf::from("/home/user/go")
        );
    }

    #[test]
    fn test_toolchain_root_empty_output_is_fatal() {
        let runner = FixedOutput {
            status_code: Some(0),
            stdout: b"\n",
        };
        assert!(toolchain_root(&runner).is_err());
    }

    #[test]
    fn test_toolchain_root_nonzero_exit_is_fatal() {
        let runner = FixedOutput {
            status_code: Some(2),
            stdout: b"",
        };
        assert!(toolchain_root(&runner).is_err());
    }

    fn resolver(cwd: &Path, root: &Path) -> InputResolver {
        InputResolver::new(cwd, root, "src/github.com/gokrazy/kernel")
    }

    #[test]
    fn test_resolve_prefers_working_directory() {
        let cwd = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        let kernel_dir = root.path().join("src/github.com/gokrazy/kernel");
        fs::create_dir_all(&kernel_dir).unwrap();
        fs::write(cwd.path().join("vmlinuz"), b"local").unwrap();
        fs::write(kernel_dir.join("vmlinuz"), b"checkout").unwrap();

        let path = resolver(cwd.path(), root.path()).resolve("vmlinuz").unwrap();
        assert_eq!(path, cwd.path().join("vmlinuz"));
    }

    #[test]
    fn test_resolve_falls_back_to_checkout() {
        let cwd = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        let kernel_dir = root.path().join("src/github.com/gokrazy/kernel");
        fs::create_dir_all(&kernel_dir).unwrap();
        fs::write(kernel_dir.join("a.patch"), b"patch").unwrap();

        let path = resolver(cwd.path(), root.path()).resolve("a.patch").unwrap();
        assert_eq!(path, kernel_dir.join("a.patch"));
    }

    #[test]
    fn test_resolve_miss_names_both_locations() {
        let cwd = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();

        let err = resolver(cwd.path(), root.path())
            .resolve("missing.patch")
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("missing.patch"));
        assert!(msg.contains(&cwd.path().display().to_string()));
        assert!(msg.contains(&root.path().display().to_string()));
    }
}
