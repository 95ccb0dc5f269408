//! Staging directory management.
//!
//! The staging directory is the Docker build context and the bind-mount
//! target for the build result. It lives under `/tmp` explicitly because
//! Docker only allows volume mounts under certain paths on some platforms
//! (notably macOS). The [`Staging`] wrapper removes the directory when
//! dropped, so every exit path cleans up.

use anyhow::{bail, Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::process::{CommandRunner, CommandSpec};

const STAGING_PREFIX: &str = "gokr-rebuild-kernel";

/// Ephemeral, exclusively owned staging directory.
pub struct Staging {
    dir: TempDir,
}

impl Staging {
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in("/tmp")
            .context("creating staging directory under /tmp")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Copy `source` into the staging directory under its base filename.
    pub fn stage_file(&self, source: &Path) -> Result<()> {
        let filename = source
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("input path has no filename: {}", source.display()))?;
        copy_file(source, &self.path().join(filename))
    }

    /// Write the rendered container build definition into the staging
    /// directory.
    pub fn write_dockerfile(&self, contents: &str) -> Result<PathBuf> {
        let path = self.path().join("Dockerfile");
        fs::write(&path, contents)
            .with_context(|| format!("writing Dockerfile '{}'", path.display()))?;
        Ok(path)
    }

    /// Cross-build the in-container helper into the staging directory.
    ///
    /// The helper runs inside the (Linux) container, so the build targets
    /// Linux regardless of the host OS.
    pub fn build_helper(&self, runner: &dyn CommandRunner, helper_module: &str) -> Result<()> {
        let spec = CommandSpec::new("go")
            .args(["build", helper_module])
            .current_dir(self.path())
            .env("GOOS", "linux")
            .streamed();
        let outcome = runner
            .run(&spec)
            .with_context(|| format!("building helper '{}'", helper_module))?;
        if !outcome.success() {
            bail!(
                "helper build failed with status {:?} (cmd: {})",
                outcome.status_code,
                spec.display_line()
            );
        }
        Ok(())
    }
}

/// Whole-file streaming copy that preserves the source permission bits.
pub fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    let mut input = fs::File::open(source)
        .with_context(|| format!("opening '{}' for copy", source.display()))?;
    let mut output = fs::File::create(dest)
        .with_context(|| format!("creating '{}' for copy", dest.display()))?;

    io::copy(&mut input, &mut output).with_context(|| {
        format!(
            "copying '{}' to '{}'",
            source.display(),
            dest.display()
        )
    })?;

    let metadata = input
        .metadata()
        .with_context(|| format!("reading metadata of '{}'", source.display()))?;
    output
        .set_permissions(metadata.permissions())
        .with_context(|| format!("setting permissions on '{}'", dest.display()))?;

    Ok(())
}
