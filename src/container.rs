//! Docker build and run driver.
//!
//! Two sequential invocations sharing the staging directory as working
//! directory. Output streams to the controlling terminal so the user can
//! watch compilation progress. One attempt per phase; a non-zero exit
//! aborts the run with the failing command line in the message.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::process::{CommandRunner, CommandSpec};

/// Build the compilation container image from the staged context.
pub fn build_image(runner: &dyn CommandRunner, staging: &Path, image_tag: &str) -> Result<()> {
    let spec = CommandSpec::new("docker")
        .args(["build", "--rm=true"])
        .arg(format!("--tag={}", image_tag))
        .arg(".")
        .current_dir(staging)
        .streamed();
    let outcome = runner
        .run(&spec)
        .with_context(|| format!("docker build of '{}'", image_tag))?;
    if !outcome.success() {
        bail!(
            "docker build failed with status {:?} (cmd: {})",
            outcome.status_code,
            spec.display_line()
        );
    }
    Ok(())
}

/// Run the built image with the staging directory bind-mounted, so the
/// compiled artifacts land back on the host.
pub fn run_image(
    runner: &dyn CommandRunner,
    staging: &Path,
    image_tag: &str,
    container_mount: &str,
) -> Result<()> {
    let volume = format!("{}:{}:Z", staging.display(), container_mount);
    let spec = CommandSpec::new("docker")
        .args(["run", "--rm", "--volume"])
        .arg(volume)
        .arg(image_tag)
        .current_dir(staging)
        .streamed();
    let outcome = runner
        .run(&spec)
        .with_context(|| format!("docker run of '{}'", image_tag))?;
    if !outcome.success() {
        bail!(
            "docker run failed with status {:?} (cmd: {})",
            outcome.status_code,
            spec.display_line()
        );
    }
    Ok(())
}
