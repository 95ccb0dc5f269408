//! The rebuild pipeline.
//!
//! Strictly sequential: resolve inputs, stage, render, container build,
//! container run, extract results. Every step is fail-fast; the staging
//! directory is removed on every exit path because [`Staging`] owns it.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::RebuildConfig;
use crate::container;
use crate::dockerfile::{self, RenderContext};
use crate::process::CommandRunner;
use crate::resolve::InputResolver;
use crate::staging::{copy_file, Staging};

/// Numeric identity of the invoking user, embedded into the container so
/// build artifacts come back owned by the caller.
#[derive(Debug, Clone, Copy)]
pub struct UserIdentity {
    pub uid: u32,
    pub gid: u32,
}

impl UserIdentity {
    pub fn current() -> Self {
        // getuid/getgid cannot fail.
        Self {
            uid: unsafe { libc::getuid() },
            gid: unsafe { libc::getgid() },
        }
    }
}

/// Absolute locations of every required input, resolved before any
/// external process runs.
#[derive(Debug)]
struct ResolvedInputs {
    patches: Vec<PathBuf>,
    kernel_image: PathBuf,
    dtbs: Vec<PathBuf>,
}

/// Run the whole rebuild: the only entry point of the crate.
///
/// `toolchain_root` is resolved by the caller (see
/// [`crate::resolve::toolchain_root`]) so tests can substitute a fake root.
pub fn rebuild(
    config: &RebuildConfig,
    runner: &dyn CommandRunner,
    cwd: &Path,
    toolchain_root: &Path,
    identity: UserIdentity,
) -> Result<()> {
    let resolver = InputResolver::new(cwd, toolchain_root, &config.secondary_search_subdir);
    let inputs = resolve_inputs(config, &resolver)?;

    let staging = Staging::create()?;
    run_staged(config, runner, &staging, &inputs, identity)
}

fn resolve_inputs(config: &RebuildConfig, resolver: &InputResolver) -> Result<ResolvedInputs> {
    let patches = config
        .patches
        .iter()
        .map(|name| resolver.resolve(name))
        .collect::<Result<Vec<_>>>()
        .context("resolving patch files")?;
    let kernel_image = resolver
        .resolve(&config.kernel_image)
        .context("resolving kernel image")?;
    let dtbs = config
        .dtbs
        .iter()
        .map(|name| resolver.resolve(name))
        .collect::<Result<Vec<_>>>()
        .context("resolving device-tree blobs")?;

    Ok(ResolvedInputs {
        patches,
        kernel_image,
        dtbs,
    })
}

fn run_staged(
    config: &RebuildConfig,
    runner: &dyn CommandRunner,
    staging: &Staging,
    inputs: &ResolvedInputs,
    identity: UserIdentity,
) -> Result<()> {
    println!("[rebuild] staging build inputs in {}", staging.path().display());
    staging
        .build_helper(runner, &config.helper_module)
        .context("staging: helper build")?;
    for patch in &inputs.patches {
        staging
            .stage_file(patch)
            .with_context(|| format!("staging patch '{}'", patch.display()))?;
    }

    let rendered = dockerfile::render(&RenderContext {
        uid: identity.uid,
        gid: identity.gid,
        patches: config.patches.clone(),
        base_image: config.base_image.clone(),
        build_packages: config.build_packages.clone(),
        helper_binary: config.helper_binary.clone(),
    });
    staging.write_dockerfile(&rendered)?;

    println!("[rebuild] building docker container for kernel compilation");
    container::build_image(runner, staging.path(), &config.image_tag)
        .context("container build phase")?;

    println!("[rebuild] compiling kernel");
    container::run_image(
        runner,
        staging.path(),
        &config.image_tag,
        &config.container_mount,
    )
    .context("container run phase")?;

    extract_results(config, staging.path(), inputs)
}

/// Copy the produced artifacts from the staging directory back over the
/// paths the corresponding inputs were resolved at.
fn extract_results(config: &RebuildConfig, staging: &Path, inputs: &ResolvedInputs) -> Result<()> {
    copy_file(&staging.join(&config.kernel_image), &inputs.kernel_image)
        .context("extracting kernel image")?;
    for (name, dest) in config.dtbs.iter().zip(&inputs.dtbs) {
        copy_file(&staging.join(name), dest)
            .with_context(|| format!("extracting device-tree blob '{}'", name))?;
    }

    println!(
        "[rebuild] kernel artifacts written back to {}",
        inputs.kernel_image.display()
    );
    Ok(())
}
