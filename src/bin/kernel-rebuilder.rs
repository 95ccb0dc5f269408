use anyhow::{bail, Context, Result};

use kernel_rebuilder::pipeline::{rebuild, UserIdentity};
use kernel_rebuilder::process::HostRunner;
use kernel_rebuilder::{preflight, resolve, RebuildConfig};

fn usage() -> &'static str {
    "Usage:\n  kernel-rebuilder\n\nRebuilds the Raspberry Pi 3 kernel in a Docker container and writes the\nartifacts back over the resolved input files. Takes no arguments; optional\noverrides are read from kernel-rebuild.toml in the working directory."
}

fn main() -> Result<()> {
    if std::env::args().len() > 1 {
        bail!(usage());
    }

    preflight::check_host_tools()?;

    let cwd = std::env::current_dir().context("resolving current directory")?;
    let config = RebuildConfig::load(&cwd)?;

    let runner = HostRunner;
    let toolchain_root = resolve::toolchain_root(&runner)?;

    rebuild(
        &config,
        &runner,
        &cwd,
        &toolchain_root,
        UserIdentity::current(),
    )
}
