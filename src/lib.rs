//! Containerized Raspberry Pi 3 kernel rebuild.
//!
//! Orchestrates a reproducible cross-compilation of the gokrazy Linux
//! kernel inside a Docker container:
//!
//! - **Input resolution** - locates patches, kernel image, and device-tree
//!   blobs in the working directory or the kernel repository checkout
//! - **Staging** - ephemeral build context with the cross-built helper and
//!   the patch set
//! - **Dockerfile rendering** - fixed template parameterized by the
//!   invoking user's uid/gid and the ordered patch list
//! - **Container driver** - `docker build` then `docker run` with the
//!   staging directory bind-mounted
//! - **Result extraction** - produced artifacts overwrite the resolved
//!   input paths
//!
//! The pipeline is strictly sequential and fail-fast; the staging
//! directory never outlives the run.

pub mod config;
pub mod container;
pub mod dockerfile;
pub mod pipeline;
pub mod preflight;
pub mod process;
pub mod resolve;
pub mod staging;

pub use config::RebuildConfig;
pub use pipeline::{rebuild, UserIdentity};
pub use process::{CommandRunner, HostRunner};
