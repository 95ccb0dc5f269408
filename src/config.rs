//! Rebuild configuration.
//!
//! Everything fixed about a rebuild lives in [`RebuildConfig`] so the
//! pipeline and its tests receive explicit values instead of sharing
//! constants. A `kernel-rebuild.toml` in the working directory may override
//! individual fields; without one the defaults describe the stock
//! gokrazy/kernel rebuild.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Patches applied to the kernel tree, in application order.
const DEFAULT_PATCHES: &[&str] = &[
    "0001-Revert-add-index-to-the-ethernet-alias.patch",
    // serial
    "0101-expose-UART0-ttyAMA0-on-GPIO-14-15-disable-UART1-tty.patch",
    "0102-expose-UART0-ttyAMA0-on-GPIO-14-15-disable-UART1-tty.patch",
];

pub const CONFIG_FILENAME: &str = "kernel-rebuild.toml";

#[derive(Debug, Clone)]
pub struct RebuildConfig {
    /// Ordered patch filenames; order matters for application upstream.
    pub patches: Vec<String>,
    /// Kernel image filename, both input and produced artifact.
    pub kernel_image: String,
    /// Device-tree blob filenames, both inputs and produced artifacts.
    pub dtbs: Vec<String>,
    /// Docker image tag for the compilation container.
    pub image_tag: String,
    /// Base image of the compilation container.
    pub base_image: String,
    /// Packages installed into the container for the cross-build.
    pub build_packages: Vec<String>,
    /// Go module path of the in-container build helper.
    pub helper_module: String,
    /// Helper binary name (last element of the module path).
    pub helper_binary: String,
    /// Where the staging directory is mounted inside the container.
    pub container_mount: String,
    /// Sub-path under the toolchain root holding the kernel repository,
    /// searched after the working directory.
    pub secondary_search_subdir: String,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            patches: DEFAULT_PATCHES.iter().map(|s| s.to_string()).collect(),
            kernel_image: "vmlinuz".to_string(),
            dtbs: vec![
                "bcm2710-rpi-3-b.dtb".to_string(),
                "bcm2710-rpi-3-b-plus.dtb".to_string(),
            ],
            image_tag: "gokr-rebuild-kernel".to_string(),
            base_image: "debian:stretch".to_string(),
            build_packages: vec![
                "crossbuild-essential-arm64".to_string(),
                "bc".to_string(),
                "libssl-dev".to_string(),
                "bison".to_string(),
                "flex".to_string(),
            ],
            helper_module: "github.com/gokrazy/kernel/cmd/gokr-build-kernel".to_string(),
            helper_binary: "gokr-build-kernel".to_string(),
            container_mount: "/tmp/buildresult".to_string(),
            secondary_search_subdir: "src/github.com/gokrazy/kernel".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RebuildToml {
    patches: Option<Vec<String>>,
    kernel_image: Option<String>,
    dtbs: Option<Vec<String>>,
    image_tag: Option<String>,
    base_image: Option<String>,
    build_packages: Option<Vec<String>>,
}

impl RebuildConfig {
    /// Load the configuration, applying overrides from
    /// `kernel-rebuild.toml` in `dir` when present.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut config = Self::default();

        let config_path = dir.join(CONFIG_FILENAME);
        if !config_path.is_file() {
            return Ok(config);
        }

        let raw = fs::read_to_string(&config_path)
            .with_context(|| format!("reading config '{}'", config_path.display()))?;
        let parsed: RebuildToml = toml::from_str(&raw)
            .with_context(|| format!("parsing config '{}'", config_path.display()))?;

        if let Some(patches) = parsed.patches {
            if patches.is_empty() {
                bail!(
                    "invalid config '{}': patches must not be empty",
                    config_path.display()
                );
            }
            config.patches = patches;
        }
        if let Some(kernel_image) = parsed.kernel_image {
            config.kernel_image = kernel_image;
        }
        if let Some(dtbs) = parsed.dtbs {
            config.dtbs = dtbs;
        }
        if let Some(image_tag) = parsed.image_tag {
            config.image_tag = image_tag;
        }
        if let Some(base_image) = parsed.base_image {
            config.base_image = base_image;
        }
        if let Some(build_packages) = parsed.build_packages {
            config.build_packages = build_packages;
        }

        Ok(config)
    }

    /// Every file the resolver must locate before the build starts.
    pub fn required_inputs(&self) -> Vec<&str> {
        let mut inputs: Vec<&str> = self.patches.iter().map(|s| s.as_str()).collect();
        inputs.push(self.kernel_image.as_str());
        inputs.extend(self.dtbs.iter().map(|s| s.as_str()));
        inputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_config_file() {
        let temp = TempDir::new().unwrap();
        let config = RebuildConfig::load(temp.path()).unwrap();

        assert_eq!(config.patches.len(), 3);
        assert_eq!(config.kernel_image, "vmlinuz");
        assert_eq!(config.image_tag, "gokr-rebuild-kernel");
    }

    #[test]
    fn test_overrides_applied() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILENAME),
            "image_tag = \"custom-rebuild\"\npatches = [\"only.patch\"]\n",
        )
        .unwrap();

        let config = RebuildConfig::load(temp.path()).unwrap();
        assert_eq!(config.image_tag, "custom-rebuild");
        assert_eq!(config.patches, vec!["only.patch"]);
        // untouched fields keep their defaults
        assert_eq!(config.base_image, "debian:stretch");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILENAME), "no_such_field = 1\n").unwrap();

        assert!(RebuildConfig::load(temp.path()).is_err());
    }

    #[test]
    fn test_empty_patch_list_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILENAME), "patches = []\n").unwrap();

        assert!(RebuildConfig::load(temp.path()).is_err());
    }

    #[test]
    fn test_required_inputs_order() {
        let config = RebuildConfig::default();
        let inputs = config.required_inputs();

        assert_eq!(inputs.len(), 6);
        assert!(inputs[0].starts_with("0001-"));
        assert_eq!(inputs[3], "vmlinuz");
        assert_eq!(inputs[5], "bcm2710-rpi-3-b-plus.dtb");
    }
}
