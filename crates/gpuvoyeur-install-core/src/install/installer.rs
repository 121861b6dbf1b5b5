//! End-to-end layer installation.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::steps::{copy_descriptor, install_descriptor};
use crate::config::{ActivationMode, InstallConfig};
use crate::descriptor::DescriptorLocator;
use crate::error::Result;
use crate::platform::{
    install_target, layer_key_path, LayerRegistry, Platform, ProjectLayout, SystemRegistry,
};

/// What an install run changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub mode: ActivationMode,
    pub platform: Platform,
    /// Descriptor copied next to the layer library.
    pub bin_descriptor: PathBuf,
    /// Descriptor placed in the loader search directory (POSIX only).
    pub installed_descriptor: Option<PathBuf>,
    /// Registry key the layer was registered under (Windows only).
    pub registry_key: Option<String>,
}

/// Drives one install run from an `InstallConfig`.
///
/// Collaborators default to the host's search bases and registry and can be
/// replaced for testing.
pub struct LayerInstaller {
    config: InstallConfig,
    layout: ProjectLayout,
    locator: DescriptorLocator,
    registry: Box<dyn LayerRegistry>,
}

impl LayerInstaller {
    /// Create an installer for the host system.
    pub fn new(config: InstallConfig) -> Result<Self> {
        let layout = ProjectLayout::new(&config)?;
        Ok(Self {
            config,
            layout,
            locator: DescriptorLocator::system(),
            registry: Box::new(SystemRegistry),
        })
    }

    pub fn with_locator(mut self, locator: DescriptorLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_registry(mut self, registry: impl LayerRegistry + 'static) -> Self {
        self.registry = Box::new(registry);
        self
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Run the install for the configured platform.
    pub fn run(&self) -> Result<InstallReport> {
        let mode = self.config.mode;
        info!("Starting {} layer installation", self.config.layer_name);
        info!("Layer mode: {}", mode);

        if let Some(path) = &self.config.config_install_path {
            debug!(
                "Config install path {} is not used by the layer install",
                path.display()
            );
        }

        let source = self.layout.source_descriptor(mode);
        let bin_descriptor = self.layout.bin_descriptor();
        info!("Layer source: {}", source.display());
        info!("Layer dest: {}", bin_descriptor.display());

        let report = match self.config.platform {
            Platform::WindowsLike => self.run_windows(source, bin_descriptor)?,
            Platform::PosixLike => self.run_posix(source, bin_descriptor)?,
        };

        info!("{} layer installation complete", self.config.layer_name);
        Ok(report)
    }

    fn run_windows(&self, source: PathBuf, bin_descriptor: PathBuf) -> Result<InstallReport> {
        let mode = self.config.mode;

        if let Some(path) = &self.config.search_path_override {
            warn!(
                "Ignoring layer search path {} (only used on POSIX systems)",
                path.display()
            );
        }

        copy_descriptor(&source, &bin_descriptor)?;
        self.registry.register_layer(mode, &bin_descriptor)?;

        Ok(InstallReport {
            mode,
            platform: Platform::WindowsLike,
            bin_descriptor,
            installed_descriptor: None,
            registry_key: Some(layer_key_path(mode)),
        })
    }

    fn run_posix(&self, source: PathBuf, bin_descriptor: PathBuf) -> Result<InstallReport> {
        let mode = self.config.mode;

        // Resolve before writing anything so a miss leaves the host untouched.
        let search_dir = self
            .locator
            .require(mode, self.config.search_path_override.as_deref())?;
        let target = install_target(&search_dir, mode, &self.layout.descriptor_file_name());

        copy_descriptor(&source, &bin_descriptor)?;

        info!("Copying layer JSON to layer search directory");
        install_descriptor(
            &source,
            &target,
            &self.layout.library_path(),
            Platform::PosixLike,
        )?;
        info!("Layer JSON copied to {}", target.display());

        Ok(InstallReport {
            mode,
            platform: Platform::PosixLike,
            bin_descriptor,
            installed_descriptor: Some(target),
            registry_key: None,
        })
    }
}
