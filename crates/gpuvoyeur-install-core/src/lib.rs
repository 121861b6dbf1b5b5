//! GPUVoyeur install core - Vulkan layer descriptor deployment.
//!
//! This crate places the GPUVoyeur layer descriptor where the Vulkan loader
//! will find it:
//!
//! - **POSIX**: the descriptor is copied into the first populated
//!   `{mode}_layer.d` search directory and its `layer.library_path` is
//!   rewritten to the absolute path of the layer library.
//! - **Windows**: the descriptor stays in the project's bin directory and is
//!   registered under `HKLM\SOFTWARE\Khronos\Vulkan`.
//!
//! The CLI lives in the `gpuvoyeur-install` crate.
//!
//! # Example
//!
//! ```rust,ignore
//! use gpuvoyeur_install::{ActivationMode, InstallConfig, LayerInstaller};
//!
//! fn main() -> gpuvoyeur_install::Result<()> {
//!     let config = InstallConfig::new("/opt/gpuvoyeur", ActivationMode::Explicit);
//!     let report = LayerInstaller::new(config)?.run()?;
//!     println!("Installed {:?}", report.installed_descriptor);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod descriptor;
pub mod error;
pub mod install;
pub mod platform;

// Re-export commonly used types
pub use config::{ActivationMode, InstallConfig, LayerConfig, PathsConfig, RegistryConfig};
pub use descriptor::{DescriptorLocator, DescriptorSearchResult, LayerDescriptor};
pub use error::{InstallError, Result};
pub use install::{
    copy_descriptor, install_descriptor, patch_library_path, InstallReport, LayerInstaller,
};
pub use platform::{
    find_project_root, install_target, LayerRegistry, Platform, ProjectLayout, SystemRegistry,
};
