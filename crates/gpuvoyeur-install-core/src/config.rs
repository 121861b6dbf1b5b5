//! Centralized configuration for the layer installer.
//!
//! Constant holders cover naming, filesystem layout and registry locations.
//! `InstallConfig` is the runtime configuration, built once at startup and
//! passed by reference into every component.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{InstallError, Result};
use crate::platform::Platform;

/// Layer naming and descriptor format.
pub struct LayerConfig;

impl LayerConfig {
    pub const LAYER_NAME: &'static str = "GPUVoyeur";
    pub const DESCRIPTOR_PREFIX: &'static str = "VkLayer_";
    pub const DESCRIPTOR_EXTENSION: &'static str = "json";
    pub const DESCRIPTOR_INDENT: &'static [u8] = b"    ";
    /// Object holding the layer definition inside a descriptor.
    pub const LAYER_KEY: &'static str = "layer";
    pub const LIBRARY_PATH_KEY: &'static str = "library_path";
}

/// Project directory names and the layer search locations.
pub struct PathsConfig;

impl PathsConfig {
    pub const RESOURCES_DIR_NAME: &'static str = "resources";
    pub const BIN_DIR_NAME: &'static str = "bin";
    pub const LINUX_OS_DIR_NAME: &'static str = "Linux";
    pub const WINDOWS_OS_DIR_NAME: &'static str = "windows";
    pub const LAYER_DIR_SUFFIX: &'static str = "_layer.d";

    /// System-wide search bases, in loader precedence order.
    pub const SYSTEM_SEARCH_BASES: [&'static str; 4] = [
        "/usr/local/etc/vulkan",
        "/usr/local/share/vulkan",
        "/etc/vulkan",
        "/usr/share/vulkan",
    ];

    /// Per-user search base, relative to the home directory. Searched last.
    pub const USER_SEARCH_BASE: &'static str = ".local/share/vulkan";
}

/// Windows registry locations for layer registration.
pub struct RegistryConfig;

impl RegistryConfig {
    /// Parent key under `HKEY_LOCAL_MACHINE`.
    pub const VULKAN_KEY: &'static str = r"SOFTWARE\Khronos\Vulkan";
    pub const EXPLICIT_SUBKEY: &'static str = "ExplicitLayers";
    pub const IMPLICIT_SUBKEY: &'static str = "ImplicitLayers";
    /// `REG_DWORD` payload; 0 means the layer is enabled.
    pub const LAYER_ENABLED_VALUE: u32 = 0;
}

/// Whether the layer is always loaded or must be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActivationMode {
    #[default]
    Explicit,
    Implicit,
}

impl ActivationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivationMode::Explicit => "explicit",
            ActivationMode::Implicit => "implicit",
        }
    }

    /// Name of the loader search subdirectory, e.g. `explicit_layer.d`.
    pub fn layer_dir_name(&self) -> String {
        format!("{}{}", self.as_str(), PathsConfig::LAYER_DIR_SUFFIX)
    }

    pub fn registry_subkey(&self) -> &'static str {
        match self {
            ActivationMode::Explicit => RegistryConfig::EXPLICIT_SUBKEY,
            ActivationMode::Implicit => RegistryConfig::IMPLICIT_SUBKEY,
        }
    }

    /// Parse a mode, accepting the short aliases.
    ///
    /// `e`, `exp` and `explicit` map to `Explicit`; `i`, `imp` and `implicit`
    /// map to `Implicit`. Matching is exact.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "e" | "exp" | "explicit" => Ok(ActivationMode::Explicit),
            "i" | "imp" | "implicit" => Ok(ActivationMode::Implicit),
            other => Err(InstallError::Config {
                message: format!(
                    "Unsupported layer install type '{}', please use either 'explicit' or 'implicit'",
                    other
                ),
            }),
        }
    }
}

impl FromStr for ActivationMode {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self> {
        ActivationMode::parse(s)
    }
}

impl std::fmt::Display for ActivationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runtime configuration for one install run.
#[derive(Debug, Clone)]
pub struct InstallConfig {
    /// Project root holding `resources/` and `bin/`.
    pub root: PathBuf,
    pub mode: ActivationMode,
    pub platform: Platform,
    pub layer_name: String,
    /// Search directory supplied by the operator (POSIX only).
    pub search_path_override: Option<PathBuf>,
    /// Accepted for compatibility; the install flow does not use it.
    pub config_install_path: Option<PathBuf>,
}

impl InstallConfig {
    /// Create a configuration for the current platform.
    pub fn new(root: impl AsRef<Path>, mode: ActivationMode) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            mode,
            platform: Platform::current(),
            layer_name: LayerConfig::LAYER_NAME.to_string(),
            search_path_override: None,
            config_install_path: None,
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_layer_name(mut self, name: impl Into<String>) -> Self {
        self.layer_name = name.into();
        self
    }

    pub fn with_search_path(mut self, path: Option<PathBuf>) -> Self {
        self.search_path_override = path;
        self
    }

    pub fn with_config_install_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_install_path = path;
        self
    }
}
