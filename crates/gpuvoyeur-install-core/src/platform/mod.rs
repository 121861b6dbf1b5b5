//! Platform abstraction layer for cross-platform installs.
//!
//! All `#[cfg]` blocks for OS-specific behavior live in this module rather
//! than being scattered through the installer.
//!
//! # Architecture
//!
//! - `paths` - Project layout, layer search bases and install targets
//! - `registry` - Windows registry registration behind the `LayerRegistry` seam
//!
//! The install flow never inspects the OS directly. It reads the `Platform`
//! stored in `InstallConfig`, chosen once at startup by `Platform::current()`.

pub mod paths;
pub mod registry;

pub use paths::{find_project_root, install_target, system_search_bases, ProjectLayout};
pub use registry::{layer_key_path, LayerRegistry, SystemRegistry};

use crate::config::PathsConfig;

/// How a layer gets activated on the target OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Descriptor stays in the bin directory and the registry points at it.
    WindowsLike,
    /// Descriptor is copied into a loader search directory with an absolute
    /// library path.
    PosixLike,
}

impl Platform {
    /// Returns the platform of the running host.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::WindowsLike
        } else {
            Platform::PosixLike
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::WindowsLike => "windows",
            Platform::PosixLike => "posix",
        }
    }

    /// Per-OS directory name under `resources/` and `bin/`.
    pub fn os_dir_name(&self) -> &'static str {
        match self {
            Platform::WindowsLike => PathsConfig::WINDOWS_OS_DIR_NAME,
            Platform::PosixLike => PathsConfig::LINUX_OS_DIR_NAME,
        }
    }

    /// File name of the layer shared library.
    ///
    /// # Platform Behavior
    /// - **Windows**: `{name}.dll`
    /// - **POSIX**: `lib{name}.so`
    pub fn library_file_name(&self, layer_name: &str) -> String {
        match self {
            Platform::WindowsLike => format!("{}.dll", layer_name),
            Platform::PosixLike => format!("lib{}.so", layer_name),
        }
    }

    /// Whether installed descriptors get their `library_path` rewritten.
    pub fn patches_descriptor(&self) -> bool {
        matches!(self, Platform::PosixLike)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
