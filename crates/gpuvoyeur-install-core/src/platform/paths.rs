//! Platform-specific path utilities.
//!
//! This module provides:
//! - The project layout (source descriptors, bin directory, layer library)
//! - The ordered list of loader search bases
//! - Install target derivation for a resolved search directory
//! - Project root discovery from the executable location

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf, Prefix};

use tracing::{debug, warn};

use super::Platform;
use crate::config::{ActivationMode, InstallConfig, LayerConfig, PathsConfig};
use crate::error::{InstallError, Result};

/// Every project-relative path the installer reads or writes.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
    platform: Platform,
    layer_name: String,
}

impl ProjectLayout {
    /// Build the layout for a configuration.
    ///
    /// The root is canonicalized so the library path written into descriptors
    /// is absolute. On Windows the `\\?\` prefix is dropped again so the
    /// registry and the loader see a plain drive or UNC path.
    pub fn new(config: &InstallConfig) -> Result<Self> {
        let root = config
            .root
            .canonicalize()
            .map(strip_verbatim)
            .map_err(|e| InstallError::Config {
                message: format!(
                    "Project root {} is not usable: {}",
                    config.root.display(),
                    e
                ),
            })?;

        if !root.is_dir() {
            return Err(InstallError::Config {
                message: format!("Project root {} is not a directory", root.display()),
            });
        }

        Ok(Self {
            root,
            platform: config.platform,
            layer_name: config.layer_name.clone(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{root}/resources/{OSDir}`
    pub fn resources_dir(&self) -> PathBuf {
        self.root
            .join(PathsConfig::RESOURCES_DIR_NAME)
            .join(self.platform.os_dir_name())
    }

    /// `{root}/bin/{OSDir}`
    pub fn bin_dir(&self) -> PathBuf {
        self.root
            .join(PathsConfig::BIN_DIR_NAME)
            .join(self.platform.os_dir_name())
    }

    /// Installed descriptor name, `VkLayer_{name}.json`. Shared by the bin copy
    /// and the search directory copy.
    pub fn descriptor_file_name(&self) -> String {
        format!(
            "{}{}.{}",
            LayerConfig::DESCRIPTOR_PREFIX,
            self.layer_name,
            LayerConfig::DESCRIPTOR_EXTENSION
        )
    }

    /// Mode-specific source descriptor, `VkLayer_{name}_{mode}.json`.
    pub fn source_descriptor(&self, mode: ActivationMode) -> PathBuf {
        self.resources_dir().join(format!(
            "{}{}_{}.{}",
            LayerConfig::DESCRIPTOR_PREFIX,
            self.layer_name,
            mode.as_str(),
            LayerConfig::DESCRIPTOR_EXTENSION
        ))
    }

    pub fn bin_descriptor(&self) -> PathBuf {
        self.bin_dir().join(self.descriptor_file_name())
    }

    /// Absolute path of the layer shared library.
    pub fn library_path(&self) -> PathBuf {
        self.bin_dir()
            .join(self.platform.library_file_name(&self.layer_name))
    }
}

/// Longest path Win32 accepts without the verbatim prefix.
const MAX_PLAIN_PATH: usize = 259;

/// Rewrite `\\?\C:\...` as `C:\...` and `\\?\UNC\server\share\...` as
/// `\\server\share\...`.
///
/// Paths without a verbatim prefix, other verbatim forms and paths too long
/// for plain Win32 syntax are returned unchanged.
fn strip_verbatim(path: PathBuf) -> PathBuf {
    plain_form(&path).unwrap_or(path)
}

fn plain_form(path: &Path) -> Option<PathBuf> {
    let mut components = path.components();
    let mut plain = match components.next() {
        Some(Component::Prefix(prefix)) => match prefix.kind() {
            Prefix::VerbatimDisk(letter) => OsString::from(format!("{}:", letter as char)),
            Prefix::VerbatimUNC(server, share) => {
                let mut unc = OsString::from(r"\\");
                unc.push(server);
                unc.push(r"\");
                unc.push(share);
                unc
            }
            _ => return None,
        },
        _ => return None,
    };

    plain.push(r"\");
    let rest = components.filter(|c| !matches!(c, Component::RootDir));
    for (index, component) in rest.enumerate() {
        if index > 0 {
            plain.push(r"\");
        }
        plain.push(component.as_os_str());
    }

    if plain.len() > MAX_PLAIN_PATH {
        return None;
    }
    Some(PathBuf::from(plain))
}

/// Get the ordered loader search bases.
///
/// # Platform Behavior
/// - **POSIX**: the four system bases followed by `~/.local/share/vulkan`
/// - The home entry is skipped when the home directory cannot be determined
pub fn system_search_bases() -> Vec<PathBuf> {
    let mut bases: Vec<PathBuf> = PathsConfig::SYSTEM_SEARCH_BASES
        .iter()
        .map(PathBuf::from)
        .collect();

    match dirs::home_dir() {
        Some(home) => bases.push(home.join(PathsConfig::USER_SEARCH_BASE)),
        None => warn!("Could not determine home directory, skipping per-user layer search path"),
    }

    bases
}

/// Derive the descriptor destination inside a resolved search directory.
///
/// A directory already named `{mode}_layer.d` is used as-is; anything else is
/// treated as a base and gets the mode subdirectory appended.
pub fn install_target(search_dir: &Path, mode: ActivationMode, file_name: &str) -> PathBuf {
    let layer_dir_name = mode.layer_dir_name();
    let is_layer_dir = search_dir
        .file_name()
        .map(|n| n == layer_dir_name.as_str())
        .unwrap_or(false);

    if is_layer_dir {
        search_dir.join(file_name)
    } else {
        search_dir.join(layer_dir_name).join(file_name)
    }
}

/// Find the nearest ancestor of `start` (inclusive) that holds `resources/`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let found = start
        .ancestors()
        .find(|dir| dir.join(PathsConfig::RESOURCES_DIR_NAME).is_dir())
        .map(Path::to_path_buf);

    match &found {
        Some(root) => debug!("Discovered project root at {}", root.display()),
        None => debug!("No project root above {}", start.display()),
    }
    found
}
