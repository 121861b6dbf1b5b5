//! Atomic file replacement for installed descriptors.
//!
//! Implements atomic writes using:
//! 1. Write to a temp file with a unique PID+TID suffix in the target directory
//! 2. fsync to ensure data reaches disk
//! 3. Atomic rename over the target path
//!
//! The temp file lives next to the target so the rename never crosses a
//! filesystem boundary.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::thread;

use tracing::{debug, warn};

use crate::error::{InstallError, Result};

/// Replace `path` with `contents` atomically.
///
/// The parent directory must already exist. On failure the temp file is
/// removed and `path` is left untouched.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let temp_path = temp_path_for(path);

    if let Err(e) = write_synced(&temp_path, contents) {
        remove_temp(&temp_path);
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        remove_temp(&temp_path);
        return Err(InstallError::Io {
            message: format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            ),
            path: Some(path.to_path_buf()),
            source: Some(e),
        });
    }

    debug!("Atomically wrote {}", path.display());
    Ok(())
}

/// Temp sibling of `path`, e.g. `VkLayer_X.json.1234.5678.tmp`.
fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "descriptor".to_string());
    path.with_file_name(format!(
        "{}.{}.{}.tmp",
        file_name,
        process::id(),
        thread_id()
    ))
}

fn write_synced(temp_path: &Path, contents: &[u8]) -> Result<()> {
    let mut file: File = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| InstallError::Io {
            message: format!("Failed to create temp file {}", temp_path.display()),
            path: Some(temp_path.to_path_buf()),
            source: Some(e),
        })?;

    file.write_all(contents).map_err(|e| InstallError::Io {
        message: format!("Failed to write temp file {}", temp_path.display()),
        path: Some(temp_path.to_path_buf()),
        source: Some(e),
    })?;

    file.sync_all().map_err(|e| InstallError::Io {
        message: format!("Failed to sync temp file {}", temp_path.display()),
        path: Some(temp_path.to_path_buf()),
        source: Some(e),
    })?;

    Ok(())
}

fn remove_temp(temp_path: &Path) {
    if temp_path.exists() {
        if let Err(e) = fs::remove_file(temp_path) {
            warn!("Failed to remove temp file {}: {}", temp_path.display(), e);
        }
    }
}

/// Get a unique thread identifier.
fn thread_id() -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    format!("{:?}", thread::current().id()).hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn leftover_temp_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.to_string_lossy().ends_with(".tmp"))
            .collect()
    }

    #[test]
    fn test_atomic_write_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("layer.json");

        atomic_write(&path, b"{}").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"{}");
        assert!(leftover_temp_files(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_atomic_write_truncates_longer_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("layer.json");
        fs::write(&path, "a much longer previous document body").unwrap();

        atomic_write(&path, b"short").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "short");
    }

    #[test]
    fn test_atomic_write_missing_parent_leaves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("layer.json");

        let err = atomic_write(&path, b"{}").unwrap_err();
        assert!(matches!(err, InstallError::Io { .. }));
        assert!(!path.exists());
        assert!(leftover_temp_files(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let path = Path::new("/etc/vulkan/explicit_layer.d/VkLayer_GPUVoyeur.json");
        let temp = temp_path_for(path);
        assert_eq!(temp.parent(), path.parent());
        let name = temp.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("VkLayer_GPUVoyeur.json."));
        assert!(name.ends_with(".tmp"));
    }
}
