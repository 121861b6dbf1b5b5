//! Copy and patch steps for a single descriptor.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::descriptor::{atomic_write, LayerDescriptor};
use crate::error::{InstallError, Result};
use crate::platform::Platform;

/// Copy `source` to `destination` byte for byte.
///
/// The source is checked before the destination is touched, and the
/// destination directory must already exist.
pub fn copy_descriptor(source: &Path, destination: &Path) -> Result<u64> {
    if !source.is_file() {
        return Err(InstallError::FileNotFound(source.to_path_buf()));
    }

    if let Some(parent) = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        if !parent.is_dir() {
            return Err(InstallError::NotADirectory(parent.to_path_buf()));
        }
    }

    let bytes = fs::copy(source, destination).map_err(|e| InstallError::Io {
        message: format!(
            "Failed to copy {} to {}",
            source.display(),
            destination.display()
        ),
        path: Some(destination.to_path_buf()),
        source: Some(e),
    })?;

    debug!(
        "Copied {} bytes from {} to {}",
        bytes,
        source.display(),
        destination.display()
    );
    Ok(bytes)
}

/// Rewrite `layer.library_path` in an installed descriptor.
///
/// The whole file is read, patched in memory and swapped in atomically.
pub fn patch_library_path(descriptor_path: &Path, library: &Path) -> Result<LayerDescriptor> {
    let mut descriptor = LayerDescriptor::load(descriptor_path)?;
    let previous = descriptor.library_path().map(str::to_string);

    descriptor.set_library_path(library)?;
    let contents = descriptor.to_pretty_bytes()?;
    atomic_write(descriptor_path, &contents)?;

    debug!(
        "Patched library_path in {}: {:?} -> {}",
        descriptor_path.display(),
        previous,
        library.display()
    );
    Ok(descriptor)
}

/// Copy a descriptor into place and, where the platform needs it, point its
/// library path at `library`.
///
/// If patching fails the copied file is removed so no half-installed
/// descriptor is left for the loader to pick up.
pub fn install_descriptor(
    source: &Path,
    destination: &Path,
    library: &Path,
    platform: Platform,
) -> Result<()> {
    copy_descriptor(source, destination)?;

    if !platform.patches_descriptor() {
        return Ok(());
    }

    if let Err(e) = patch_library_path(destination, library) {
        warn!(
            "Rolling back {} after failed patch: {}",
            destination.display(),
            e
        );
        if let Err(remove_err) = fs::remove_file(destination) {
            warn!(
                "Failed to remove {}: {}",
                destination.display(),
                remove_err
            );
        }
        return Err(e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    const SOURCE: &str = r#"{"layer":{"library_path":"/old/path.so","name":"X"}}"#;

    fn write_source(temp_dir: &TempDir, text: &str) -> std::path::PathBuf {
        let path = temp_dir.path().join("VkLayer_GPUVoyeur_explicit.json");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_copy_missing_source_leaves_destination_alone() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("dest.json");
        fs::write(&destination, "previous").unwrap();

        let err = copy_descriptor(&temp_dir.path().join("missing.json"), &destination).unwrap_err();
        assert!(matches!(err, InstallError::FileNotFound(_)));
        assert_eq!(fs::read_to_string(&destination).unwrap(), "previous");
    }

    #[test]
    fn test_copy_requires_existing_destination_dir() {
        let temp_dir = TempDir::new().unwrap();
        let source = write_source(&temp_dir, SOURCE);
        let destination = temp_dir.path().join("nope").join("dest.json");

        let err = copy_descriptor(&source, &destination).unwrap_err();
        assert!(matches!(err, InstallError::NotADirectory(_)));
        assert!(!destination.exists());
    }

    #[test]
    fn test_posix_install_patches_library_path() {
        let temp_dir = TempDir::new().unwrap();
        let source = write_source(&temp_dir, SOURCE);
        let destination = temp_dir.path().join("VkLayer_GPUVoyeur.json");

        install_descriptor(
            &source,
            &destination,
            Path::new("/opt/app/libX.so"),
            Platform::PosixLike,
        )
        .unwrap();

        let installed: Value =
            serde_json::from_str(&fs::read_to_string(&destination).unwrap()).unwrap();
        let mut expected: Value = serde_json::from_str(SOURCE).unwrap();
        expected["layer"]["library_path"] = Value::String("/opt/app/libX.so".into());
        assert_eq!(installed, expected);

        // Source untouched
        assert_eq!(fs::read_to_string(&source).unwrap(), SOURCE);
    }

    #[test]
    fn test_windows_install_is_a_verbatim_copy() {
        let temp_dir = TempDir::new().unwrap();
        let source = write_source(&temp_dir, SOURCE);
        let destination = temp_dir.path().join("VkLayer_GPUVoyeur.json");

        install_descriptor(
            &source,
            &destination,
            Path::new("C:\\app\\GPUVoyeur.dll"),
            Platform::WindowsLike,
        )
        .unwrap();

        assert_eq!(fs::read(&destination).unwrap(), fs::read(&source).unwrap());
    }

    #[test]
    fn test_patch_failure_rolls_back_copy() {
        let temp_dir = TempDir::new().unwrap();
        let source = write_source(&temp_dir, "{ \"layer\": ");
        let destination = temp_dir.path().join("VkLayer_GPUVoyeur.json");

        let err = install_descriptor(
            &source,
            &destination,
            Path::new("/opt/app/libX.so"),
            Platform::PosixLike,
        )
        .unwrap_err();

        assert!(matches!(err, InstallError::Json { .. }));
        assert!(!destination.exists());
    }

    #[test]
    fn test_patch_without_layer_object_rolls_back_copy() {
        let temp_dir = TempDir::new().unwrap();
        let source = write_source(&temp_dir, r#"{"file_format_version":"1.0.0"}"#);
        let destination = temp_dir.path().join("VkLayer_GPUVoyeur.json");

        let err = install_descriptor(
            &source,
            &destination,
            Path::new("/opt/app/libX.so"),
            Platform::PosixLike,
        )
        .unwrap_err();

        assert!(matches!(err, InstallError::InvalidDescriptor { .. }));
        assert!(!destination.exists());
    }

    #[test]
    fn test_patch_returns_updated_descriptor() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_source(&temp_dir, SOURCE);

        let descriptor = patch_library_path(&path, Path::new("/abs/libGPUVoyeur.so")).unwrap();
        assert_eq!(descriptor.library_path(), Some("/abs/libGPUVoyeur.so"));
    }
}
