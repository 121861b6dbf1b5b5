//! Layer search directory discovery.
//!
//! The loader looks for descriptors in `{base}/{mode}_layer.d` across a fixed
//! list of bases. An install goes into the first of those directories that
//! already holds at least one descriptor, so the layer lands where the host's
//! other layers live.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{ActivationMode, LayerConfig};
use crate::error::{InstallError, Result};
use crate::platform::system_search_bases;

/// Outcome of a search directory lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorSearchResult {
    Found(PathBuf),
    NotFound,
}

impl DescriptorSearchResult {
    pub fn path(&self) -> Option<&Path> {
        match self {
            DescriptorSearchResult::Found(path) => Some(path),
            DescriptorSearchResult::NotFound => None,
        }
    }
}

/// Searches an ordered list of base directories for a populated
/// `{mode}_layer.d`.
#[derive(Debug, Clone)]
pub struct DescriptorLocator {
    bases: Vec<PathBuf>,
}

impl DescriptorLocator {
    /// Create a locator over explicit bases, searched in the given order.
    pub fn new(bases: Vec<PathBuf>) -> Self {
        Self { bases }
    }

    /// Create a locator over the standard loader search bases.
    pub fn system() -> Self {
        Self::new(system_search_bases())
    }

    pub fn bases(&self) -> &[PathBuf] {
        &self.bases
    }

    /// Mode subdirectories this locator would inspect, in order.
    pub fn candidates(&self, mode: ActivationMode) -> Vec<PathBuf> {
        let layer_dir_name = mode.layer_dir_name();
        self.bases
            .iter()
            .map(|base| base.join(&layer_dir_name))
            .collect()
    }

    /// Find the search directory for `mode`.
    ///
    /// An override is returned unchanged without touching the filesystem.
    /// Otherwise the first candidate that is a directory containing a
    /// descriptor wins and the remaining bases are not inspected.
    pub fn locate(
        &self,
        mode: ActivationMode,
        override_path: Option<&Path>,
    ) -> DescriptorSearchResult {
        if let Some(path) = override_path {
            debug!("Using layer search path override {}", path.display());
            return DescriptorSearchResult::Found(path.to_path_buf());
        }

        info!("Searching known layer JSON directories for possible install destination");

        for candidate in self.candidates(mode) {
            if contains_descriptor(&candidate) {
                info!(
                    "Candidate install path for layer JSON found: {}",
                    candidate.display()
                );
                return DescriptorSearchResult::Found(candidate);
            }
            debug!("No layer descriptors in {}", candidate.display());
        }

        DescriptorSearchResult::NotFound
    }

    /// Like `locate`, but a miss becomes a resolution error naming every
    /// directory that was searched.
    pub fn require(&self, mode: ActivationMode, override_path: Option<&Path>) -> Result<PathBuf> {
        match self.locate(mode, override_path) {
            DescriptorSearchResult::Found(path) => Ok(path),
            DescriptorSearchResult::NotFound => Err(InstallError::Resolution {
                mode,
                searched: self.candidates(mode),
            }),
        }
    }
}

/// Whether `dir` is a directory with at least one descriptor file directly
/// inside it.
fn contains_descriptor(dir: &Path) -> bool {
    if !dir.is_dir() {
        return false;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Skipping unreadable layer directory {}: {}", dir.display(), e);
            return false;
        }
    };

    // Suffix match, so a bare `.json` counts too.
    let suffix = format!(".{}", LayerConfig::DESCRIPTOR_EXTENSION);
    entries
        .filter_map(|entry| entry.ok())
        .any(|entry| entry.file_name().to_string_lossy().ends_with(&suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Five bases under a temp dir, mirroring the system list.
    fn make_bases(temp_dir: &TempDir) -> Vec<PathBuf> {
        ["local-etc", "local-share", "etc", "share", "home"]
            .iter()
            .map(|name| temp_dir.path().join(name))
            .collect()
    }

    fn populate(base: &Path, mode: ActivationMode, file: &str) -> PathBuf {
        let dir = base.join(mode.layer_dir_name());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), "{}").unwrap();
        dir
    }

    #[test]
    fn test_each_single_populated_base_is_found() {
        for index in 0..5 {
            let temp_dir = TempDir::new().unwrap();
            let bases = make_bases(&temp_dir);
            let expected = populate(&bases[index], ActivationMode::Explicit, "other.json");

            let locator = DescriptorLocator::new(bases);
            assert_eq!(
                locator.locate(ActivationMode::Explicit, None),
                DescriptorSearchResult::Found(expected),
                "base index {}",
                index
            );
        }
    }

    #[test]
    fn test_earliest_base_wins() {
        let temp_dir = TempDir::new().unwrap();
        let bases = make_bases(&temp_dir);
        populate(&bases[4], ActivationMode::Implicit, "a.json");
        let expected = populate(&bases[2], ActivationMode::Implicit, "b.json");
        populate(&bases[3], ActivationMode::Implicit, "c.json");

        let locator = DescriptorLocator::new(bases);
        assert_eq!(
            locator.locate(ActivationMode::Implicit, None),
            DescriptorSearchResult::Found(expected)
        );
    }

    #[test]
    fn test_directory_without_descriptors_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let bases = make_bases(&temp_dir);
        fs::create_dir_all(bases[0].join("explicit_layer.d")).unwrap();
        populate(&bases[1], ActivationMode::Explicit, "README.txt");
        let expected = populate(&bases[3], ActivationMode::Explicit, "layer.json");

        let locator = DescriptorLocator::new(bases);
        assert_eq!(
            locator.locate(ActivationMode::Explicit, None),
            DescriptorSearchResult::Found(expected)
        );
    }

    #[test]
    fn test_bare_json_file_name_counts_as_descriptor() {
        let temp_dir = TempDir::new().unwrap();
        let bases = make_bases(&temp_dir);
        let expected = populate(&bases[0], ActivationMode::Explicit, ".json");

        let locator = DescriptorLocator::new(bases);
        assert_eq!(
            locator.locate(ActivationMode::Explicit, None),
            DescriptorSearchResult::Found(expected)
        );
    }

    #[test]
    fn test_other_mode_directory_does_not_match() {
        let temp_dir = TempDir::new().unwrap();
        let bases = make_bases(&temp_dir);
        populate(&bases[0], ActivationMode::Implicit, "layer.json");

        let locator = DescriptorLocator::new(bases);
        assert_eq!(
            locator.locate(ActivationMode::Explicit, None),
            DescriptorSearchResult::NotFound
        );
    }

    #[test]
    fn test_override_bypasses_search() {
        let temp_dir = TempDir::new().unwrap();
        let bases = make_bases(&temp_dir);
        populate(&bases[0], ActivationMode::Explicit, "layer.json");
        let override_path = temp_dir.path().join("does-not-exist");

        let locator = DescriptorLocator::new(bases);
        let result = locator.locate(ActivationMode::Explicit, Some(&override_path));
        assert_eq!(result.path(), Some(override_path.as_path()));
    }

    #[test]
    fn test_require_reports_searched_directories() {
        let temp_dir = TempDir::new().unwrap();
        let bases = make_bases(&temp_dir);
        let locator = DescriptorLocator::new(bases.clone());

        let err = locator.require(ActivationMode::Implicit, None).unwrap_err();
        match err {
            InstallError::Resolution { mode, searched } => {
                assert_eq!(mode, ActivationMode::Implicit);
                assert_eq!(searched.len(), 5);
                assert_eq!(searched[0], bases[0].join("implicit_layer.d"));
            }
            other => panic!("expected resolution error, got {:?}", other),
        }
    }

    #[test]
    fn test_system_locator_has_standard_bases() {
        let locator = DescriptorLocator::system();
        assert_eq!(locator.bases()[0], PathBuf::from("/usr/local/etc/vulkan"));
    }
}
