//! In-memory layer descriptor.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value};

use crate::config::LayerConfig;
use crate::error::{InstallError, Result};

/// A parsed Vulkan layer manifest.
///
/// Only `layer.library_path` is ever modified; every other field keeps its
/// value and position.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDescriptor {
    document: Value,
    /// Where the descriptor was loaded from, for error context.
    origin: Option<PathBuf>,
}

impl LayerDescriptor {
    /// Parse a descriptor from JSON text.
    pub fn parse(text: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(text)?;
        Ok(Self {
            document,
            origin: None,
        })
    }

    /// Read and parse a descriptor file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| InstallError::Io {
            message: format!("Failed to read {}", path.display()),
            path: Some(path.to_path_buf()),
            source: Some(e),
        })?;

        let document: Value =
            serde_json::from_str(&text).map_err(|e| InstallError::json_with_path(e, path))?;

        Ok(Self {
            document,
            origin: Some(path.to_path_buf()),
        })
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Current `layer.library_path`, if present and a string.
    pub fn library_path(&self) -> Option<&str> {
        self.document
            .get(LayerConfig::LAYER_KEY)?
            .get(LayerConfig::LIBRARY_PATH_KEY)?
            .as_str()
    }

    /// Point `layer.library_path` at `library`.
    ///
    /// The descriptor must contain a `layer` object. The path must be valid
    /// UTF-8 since JSON strings cannot carry anything else.
    pub fn set_library_path(&mut self, library: &Path) -> Result<()> {
        let rendered = library
            .to_str()
            .ok_or_else(|| InstallError::InvalidDescriptor {
                path: self.origin.clone(),
                message: format!("library path {} is not valid UTF-8", library.display()),
            })?
            .to_string();

        let layer = self
            .document
            .get_mut(LayerConfig::LAYER_KEY)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| InstallError::InvalidDescriptor {
                path: self.origin.clone(),
                message: format!("missing \"{}\" object", LayerConfig::LAYER_KEY),
            })?;

        layer.insert(
            LayerConfig::LIBRARY_PATH_KEY.to_string(),
            Value::String(rendered),
        );
        Ok(())
    }

    /// Serialize with 4-space indentation.
    pub fn to_pretty_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(LayerConfig::DESCRIPTOR_INDENT);
        let mut serializer = Serializer::with_formatter(&mut buf, formatter);
        serde::Serialize::serialize(&self.document, &mut serializer)?;
        Ok(buf)
    }
}
