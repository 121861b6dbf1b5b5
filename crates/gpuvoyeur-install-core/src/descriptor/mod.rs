//! Layer descriptor handling.
//!
//! This module provides:
//! - Search directory discovery for explicit and implicit layers
//! - Parsing and patching of layer manifests
//! - Atomic replacement of installed manifest files

mod atomic;
mod document;
mod locator;

pub use atomic::atomic_write;
pub use document::LayerDescriptor;
pub use locator::{DescriptorLocator, DescriptorSearchResult};
