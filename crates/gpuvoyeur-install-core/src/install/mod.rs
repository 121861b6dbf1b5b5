//! Layer installation.
//!
//! This module provides:
//! - Single-descriptor copy and library path patching
//! - The full install run for Windows-like and POSIX-like hosts

mod installer;
mod steps;

pub use installer::{InstallReport, LayerInstaller};
pub use steps::{copy_descriptor, install_descriptor, patch_library_path};
