//! Layer registration in the Windows registry.
//!
//! The Vulkan loader on Windows discovers layers through values under
//! `HKEY_LOCAL_MACHINE\SOFTWARE\Khronos\Vulkan\{Explicit,Implicit}Layers`.
//! Each value name is an absolute descriptor path and the `REG_DWORD` data is
//! 0 for an enabled layer.

// Registry access goes through raw Win32 calls.
#![allow(unsafe_code)]

use std::path::Path;

use tracing::{debug, info};

use crate::config::{ActivationMode, RegistryConfig};
use crate::error::Result;

/// Something that can record a layer descriptor for the loader.
pub trait LayerRegistry {
    /// Register `descriptor` under the subkey for `mode`.
    fn register_layer(&self, mode: ActivationMode, descriptor: &Path) -> Result<()>;
}

/// Key path below `HKEY_LOCAL_MACHINE` for a mode.
pub fn layer_key_path(mode: ActivationMode) -> String {
    format!("{}\\{}", RegistryConfig::VULKAN_KEY, mode.registry_subkey())
}

/// The host's registry.
///
/// # Platform Behavior
/// - **Windows**: writes under `HKEY_LOCAL_MACHINE` (needs elevation)
/// - **Other**: returns `UnsupportedPlatform`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRegistry;

impl LayerRegistry for SystemRegistry {
    fn register_layer(&self, mode: ActivationMode, descriptor: &Path) -> Result<()> {
        let key_path = layer_key_path(mode);
        info!("Adding layer key to registry: HKLM\\{}", key_path);

        #[cfg(windows)]
        {
            windows_impl::set_layer_value(&key_path, descriptor)?;
            debug!("Registered {} under HKLM\\{}", descriptor.display(), key_path);
            Ok(())
        }

        #[cfg(not(windows))]
        {
            debug!(
                "Cannot register {} under HKLM\\{} on this host",
                descriptor.display(),
                key_path
            );
            Err(crate::error::InstallError::UnsupportedPlatform(
                "the Windows registry is not available on this host".to_string(),
            ))
        }
    }
}

#[cfg(windows)]
mod windows_impl {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;
    use std::ptr;

    use windows_sys::Win32::Foundation::ERROR_SUCCESS;
    use windows_sys::Win32::System::Registry::{
        RegCloseKey, RegCreateKeyExW, RegSetValueExW, HKEY, HKEY_LOCAL_MACHINE, KEY_WRITE,
        REG_DWORD, REG_OPTION_NON_VOLATILE,
    };

    use crate::config::RegistryConfig;
    use crate::error::{InstallError, Result};

    fn to_wide(s: &OsStr) -> Vec<u16> {
        s.encode_wide().chain(std::iter::once(0)).collect()
    }

    /// Closes the key on drop so every exit path releases it.
    struct KeyGuard(HKEY);

    impl Drop for KeyGuard {
        fn drop(&mut self) {
            // SAFETY: the handle came from a successful RegCreateKeyExW and is
            // closed exactly once here.
            unsafe {
                RegCloseKey(self.0);
            }
        }
    }

    fn registry_error(key_path: &str, message: &str, code: u32) -> InstallError {
        InstallError::Registry {
            key: format!("HKLM\\{}", key_path),
            message: message.to_string(),
            source: Some(std::io::Error::from_raw_os_error(code as i32)),
        }
    }

    pub(super) fn set_layer_value(key_path: &str, descriptor: &Path) -> Result<()> {
        let wide_key = to_wide(OsStr::new(key_path));
        let wide_value = to_wide(descriptor.as_os_str());
        let data = RegistryConfig::LAYER_ENABLED_VALUE.to_le_bytes();

        let mut key: HKEY = ptr::null_mut();
        // SAFETY: `wide_key` is NUL-terminated and outlives the call; `key` is
        // a valid out pointer; the optional class, security and disposition
        // arguments are null as the API allows.
        let status = unsafe {
            RegCreateKeyExW(
                HKEY_LOCAL_MACHINE,
                wide_key.as_ptr(),
                0,
                ptr::null(),
                REG_OPTION_NON_VOLATILE,
                KEY_WRITE,
                ptr::null(),
                &mut key,
                ptr::null_mut(),
            )
        };
        if status != ERROR_SUCCESS {
            return Err(registry_error(key_path, "failed to create key", status));
        }
        let key = KeyGuard(key);

        // SAFETY: `key.0` is an open key with KEY_WRITE; `wide_value` is
        // NUL-terminated; `data` is exactly the 4 bytes a REG_DWORD needs.
        let status = unsafe {
            RegSetValueExW(
                key.0,
                wide_value.as_ptr(),
                0,
                REG_DWORD,
                data.as_ptr(),
                data.len() as u32,
            )
        };
        if status != ERROR_SUCCESS {
            return Err(registry_error(key_path, "failed to set layer value", status));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(not(windows))]
    use crate::error::InstallError;

    #[test]
    fn test_layer_key_paths() {
        assert_eq!(
            layer_key_path(ActivationMode::Explicit),
            r"SOFTWARE\Khronos\Vulkan\ExplicitLayers"
        );
        assert_eq!(
            layer_key_path(ActivationMode::Implicit),
            r"SOFTWARE\Khronos\Vulkan\ImplicitLayers"
        );
    }

    #[test]
    fn test_system_registry_unsupported_off_windows() {
        #[cfg(not(windows))]
        {
            let err = SystemRegistry
                .register_layer(ActivationMode::Explicit, Path::new("/tmp/VkLayer.json"))
                .unwrap_err();
            assert!(matches!(err, InstallError::UnsupportedPlatform(_)));
        }
    }
}
